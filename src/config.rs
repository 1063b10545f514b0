use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub gateway: GatewayConfig,
    pub mail: Option<MailConfig>,
}

/// Payment processor credentials. The client built from this is constructed
/// once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_token: String,
    pub sender: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")?;

        let gateway = GatewayConfig {
            base_url: env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
            key_id: env::var("GATEWAY_KEY_ID").unwrap_or_default(),
            key_secret: env::var("GATEWAY_KEY_SECRET").unwrap_or_default(),
            currency: env::var("GATEWAY_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
        };

        // Welcome mail is optional; without credentials the subscribe flow
        // still works and sending becomes a no-op.
        let mail = match (
            env::var("MAIL_API_URL"),
            env::var("MAIL_API_TOKEN"),
            env::var("MAIL_SENDER"),
        ) {
            (Ok(api_url), Ok(api_token), Ok(sender)) => Some(MailConfig {
                api_url,
                api_token,
                sender,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            gateway,
            mail,
        })
    }
}
