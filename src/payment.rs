use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use utoipa::ToSchema;

use crate::{config::GatewayConfig, error::AppError};

type HmacSha256 = Hmac<Sha256>;

/// Processor-side order descriptor handed back to the client so it can run
/// the hosted confirmation step. Amount is in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayOrder {
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, AppError>;
}

/// REST client for the hosted payment processor. Built once at startup from
/// config and reused across requests.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderReply {
    id: String,
    amount: i64,
    currency: String,
}

#[async_trait]
impl PaymentGateway for GatewayClient {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, AppError> {
        let url = format!("{}/v1/orders", self.base_url);
        let reply = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Gateway(e.to_string()))?
            .json::<CreateOrderReply>()
            .await
            .map_err(|e| AppError::Gateway(e.to_string()))?;

        Ok(GatewayOrder {
            gateway_order_id: reply.id,
            amount: reply.amount,
            currency: reply.currency,
        })
    }
}

/// Check a confirmation callback: HMAC-SHA256 over
/// `"{order_id}|{payment_id}"` keyed with the gateway shared secret must
/// match the hex signature the client relayed. This is the sole integrity
/// guarantee on the payment path.
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());

    let Ok(supplied) = hex::decode(signature) else {
        return false;
    };
    mac.verify_slice(&supplied).is_ok()
}

/// Sign the pair the way the processor does; used by tests and nowhere else
/// in the request path.
pub fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_gateway_secret";

    #[test]
    fn signature_round_trip() {
        let sig = sign(SECRET, "order_abc", "pay_xyz");
        assert!(verify_signature(SECRET, "order_abc", "pay_xyz", &sig));
    }

    #[test]
    fn any_byte_flip_rejects() {
        let sig = sign(SECRET, "order_abc", "pay_xyz");
        for i in 0..sig.len() {
            let mut bytes = sig.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(
                !verify_signature(SECRET, "order_abc", "pay_xyz", &tampered),
                "flip at {i} must invalidate the signature"
            );
        }
    }

    #[test]
    fn wrong_secret_rejects() {
        let sig = sign(SECRET, "order_abc", "pay_xyz");
        assert!(!verify_signature("other_secret", "order_abc", "pay_xyz", &sig));
    }

    #[test]
    fn non_hex_signature_rejects() {
        assert!(!verify_signature(SECRET, "order_abc", "pay_xyz", "zz-not-hex"));
    }

    #[test]
    fn swapped_ids_reject() {
        let sig = sign(SECRET, "order_abc", "pay_xyz");
        assert!(!verify_signature(SECRET, "pay_xyz", "order_abc", &sig));
    }
}
