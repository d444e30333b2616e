// src/connectors/signer.rs
//! HMAC-SHA256 request signing for Binance futures private endpoints.

use crate::config::Credentials;
use crate::error::{BotError, Result};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

pub struct RequestSigner<'a> {
    credentials: &'a Credentials,
    recv_window_ms: u64,
}

impl<'a> RequestSigner<'a> {
    pub fn new(credentials: &'a Credentials, recv_window_ms: u64) -> Self {
        Self {
            credentials,
            recv_window_ms,
        }
    }

    /// Lower-case hex HMAC-SHA256 of `message` under the secret key.
    pub fn sign(&self, message: &str) -> Result<String> {
        let secret = self.credentials.expose_secret();
        if secret.is_empty() {
            return Err(BotError::Configuration("API secret is not set".into()));
        }

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| BotError::Configuration("invalid secret key length".into()))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Signed query string for the current time.
    pub fn signed_query(&self, params: &[(&str, String)]) -> Result<String> {
        self.signed_query_at(params, Utc::now().timestamp_millis())
    }

    /// Appends `timestamp` and `recvWindow` after the caller's parameters (order
    /// preserved), percent-encodes the values and appends `&signature=<hex>`.
    pub fn signed_query_at(&self, params: &[(&str, String)], timestamp_ms: i64) -> Result<String> {
        let mut all_params: Vec<(&str, String)> = params.to_vec();
        all_params.push(("timestamp", timestamp_ms.to_string()));
        all_params.push(("recvWindow", self.recv_window_ms.to_string()));

        let query_string = serde_urlencoded::to_string(&all_params)
            .map_err(|e| BotError::Configuration(format!("unencodable parameters: {}", e)))?;
        let signature = self.sign(&query_string)?;

        Ok(format!("{}&signature={}", query_string, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(secret: &str) -> Credentials {
        Credentials::new("key".into(), secret.into())
    }

    #[test]
    fn test_sign_known_vector() {
        // Example from the Binance signed endpoint documentation.
        let creds = Credentials::new(
            "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A".into(),
            "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j".into(),
        );
        let signer = RequestSigner::new(&creds, DEFAULT_RECV_WINDOW_MS);

        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            signer.sign(query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_injects_timestamp_and_recv_window() {
        let creds = creds("secret");
        let signer = RequestSigner::new(&creds, 5000);

        let query = signer
            .signed_query_at(&[("symbol", "BNBUSDT".to_string())], 1000)
            .unwrap();

        let (payload, signature) = query.split_once("&signature=").unwrap();
        assert_eq!(payload, "symbol=BNBUSDT&timestamp=1000&recvWindow=5000");
        assert_eq!(signature, signer.sign(payload).unwrap());
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_signature_depends_on_parameter_order() {
        let creds = creds("secret");
        let signer = RequestSigner::new(&creds, 5000);

        let a = signer
            .signed_query_at(&[("a", "1".into()), ("b", "2".into())], 1000)
            .unwrap();
        let again = signer
            .signed_query_at(&[("a", "1".into()), ("b", "2".into())], 1000)
            .unwrap();
        let swapped = signer
            .signed_query_at(&[("b", "2".into()), ("a", "1".into())], 1000)
            .unwrap();

        assert_eq!(a, again);
        assert_ne!(a, swapped);
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let creds = creds("secret");
        let signer = RequestSigner::new(&creds, 5000);

        let query = signer
            .signed_query_at(&[("note", "a&b=c".into())], 1)
            .unwrap();
        assert!(query.starts_with("note=a%26b%3Dc&timestamp=1"));
    }

    #[test]
    fn test_empty_secret_is_configuration_error() {
        let creds = creds("");
        let signer = RequestSigner::new(&creds, 5000);

        assert!(matches!(
            signer.signed_query_at(&[], 1),
            Err(BotError::Configuration(_))
        ));
    }
}
