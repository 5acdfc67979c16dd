//! OAuth 1.0a request signing for user-context endpoints.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use thiserror::Error;

use super::XCredentials;

/// Everything except RFC 3986 unreserved characters
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("System clock is before the Unix epoch")]
    Clock,
    #[error("Invalid signing key: {0}")]
    Key(String),
}

/// OAuth 1.0a HMAC-SHA1 signer
pub struct OAuthSigner {
    consumer_key: SecretString,
    consumer_secret: SecretString,
    access_token: SecretString,
    access_token_secret: SecretString,
}

impl OAuthSigner {
    pub fn new(credentials: &XCredentials) -> Self {
        let copy = |s: &SecretString| SecretString::new(s.expose_secret().into());
        Self {
            consumer_key: copy(&credentials.api_key),
            consumer_secret: copy(&credentials.api_secret),
            access_token: copy(&credentials.access_token),
            access_token_secret: copy(&credentials.access_secret),
        }
    }

    /// Authorization header value for a request.
    ///
    /// `url` must not carry a query string; query parameters go in `params`.
    /// JSON bodies are not part of the signature.
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, OAuthError> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|_| OAuthError::Clock)?
            .as_secs()
            .to_string();

        self.sign_with(method, url, params, &timestamp, &generate_nonce())
    }

    fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        timestamp: &str,
        nonce: &str,
    ) -> Result<String, OAuthError> {
        let oauth_params: Vec<(&str, &str)> = vec![
            ("oauth_consumer_key", self.consumer_key.expose_secret()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.access_token.expose_secret()),
            ("oauth_version", "1.0"),
        ];

        let mut encoded: Vec<(String, String)> = oauth_params
            .iter()
            .chain(params.iter())
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect();
        encoded.sort();

        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            percent_encode(url),
            percent_encode(&param_string)
        );

        let signing_key = format!(
            "{}&{}",
            percent_encode(self.consumer_secret.expose_secret()),
            percent_encode(self.access_token_secret.expose_secret())
        );

        let signature = hmac_sha1(&signing_key, &base_string)?;

        let mut header: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect();
        header.push(format!("oauth_signature=\"{}\"", percent_encode(&signature)));

        Ok(format!("OAuth {}", header.join(", ")))
    }
}

fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hmac_sha1(key: &str, data: &str) -> Result<String, OAuthError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| OAuthError::Key(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.into())
    }

    fn signer() -> OAuthSigner {
        OAuthSigner::new(&XCredentials {
            api_key: secret("xvz1evFS4wEEPTGEFPHBog"),
            api_secret: secret("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"),
            access_token: secret("370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb"),
            access_secret: secret("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"),
            bearer_token: secret("unused"),
        })
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("foo=bar&baz"), "foo%3Dbar%26baz");
        assert_eq!(percent_encode("test-value_123.txt~"), "test-value_123.txt~");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_nonce_is_random_hex() {
        let a = generate_nonce();
        let b = generate_nonce();

        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    // Reference request from the platform's OAuth 1.0a signing guide
    #[test]
    fn test_known_signature() {
        let header = signer()
            .sign_with(
                "post",
                "https://api.twitter.com/1.1/statuses/update.json",
                &[
                    ("include_entities", "true"),
                    ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
                ],
                "1318622958",
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            )
            .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(!header.contains("include_entities"));
    }
}
