//! Retweet adapter (OAuth 1.0a user context)

use async_trait::async_trait;
use reqwest::Client;
use retweet_bot_domain::{ApiError, Retweeter, TweetId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{DEFAULT_BASE_URL, OAuthSigner, XCredentials, check_response, http_client};

/// The authenticated bot account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XUser {
    pub id: String,
    pub username: String,
}

/// Retweets on behalf of the account the access token belongs to
pub struct XRetweeter {
    client: Client,
    signer: OAuthSigner,
    base_url: String,
    user: OnceCell<XUser>,
}

impl XRetweeter {
    pub fn new(credentials: &XCredentials) -> Result<Self, ApiError> {
        Self::with_base_url(
            credentials,
            DEFAULT_BASE_URL.to_string(),
            Duration::from_secs(30),
        )
    }

    pub fn with_base_url(
        credentials: &XCredentials,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client(timeout)?,
            signer: OAuthSigner::new(credentials),
            base_url: base_url.trim_end_matches('/').to_string(),
            user: OnceCell::new(),
        })
    }

    /// Resolve the authenticated account, checking the credentials
    pub async fn verify(&self) -> Result<XUser, ApiError> {
        self.user
            .get_or_try_init(|| self.fetch_me())
            .await
            .cloned()
    }

    async fn fetch_me(&self) -> Result<XUser, ApiError> {
        let url = format!("{}/2/users/me", self.base_url);
        let authorization = self
            .signer
            .sign("GET", &url, &[])
            .map_err(|e| ApiError::Auth(e.to_string()))?;

        let response = self
            .client
            .get(&url)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let response = check_response(response, "Failed to look up bot account").await?;

        let me: MeResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Api(format!("Invalid user response: {}", e)))?;

        tracing::info!(user_id = %me.data.id, username = %me.data.username, "Authenticated as bot account");
        Ok(me.data)
    }
}

#[derive(Deserialize)]
struct MeResponse {
    data: XUser,
}

#[derive(Serialize)]
struct RetweetRequest<'a> {
    tweet_id: &'a str,
}

#[derive(Deserialize)]
struct RetweetResponse {
    data: RetweetData,
}

#[derive(Deserialize)]
struct RetweetData {
    retweeted: bool,
}

#[async_trait]
impl Retweeter for XRetweeter {
    async fn retweet(&self, tweet_id: &TweetId) -> Result<(), ApiError> {
        let user = self.verify().await?;

        let url = format!("{}/2/users/{}/retweets", self.base_url, user.id);
        let authorization = self
            .signer
            .sign("POST", &url, &[])
            .map_err(|e| ApiError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&url)
            .header("Authorization", authorization)
            .json(&RetweetRequest {
                tweet_id: tweet_id.as_str(),
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let response = check_response(response, "Retweet failed").await?;

        let body: RetweetResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Api(format!("Invalid retweet response: {}", e)))?;

        if !body.data.retweeted {
            return Err(ApiError::Api(format!(
                "Tweet {} was not retweeted",
                tweet_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> XCredentials {
        let secret = |value: &str| SecretString::new(value.into());
        XCredentials {
            api_key: secret("key"),
            api_secret: secret("secret"),
            access_token: secret("token"),
            access_secret: secret("token-secret"),
            bearer_token: secret("bearer"),
        }
    }

    fn retweeter(server: &MockServer) -> XRetweeter {
        XRetweeter::with_base_url(&credentials(), server.uri(), Duration::from_secs(5)).unwrap()
    }

    async fn mount_me(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/2/users/me"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"id": "42", "username": "bot", "name": "Bot"}
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_retweet_success() {
        let mock_server = MockServer::start().await;
        mount_me(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/2/users/42/retweets"))
            .and(header_exists("Authorization"))
            .and(body_json(serde_json::json!({"tweet_id": "1001"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"retweeted": true}
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let retweeter = retweeter(&mock_server);

        retweeter.retweet(&TweetId::new("1001")).await.unwrap();
        retweeter.retweet(&TweetId::new("1001")).await.unwrap();
    }

    #[tokio::test]
    async fn test_retweet_not_applied_is_failure() {
        let mock_server = MockServer::start().await;
        mount_me(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/2/users/42/retweets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"retweeted": false}
            })))
            .mount(&mock_server)
            .await;

        let result = retweeter(&mock_server).retweet(&TweetId::new("1001")).await;

        assert!(matches!(result, Err(ApiError::Api(_))));
    }

    #[tokio::test]
    async fn test_retweet_forbidden() {
        let mock_server = MockServer::start().await;
        mount_me(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/2/users/42/retweets"))
            .respond_with(ResponseTemplate::new(403).set_body_string("protected"))
            .mount(&mock_server)
            .await;

        let result = retweeter(&mock_server).retweet(&TweetId::new("1001")).await;

        match result {
            Err(ApiError::Api(message)) => assert!(message.contains("protected")),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_verify_with_bad_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let result = retweeter(&mock_server).verify().await;

        assert!(matches!(result, Err(ApiError::Auth(_))));
    }

    #[tokio::test]
    async fn test_verify_returns_account() {
        let mock_server = MockServer::start().await;
        mount_me(&mock_server).await;

        let user = retweeter(&mock_server).verify().await.unwrap();

        assert_eq!(
            user,
            XUser {
                id: "42".to_string(),
                username: "bot".to_string()
            }
        );
    }
}
