use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{GraphError, GraphResult};
use crate::models::{
    GroupDeltaPage, ODataErrorResponse, Subscription, SubscriptionRequest, UserProfile,
};

const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
const TOKEN_EXPIRY_SKEW_SECS: i64 = 60;

/// Remote directory service operations consumed by the events service.
///
/// Implemented by [`GraphClient`] in production and by recording mocks in
/// tests; components receive it as an `Arc<dyn DirectoryClient>`.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Resolves an object by its relative resource URL (e.g. `groups/{id}`).
    async fn get_object(&self, relative_url: &str) -> GraphResult<serde_json::Value>;

    /// Fetches one page of a group delta query. `url` is either the initial
    /// relative query or an absolute nextLink/deltaLink cursor. Sends a
    /// minimal-representation preference.
    async fn delta_page(&self, url: &str) -> GraphResult<GroupDeltaPage>;

    /// Looks up a single user by id with field selection.
    async fn get_user(&self, id: &str, select: &[&str]) -> GraphResult<UserProfile>;

    /// Lists all subscriptions owned by this application.
    async fn list_subscriptions(&self) -> GraphResult<Vec<Subscription>>;

    /// Creates a subscription. `None` means the service accepted the call
    /// but returned no subscription body.
    async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> GraphResult<Option<Subscription>>;

    /// Extends a subscription's expiration via partial update.
    async fn update_subscription(&self, id: &str, expiration: DateTime<Utc>) -> GraphResult<()>;

    /// Deletes a subscription.
    async fn delete_subscription(&self, id: &str) -> GraphResult<()>;
}

/// Credentials for the OAuth2 client-credentials flow.
#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Microsoft Graph directory client.
///
/// Single-attempt semantics throughout: no retry or backoff, errors surface
/// to the caller on the first failure.
pub struct GraphClient {
    config: GraphClientConfig,
    http_client: reqwest::Client,
    token_cache: Arc<Mutex<Option<CachedToken>>>,
}

impl GraphClient {
    /// Creates a new Graph client.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are incomplete or the HTTP client
    /// cannot be created.
    pub fn new(config: GraphClientConfig) -> GraphResult<Self> {
        if config.tenant_id.is_empty() || config.client_id.is_empty() {
            return Err(GraphError::Config(
                "tenant_id and client_id are required".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GraphError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
            token_cache: Arc::new(Mutex::new(None)),
        })
    }

    /// Returns a cached access token, fetching a fresh one when missing or
    /// within the expiry skew.
    async fn get_access_token(&self) -> GraphResult<String> {
        let mut cache = self.token_cache.lock().await;

        if let Some(token) = cache.as_ref() {
            if token.expires_at - ChronoDuration::seconds(TOKEN_EXPIRY_SKEW_SECS) > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let token_url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.config.tenant_id
        );

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", "https://graph.microsoft.com/.default"),
            ("grant_type", "client_credentials"),
        ];

        let response = self.http_client.post(&token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Auth(format!(
                "token request failed with {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Auth(format!("failed to parse token response: {e}")))?;

        let cached = CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
        };
        *cache = Some(cached);

        Ok(token.access_token)
    }

    /// Joins a relative resource path onto the Graph base URL; absolute
    /// cursors (nextLink/deltaLink) pass through untouched.
    fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", GRAPH_BASE_URL, url.trim_start_matches('/'))
        }
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
        prefer_minimal: bool,
    ) -> GraphResult<reqwest::Response> {
        let token = self.get_access_token().await?;
        let absolute = self.absolute_url(url);
        debug!("Graph request: {} {}", method, absolute);

        let mut request = self
            .http_client
            .request(method, &absolute)
            .bearer_auth(&token);

        if prefer_minimal {
            request = request.header("Prefer", "return=minimal");
        }
        if let Some(b) = body {
            request = request.json(b);
        }

        Ok(request.send().await?)
    }

    /// Converts a non-success response into the error taxonomy. HTTP 404 and
    /// OData `ResourceNotFound` codes both become [`GraphError::NotFound`].
    async fn error_from_response(response: reqwest::Response) -> GraphError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(odata) = serde_json::from_str::<ODataErrorResponse>(&body) {
            return GraphError::from_odata(odata.error.code, odata.error.message);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return GraphError::NotFound(body);
        }
        GraphError::Api {
            code: status.to_string(),
            message: body,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, prefer_minimal: bool) -> GraphResult<T> {
        let response = self
            .send(reqwest::Method::GET, url, None, prefer_minimal)
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DirectoryClient for GraphClient {
    async fn get_object(&self, relative_url: &str) -> GraphResult<serde_json::Value> {
        self.get_json(relative_url, false).await
    }

    async fn delta_page(&self, url: &str) -> GraphResult<GroupDeltaPage> {
        self.get_json(url, true).await
    }

    async fn get_user(&self, id: &str, select: &[&str]) -> GraphResult<UserProfile> {
        let url = format!("users/{}?$select={}", id, select.join(","));
        self.get_json(&url, false).await
    }

    async fn list_subscriptions(&self) -> GraphResult<Vec<Subscription>> {
        #[derive(Deserialize)]
        struct SubscriptionPage {
            value: Vec<Subscription>,
        }
        let page: SubscriptionPage = self.get_json("subscriptions", false).await?;
        Ok(page.value)
    }

    async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> GraphResult<Option<Subscription>> {
        let body = serde_json::to_value(request)?;
        let response = self
            .send(reqwest::Method::POST, "subscriptions", Some(&body), false)
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn update_subscription(&self, id: &str, expiration: DateTime<Utc>) -> GraphResult<()> {
        let body = serde_json::json!({
            "expirationDateTime": expiration,
        });
        let url = format!("subscriptions/{id}");
        let response = self
            .send(reqwest::Method::PATCH, &url, Some(&body), false)
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }

    async fn delete_subscription(&self, id: &str) -> GraphResult<()> {
        let url = format!("subscriptions/{id}");
        let response = self.send(reqwest::Method::DELETE, &url, None, false).await?;

        // Usually 204 No Content
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }
}
