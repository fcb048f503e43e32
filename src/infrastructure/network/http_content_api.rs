use crate::application::ports::{ApiError, Connectivity, ContentApi};
use crate::domain::entities::{
    AiInfluencer, DashboardSnapshot, GenerateContentRequest, GeneratedContent, InfluencerDraft,
    PublishReceipt, PublishRequest,
};
use crate::domain::value_objects::ContentId;
use crate::shared::config::ApiConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const API_PREFIX: &str = "/api/v1";

#[derive(Serialize)]
struct GenerateBody<'a> {
    content_id: &'a ContentId,
    #[serde(flatten)]
    request: &'a GenerateContentRequest,
}

/// REST バックエンドへの HTTP アダプタ
pub struct HttpContentApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    connectivity: Option<Arc<dyn Connectivity>>,
}

impl HttpContentApi {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            connectivity: None,
        })
    }

    /// オフラインと分かっている間はリクエストを送らない
    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn ensure_online(&self) -> Result<(), ApiError> {
        match &self.connectivity {
            Some(connectivity) if !connectivity.is_online() => Err(ApiError::Offline),
            _ => Ok(()),
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        self.ensure_online()?;
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|err| classify_transport(&err))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("API responded with {status}: {body}");
        Err(classify_status(status, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn generate(
        &self,
        content_id: &ContentId,
        request: &GenerateContentRequest,
    ) -> Result<GeneratedContent, ApiError> {
        debug!("POST /content/generate content_id={content_id}");
        let body = GenerateBody {
            content_id,
            request,
        };
        self.send_json(self.client.post(self.url("/content/generate")).json(&body))
            .await
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ApiError> {
        let path = format!("/content/{}/publish", request.content_id);
        debug!("POST {path}");
        self.send_json(self.client.post(self.url(&path)).json(request))
            .await
    }

    async fn create_influencer(&self, draft: &InfluencerDraft) -> Result<AiInfluencer, ApiError> {
        debug!("POST /influencers id={}", draft.id);
        self.send_json(self.client.post(self.url("/influencers")).json(draft))
            .await
    }

    async fn delete_content(&self, content_id: &ContentId) -> Result<(), ApiError> {
        let path = format!("/content/offline-content/{content_id}");
        debug!("DELETE {path}");
        match self.send(self.client.delete(self.url(&path))).await {
            Ok(_) => Ok(()),
            // 既に消えている場合は成功扱い
            Err(ApiError::Rejected { status: 404, .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn fetch_dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        self.send_json(self.client.get(self.url("/analytics/dashboard")))
            .await
    }
}

fn classify_transport(err: &reqwest::Error) -> ApiError {
    if err.is_connect() {
        ApiError::Offline
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transient(err.to_string())
    }
}

fn classify_status(status: StatusCode, body: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            ApiError::Transient(format!("{status}: {body}"))
        }
        s if s.is_server_error() => ApiError::Transient(format!("{status}: {body}")),
        s => ApiError::Rejected {
            status: s.as_u16(),
            message: body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Platform;
    use crate::infrastructure::network::ConnectivityMonitor;

    fn config() -> ApiConfig {
        ApiConfig {
            base_url: "http://127.0.0.1:9/".into(),
            request_timeout: 1,
            auth_token: Some("token".into()),
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, String::new()),
            ApiError::Unauthorized(_)
        ));
        assert!(classify_status(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());

        let rejected = classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad prompt".into());
        assert_eq!(
            rejected,
            ApiError::Rejected {
                status: 422,
                message: "bad prompt".into()
            }
        );
        assert!(!rejected.is_transient());
    }

    #[test]
    fn test_url_joins_prefix_without_double_slash() {
        let api = HttpContentApi::new(&config()).unwrap();
        assert_eq!(
            api.url("/content/generate"),
            "http://127.0.0.1:9/api/v1/content/generate"
        );
    }

    #[test]
    fn test_generate_body_flattens_request() {
        let id = ContentId::new("c-9".into()).unwrap();
        let request = GenerateContentRequest::new("Spring launch teaser copy", vec![Platform::Tiktok]);
        let body = serde_json::to_value(GenerateBody {
            content_id: &id,
            request: &request,
        })
        .unwrap();
        assert_eq!(body["content_id"], "c-9");
        assert_eq!(body["platforms"][0], "tiktok");
        assert_eq!(body["variations_count"], 3);
    }

    #[tokio::test]
    async fn test_offline_short_circuits_before_request() {
        let monitor = Arc::new(ConnectivityMonitor::new(false));
        let api = HttpContentApi::new(&config())
            .unwrap()
            .with_connectivity(monitor);
        let result = api.fetch_dashboard().await;
        assert_eq!(result.unwrap_err(), ApiError::Offline);
    }
}
