use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::QueryMode,
    error::ErrorBody,
    protocol::{QueryAnswer, QueryRequest, QueryResponseBody},
};
use tracing::{debug, warn};

use crate::{config::ClientSettings, error::QueryFailure};

pub const MALFORMED_RESPONSE_MESSAGE: &str = "malformed response from query service";

/// The one outbound call a submission makes.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn send(&self, mode: QueryMode, request: &QueryRequest)
        -> Result<QueryAnswer, QueryFailure>;
}

pub struct HttpQueryTransport {
    http: Client,
    base_url: String,
}

impl HttpQueryTransport {
    /// `base_url` is used as given; run it through `normalize_base_url` first.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        let base_url = crate::config::normalize_base_url(&settings.api_base_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, mode: QueryMode) -> String {
        format!("{}{}", self.base_url, mode.endpoint_path())
    }
}

#[async_trait]
impl QueryTransport for HttpQueryTransport {
    async fn send(
        &self,
        mode: QueryMode,
        request: &QueryRequest,
    ) -> Result<QueryAnswer, QueryFailure> {
        let url = self.endpoint_url(mode);
        debug!(%url, %mode, "posting query");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| QueryFailure::Transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| QueryFailure::Transport(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.message().map(str::to_string));
            return Err(QueryFailure::Application {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = QueryResponseBody::from_slice(&body).map_err(|err| {
            warn!(%url, error = %err, "unparsable success body");
            QueryFailure::Malformed(MALFORMED_RESPONSE_MESSAGE.to_string())
        })?;
        Ok(parsed.into_answer())
    }
}
