//! HTTP model invoker
//!
//! Posts each prompt to the model's configured endpoint and normalizes the
//! reply through its [`ResponseShape`]. The per-invocation timeout is
//! enforced by the client; a model without an endpoint is unavailable.

use super::{EndpointTable, ModelEndpoint};
use async_trait::async_trait;
use parley_application::ports::model_invoker::{
    Completion, InvocationError, InvocationRequest, ModelInvoker,
};
use parley_domain::Model;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default per-invocation timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub struct HttpModelInvoker {
    client: Client,
    endpoints: EndpointTable,
    timeout: Duration,
}

impl HttpModelInvoker {
    pub fn new(endpoints: EndpointTable, timeout: Duration) -> Result<Self, InvocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InvocationError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoints,
            timeout,
        })
    }

    pub fn with_default_timeout(endpoints: EndpointTable) -> Result<Self, InvocationError> {
        Self::new(endpoints, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn post(&self, endpoint: &ModelEndpoint, body: &Value) -> Result<Value, InvocationError> {
        let response = self
            .client
            .post(&endpoint.url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(endpoint, e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(endpoint, e))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(InvocationError::ModelUnavailable(format!(
                "{} returned 404",
                endpoint.url
            )));
        }
        if !status.is_success() {
            return Err(InvocationError::RequestFailed(format!(
                "HTTP {} from {}",
                status, endpoint.url
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| InvocationError::MalformedResponse(format!("invalid JSON: {}", e)))
    }

    fn classify(&self, endpoint: &ModelEndpoint, error: reqwest::Error) -> InvocationError {
        if error.is_timeout() {
            InvocationError::Timeout(self.timeout.as_secs())
        } else if error.is_connect() {
            InvocationError::ModelUnavailable(format!(
                "Failed to connect to {}: {}",
                endpoint.url, error
            ))
        } else {
            InvocationError::RequestFailed(error.to_string())
        }
    }
}

#[async_trait]
impl ModelInvoker for HttpModelInvoker {
    #[instrument(skip(self, request), fields(model = %model))]
    async fn invoke(
        &self,
        model: &Model,
        request: &InvocationRequest,
    ) -> Result<Completion, InvocationError> {
        let endpoint = self.endpoints.get(model).ok_or_else(|| {
            InvocationError::ModelUnavailable(format!("no endpoint configured for {}", model))
        })?;

        debug!("Posting {} byte prompt to {}", request.prompt.len(), endpoint.url);
        let body = endpoint.shape.request_body(model, request);
        let response = self.post(endpoint, &body).await?;
        endpoint.shape.normalize(&response)
    }
}
