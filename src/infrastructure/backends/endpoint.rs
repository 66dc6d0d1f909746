#[cfg(test)]
#[path = "endpoint_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use super::into_completion_stream;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::CompletionStream;
use crate::domain::models::GenerationRequest;
use crate::domain::models::MODEL_CATALOG;

/// The app generation service, which picks its own system prompt from the
/// quality and shadcn flags and streams back chat completion chunks.
pub struct Endpoint {
    url: String,
    timeout: String,
}

impl Default for Endpoint {
    fn default() -> Endpoint {
        return Endpoint {
            url: Config::get(ConfigKey::EndpointURL),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for Endpoint {
    fn name(&self) -> BackendName {
        return BackendName::Endpoint;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Endpoint URL is not defined");
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let status = match res {
            Ok(res) => res.status().as_u16(),
            Err(err) => {
                tracing::error!(error = ?err, "Endpoint is not reachable");
                bail!("Endpoint is not reachable");
            }
        };

        if status >= 500 {
            tracing::error!(status = status, "Endpoint health check failed");
            bail!("Endpoint health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        return Ok(MODEL_CATALOG
            .iter()
            .map(|model| return model.to_string())
            .collect());
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, request: &GenerationRequest) -> Result<CompletionStream> {
        let res = reqwest::Client::new()
            .post(format!("{url}/api/generateCode", url = self.url))
            .json(request)
            .send()
            .await?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            tracing::error!(status = status, "Failed to make generation request");
            bail!(BackendError::Status { status });
        }

        if status == 204 || res.content_length() == Some(0) {
            tracing::error!(status = status, "Generation response had no body");
            bail!(BackendError::EmptyBody);
        }

        return Ok(into_completion_stream(res));
    }
}
