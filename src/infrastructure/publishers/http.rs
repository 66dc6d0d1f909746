#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::PublishReceipt;
use crate::domain::models::PublishRequest;
use crate::domain::models::Publisher;
use crate::domain::models::PublisherName;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ShareResponse {
    id: String,
}

/// Shares apps through the same service that generates them, which hands
/// back an id the app can be viewed under.
pub struct HttpPublisher {
    url: String,
}

impl Default for HttpPublisher {
    fn default() -> HttpPublisher {
        return HttpPublisher {
            url: Config::get(ConfigKey::PublishURL),
        };
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    fn name(&self) -> PublisherName {
        return PublisherName::Http;
    }

    #[allow(clippy::implicit_return)]
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt> {
        if self.url.is_empty() {
            bail!("Publish URL is not defined");
        }

        let url = self.url.trim_end_matches('/');
        let res = reqwest::Client::new()
            .post(format!("{url}/api/share"))
            .json(request)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to share app");
            bail!(format!("Share request failed with status {}", res.status().as_u16()));
        }

        let share = res.json::<ShareResponse>().await?;
        if share.id.is_empty() {
            bail!("Share response did not include an id");
        }

        return Ok(PublishReceipt {
            url: format!("{url}/share/{}", share.id),
            id: share.id,
        });
    }
}
