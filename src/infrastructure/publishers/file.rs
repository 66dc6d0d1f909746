#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::PublishReceipt;
use crate::domain::models::PublishRequest;
use crate::domain::models::Publisher;
use crate::domain::models::PublisherName;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedApp {
    pub version: String,
    pub id: String,
    pub timestamp: String,
    pub model: String,
    pub prompt: String,
    pub code: String,
}

/// Keeps published apps as YAML files on disk, for when there's no share
/// service to publish to.
pub struct FilePublisher {
    dir: path::PathBuf,
}

impl Default for FilePublisher {
    fn default() -> FilePublisher {
        return FilePublisher {
            dir: path::PathBuf::from(Config::get(ConfigKey::PublishDir)),
        };
    }
}

fn short_id() -> String {
    return uuid::Uuid::new_v4()
        .to_string()
        .split('-')
        .take(2)
        .collect::<Vec<&str>>()
        .join("-");
}

#[async_trait]
impl Publisher for FilePublisher {
    fn name(&self) -> PublisherName {
        return PublisherName::File;
    }

    #[allow(clippy::implicit_return)]
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt> {
        if self.dir.as_os_str().is_empty() {
            bail!("Publish directory is not defined");
        }

        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
        }

        let app = PublishedApp {
            version: "1".to_string(),
            id: short_id(),
            timestamp: chrono::Local::now().to_rfc3339(),
            model: request.model.to_string(),
            prompt: request.prompt.to_string(),
            code: request.code.to_string(),
        };

        let app_path = self.dir.join(format!("{}.yaml", app.id));
        fs::write(&app_path, serde_yaml::to_string(&app)?).await?;
        tracing::debug!(path = %app_path.display(), "Wrote published app");

        return Ok(PublishReceipt {
            id: app.id,
            url: format!("file://{}", app_path.to_string_lossy()),
        });
    }
}
