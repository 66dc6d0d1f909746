use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PublisherName {
    File,
    Http,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    #[serde(rename = "generatedCode")]
    pub code: String,
    pub model: String,
    pub prompt: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishReceipt {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait Publisher {
    fn name(&self) -> PublisherName;

    /// Stores the final code of a session somewhere shareable and returns
    /// where it can be found.
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt>;
}

pub type PublisherBox = Box<dyn Publisher + Send + Sync>;
