#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

use super::GenerationRequest;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumString, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Endpoint,
    OpenAI,
}

/// Incremental text fragments of one generation. The stream is lazy, finite
/// and can't be restarted. Reaching its end is the completion signal.
pub type CompletionStream = BoxStream<'static, Result<String>>;

pub struct BackendResponse {
    pub generation: u64,
    pub text: String,
    pub done: bool,
}

pub struct BackendFailure {
    pub generation: u64,
    pub error: String,
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify the backend is reachable and configured.
    async fn health_check(&self) -> Result<()>;

    /// Called by `/modellist` to show every model the backend can generate
    /// with.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Sends a generation request and hands back the response as a stream of
    /// text deltas.
    ///
    /// A non-success status or a response without a body fails here, before
    /// any delta is produced.
    async fn get_completion(&self, request: &GenerationRequest) -> Result<CompletionStream>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
