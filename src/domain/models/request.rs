#[cfg(test)]
#[path = "request_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio_util::sync::CancellationToken;

use super::ConfigSnapshot;
use super::ConversationLog;
use super::DraftConfig;
use super::Message;
use super::Quality;

/// Where the settings and history of an outbound request come from.
pub enum RequestMode<'a> {
    /// A brand new session, using whatever the user currently has selected.
    Start { draft: &'a DraftConfig },
    /// A revision of an existing session, replaying its log and the code it
    /// produced last under the frozen settings.
    Revise {
        snapshot: &'a ConfigSnapshot,
        log: &'a ConversationLog,
        previous_code: &'a str,
    },
}

/// Body posted to the generation endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub quality: Quality,
    #[serde(rename = "shadcn")]
    pub use_component_library: bool,
    pub messages: Vec<Message>,
}

impl GenerationRequest {
    pub fn build(mode: RequestMode, text: &str) -> GenerationRequest {
        match mode {
            RequestMode::Start { draft } => {
                return GenerationRequest {
                    model: draft.model.to_string(),
                    quality: draft.quality,
                    use_component_library: draft.use_component_library,
                    messages: vec![Message::user(text)],
                };
            }
            RequestMode::Revise {
                snapshot,
                log,
                previous_code,
            } => {
                let mut messages = Vec::with_capacity(log.len() + 2);
                messages.extend_from_slice(log.messages());
                messages.push(Message::assistant(previous_code));
                messages.push(Message::user(text));

                return GenerationRequest {
                    model: snapshot.model().to_string(),
                    quality: snapshot.quality(),
                    use_component_library: snapshot.use_component_library(),
                    messages,
                };
            }
        }
    }
}

/// Everything a worker needs to run one generation: the id deltas are tagged
/// with, the payload, and the handle that stops the stream.
pub struct GenerationTicket {
    pub generation: u64,
    pub request: GenerationRequest,
    pub cancel: CancellationToken,
}
