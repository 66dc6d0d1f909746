use super::GenerationTicket;
use super::PublishRequest;

pub enum Action {
    BackendAbort(),
    BackendRequest(GenerationTicket),
    ModelList(),
    Publish(PublishRequest),
}
