use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;

use super::help_text;
use super::ActionsService;
use crate::domain::models::Action;
use crate::domain::models::Backend;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::CompletionStream;
use crate::domain::models::DraftConfig;
use crate::domain::models::Event;
use crate::domain::models::GenerationRequest;
use crate::domain::models::PublishReceipt;
use crate::domain::models::PublishRequest;
use crate::domain::models::Publisher;
use crate::domain::models::PublisherBox;
use crate::domain::models::PublisherName;
use crate::domain::models::ToastKind;
use crate::domain::services::GenerationSession;

struct EchoBackend {}

#[async_trait]
impl Backend for EchoBackend {
    fn name(&self) -> BackendName {
        return BackendName::Endpoint;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        return Ok(vec!["first".to_string(), "second".to_string()]);
    }

    /// Streams the last user message back word by word, stalling forever
    /// when asked to and failing when asked to.
    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, request: &GenerationRequest) -> Result<CompletionStream> {
        let text = request
            .messages
            .last()
            .map(|msg| return msg.content.to_string())
            .unwrap_or_default();
        if text == "fail" {
            bail!("Boom");
        }

        let words = text
            .split_inclusive(' ')
            .map(|e| return Ok(e.to_string()))
            .collect::<Vec<Result<String>>>();
        if text == "stall" {
            return Ok(stream::iter(words).chain(stream::pending()).boxed());
        }

        return Ok(stream::iter(words).boxed());
    }
}

struct FakePublisher {
    fail: bool,
}

#[async_trait]
impl Publisher for FakePublisher {
    fn name(&self) -> PublisherName {
        return PublisherName::File;
    }

    #[allow(clippy::implicit_return)]
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt> {
        if self.fail {
            bail!("Store is down");
        }

        return Ok(PublishReceipt {
            id: "abc-123".to_string(),
            url: format!("memory://{}", request.model),
        });
    }
}

fn spawn_service(fail_publish: bool) -> (mpsc::UnboundedSender<Action>, mpsc::UnboundedReceiver<Event>) {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let backend: BackendBox = Box::new(EchoBackend {});
    let publisher: PublisherBox = Box::new(FakePublisher { fail: fail_publish });

    tokio::spawn(async move {
        return ActionsService::start(
            backend,
            publisher,
            Some(Duration::from_secs(5)),
            event_tx,
            &mut action_rx,
        )
        .await;
    });

    return (action_tx, event_rx);
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Result<Event> {
    match time::timeout(Duration::from_secs(5), rx.recv()).await? {
        Some(event) => return Ok(event),
        None => bail!("Event channel closed"),
    }
}

/// Feeds events into the session until the generation settles.
async fn settle(session: &mut GenerationSession, rx: &mut mpsc::UnboundedReceiver<Event>) -> Result<()> {
    loop {
        match next_event(rx).await? {
            Event::BackendResponse(msg) => {
                if msg.done {
                    session.complete(msg.generation)?;
                    return Ok(());
                }
                session.apply_delta(msg.generation, &msg.text)?;
            }
            Event::BackendFailed(failure) => {
                session.fail(failure.generation);
                return Ok(());
            }
            _ => bail!("Unexpected event"),
        }
    }
}

#[test]
fn it_describes_revisions_in_help() {
    assert!(help_text().contains("/quality"));
    assert!(help_text().contains("Revisions always use"));
}

#[tokio::test]
async fn it_streams_a_generation_into_the_session() -> Result<()> {
    let (tx, mut rx) = spawn_service(false);
    let mut session = GenerationSession::default();

    let ticket = session.start("a small todo app", &DraftConfig::default())?;
    tx.send(Action::BackendRequest(ticket))?;
    settle(&mut session, &mut rx).await?;

    assert_eq!(session.code(), "a small todo app");
    assert_eq!(session.log().len(), 1);

    let ticket = session.revise("add dark mode")?;
    tx.send(Action::BackendRequest(ticket))?;
    settle(&mut session, &mut rx).await?;

    assert_eq!(session.code(), "add dark mode");
    assert_eq!(session.log().len(), 3);

    return Ok(());
}

#[tokio::test]
async fn it_reports_backend_failures() -> Result<()> {
    let (tx, mut rx) = spawn_service(false);
    let mut session = GenerationSession::default();

    let ticket = session.start("fail", &DraftConfig::default())?;
    let generation = ticket.generation;
    tx.send(Action::BackendRequest(ticket))?;

    match next_event(&mut rx).await? {
        Event::BackendFailed(failure) => {
            assert_eq!(failure.generation, generation);
            assert!(failure.error.contains("Boom"));
            assert!(session.fail(failure.generation));
        }
        _ => bail!("Wrong event"),
    }
    assert!(session.log().is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_aborts_in_flight_generations() -> Result<()> {
    let (tx, mut rx) = spawn_service(false);
    let mut session = GenerationSession::default();

    let ticket = session.start("stall", &DraftConfig::default())?;
    tx.send(Action::BackendRequest(ticket))?;
    match next_event(&mut rx).await? {
        Event::BackendResponse(msg) => assert_eq!(msg.text, "stall"),
        _ => bail!("Wrong event"),
    }

    tx.send(Action::BackendAbort())?;
    session.cancel();
    time::sleep(Duration::from_millis(50)).await;

    assert!(rx.try_recv().is_err());

    return Ok(());
}

#[tokio::test]
async fn it_lists_models() -> Result<()> {
    let (tx, mut rx) = spawn_service(false);
    tx.send(Action::ModelList())?;

    match next_event(&mut rx).await? {
        Event::Toast(toast) => {
            assert_eq!(toast.kind, ToastKind::Info);
            insta::assert_snapshot!(toast.text, @r###"
            - (1) first
            - (2) second
            "###);
        }
        _ => bail!("Wrong event"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_publishes() -> Result<()> {
    let (tx, mut rx) = spawn_service(false);
    tx.send(Action::Publish(PublishRequest {
        code: "code".to_string(),
        model: "first".to_string(),
        prompt: "Build a todo app".to_string(),
    }))?;

    match next_event(&mut rx).await? {
        Event::PublishResponse(receipt) => {
            assert_eq!(receipt.id, "abc-123");
            assert_eq!(receipt.url, "memory://first");
        }
        _ => bail!("Wrong event"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_reports_publish_failures_as_toasts() -> Result<()> {
    let (tx, mut rx) = spawn_service(true);
    tx.send(Action::Publish(PublishRequest {
        code: "code".to_string(),
        model: "first".to_string(),
        prompt: "Build a todo app".to_string(),
    }))?;

    match next_event(&mut rx).await? {
        Event::Toast(toast) => {
            assert_eq!(toast.kind, ToastKind::Error);
            assert_eq!(toast.text, "Failed to publish your app: Store is down");
        }
        _ => bail!("Wrong event"),
    }

    return Ok(());
}
