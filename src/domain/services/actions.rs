#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::generation::run_generation;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendFailure;
use crate::domain::models::Event;
use crate::domain::models::GenerationTicket;
use crate::domain::models::PublishRequest;
use crate::domain::models::PublisherBox;
use crate::domain::models::Toast;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /model (/m) [MODEL_NAME,MODEL_INDEX] - Selects the model for a new app. You can pass either the model name, or the index from /modellist
- /modellist (/ml) - Lists all available models from the backend.
- /quality [low,high] - Selects the generation quality for a new app.
- /shadcn [on,off] - Toggles whether a new app may use the shadcn/ui component library.
- /publish (/p) - Publishes the current code and prints where it can be found.
- /quit /exit (/q) - Exit Granola.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+End - Jump to the end and follow new code
- CTRL+P - Publish the current code.
- CTRL+C - Cancel the app being generated if in progress, otherwise exit.

REVISIONS:
Your first prompt creates the app. Everything you type after that is an instruction to change it. Revisions always use the model, quality and shadcn settings the app was created with, changing them only applies to a new app.
        "#;

    return text.trim().to_string();
}

async fn model_list(backend: &BackendBox, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    let models = backend.list_models().await?;

    let res = models
        .iter()
        .enumerate()
        .map(|(idx, model)| {
            let n = idx + 1;
            return format!("- ({n}) {model}");
        })
        .collect::<Vec<String>>();

    tx.send(Event::Toast(Toast::info(&res.join("\n"))))?;

    return Ok(());
}

async fn publish(
    publisher: &PublisherBox,
    request: PublishRequest,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match publisher.publish(&request).await {
        Ok(receipt) => {
            tracing::info!(publisher = %publisher.name(), id = %receipt.id, url = %receipt.url, "Published app");
            tx.send(Event::PublishResponse(receipt))?;
        }
        Err(err) => {
            tracing::error!(error = ?err, "Failed to publish app");
            tx.send(Event::Toast(Toast::error(&format!(
                "Failed to publish your app: {err}"
            ))))?;
        }
    }

    return Ok(());
}

fn worker_error(generation: u64, err: anyhow::Error, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    tracing::error!(generation, error = ?err, "Generation failed");
    tx.send(Event::BackendFailed(BackendFailure {
        generation,
        error: format!("The backend failed with the following error: {err}"),
    }))?;

    return Ok(());
}

pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        backend: BackendBox,
        publisher: PublisherBox,
        idle_timeout: Option<Duration>,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let backend = Arc::new(backend);
        let publisher = Arc::new(publisher);
        let mut in_flight: Option<CancellationToken> = None;

        while let Some(action) = rx.recv().await {
            let worker_tx = tx.clone();
            match action {
                Action::BackendAbort() => {
                    if let Some(cancel) = in_flight.take() {
                        cancel.cancel();
                    }
                }
                Action::BackendRequest(ticket) => {
                    if let Some(previous) = in_flight.replace(ticket.cancel.clone()) {
                        previous.cancel();
                    }

                    let worker_backend = Arc::clone(&backend);
                    tokio::spawn(async move {
                        return ActionsService::generate(
                            worker_backend,
                            ticket,
                            idle_timeout,
                            worker_tx,
                        )
                        .await;
                    });
                }
                Action::ModelList() => {
                    let worker_backend = Arc::clone(&backend);
                    tokio::spawn(async move {
                        if let Err(err) = model_list(&worker_backend, &worker_tx).await {
                            tracing::error!(error = ?err, "Failed to list models");
                            worker_tx.send(Event::Toast(Toast::error(&format!(
                                "Failed to list models: {err}"
                            ))))?;
                        }

                        return Ok::<(), anyhow::Error>(());
                    });
                }
                Action::Publish(request) => {
                    let worker_publisher = Arc::clone(&publisher);
                    tokio::spawn(async move {
                        return publish(&worker_publisher, request, &worker_tx).await;
                    });
                }
            }
        }

        return Ok(());
    }

    async fn generate(
        backend: Arc<BackendBox>,
        ticket: GenerationTicket,
        idle_timeout: Option<Duration>,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let generation = ticket.generation;
        let cancel = ticket.cancel.clone();

        let res = run_generation(&**backend, ticket, idle_timeout, &tx).await;
        if let Err(err) = res {
            if cancel.is_cancelled() {
                return Ok(());
            }
            worker_error(generation, err, &tx)?;
        }

        return Ok(());
    }
}
