#[cfg(test)]
#[path = "headless_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use super::cli::GenerateArgs;
use crate::domain::models::Action;
use crate::domain::models::DraftConfig;
use crate::domain::models::Event;
use crate::domain::models::GenerationTicket;
use crate::domain::models::Loading;
use crate::domain::models::PublishReceipt;
use crate::domain::models::PublishRequest;
use crate::domain::models::ToastKind;
use crate::domain::services::GenerationSession;

/// Drives a session from the command line. Progress goes to stderr, the code
/// of the final generation goes to `out` unless a file was asked for.
struct Headless<'a, W> {
    session: GenerationSession,
    tx: mpsc::UnboundedSender<Action>,
    rx: &'a mut mpsc::UnboundedReceiver<Event>,
    out: &'a mut W,
}

impl<'a, W: AsyncWrite + Unpin> Headless<'a, W> {
    async fn next_event(&mut self) -> Result<Event> {
        match self.rx.recv().await {
            Some(event) => return Ok(event),
            None => bail!("The actions service stopped before the generation finished"),
        }
    }

    async fn generate(&mut self, ticket: GenerationTicket, echo: bool) -> Result<()> {
        eprintln!("{}", Loading::text(self.session.state()));
        self.tx.send(Action::BackendRequest(ticket))?;

        loop {
            match self.next_event().await? {
                Event::BackendResponse(msg) => {
                    if msg.done {
                        if self.session.complete(msg.generation)? {
                            if echo {
                                self.out.write_all(b"\n").await?;
                                self.out.flush().await?;
                            }
                            return Ok(());
                        }
                        continue;
                    }

                    if self.session.apply_delta(msg.generation, &msg.text)? && echo {
                        self.out.write_all(msg.text.as_bytes()).await?;
                        self.out.flush().await?;
                    }
                }
                Event::BackendFailed(failure) => {
                    if self.session.fail(failure.generation) {
                        bail!(failure.error);
                    }
                }
                _ => {}
            }
        }
    }

    async fn publish(&mut self, request: PublishRequest) -> Result<PublishReceipt> {
        self.tx.send(Action::Publish(request))?;

        loop {
            match self.next_event().await? {
                Event::PublishResponse(receipt) => return Ok(receipt),
                Event::Toast(toast) if toast.kind == ToastKind::Error => bail!(toast.text),
                _ => {}
            }
        }
    }
}

/// Builds the app from `args.prompt`, then applies every revision in order
/// through the same session the UI uses.
pub async fn start<W: AsyncWrite + Unpin>(
    args: GenerateArgs,
    draft: DraftConfig,
    tx: mpsc::UnboundedSender<Action>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
    out: &mut W,
) -> Result<()> {
    let mut headless = Headless {
        session: GenerationSession::default(),
        tx,
        rx,
        out,
    };

    let stream_last = args.output.is_none();
    let ticket = headless.session.start(&args.prompt, &draft)?;
    headless
        .generate(ticket, stream_last && args.revisions.is_empty())
        .await?;

    for (idx, instruction) in args.revisions.iter().enumerate() {
        let ticket = headless.session.revise(instruction)?;
        let is_last = idx == args.revisions.len() - 1;
        headless.generate(ticket, stream_last && is_last).await?;
    }

    if let Some(output) = &args.output {
        fs::write(output, headless.session.code()).await?;
        eprintln!("Wrote your app to {}", output.to_string_lossy());
    }

    if args.publish {
        let request = PublishRequest {
            code: headless.session.code().to_string(),
            model: headless
                .session
                .snapshot()
                .map(|snapshot| return snapshot.model().to_string())
                .unwrap_or_default(),
            prompt: args.prompt.to_string(),
        };
        let receipt = headless.publish(request).await?;
        eprintln!("Published! Your app is available at {}", receipt.url);
    }

    return Ok(());
}
