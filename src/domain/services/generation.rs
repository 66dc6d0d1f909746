#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;

use std::future::Future;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;

use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendResponse;
use crate::domain::models::Event;
use crate::domain::models::GenerationTicket;

async fn within<T>(idle_timeout: Option<Duration>, fut: impl Future<Output = T>) -> Result<T> {
    let duration = match idle_timeout {
        Some(duration) => duration,
        None => return Ok(fut.await),
    };

    match time::timeout(duration, fut).await {
        Ok(res) => return Ok(res),
        Err(_) => bail!(BackendError::Timeout(duration)),
    }
}

/// Runs one generation to the end, forwarding each delta as a
/// `BackendResponse` and finishing with a single `done` response.
///
/// Cancelling the ticket stops the stream without emitting anything further.
/// `idle_timeout` bounds both the wait for the response and the gap between
/// two deltas.
pub async fn run_generation(
    backend: &(dyn Backend + Send + Sync),
    ticket: GenerationTicket,
    idle_timeout: Option<Duration>,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let generation = ticket.generation;
    let cancel = ticket.cancel;

    let mut stream = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(generation, "Generation cancelled before the response arrived");
            return Ok(());
        }
        res = within(idle_timeout, backend.get_completion(&ticket.request)) => res??,
    };

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(generation, "Generation cancelled mid stream");
                return Ok(());
            }
            next = within(idle_timeout, stream.next()) => next?,
        };

        match next {
            Some(delta) => {
                tx.send(Event::BackendResponse(BackendResponse {
                    generation,
                    text: delta?,
                    done: false,
                }))?;
            }
            None => {
                tx.send(Event::BackendResponse(BackendResponse {
                    generation,
                    text: "".to_string(),
                    done: true,
                }))?;

                return Ok(());
            }
        }
    }
}
