#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use tokio_util::sync::CancellationToken;

use super::DeltaAccumulator;
use crate::domain::models::ConfigSnapshot;
use crate::domain::models::ConversationLog;
use crate::domain::models::DraftConfig;
use crate::domain::models::GenerationRequest;
use crate::domain::models::GenerationTicket;
use crate::domain::models::Message;
use crate::domain::models::RequestMode;
use crate::domain::models::SessionError;
use crate::domain::models::SessionState;

enum PendingCommit {
    Start {
        snapshot: ConfigSnapshot,
        prompt: String,
    },
    Revise {
        previous_code: Message,
        instruction: Message,
    },
}

struct PendingGeneration {
    generation: u64,
    prior_state: SessionState,
    prior_generation: u64,
    prior_code: String,
    commit: PendingCommit,
    cancel: CancellationToken,
}

/// Drives one generate, revise, revise... session.
///
/// The session exclusively owns the conversation log, the frozen config
/// snapshot and the code buffer. Callers get a [`GenerationTicket`] for every
/// accepted submission, run it against a backend, and feed the stream back
/// through [`GenerationSession::apply_delta`],
/// [`GenerationSession::complete`] or [`GenerationSession::fail`]. Nothing is
/// written to the log or snapshot until a stream completes.
#[derive(Default)]
pub struct GenerationSession {
    state: SessionState,
    snapshot: Option<ConfigSnapshot>,
    log: ConversationLog,
    accumulator: DeltaAccumulator,
    pending: Option<PendingGeneration>,
    last_generation: u64,
}

impl GenerationSession {
    pub fn state(&self) -> SessionState {
        return self.state;
    }

    pub fn is_loading(&self) -> bool {
        return self.state.is_loading();
    }

    pub fn snapshot(&self) -> Option<&ConfigSnapshot> {
        return self.snapshot.as_ref();
    }

    pub fn log(&self) -> &ConversationLog {
        return &self.log;
    }

    /// The code buffer, either still streaming or final.
    pub fn code(&self) -> &str {
        return self.accumulator.code();
    }

    /// Id of the generation currently in flight.
    pub fn in_flight(&self) -> Option<u64> {
        return self.pending.as_ref().map(|pending| return pending.generation);
    }

    pub fn start(
        &mut self,
        prompt: &str,
        draft: &DraftConfig,
    ) -> Result<GenerationTicket, SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyInput("Prompt"));
        }
        if self.is_loading() {
            return Err(SessionError::Busy);
        }
        if self.state != SessionState::Initial {
            return Err(SessionError::InvalidTransition {
                operation: "start a new app",
                state: self.state,
            });
        }

        let request = GenerationRequest::build(RequestMode::Start { draft }, prompt);
        let commit = PendingCommit::Start {
            snapshot: ConfigSnapshot::freeze(draft),
            prompt: prompt.to_string(),
        };

        return Ok(self.begin(SessionState::Creating, commit, request));
    }

    pub fn revise(&mut self, instruction: &str) -> Result<GenerationTicket, SessionError> {
        if instruction.trim().is_empty() {
            return Err(SessionError::EmptyInput("Instruction"));
        }
        if self.is_loading() {
            return Err(SessionError::Busy);
        }

        let snapshot = match &self.snapshot {
            Some(snapshot) if self.state.has_generated() => snapshot,
            _ => {
                return Err(SessionError::InvalidTransition {
                    operation: "revise the app",
                    state: self.state,
                });
            }
        };

        let previous_code = self.accumulator.code();
        let request = GenerationRequest::build(
            RequestMode::Revise {
                snapshot,
                log: &self.log,
                previous_code,
            },
            instruction,
        );
        let commit = PendingCommit::Revise {
            previous_code: Message::assistant(previous_code),
            instruction: Message::user(instruction),
        };

        return Ok(self.begin(SessionState::Updating, commit, request));
    }

    /// Appends a delta of the in-flight generation. Returns `false` when the
    /// delta belongs to a generation that is no longer current.
    pub fn apply_delta(&mut self, generation: u64, delta: &str) -> Result<bool, SessionError> {
        if self.in_flight() != Some(generation) {
            tracing::debug!(generation, "Dropping delta of a stale generation");
            return Ok(false);
        }

        self.accumulator.push(delta)?;
        return Ok(true);
    }

    /// Commits the in-flight generation. Returns `false` when `generation` is
    /// not the one in flight.
    pub fn complete(&mut self, generation: u64) -> Result<bool, SessionError> {
        if self.in_flight() != Some(generation) {
            tracing::debug!(generation, "Ignoring completion of a stale generation");
            return Ok(false);
        }

        self.accumulator.complete()?;
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return Ok(false),
        };

        match pending.commit {
            PendingCommit::Start { snapshot, prompt } => {
                self.snapshot = Some(snapshot);
                self.log = ConversationLog::seed(&prompt);
                self.state = SessionState::Created;
            }
            PendingCommit::Revise {
                previous_code,
                instruction,
            } => {
                self.log.append_revision(previous_code, instruction);
                self.state = SessionState::Updated;
            }
        }

        tracing::info!(
            generation,
            state = %self.state,
            deltas = self.accumulator.delta_count(),
            code_length = self.accumulator.code().len(),
            log_length = self.log.len(),
            "Generation committed"
        );

        return Ok(true);
    }

    /// Abandons the in-flight generation after a transport failure, putting
    /// the session back where it was before the submission so the same step
    /// can be retried.
    pub fn fail(&mut self, generation: u64) -> bool {
        if self.in_flight() != Some(generation) {
            return false;
        }

        tracing::warn!(generation, "Generation failed, reverting");
        return self.revert();
    }

    /// Cancels the in-flight generation, if any, and reverts like
    /// [`GenerationSession::fail`].
    pub fn cancel(&mut self) -> bool {
        if let Some(pending) = &self.pending {
            tracing::info!(generation = pending.generation, "Generation cancelled");
        }

        return self.revert();
    }

    fn begin(
        &mut self,
        next_state: SessionState,
        commit: PendingCommit,
        request: GenerationRequest,
    ) -> GenerationTicket {
        if let Some(previous) = self.pending.take() {
            previous.cancel.cancel();
        }

        self.last_generation += 1;
        let generation = self.last_generation;
        let cancel = CancellationToken::new();

        self.pending = Some(PendingGeneration {
            generation,
            prior_state: self.state,
            prior_generation: self.accumulator.generation(),
            prior_code: self.accumulator.code().to_string(),
            commit,
            cancel: cancel.clone(),
        });
        self.accumulator.attach(generation);
        self.state = next_state;

        tracing::debug!(
            generation,
            state = %self.state,
            model = %request.model,
            quality = %request.quality,
            messages = request.messages.len(),
            "Generation started"
        );

        return GenerationTicket {
            generation,
            request,
            cancel,
        };
    }

    fn revert(&mut self) -> bool {
        let pending = match self.pending.take() {
            Some(pending) => pending,
            None => return false,
        };

        pending.cancel.cancel();
        self.accumulator
            .restore(pending.prior_generation, pending.prior_code);
        self.state = pending.prior_state;

        return true;
    }
}
