#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use std::str::FromStr;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::actions::help_text;
use super::CodeView;
use super::GenerationSession;
use super::Scroll;
use super::Themes;
use crate::domain::models::parse_toggle;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendFailure;
use crate::domain::models::BackendResponse;
use crate::domain::models::DraftConfig;
use crate::domain::models::PublishReceipt;
use crate::domain::models::PublishRequest;
use crate::domain::models::Quality;
use crate::domain::models::SlashCommand;
use crate::domain::models::Toast;
use crate::domain::models::MODEL_CATALOG;

pub struct AppState {
    pub session: GenerationSession,
    pub draft: DraftConfig,
    pub code_view: CodeView,
    pub scroll: Scroll,
    pub toast: Option<Toast>,
    pub last_known_height: u16,
    pub last_known_width: u16,
    submitted: Option<String>,
    restorable_input: Option<String>,
}

impl AppState {
    pub fn new(draft: DraftConfig, theme_name: &str, theme_file: &str) -> Result<AppState> {
        let theme = Themes::load(theme_name, theme_file)?;

        return Ok(AppState {
            session: GenerationSession::default(),
            draft,
            code_view: CodeView::new(theme, "tsx"),
            scroll: Scroll::default(),
            toast: Some(Toast::info(
                "What would you like to build? Type /help for commands.",
            )),
            last_known_height: 0,
            last_known_width: 0,
            submitted: None,
            restorable_input: None,
        });
    }

    pub async fn check_backend(&mut self, backend: &BackendBox) {
        if let Err(err) = backend.health_check().await {
            tracing::warn!(error = ?err, backend = %backend.name(), "Backend health check failed");
            self.toast = Some(Toast::error(&format!(
                "Backend {} isn't reachable, generating will likely fail. Error: {err}",
                backend.name()
            )));
        }
    }

    pub fn input_title(&self) -> &'static str {
        if self.session.state().has_generated() {
            return "Make changes to your app";
        }

        return "Describe your app";
    }

    /// One line summary of the session, showing the frozen settings once
    /// they exist and the draft ones before that.
    pub fn status_line(&self) -> String {
        let state = self.session.state();
        if let Some(snapshot) = self.session.snapshot() {
            return format!(
                "{state} | model: {} | quality: {} | shadcn: {}",
                snapshot.model(),
                snapshot.quality(),
                on_off(snapshot.use_component_library())
            );
        }

        return format!(
            "{state} | model: {} | quality: {} | shadcn: {}",
            self.draft.model,
            self.draft.quality,
            on_off(self.draft.use_component_library)
        );
    }

    fn draft_notice(&self, change: &str) -> Toast {
        if let Some(snapshot) = self.session.snapshot() {
            return Toast::info(&format!(
                "{change}. This app keeps being revised with {}, the setting applies to new apps only.",
                snapshot.model()
            ));
        }

        return Toast::info(&format!("{change}."));
    }

    fn set_model(&mut self, command: &SlashCommand) {
        let model_name = match command.first_arg() {
            Some(name) => name.to_string(),
            None => {
                self.toast = Some(Toast::error(
                    "You must specify a model name with `/model` or `/m`. Run `/help` for more details.",
                ));
                return;
            }
        };

        let mut model = model_name.to_string();
        if let Ok(idx) = model_name.parse::<usize>() {
            if idx < 1 || idx > MODEL_CATALOG.len() {
                self.toast = Some(Toast::error(&format!(
                    "{idx} is not a valid index from the model list."
                )));
                return;
            }
            model = MODEL_CATALOG[idx - 1].to_string();
        }

        self.draft.model = model.to_string();
        self.toast = Some(self.draft_notice(&format!("Model set to {model}")));
    }

    fn set_quality(&mut self, command: &SlashCommand) {
        match command.first_arg().map(Quality::from_str) {
            Some(Ok(quality)) => {
                self.draft.quality = quality;
                self.toast = Some(self.draft_notice(&format!("Quality set to {quality}")));
            }
            _ => {
                self.toast = Some(Toast::error("Quality must be either `low` or `high`."));
            }
        }
    }

    fn set_component_library(&mut self, command: &SlashCommand) {
        match command.first_arg().and_then(parse_toggle) {
            Some(enabled) => {
                self.draft.use_component_library = enabled;
                self.toast = Some(
                    self.draft_notice(&format!("shadcn/ui components {}", on_off(enabled))),
                );
            }
            None => {
                self.toast = Some(Toast::error("Use `/shadcn on` or `/shadcn off`."));
            }
        }
    }

    /// Returns `(should_break, should_continue)`.
    pub fn handle_slash_commands(
        &mut self,
        input: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<(bool, bool)> {
        let command = match SlashCommand::parse(input) {
            Some(command) => command,
            None => return Ok((false, false)),
        };

        if command.is_quit() {
            return Ok((true, false));
        }

        if command.is_help() {
            self.toast = Some(Toast::info(&help_text()));
        } else if command.is_model_list() {
            tx.send(Action::ModelList())?;
        } else if command.is_model_set() {
            self.set_model(&command);
        } else if command.is_quality_set() {
            self.set_quality(&command);
        } else if command.is_component_library_set() {
            self.set_component_library(&command);
        } else if command.is_publish() {
            self.publish(tx)?;
        }

        return Ok((false, true));
    }

    /// Handles whatever was typed in the input box. Returns true when the
    /// application should exit.
    pub fn submit(&mut self, input: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<bool> {
        if input.trim().is_empty() {
            return Ok(false);
        }

        let (should_break, should_continue) = self.handle_slash_commands(input, tx)?;
        if should_break || should_continue {
            return Ok(should_break);
        }

        let res = if self.session.state().has_generated() {
            self.session.revise(input)
        } else {
            self.session.start(input, &self.draft)
        };

        match res {
            Ok(ticket) => {
                self.toast = None;
                self.submitted = Some(input.to_string());
                self.restorable_input = None;
                tx.send(Action::BackendRequest(ticket))?;
                self.scroll.last();
                self.sync_dependants();
            }
            Err(err) => {
                self.toast = Some(Toast::error(&err.to_string()));
            }
        }

        return Ok(false);
    }

    /// Cancels the generation in flight. Returns false when nothing was
    /// running.
    pub fn abort(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<bool> {
        if !self.session.cancel() {
            return Ok(false);
        }

        tx.send(Action::BackendAbort())?;
        self.restorable_input = self.submitted.take();
        self.toast = Some(Toast::info("Cancelled. Your previous code is back."));
        self.sync_dependants();

        return Ok(true);
    }

    pub fn publish(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        if self.session.is_loading() {
            self.toast = Some(Toast::error(
                "Wait for your app to finish generating before publishing it.",
            ));
            return Ok(());
        }

        let snapshot = match self.session.snapshot() {
            Some(snapshot) if !self.session.code().is_empty() => snapshot,
            _ => {
                self.toast = Some(Toast::error("There's no app to publish yet."));
                return Ok(());
            }
        };

        tx.send(Action::Publish(PublishRequest {
            code: self.session.code().to_string(),
            model: snapshot.model().to_string(),
            prompt: self
                .session
                .log()
                .first_prompt()
                .unwrap_or_default()
                .to_string(),
        }))?;
        self.toast = Some(Toast::info("Publishing..."));

        return Ok(());
    }

    pub fn handle_backend_response(&mut self, msg: BackendResponse) {
        let res = if msg.done {
            self.session.complete(msg.generation)
        } else {
            self.session.apply_delta(msg.generation, &msg.text)
        };

        match res {
            Ok(true) if msg.done => {
                self.submitted = None;
                self.toast = Some(Toast::info(
                    "Done! Type what you'd like to change, or press CTRL+P to publish.",
                ));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(generation = msg.generation, error = ?err, "Dropped backend response");
            }
        }

        self.sync_dependants();
    }

    pub fn handle_backend_failure(&mut self, failure: BackendFailure) {
        if self.session.fail(failure.generation) {
            self.restorable_input = self.submitted.take();
            self.toast = Some(Toast::error(&failure.error));
            self.sync_dependants();
        }
    }

    /// The prompt of a generation that failed or was cancelled, handed back
    /// once so the input box can be refilled.
    pub fn take_restorable_input(&mut self) -> Option<String> {
        return self.restorable_input.take();
    }

    pub fn handle_publish_response(&mut self, receipt: PublishReceipt) {
        self.toast = Some(Toast::info(&format!(
            "Published! Your app is available at {}",
            receipt.url
        )));
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    fn sync_dependants(&mut self) {
        if let Err(err) = self.code_view.sync(self.session.code()) {
            tracing::warn!(error = ?err, "Failed to highlight code");
        }

        let length = u16::try_from(self.code_view.len()).unwrap_or(u16::MAX);
        self.scroll
            .set_state(length, self.last_known_height.saturating_sub(2));
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        return "on";
    }

    return "off";
}
