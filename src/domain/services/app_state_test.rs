use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::AppState;
use crate::domain::models::Action;
use crate::domain::models::BackendFailure;
use crate::domain::models::BackendResponse;
use crate::domain::models::DraftConfig;
use crate::domain::models::Message;
use crate::domain::models::PublishReceipt;
use crate::domain::models::Quality;
use crate::domain::models::SessionState;
use crate::domain::models::ToastKind;
use crate::domain::models::MODEL_CATALOG;

impl Default for AppState {
    fn default() -> AppState {
        let mut app_state = AppState::new(DraftConfig::default(), "base16-ocean.dark", "").unwrap();
        app_state.last_known_width = 100;
        app_state.last_known_height = 40;
        return app_state;
    }
}

fn respond(app_state: &mut AppState, generation: u64, deltas: &[&str]) {
    for delta in deltas {
        app_state.handle_backend_response(BackendResponse {
            generation,
            text: delta.to_string(),
            done: false,
        });
    }
    app_state.handle_backend_response(BackendResponse {
        generation,
        text: "".to_string(),
        done: true,
    });
}

fn next_request(rx: &mut mpsc::UnboundedReceiver<Action>) -> Result<(u64, Vec<Message>, String)> {
    match rx.try_recv()? {
        Action::BackendRequest(ticket) => {
            return Ok((
                ticket.generation,
                ticket.request.messages,
                ticket.request.model,
            ));
        }
        _ => bail!("Wrong enum"),
    }
}

fn created(tx: &mpsc::UnboundedSender<Action>, rx: &mut mpsc::UnboundedReceiver<Action>) -> Result<AppState> {
    let mut app_state = AppState::default();
    app_state.submit("Build a todo app", tx)?;
    let (generation, _, _) = next_request(rx)?;
    respond(&mut app_state, generation, &["export default ", "function App() {}\n"]);

    return Ok(app_state);
}

mod submit {
    use super::*;

    #[test]
    fn it_ignores_blank_input() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();

        assert!(!app_state.submit("  ", &tx)?);
        assert!(rx.try_recv().is_err());
        assert_eq!(app_state.session.state(), SessionState::Initial);

        return Ok(());
    }

    #[test]
    fn it_starts_with_the_draft() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        app_state.draft = DraftConfig::new("google/gemma-2-27b-it", Quality::High, false);

        app_state.submit("Build a todo app", &tx)?;
        let (_, messages, model) = next_request(&mut rx)?;

        assert_eq!(app_state.session.state(), SessionState::Creating);
        assert_eq!(messages, vec![Message::user("Build a todo app")]);
        assert_eq!(model, "google/gemma-2-27b-it");
        assert_eq!(app_state.input_title(), "Describe your app");

        return Ok(());
    }

    #[test]
    fn it_renders_deltas_as_they_arrive() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        app_state.submit("Build a todo app", &tx)?;
        let (generation, _, _) = next_request(&mut rx)?;

        app_state.handle_backend_response(BackendResponse {
            generation,
            text: "line one\nline".to_string(),
            done: false,
        });
        assert_eq!(app_state.session.code(), "line one\nline");
        assert_eq!(app_state.code_view.len(), 2);

        return Ok(());
    }

    #[test]
    fn it_revises_once_created() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = created(&tx, &mut rx)?;
        assert_eq!(app_state.session.state(), SessionState::Created);
        assert_eq!(app_state.input_title(), "Make changes to your app");

        app_state.submit("Add dark mode", &tx)?;
        let (_, messages, _) = next_request(&mut rx)?;

        assert_eq!(app_state.session.state(), SessionState::Updating);
        assert_eq!(
            messages,
            vec![
                Message::user("Build a todo app"),
                Message::assistant("export default function App() {}\n"),
                Message::user("Add dark mode"),
            ]
        );

        return Ok(());
    }

    #[test]
    fn it_refuses_submissions_while_loading() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        app_state.submit("Build a todo app", &tx)?;
        next_request(&mut rx)?;

        app_state.submit("Build another app", &tx)?;

        assert!(rx.try_recv().is_err());
        let toast = app_state.toast.clone().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.text.contains("still being generated"));

        return Ok(());
    }

    #[test]
    fn it_reverts_on_backend_failure() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = created(&tx, &mut rx)?;
        app_state.submit("Add dark mode", &tx)?;
        let (generation, _, _) = next_request(&mut rx)?;

        app_state.handle_backend_failure(BackendFailure {
            generation,
            error: "The backend failed with the following error: status 500".to_string(),
        });

        assert_eq!(app_state.session.state(), SessionState::Created);
        assert_eq!(app_state.session.log().len(), 1);
        assert_eq!(app_state.session.code(), "export default function App() {}\n");
        assert_eq!(app_state.toast.clone().unwrap().kind, ToastKind::Error);
        assert_eq!(
            app_state.take_restorable_input(),
            Some("Add dark mode".to_string())
        );
        assert_eq!(app_state.take_restorable_input(), None);

        return Ok(());
    }

    #[test]
    fn it_gives_back_the_first_prompt_when_creation_fails() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        app_state.submit("Build a todo app", &tx)?;
        let (generation, _, _) = next_request(&mut rx)?;

        app_state.handle_backend_failure(BackendFailure {
            generation: generation + 1,
            error: "stale".to_string(),
        });
        assert_eq!(app_state.take_restorable_input(), None);

        app_state.handle_backend_failure(BackendFailure {
            generation,
            error: "The backend timed out".to_string(),
        });
        assert_eq!(app_state.session.state(), SessionState::Initial);
        assert_eq!(
            app_state.take_restorable_input(),
            Some("Build a todo app".to_string())
        );

        return Ok(());
    }

    #[test]
    fn it_forgets_prompts_that_completed() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = created(&tx, &mut rx)?;

        assert_eq!(app_state.take_restorable_input(), None);
        assert!(!app_state.abort(&tx)?);
        assert_eq!(app_state.take_restorable_input(), None);

        return Ok(());
    }

    #[test]
    fn it_aborts_in_flight_generations() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = created(&tx, &mut rx)?;
        app_state.submit("Add dark mode", &tx)?;
        next_request(&mut rx)?;

        assert!(app_state.abort(&tx)?);
        match rx.try_recv()? {
            Action::BackendAbort() => {}
            _ => bail!("Wrong enum"),
        }
        assert_eq!(app_state.session.state(), SessionState::Created);
        assert_eq!(
            app_state.take_restorable_input(),
            Some("Add dark mode".to_string())
        );
        assert!(!app_state.abort(&tx)?);

        return Ok(());
    }
}

mod handle_slash_commands {
    use super::*;

    #[test]
    fn it_breaks_on_quit() -> Result<()> {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        let (should_break, should_continue) = app_state.handle_slash_commands("/q", &tx)?;

        assert!(should_break);
        assert!(!should_continue);

        return Ok(());
    }

    #[test]
    fn it_passes_through_prompts() -> Result<()> {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        let (should_break, should_continue) =
            app_state.handle_slash_commands("Build a todo app", &tx)?;

        assert!(!should_break);
        assert!(!should_continue);

        return Ok(());
    }

    #[test]
    fn it_shows_help() -> Result<()> {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        app_state.handle_slash_commands("/help", &tx)?;

        assert!(app_state.toast.clone().unwrap().text.starts_with("COMMANDS:"));

        return Ok(());
    }

    #[test]
    fn it_requests_the_model_list() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        app_state.handle_slash_commands("/ml", &tx)?;

        match rx.try_recv()? {
            Action::ModelList() => {}
            _ => bail!("Wrong enum"),
        }

        return Ok(());
    }

    #[test]
    fn it_sets_the_model_by_name_and_index() -> Result<()> {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();

        app_state.handle_slash_commands("/model custom/model", &tx)?;
        assert_eq!(app_state.draft.model, "custom/model");

        app_state.handle_slash_commands("/m 3", &tx)?;
        assert_eq!(app_state.draft.model, MODEL_CATALOG[2]);

        app_state.handle_slash_commands("/m 99", &tx)?;
        assert_eq!(app_state.draft.model, MODEL_CATALOG[2]);
        insta::assert_snapshot!(app_state.toast.clone().unwrap().text, @"99 is not a valid index from the model list.");

        return Ok(());
    }

    #[test]
    fn it_sets_quality_and_shadcn() -> Result<()> {
        let (tx, _rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();

        app_state.handle_slash_commands("/quality high", &tx)?;
        app_state.handle_slash_commands("/shadcn on", &tx)?;
        assert_eq!(app_state.draft.quality, Quality::High);
        assert!(app_state.draft.use_component_library);
        insta::assert_snapshot!(app_state.status_line(), @"initial | model: meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo | quality: high | shadcn: on");

        app_state.handle_slash_commands("/quality medium", &tx)?;
        assert_eq!(app_state.draft.quality, Quality::High);
        assert_eq!(app_state.toast.clone().unwrap().kind, ToastKind::Error);

        return Ok(());
    }

    #[test]
    fn it_keeps_the_snapshot_after_draft_changes() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = created(&tx, &mut rx)?;

        app_state.handle_slash_commands("/model other/model", &tx)?;
        assert!(app_state
            .toast
            .clone()
            .unwrap()
            .text
            .contains("applies to new apps only"));
        assert!(app_state.status_line().contains(MODEL_CATALOG[0]));

        app_state.submit("Add dark mode", &tx)?;
        let (_, _, model) = next_request(&mut rx)?;
        assert_eq!(model, MODEL_CATALOG[0]);

        return Ok(());
    }

    #[test]
    fn it_refuses_to_publish_without_code() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = AppState::default();
        app_state.handle_slash_commands("/publish", &tx)?;

        assert!(rx.try_recv().is_err());
        assert_eq!(app_state.toast.clone().unwrap().kind, ToastKind::Error);

        return Ok(());
    }

    #[test]
    fn it_publishes_the_final_code() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
        let mut app_state = created(&tx, &mut rx)?;
        app_state.handle_slash_commands("/p", &tx)?;

        match rx.try_recv()? {
            Action::Publish(request) => {
                assert_eq!(request.code, "export default function App() {}\n");
                assert_eq!(request.prompt, "Build a todo app");
                assert_eq!(request.model, MODEL_CATALOG[0]);
            }
            _ => bail!("Wrong enum"),
        }

        app_state.handle_publish_response(PublishReceipt {
            id: "abc".to_string(),
            url: "https://example.com/share/abc".to_string(),
        });
        assert_eq!(app_state.session.state(), SessionState::Created);
        insta::assert_snapshot!(app_state.toast.clone().unwrap().text, @"Published! Your app is available at https://example.com/share/abc");

        return Ok(());
    }
}
