#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::str::FromStr;

use anyhow::Error;
use anyhow::Result;
use domain::models::Action;
use domain::models::BackendName;
use domain::models::Event;
use domain::models::PublisherName;
use infrastructure::backends::BackendManager;
use infrastructure::publishers::PublisherManager;
use tokio::sync::mpsc;
use tokio::task;
use yansi::Paint;

use crate::application::cli;
use crate::application::headless;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::AppState;

fn handle_error(err: Error) {
    eprintln!(
            "{}",
            Paint::red(format!(
                "Oh no! Granola has failed with the following app version and error.\n\nVersion: {}\nBuilt: {}\nError: {}",
                env!("CARGO_PKG_VERSION"),
                env!("VERGEN_BUILD_TIMESTAMP"),
                err
            ))
        );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn run(mode: cli::Mode) -> Result<()> {
    let backend_name = BackendName::from_str(&Config::get(ConfigKey::Backend))?;
    let publisher_name = PublisherName::from_str(&Config::get(ConfigKey::Publisher))?;
    let idle_timeout = Config::duration(ConfigKey::StreamTimeout)?;
    let draft = Config::draft()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut background_futures = task::JoinSet::new();
    let backend = BackendManager::get(backend_name)?;
    let publisher = PublisherManager::get(publisher_name)?;

    match mode {
        cli::Mode::Generate(args) => {
            background_futures.spawn(async move {
                return ActionsService::start(
                    backend,
                    publisher,
                    idle_timeout,
                    event_tx,
                    &mut action_rx,
                )
                .await;
            });

            let mut event_rx = event_rx;
            let mut stdout = tokio::io::stdout();
            return headless::start(args, draft, action_tx, &mut event_rx, &mut stdout).await;
        }
        cli::Mode::Interactive => {
            let mut app_state = AppState::new(
                draft,
                &Config::get(ConfigKey::Theme),
                &Config::get(ConfigKey::ThemeFile),
            )?;
            app_state.check_backend(&backend).await;

            background_futures.spawn(async move {
                return ActionsService::start(
                    backend,
                    publisher,
                    idle_timeout,
                    event_tx,
                    &mut action_rx,
                )
                .await;
            });

            let ui_future = ui::start(app_state, action_tx, event_rx);

            let res = tokio::select!(
                res = background_futures.join_next() => match res {
                    Some(Ok(res)) => res,
                    Some(Err(err)) => Err(Error::from(err)),
                    None => Ok(()),
                },
                res = ui_future => res,
            );

            return res;
        }
        cli::Mode::Exit => {
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        ui::destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let log_path = cli::log_path();
    let debug_log_dir = log_path
        .parent()
        .map(|dir| return dir.to_path_buf())
        .unwrap_or_default();

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("granola")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let mode = match cli::parse().await {
        Ok(mode) => mode,
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    let is_interactive = matches!(mode, cli::Mode::Interactive);
    if let Err(err) = run(mode).await {
        if is_interactive {
            ui::destruct_terminal_for_panic();
        }
        handle_error(err);
    }

    process::exit(0);
}
