#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::PublisherName;
use crate::domain::models::Quality;
use crate::domain::services::actions::help_text;
use crate::domain::services::Syntaxes;
use crate::domain::services::Themes;

/// What `main` should do once arguments and config have been handled.
pub enum Mode {
    Exit,
    Interactive,
    Generate(GenerateArgs),
}

/// Arguments of `granola generate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateArgs {
    pub prompt: String,
    pub revisions: Vec<String>,
    pub output: Option<path::PathBuf>,
    pub publish: bool,
}

impl GenerateArgs {
    fn from_matches(matches: &ArgMatches) -> Result<GenerateArgs> {
        let prompt = match matches.get_one::<String>("prompt") {
            Some(prompt) => prompt.to_string(),
            None => bail!("A prompt is required to generate an app"),
        };

        return Ok(GenerateArgs {
            prompt,
            revisions: matches
                .get_many::<String>("revise")
                .map(|revisions| return revisions.map(|e| return e.to_string()).collect())
                .unwrap_or_default(),
            output: matches
                .get_one::<String>("output")
                .map(path::PathBuf::from),
            publish: matches.get_flag("publish"),
        });
    }
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

pub fn log_path() -> path::PathBuf {
    if let Ok(dir) = std::env::var("GRANOLA_LOG_DIR") {
        return path::PathBuf::from(dir).join("debug.log");
    }

    return dirs::cache_dir()
        .unwrap_or_default()
        .join("granola/debug.log");
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    let mut cmd = Command::new("debug");
    cmd = cmd.about("Debug helpers for Granola")
        .hide(true)
        .subcommand(
            Command::new("syntaxes").about("List all supported code highlighting languages.")
        )
        .subcommand(
            Command::new("themes").about("List all supported code highlighting themes.")
        )
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Granola with environment variable RUST_LOG=granola")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );

    return cmd;
}

fn subcommand_generate() -> Command {
    return Command::new("generate")
        .about("Generates an app without the UI, applying each revision in order, and writes the final code to stdout or a file.")
        .arg(
            Arg::new("prompt")
                .short('p')
                .long("prompt")
                .help("Description of the app to build.")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new("revise")
                .short('r')
                .long("revise")
                .help("An instruction to change the app once it's built. Can be passed multiple times.")
                .action(ArgAction::Append)
                .num_args(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("File to write the final code to. Defaults to stdout.")
                .num_args(1),
        )
        .arg(
            Arg::new("publish")
                .long("publish")
                .help("Publish the final code once every revision is done.")
                .action(ArgAction::SetTrue),
        );
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("GRANOLA_BACKEND")
        .num_args(1)
        .help(format!(
            "The backend used to generate apps. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS))
        .global(true);
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("GRANOLA_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        )
        .global(true);
}

fn arg_model() -> Arg {
    return Arg::new(ConfigKey::Model.to_string())
        .short('m')
        .long(ConfigKey::Model.to_string())
        .env("GRANOLA_MODEL")
        .num_args(1)
        .help(format!(
            "The model a new app is generated with. Revisions keep the model the app was created with. [default: {}]",
            Config::default(ConfigKey::Model)
        ))
        .global(true);
}

fn arg_quality() -> Arg {
    return Arg::new(ConfigKey::Quality.to_string())
        .short('q')
        .long(ConfigKey::Quality.to_string())
        .env("GRANOLA_QUALITY")
        .num_args(1)
        .help(format!(
            "Generation quality for a new app. [default: {}]",
            Config::default(ConfigKey::Quality)
        ))
        .value_parser(PossibleValuesParser::new(Quality::VARIANTS))
        .global(true);
}

fn arg_shadcn() -> Arg {
    return Arg::new(ConfigKey::Shadcn.to_string())
        .long(ConfigKey::Shadcn.to_string())
        .env("GRANOLA_SHADCN")
        .num_args(1)
        .help(format!(
            "Whether a new app may use the shadcn/ui component library. [default: {}]",
            Config::default(ConfigKey::Shadcn)
        ))
        .value_parser(PossibleValuesParser::new(["true", "false"]))
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:")
                || line.starts_with("HOTKEYS:")
                || line.starts_with("REVISIONS:")
            {
                return Paint::new(format!("UI {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nBuilt: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_TIMESTAMP")
    );

    let themes = Themes::list();

    return Command::new("granola")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("create").about("Start building a new app in the UI."))
        .subcommand(subcommand_generate())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_model())
        .arg(arg_quality())
        .arg(arg_shadcn())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("GRANOLA_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::EndpointURL.to_string())
                .long(ConfigKey::EndpointURL.to_string())
                .env("GRANOLA_ENDPOINT_URL")
                .num_args(1)
                .help(format!("Base URL of the app generation service when using the endpoint backend. [default: {}]", Config::default(ConfigKey::EndpointURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiURL.to_string())
                .long(ConfigKey::OpenAiURL.to_string())
                .env("GRANOLA_OPENAI_URL")
                .num_args(1)
                .help(format!("OpenAI compatible API URL when using the openai backend. [default: {}]", Config::default(ConfigKey::OpenAiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiToken.to_string())
                .long(ConfigKey::OpenAiToken.to_string())
                .env("GRANOLA_OPENAI_TOKEN")
                .num_args(1)
                .help("OpenAI compatible API token when using the openai backend.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StreamTimeout.to_string())
                .long(ConfigKey::StreamTimeout.to_string())
                .env("GRANOLA_STREAM_TIMEOUT")
                .num_args(1)
                .help(format!("Time to wait in milliseconds for the next piece of a generation before giving up. 0 disables it. [default: {}]", Config::default(ConfigKey::StreamTimeout)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Publisher.to_string())
                .long(ConfigKey::Publisher.to_string())
                .env("GRANOLA_PUBLISHER")
                .num_args(1)
                .help(format!("Where finished apps are published to. [default: {}]", Config::default(ConfigKey::Publisher)))
                .value_parser(PossibleValuesParser::new(PublisherName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::PublishURL.to_string())
                .long(ConfigKey::PublishURL.to_string())
                .env("GRANOLA_PUBLISH_URL")
                .num_args(1)
                .help(format!("Base URL of the share service when using the http publisher. [default: {}]", Config::default(ConfigKey::PublishURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::PublishDir.to_string())
                .long(ConfigKey::PublishDir.to_string())
                .env("GRANOLA_PUBLISH_DIR")
                .num_args(1)
                .help(format!("Directory apps are written to when using the file publisher. [default: {}]", Config::default(ConfigKey::PublishDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Theme.to_string())
                .short('t')
                .long(ConfigKey::Theme.to_string())
                .env("GRANOLA_THEME")
                .num_args(1)
                .help(format!("Sets code syntax highlighting theme. [default: {}]", Config::default(ConfigKey::Theme)))
                .value_parser(PossibleValuesParser::new(themes))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ThemeFile.to_string())
                .long(ConfigKey::ThemeFile.to_string())
                .env("GRANOLA_THEME_FILE")
                .num_args(1)
                .help(
                    "Absolute path to a TextMate tmTheme to use for code syntax highlighting."
                )
                .global(true),
        );
}

pub async fn parse() -> Result<Mode> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("syntaxes", _)) => {
                    println!("{}", Syntaxes::list().join("\n"));
                }
                Some(("themes", _)) => {
                    println!("{}", Themes::list().join("\n"));
                }
                Some(("log-path", _)) => {
                    println!("{}", log_path().to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(Mode::Exit);
        }
        Some(("create", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("generate", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Mode::Generate(GenerateArgs::from_matches(subcmd_matches)?));
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(Mode::Exit);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(Mode::Exit);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(Mode::Exit);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(Mode::Exit);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(Mode::Exit);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(Mode::Exit);
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(Mode::Interactive);
}
