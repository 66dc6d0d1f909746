use std::time::Duration;

use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;
use crate::domain::models::Quality;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());

    assert!(res.contains("backend = \"endpoint\""));
    assert!(res.contains("shadcn = false"));
    assert!(res.contains("stream-timeout = 60000"));
    assert!(!res.contains("config-file"));
}

#[test]
fn it_names_keys_in_kebab_case() {
    assert_eq!(ConfigKey::EndpointURL.to_string(), "endpoint-url");
    assert_eq!(ConfigKey::OpenAiURL.to_string(), "openai-url");
    assert_eq!(ConfigKey::OpenAiToken.to_string(), "openai-token");
    assert_eq!(ConfigKey::PublishURL.to_string(), "publish-url");
    assert_eq!(
        ConfigKey::BackendHealthCheckTimeout.to_string(),
        "backend-health-check-timeout"
    );
}

// Config is global, loading both files in one test keeps them from racing.
#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["granola", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());

    let matches =
        cli::build().try_get_matches_from(vec!["granola", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;

    let draft = Config::draft()?;
    assert_eq!(draft.model, "meta-llama/Llama-3.3-70B-Instruct-Turbo");
    assert_eq!(draft.quality, Quality::High);
    assert!(draft.use_component_library);
    assert_eq!(
        Config::duration(ConfigKey::StreamTimeout)?,
        Some(Duration::from_millis(30000))
    );

    return Ok(());
}
