#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::parse_toggle;
use crate::domain::models::BackendName;
use crate::domain::models::DraftConfig;
use crate::domain::models::PublisherName;
use crate::domain::models::Quality;
use crate::domain::models::MODEL_CATALOG;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    Backend,
    BackendHealthCheckTimeout,
    ConfigFile,
    EndpointURL,
    Model,
    #[strum(to_string = "openai-token")]
    OpenAiToken,
    #[strum(to_string = "openai-url")]
    OpenAiURL,
    PublishDir,
    Publisher,
    PublishURL,
    Quality,
    Shadcn,
    StreamTimeout,
    Theme,
    ThemeFile,
}

fn path_to_string(path: Option<path::PathBuf>, rest: &str) -> String {
    return path
        .map(|dir| return dir.join(rest).to_string_lossy().to_string())
        .unwrap_or_default();
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        let res = match key {
            ConfigKey::Backend => BackendName::Endpoint.to_string(),
            ConfigKey::BackendHealthCheckTimeout => "1000".to_string(),
            ConfigKey::EndpointURL => "http://localhost:3000".to_string(),
            ConfigKey::Model => MODEL_CATALOG[0].to_string(),
            ConfigKey::OpenAiToken => "".to_string(),
            ConfigKey::OpenAiURL => "https://api.together.xyz".to_string(),
            ConfigKey::Publisher => PublisherName::File.to_string(),
            ConfigKey::PublishURL => "http://localhost:3000".to_string(),
            ConfigKey::Quality => Quality::Low.to_string(),
            ConfigKey::Shadcn => "false".to_string(),
            ConfigKey::StreamTimeout => "60000".to_string(),
            ConfigKey::Theme => "base16-ocean.dark".to_string(),
            ConfigKey::ThemeFile => "".to_string(),

            // Paths
            ConfigKey::ConfigFile => path_to_string(dirs::config_dir(), "granola/config.toml"),
            ConfigKey::PublishDir => path_to_string(dirs::cache_dir(), "granola/apps"),
        };

        return res;
    }

    /// Milliseconds stored under `key` as a duration, where zero means no
    /// limit.
    pub fn duration(key: ConfigKey) -> Result<Option<Duration>> {
        let val = Config::get(key);
        let millis = match val.parse::<u64>() {
            Ok(millis) => millis,
            Err(_) => bail!(format!("{key} must be a number of milliseconds, got '{val}'")),
        };

        if millis == 0 {
            return Ok(None);
        }

        return Ok(Some(Duration::from_millis(millis)));
    }

    /// The generation settings a new app starts from.
    pub fn draft() -> Result<DraftConfig> {
        let quality_str = Config::get(ConfigKey::Quality);
        let quality = match Quality::from_str(&quality_str) {
            Ok(quality) => quality,
            Err(_) => bail!(format!("{} must be low or high, got '{quality_str}'", ConfigKey::Quality)),
        };

        let shadcn_str = Config::get(ConfigKey::Shadcn);
        let use_component_library = match parse_toggle(&shadcn_str) {
            Some(enabled) => enabled,
            None => bail!(format!("{} must be true or false, got '{shadcn_str}'", ConfigKey::Shadcn)),
        };

        return Ok(DraftConfig::new(
            &Config::get(ConfigKey::Model),
            quality,
            use_component_library,
        ));
    }

    fn possible_values(cmd: &Command, key: ConfigKey) -> Vec<String> {
        let arg = cmd
            .get_arguments()
            .find(|e| return e.get_long() == Some(key.to_string().as_str()));

        if let Some(arg) = arg {
            return arg
                .get_possible_values()
                .iter()
                .map(|e| return e.get_name().to_string())
                .collect::<Vec<String>>();
        }

        return vec![];
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let possible_values = Config::possible_values(&cmd, key);

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_bool) = val.as_bool() {
                        Config::set(key, &val_bool.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            backend = Config::get(ConfigKey::Backend),
            model = Config::get(ConfigKey::Model),
            quality = Config::get(ConfigKey::Quality),
            shadcn = Config::get(ConfigKey::Shadcn),
            publisher = Config::get(ConfigKey::Publisher),
            theme = Config::get(ConfigKey::Theme),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let possible_values = Config::possible_values(&cmd, key);
                if !possible_values.is_empty() {
                    description = format!(
                        "{description} [possible values: {}]",
                        possible_values.join(", ")
                    );
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() || parse_toggle(&val).is_some() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
