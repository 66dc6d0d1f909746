#[cfg(test)]
#[path = "generation_config_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumString;
use strum::EnumVariantNames;

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Quality {
    #[default]
    Low,
    High,
}

/// Models offered by the hosted generation endpoint.
pub const MODEL_CATALOG: [&str; 4] = [
    "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo",
    "meta-llama/Llama-3.3-70B-Instruct-Turbo",
    "google/gemma-2-27b-it",
    "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo",
];

/// The generation settings currently selected by the user. Only ever read
/// when a brand new session starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftConfig {
    pub model: String,
    pub quality: Quality,
    pub use_component_library: bool,
}

impl Default for DraftConfig {
    fn default() -> DraftConfig {
        return DraftConfig {
            model: MODEL_CATALOG[0].to_string(),
            quality: Quality::Low,
            use_component_library: false,
        };
    }
}

impl DraftConfig {
    pub fn new(model: &str, quality: Quality, use_component_library: bool) -> DraftConfig {
        return DraftConfig {
            model: model.to_string(),
            quality,
            use_component_library,
        };
    }
}

/// Generation settings frozen when a session's first generation succeeds.
/// There is no way to mutate one, or to build one other than from the
/// [`DraftConfig`] that produced that generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    model: String,
    quality: Quality,
    use_component_library: bool,
}

impl ConfigSnapshot {
    pub fn freeze(draft: &DraftConfig) -> ConfigSnapshot {
        return ConfigSnapshot {
            model: draft.model.to_string(),
            quality: draft.quality,
            use_component_library: draft.use_component_library,
        };
    }

    pub fn model(&self) -> &str {
        return &self.model;
    }

    pub fn quality(&self) -> Quality {
        return self.quality;
    }

    pub fn use_component_library(&self) -> bool {
        return self.use_component_library;
    }
}

pub fn parse_toggle(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => return Some(true),
        "off" | "false" | "no" | "0" => return Some(false),
        _ => return None,
    }
}
