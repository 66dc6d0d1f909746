#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::into_completion_stream;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendName;
use crate::domain::models::CompletionStream;
use crate::domain::models::GenerationRequest;
use crate::domain::models::Quality;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Model {
    id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModelListResponse {
    data: Vec<Model>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
    stream: bool,
}

/// Instructions sent ahead of the conversation, since an OpenAI compatible
/// API has no idea what an app generation request looks like.
fn system_prompt(quality: Quality, use_component_library: bool) -> String {
    let mut prompt = vec![
        "You are an expert frontend React engineer who is also a great UI/UX designer.",
        "Create a single React component for whatever the user asks you to build.",
        "Use TypeScript and Tailwind CSS classes for styling, with no arbitrary values.",
        "The component must be self contained, take no required props and be the default export.",
        "Only import React hooks from react, do not use any other library.",
    ];

    if use_component_library {
        prompt.pop();
        prompt.push("You may use shadcn/ui components imported from \"/components/ui/<name>\" and React hooks from react, do not use any other library.");
    }

    if quality == Quality::High {
        prompt.push("Think carefully through the layout, states and edge cases before writing the component, and polish the result.");
    }

    prompt.push("When asked to change an existing component, return the complete updated component.");
    prompt.push("Respond with the code only. Do not wrap it in markdown code fences or add any explanation.");

    return prompt.join("\n");
}

pub struct OpenAI {
    url: String,
    token: String,
    timeout: String,
}

impl Default for OpenAI {
    fn default() -> OpenAI {
        return OpenAI {
            url: Config::get(ConfigKey::OpenAiURL),
            token: Config::get(ConfigKey::OpenAiToken),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> BackendName {
        return BackendName::OpenAI;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("OpenAI URL is not defined");
        }
        if self.token.is_empty() {
            bail!("OpenAI token is not defined");
        }

        // The official API answers its index with a 404 or a 418, so there's
        // nothing useful to check.
        if self.url == "https://api.openai.com" {
            return Ok(());
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let status = match res {
            Ok(res) => res.status().as_u16(),
            Err(err) => {
                tracing::error!(error = ?err, "OpenAI is not reachable");
                bail!("OpenAI is not reachable");
            }
        };

        if status >= 500 {
            tracing::error!(status = status, "OpenAI health check failed");
            bail!("OpenAI health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?
            .json::<ModelListResponse>()
            .await?;

        let mut models: Vec<String> = res
            .data
            .iter()
            .map(|model| {
                return model.id.to_string();
            })
            .collect();

        models.sort();

        return Ok(models);
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, request: &GenerationRequest) -> Result<CompletionStream> {
        let mut messages = vec![MessageRequest {
            role: "system".to_string(),
            content: system_prompt(request.quality, request.use_component_library),
        }];
        messages.extend(request.messages.iter().map(|message| {
            return MessageRequest {
                role: message.role.to_string(),
                content: message.content.to_string(),
            };
        }));

        let req = CompletionRequest {
            model: request.model.to_string(),
            messages,
            stream: true,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req)
            .send()
            .await?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            tracing::error!(
                status = status,
                "Failed to make completion request to OpenAI"
            );
            bail!(BackendError::Status { status });
        }

        if status == 204 || res.content_length() == Some(0) {
            bail!(BackendError::EmptyBody);
        }

        return Ok(into_completion_stream(res));
    }
}
