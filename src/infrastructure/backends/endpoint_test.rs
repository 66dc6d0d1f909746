use anyhow::Result;
use futures::StreamExt;
use test_utils::completion_chunks_body;
use test_utils::split_into_deltas;
use test_utils::todo_app_fixture;

use super::Endpoint;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::DraftConfig;
use crate::domain::models::GenerationRequest;
use crate::domain::models::Quality;
use crate::domain::models::RequestMode;
use crate::domain::models::MODEL_CATALOG;

impl Endpoint {
    fn with_url(url: String) -> Endpoint {
        return Endpoint {
            url,
            timeout: "200".to_string(),
        };
    }
}

fn request() -> GenerationRequest {
    let draft = DraftConfig::new(MODEL_CATALOG[1], Quality::High, true);
    return GenerationRequest::build(RequestMode::Start { draft: &draft }, "Build a todo app");
}

async fn collect(backend: &Endpoint) -> Result<String> {
    let mut stream = backend.get_completion(&request()).await?;
    let mut code = "".to_string();
    while let Some(delta) = stream.next().await {
        code += &delta?;
    }

    return Ok(code);
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .with_status(200)
        .create_async()
        .await;

    let backend = Endpoint::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .with_status(500)
        .create_async()
        .await;

    let backend = Endpoint::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_lists_the_model_catalog() -> Result<()> {
    let backend = Endpoint::with_url("http://localhost:1".to_string());
    let res = backend.list_models().await?;

    assert_eq!(res.len(), MODEL_CATALOG.len());
    assert_eq!(res[0], "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo");

    return Ok(());
}

#[tokio::test]
async fn it_streams_generated_code() -> Result<()> {
    let deltas = split_into_deltas(todo_app_fixture(), &[3, 17, 8]);
    let body = completion_chunks_body(
        &deltas
            .iter()
            .map(|delta| return delta.as_str())
            .collect::<Vec<&str>>(),
    );

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generateCode")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "model": "meta-llama/Llama-3.3-70B-Instruct-Turbo",
            "quality": "high",
            "shadcn": true,
            "messages": [{ "role": "user", "content": "Build a todo app" }],
        })))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = Endpoint::with_url(server.url());
    let code = collect(&backend).await?;
    mock.assert_async().await;

    assert_eq!(code, todo_app_fixture());

    return Ok(());
}

#[tokio::test]
async fn it_streams_sse_framed_chunks() -> Result<()> {
    let body = [
        r#"data: {"choices":[{"delta":{"content":"export default "}}]}"#,
        "",
        r#"data: {"choices":[{"delta":{"content":"function App() {}"}}]}"#,
        "",
        "data: [DONE]",
        "",
    ]
    .join("\n");

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generateCode")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = Endpoint::with_url(server.url());
    let code = collect(&backend).await?;
    mock.assert_async().await;

    assert_eq!(code, "export default function App() {}");

    return Ok(());
}

#[tokio::test]
async fn it_streams_plain_text_bodies_verbatim() -> Result<()> {
    let body = "\n\nimport React from \"react\";\r\nexport default App;";

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generateCode")
        .with_status(200)
        .with_header("content-type", "text/plain; charset=utf-8")
        .with_body(body)
        .create_async()
        .await;

    let backend = Endpoint::with_url(server.url());
    let code = collect(&backend).await?;
    mock.assert_async().await;

    assert_eq!(code, body);

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_error_statuses() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generateCode")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let backend = Endpoint::with_url(server.url());
    let res = backend.get_completion(&request()).await;
    mock.assert_async().await;

    let err = match res {
        Ok(_) => anyhow::bail!("Expected the request to fail"),
        Err(err) => err,
    };
    assert_eq!(
        err.downcast_ref::<BackendError>(),
        Some(&BackendError::Status { status: 500 })
    );

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_empty_bodies() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generateCode")
        .with_status(204)
        .create_async()
        .await;

    let backend = Endpoint::with_url(server.url());
    let res = backend.get_completion(&request()).await;
    mock.assert_async().await;

    let err = match res {
        Ok(_) => anyhow::bail!("Expected the request to fail"),
        Err(err) => err,
    };
    assert_eq!(
        err.downcast_ref::<BackendError>(),
        Some(&BackendError::EmptyBody)
    );

    return Ok(());
}
