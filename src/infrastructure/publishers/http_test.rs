use anyhow::Result;

use super::HttpPublisher;
use crate::domain::models::PublishRequest;
use crate::domain::models::Publisher;

fn request() -> PublishRequest {
    return PublishRequest {
        code: "export default function App() {}".to_string(),
        model: "google/gemma-2-27b-it".to_string(),
        prompt: "Build a todo app".to_string(),
    };
}

#[tokio::test]
async fn it_publishes_apps() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/share")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "generatedCode": "export default function App() {}",
            "model": "google/gemma-2-27b-it",
            "prompt": "Build a todo app",
        })))
        .with_status(200)
        .with_body(r#"{"id":"a1b2c3"}"#)
        .create_async()
        .await;

    let publisher = HttpPublisher { url: server.url() };
    let receipt = publisher.publish(&request()).await?;
    mock.assert_async().await;

    assert_eq!(receipt.id, "a1b2c3");
    assert_eq!(receipt.url, format!("{}/share/a1b2c3", server.url()));

    return Ok(());
}

#[tokio::test]
async fn it_fails_on_error_statuses() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/share")
        .with_status(500)
        .create_async()
        .await;

    let publisher = HttpPublisher { url: server.url() };
    let res = publisher.publish(&request()).await;
    mock.assert_async().await;

    assert!(res.is_err());
}
