// src/classifier.rs
use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use log;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Label used whenever the classifier cannot be reached or answers garbage.
pub const FALLBACK_EMOTION: &str = "Neutral";

/// Anything that can turn entry text into emotion labels.
pub trait Classify {
    fn classify(&self, text: &str) -> impl Future<Output = Result<Vec<String>, ClassifyError>> + Send;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    emotions: Vec<String>,
}

/// HTTP client for the emotion detection service.
#[derive(Debug, Clone)]
pub struct EmotionClient {
    http: reqwest::Client,
    endpoint: String,
}

impl EmotionClient {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

impl Classify for EmotionClient {
    async fn classify(&self, text: &str) -> Result<Vec<String>, ClassifyError> {
        log::debug!("Requesting emotions from {} ({} chars)", self.endpoint, text.len());
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ClassifyRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: ClassifyResponse =
            serde_json::from_str(&body).map_err(|e| ClassifyError::Malformed(e.to_string()))?;
        log::info!("Classifier returned {} emotions", parsed.emotions.len());
        Ok(parsed.emotions)
    }
}

/// Turns a failed classification into the single fallback label.
pub fn recover(outcome: Result<Vec<String>, ClassifyError>) -> Vec<String> {
    match outcome {
        Ok(emotions) => emotions,
        Err(e) => {
            log::warn!("Emotion detection failed, using {}: {}", FALLBACK_EMOTION, e);
            vec![FALLBACK_EMOTION.to_string()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EmotionClient {
        EmotionClient::new(&ClassifierConfig {
            endpoint: format!("{}/detect_emotions", server.uri()),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_classify_posts_text_and_reads_emotions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/detect_emotions"))
            .and(body_json(json!({ "text": "Worried about exam" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "emotions": ["fear", "sadness"] })))
            .expect(1)
            .mount(&server)
            .await;

        let emotions = client_for(&server).classify("Worried about exam").await.unwrap();
        assert_eq!(emotions, vec!["fear".to_string(), "sadness".to_string()]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).classify("hello").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Status(503)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "labels": ["joy"] })))
            .mount(&server)
            .await;

        let err = client_for(&server).classify("hello").await.unwrap_err();
        assert!(matches!(err, ClassifyError::Malformed(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back_to_neutral() {
        let server = MockServer::start().await;
        let client = client_for(&server);
        drop(server);

        let emotions = recover(client.classify("anyone there?").await);
        assert_eq!(emotions, vec![FALLBACK_EMOTION.to_string()]);
    }

    #[test]
    fn test_recover_keeps_successful_labels() {
        assert_eq!(recover(Ok(vec!["joy".into()])), vec!["joy".to_string()]);
        assert_eq!(recover(Ok(vec![])), Vec::<String>::new());
        assert_eq!(recover(Err(ClassifyError::Status(500))), vec!["Neutral".to_string()]);
    }
}
