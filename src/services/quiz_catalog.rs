use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::core::config::Settings;
use crate::schemas::quiz::{QuizInfo, QuizSnapshot};

#[derive(Debug, Error)]
pub(crate) enum CatalogError {
    #[error("quiz service request failed: {0}")]
    Request(String),
    #[error("quiz service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("quiz service reported an unsuccessful response")]
    Unsuccessful,
    #[error("failed to decode quiz service response: {0}")]
    Decode(String),
}

/// The catalog's response schema is not pinned across versions: the payload
/// may arrive wrapped in `{success, data}`, in `{data}` alone, or bare.
/// Candidates are tried in that order; cosmetic envelope drift must never
/// fail a grading call.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Flagged { success: bool, data: Option<T> },
    Wrapped { data: T },
    Bare(T),
}

fn parse_enveloped<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, CatalogError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(Envelope::Flagged { success: false, .. }) => Err(CatalogError::Unsuccessful),
        Ok(Envelope::Flagged { data: Some(data), .. })
        | Ok(Envelope::Wrapped { data })
        | Ok(Envelope::Bare(data)) => Ok(data),
        Ok(Envelope::Flagged { data: None, .. }) => {
            Err(CatalogError::Decode("envelope carried no data".to_string()))
        }
        Err(err) => Err(CatalogError::Decode(err.to_string())),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CatalogClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl CatalogClient {
    pub(crate) fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.catalog().timeout_seconds);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("Failed to build quiz service HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.catalog().base_url.trim_end_matches('/').to_string(),
            max_retries: settings.catalog().max_retries,
        })
    }

    /// Fetches the full quiz content used for grading. Transient failures
    /// (network errors, 5xx) are retried with backoff; 4xx responses are
    /// terminal since retrying a validation failure cannot succeed.
    pub(crate) async fn quiz_with_questions(
        &self,
        quiz_id: Uuid,
    ) -> Result<QuizSnapshot, CatalogError> {
        let url = format!("{}/api/quizzes/{quiz_id}/with-questions", self.base_url);
        let body = self.get_with_retries(&url).await?;
        parse_enveloped::<QuizSnapshot>(&body)
    }

    /// Best-effort metadata lookup used to decorate admin result listings.
    /// Quizzes that cannot be fetched or parsed are simply absent from the
    /// returned map.
    pub(crate) async fn quizzes_batch(&self, quiz_ids: &[Uuid]) -> HashMap<Uuid, QuizInfo> {
        let mut quizzes = HashMap::new();

        for quiz_id in quiz_ids {
            if quizzes.contains_key(quiz_id) {
                continue;
            }
            let url = format!("{}/api/quizzes/{quiz_id}", self.base_url);
            match self.get_once(&url).await {
                Ok(body) => match parse_enveloped::<QuizInfo>(&body) {
                    Ok(info) => {
                        quizzes.insert(*quiz_id, info);
                    }
                    Err(err) => {
                        tracing::warn!(quiz_id = %quiz_id, error = %err, "Failed to decode quiz metadata");
                    }
                },
                Err(err) => {
                    tracing::warn!(quiz_id = %quiz_id, error = %err, "Failed to fetch quiz metadata");
                }
            }
        }

        quizzes
    }

    async fn get_with_retries(&self, url: &str) -> Result<String, CatalogError> {
        let mut last_error = CatalogError::Request("no attempts made".to_string());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(200 * 2_u64.pow(attempt - 1))).await;
            }

            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(CatalogError::Status { status, body }) if !status.is_server_error() => {
                    return Err(CatalogError::Status { status, body });
                }
                Err(err) => {
                    tracing::warn!(url = %url, attempt, error = %err, "Quiz service request failed");
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }

    async fn get_once(&self, url: &str) -> Result<String, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| CatalogError::Request(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| CatalogError::Request(err.to_string()))?;

        if !status.is_success() {
            return Err(CatalogError::Status { status, body });
        }

        if body.trim().is_empty() {
            return Err(CatalogError::Decode("empty response body".to_string()));
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIZ_JSON: &str = r#"{
        "id": "6f2c0e88-9a3e-4f6e-9d6f-0a4c1c6b1a11",
        "title": "Capitals",
        "questions": []
    }"#;

    #[test]
    fn parses_flagged_envelope() {
        let body = format!("{{\"success\": true, \"data\": {QUIZ_JSON}}}");
        let quiz = parse_enveloped::<QuizSnapshot>(&body).expect("quiz");
        assert_eq!(quiz.title, "Capitals");
    }

    #[test]
    fn parses_data_only_envelope() {
        let body = format!("{{\"data\": {QUIZ_JSON}}}");
        let quiz = parse_enveloped::<QuizSnapshot>(&body).expect("quiz");
        assert_eq!(quiz.title, "Capitals");
    }

    #[test]
    fn parses_bare_object() {
        let quiz = parse_enveloped::<QuizSnapshot>(QUIZ_JSON).expect("quiz");
        assert_eq!(quiz.title, "Capitals");
    }

    #[test]
    fn unsuccessful_envelope_is_an_error() {
        let body = format!("{{\"success\": false, \"data\": {QUIZ_JSON}}}");
        assert!(matches!(
            parse_enveloped::<QuizSnapshot>(&body),
            Err(CatalogError::Unsuccessful)
        ));
    }

    #[test]
    fn flagged_envelope_without_data_is_a_decode_error() {
        let body = "{\"success\": true}";
        assert!(matches!(
            parse_enveloped::<QuizSnapshot>(body),
            Err(CatalogError::Decode(_))
        ));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            parse_enveloped::<QuizSnapshot>("{\"nope\": 1}"),
            Err(CatalogError::Decode(_))
        ));
        assert!(matches!(
            parse_enveloped::<QuizSnapshot>("not json"),
            Err(CatalogError::Decode(_))
        ));
    }
}
