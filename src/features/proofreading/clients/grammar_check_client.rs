use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::core::error::{AppError, Result};
use crate::shared::validation::is_safe_artifact_name;

/// Summary the grammar-check service returns after a full run
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProofreadOutcome {
    /// Comparison artifact written under the json directory
    pub json_filename: String,
    /// Proofread PDF written under the generated directory
    pub final_pdf_filename: String,
    /// Number of paragraphs that were changed
    #[serde(alias = "total_errors")]
    pub total_improvements: i64,
    pub elapsed_time_seconds: f64,
}

/// Runs proofreading for a stored document
#[async_trait]
pub trait Proofreader: Send + Sync {
    /// Full pass over the original PDF
    async fn proofread(&self, file_code: &str) -> Result<ProofreadOutcome>;

    /// Rewrite only the given paragraphs of the proofread PDF with their
    /// corrected text
    async fn apply_paragraphs(
        &self,
        file_code: &str,
        paragraph_ids: &[i64],
    ) -> Result<ProofreadOutcome>;
}

/// HTTP client for the grammar-check service
pub struct GrammarCheckClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl GrammarCheckClient {
    /// Full PDF → proofread → PDF pass
    const MODE_FULL: &'static str = "0";
    /// Re-apply selected paragraphs onto the proofread PDF
    const MODE_APPLY: &'static str = "1";

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    async fn grammar_check(
        &self,
        mode: &str,
        file_code: &str,
        paragraph_ids: &str,
    ) -> Result<ProofreadOutcome> {
        let url = format!("{}/api/grammar-check", self.base_url);

        tracing::debug!("Requesting grammar check (mode={}) for {}", mode, file_code);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("mode", mode),
                ("file_code", file_code),
                ("paragraph_id", paragraph_ids),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Grammar check request failed: {}", e);
                AppError::ExternalServiceError(format!("Proofreading request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Proofreading service returned {}: {}",
                status, body
            )));
        }

        let outcome = response.json::<ProofreadOutcome>().await.map_err(|e| {
            tracing::error!("Failed to parse grammar check response: {}", e);
            AppError::ExternalServiceError(format!("Invalid proofreading response: {}", e))
        })?;

        for name in [&outcome.json_filename, &outcome.final_pdf_filename] {
            if !is_safe_artifact_name(name) {
                return Err(AppError::ExternalServiceError(format!(
                    "Proofreading service returned an invalid filename: {}",
                    name
                )));
            }
        }

        tracing::info!(
            "Grammar check finished for {}: {} improvements in {}s",
            file_code,
            outcome.total_improvements,
            outcome.elapsed_time_seconds
        );
        Ok(outcome)
    }
}

/// `[1,2,3]`, the list syntax the service parses `paragraph_id` with
fn paragraph_list(ids: &[i64]) -> String {
    let joined = ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("[{}]", joined)
}

#[async_trait]
impl Proofreader for GrammarCheckClient {
    async fn proofread(&self, file_code: &str) -> Result<ProofreadOutcome> {
        self.grammar_check(Self::MODE_FULL, file_code, &paragraph_list(&[]))
            .await
    }

    async fn apply_paragraphs(
        &self,
        file_code: &str,
        paragraph_ids: &[i64],
    ) -> Result<ProofreadOutcome> {
        self.grammar_check(Self::MODE_APPLY, file_code, &paragraph_list(paragraph_ids))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: &str) -> GrammarCheckClient {
        GrammarCheckClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_successful_check() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/grammar-check")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("mode".into(), "0".into()),
                Matcher::UrlEncoded("file_code".into(), "0197_paper".into()),
                Matcher::UrlEncoded("paragraph_id".into(), "[]".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"json_filename":"0197_paper.json","final_pdf_filename":"0197_paper.pdf","total_improvements":4,"elapsed_time_seconds":27.56}"#,
            )
            .create_async()
            .await;

        let outcome = client(&server.url()).proofread("0197_paper").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            outcome,
            ProofreadOutcome {
                json_filename: "0197_paper.json".to_string(),
                final_pdf_filename: "0197_paper.pdf".to_string(),
                total_improvements: 4,
                elapsed_time_seconds: 27.56,
            }
        );
    }

    #[tokio::test]
    async fn test_server_error_is_external_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/grammar-check")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = client(&server.url()).proofread("x").await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(msg)) if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_path_like_filenames_are_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/grammar-check")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"json_filename":"../secrets.json","final_pdf_filename":"a.pdf","total_improvements":1,"elapsed_time_seconds":1.0}"#,
            )
            .create_async()
            .await;

        let result = client(&server.url()).proofread("x").await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(_))));
    }

    #[tokio::test]
    async fn test_apply_paragraphs_sends_update_mode() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/grammar-check")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("mode".into(), "1".into()),
                Matcher::UrlEncoded("file_code".into(), "0197_paper".into()),
                Matcher::UrlEncoded("paragraph_id".into(), "[1,3]".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"json_filename":"0197_paper.json","final_pdf_filename":"0197_paper.pdf","total_improvements":2,"elapsed_time_seconds":3.1}"#,
            )
            .create_async()
            .await;

        let outcome = client(&server.url())
            .apply_paragraphs("0197_paper", &[1, 3])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(outcome.total_improvements, 2);
    }

    #[test]
    fn test_paragraph_list_format() {
        assert_eq!(paragraph_list(&[]), "[]");
        assert_eq!(paragraph_list(&[4]), "[4]");
        assert_eq!(paragraph_list(&[1, 2, 3]), "[1,2,3]");
    }
}
