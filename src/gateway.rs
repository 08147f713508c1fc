use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Failures at the grading-gateway boundary. All of them leave the ledger
/// row un-finalized, so every variant is safe to retry.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway URL not configured (set STUDYD_GATEWAY_URL)")]
    NotConfigured,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned HTTP {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

/// Outcome reported by the external evaluator, before the core applies its
/// own pass/fail thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayVerdict {
    Passed,
    Failed,
    NeedsImprovement,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRequest {
    pub subject_id: String,
    pub student_id: String,
    pub submitted_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_solution: Option<String>,
    pub rubric_context: String,
}

#[derive(Debug, Deserialize)]
pub struct GradeResponse {
    pub score: f64,
    pub status: GatewayVerdict,
    /// Structured or free-text feedback; stored verbatim on the submission.
    pub feedback: serde_json::Value,
}

/// Long-lived client for the AI evaluator. Constructed once at startup and
/// shared through `AppState`; the per-request timeout is the only bound on
/// how long a grading call may suspend.
pub struct GatewayClient {
    base_url: Option<String>,
    http: reqwest::blocking::Client,
}

impl GatewayClient {
    pub fn from_env() -> Self {
        let base_url = std::env::var("STUDYD_GATEWAY_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());
        let timeout_ms = std::env::var("STUDYD_GATEWAY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Self::new(base_url, Duration::from_millis(timeout_ms))
    }

    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { base_url, http }
    }

    pub fn grade(&self, req: &GradeRequest) -> Result<GradeResponse, GatewayError> {
        let base = self.base_url.as_deref().ok_or(GatewayError::NotConfigured)?;
        let url = format!("{}/grade", base);

        let resp = self.http.post(&url).json(req).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(GatewayError::BadStatus {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let parsed: GradeResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Malformed(format!("{} in: {}", e, truncate(&body, 200))))?;
        if !(0.0..=100.0).contains(&parsed.score) {
            return Err(GatewayError::Malformed(format!(
                "score {} out of range 0-100",
                parsed.score
            )));
        }
        Ok(parsed)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
