use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::artifact::BadgeArtifact;
use crate::dispatch::report::{BatchReport, WirePartition, reconcile};
use crate::foundation::error::{BadgeError, BadgeResult};

/// Request body of the bulk endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkRequest<'a> {
    attendee_ids: &'a [String],
    badge_data_urls: BTreeMap<&'a str, String>,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    data: WirePartition,
}

/// Client for the batch delivery endpoint.
///
/// One call sends every id and every badge in a single request. A non-2xx answer fails the whole
/// call; per-recipient failures inside a 2xx answer are part of the [`BatchReport`]. Calls are
/// never retried here.
#[derive(Debug, Clone)]
pub struct DispatchReporter {
    client: reqwest::Client,
    base_url: String,
}

impl DispatchReporter {
    /// Reporter with its own client and the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BadgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BadgeError::transport(None, format!("build http client: {e}")))?;
        Self::with_client(client, base_url)
    }

    /// Reporter around an existing client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> BadgeResult<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BadgeError::validation(format!(
                "dispatch base url '{base_url}' must be http(s)"
            )));
        }
        Ok(Self { client, base_url })
    }

    /// Base URL without trailing `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST` target for `event_id`.
    pub fn endpoint(&self, event_id: &str) -> BadgeResult<String> {
        if event_id.is_empty()
            || event_id
                .chars()
                .any(|c| matches!(c, '/' | '?' | '#') || c.is_whitespace() || c.is_control())
        {
            return Err(BadgeError::validation(format!(
                "invalid event id '{event_id}'"
            )));
        }
        Ok(format!(
            "{}/api/events/{event_id}/attendees/badges/bulk",
            self.base_url
        ))
    }

    /// Submit `attendee_ids` with their badges and reconcile the answer.
    ///
    /// Every id must have an artifact in `artifacts`; otherwise nothing is sent.
    pub async fn dispatch(
        &self,
        event_id: &str,
        attendee_ids: &[String],
        artifacts: &BTreeMap<String, BadgeArtifact>,
    ) -> BadgeResult<BatchReport> {
        let url = self.endpoint(event_id)?;
        if attendee_ids.is_empty() {
            return Err(BadgeError::validation("no attendees to dispatch"));
        }

        let mut badge_data_urls = BTreeMap::new();
        for id in attendee_ids {
            let artifact = artifacts.get(id).ok_or_else(|| {
                BadgeError::validation(format!("no badge generated for attendee '{id}'"))
            })?;
            badge_data_urls.insert(id.as_str(), artifact.data_url());
        }
        let body = BulkRequest {
            attendee_ids,
            badge_data_urls,
        };

        debug!(url = %url, count = attendee_ids.len(), "dispatching badges");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BadgeError::transport(None, format!("POST {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(status, &text);
            warn!(status = status.as_u16(), error = %message, "dispatch rejected");
            return Err(BadgeError::transport(Some(status.as_u16()), message));
        }

        let text = response.text().await.map_err(|e| {
            BadgeError::transport(Some(status.as_u16()), format!("read response body: {e}"))
        })?;
        let parsed: BulkResponse = serde_json::from_str(&text).map_err(|e| {
            BadgeError::transport(
                Some(status.as_u16()),
                format!("unreadable response body: {e}"),
            )
        })?;

        let report = reconcile(attendee_ids, parsed.data);
        info!(
            event = %event_id,
            delivered = report.success.len(),
            failed = report.failed.len(),
            "dispatch reconciled"
        );
        Ok(report)
    }
}

/// The body's `error` field when present, else the status line.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("HTTP {}: {reason}", status.as_u16()),
            None => format!("HTTP {}", status.as_u16()),
        })
}
