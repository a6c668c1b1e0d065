use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;

use crate::model::{AuditResponse, Device, ScoreSet};

pub const DEFAULT_ENDPOINT: &str =
    "https://pagespeedonline.googleapis.com/pagespeedonline/v5/runPagespeed";

// Categories in the order they are appended to the request. The report
// columns order them differently.
pub const CATEGORIES: [&str; 4] = ["accessibility", "best-practices", "performance", "seo"];

// A successful response whose body does not have the expected shape. This is
// an API contract change, not a reachability problem, and is never absorbed.
#[derive(Debug, Error)]
#[error("audit response is missing expected fields: {0}")]
pub struct MalformedAudit(#[from] serde_json::Error);

// Builds the fully parameterized request for one page and device. The query
// serializer owns percent-encoding, the page url is handed over raw.
pub fn audit_url(endpoint: &Url, page_url: &str, device: Device, api_key: &str) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("key", api_key);
        query.append_pair("url", page_url);
        query.append_pair("strategy", device.strategy());
        for category in CATEGORIES {
            query.append_pair("category", category);
        }
    }
    url
}

// One GET, one chance: a transport error, a non-success status or a body that
// is not JSON all make this audit absent for the rest of the run. The body of
// an error response is logged since the API explains itself there
// (keyInvalid, quotaExceeded, ...).
pub async fn fetch_audit(client: &Client, request_url: Url) -> Option<Value> {
    let response = match client.get(request_url).send().await {
        Ok(response) => response,
        Err(e) => {
            log::warn!("audit request failed: {e}");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        log::warn!("audit request returned {status}: {body}");
        return None;
    }

    match response.json::<Value>().await {
        Ok(body) => Some(body),
        Err(e) => {
            log::warn!("audit response was not valid json: {e}");
            None
        }
    }
}

// Decodes one successful audit body into its four category scores.
pub fn extract_scores(body: Value) -> Result<ScoreSet, MalformedAudit> {
    let audit: AuditResponse = serde_json::from_value(body)?;
    log::debug!(
        "audited {} as {} (requested {})",
        audit.lighthouse_result.final_url,
        audit.lighthouse_result.config_settings.emulated_form_factor,
        audit.loading_experience.initial_url,
    );
    Ok(audit.scores())
}
