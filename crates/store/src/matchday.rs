use crate::versioned::{StoreError, VersionedDocument, VersionedStore};
use chrono::NaiveDate;
use courtrelay_core::RelayClock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2})\.(\d{2})\.(\d{4})").unwrap());
static MATCH_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/stream/([a-zA-Z0-9-]+)").unwrap());

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchdayPayload {
    pub home_team: String,
    pub away_team: String,
    pub date: String,
    pub dvv_link: String,
    pub match_id: String,
}

/// Fixture metadata, with a best-effort external scrape that does not
/// persist its result — the caller decides whether to `update` with it.
pub struct MatchdayStore {
    inner: VersionedStore<MatchdayPayload>,
    client: reqwest::Client,
}

impl MatchdayStore {
    pub fn load(path: impl Into<PathBuf>, clock: Arc<dyn RelayClock>) -> Self {
        Self {
            inner: VersionedStore::load(path, 0o644, clock),
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("reqwest client builder"),
        }
    }

    pub async fn get(&self) -> VersionedDocument<MatchdayPayload> {
        self.inner.get().await
    }

    pub async fn get_version(&self) -> i64 {
        self.inner.get_version().await
    }

    pub async fn update(
        &self,
        payload: MatchdayPayload,
    ) -> Result<VersionedDocument<MatchdayPayload>, StoreError> {
        self.inner.update(payload).await
    }

    /// Fetch `url`, extract team names / date / match id from the HTML.
    /// Does not touch the persisted document.
    pub async fn parse_external(&self, url: &str) -> Result<MatchdayPayload, StoreError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::UpstreamStatus(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        let today = self.inner.clock().now_utc().date_naive();
        Ok(extract_from_html(url, &body, today))
    }
}

/// Pure extraction logic, factored out of `parse_external` so it can be
/// exercised without a network call.
pub fn extract_from_html(url: &str, body: &str, today: NaiveDate) -> MatchdayPayload {
    let (home_team, away_team) = extract_teams(body);
    let date = extract_date(body).unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
    let match_id = MATCH_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    MatchdayPayload {
        home_team,
        away_team,
        date,
        dvv_link: url.to_string(),
        match_id,
    }
}

fn extract_teams(body: &str) -> (String, String) {
    let title = TITLE_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let mut parts = if title.contains(" vs. ") {
        title.splitn(2, " vs. ")
    } else {
        title.splitn(2, " - ")
    };
    let home = parts.next().unwrap_or_default().trim().to_string();
    let away = parts.next().unwrap_or_default().trim().to_string();
    (home, away)
}

fn extract_date(body: &str) -> Option<String> {
    let caps = DATE_RE.captures(body)?;
    Some(format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]))
}
