//! Remote adapter: pulls tracked items and their review discussion from
//! the tracker API.

use async_trait::async_trait;
use chrono::Datelike;
use octocrab::models::issues::{Comment, Issue};
use octocrab::models::{IssueState, Label};
use octocrab::params;
use octocrab::Octocrab;
use tracing::{debug, info};

use super::{EventSource, SourceError};
use crate::config::TrackerConfig;
use crate::events::normalize::{
    classify_marker, parse_event_date, APPROVED_MARKER, CYCLE_WEEK_PREFIX, EVENT_DATE_FORMAT,
    REJECTED_MARKER,
};
use crate::events::RawRecord;

/// Label prefixes the tracker uses to tag item metadata.
const SPEC_TYPE_PREFIX: &str = "type:";
const BUSINESS_UNIT_PREFIX: &str = "bu:";
const PRODUCT_PREFIX: &str = "product:";

/// Paged, authenticated access to the tracker's item search plus per-item
/// comment retrieval.
pub struct RemoteSource {
    octocrab: Octocrab,
    owner: String,
    repo: String,
    page_size: u8,
    target_year: Option<i32>,
}

impl RemoteSource {
    /// Build a client from explicit credentials. Nothing is read from the
    /// process environment here; the config layer owns that.
    pub fn new(tracker: &TrackerConfig, target_year: Option<i32>) -> Result<Self, SourceError> {
        let token = tracker.token.clone().ok_or_else(|| {
            SourceError::CredentialsMissing(
                "set tracker.token in signoff.toml or SIGNOFF_GITHUB_TOKEN".to_string(),
            )
        })?;
        let octocrab = Octocrab::builder().personal_token(token).build()?;
        Ok(Self {
            octocrab,
            owner: tracker.owner.clone(),
            repo: tracker.repo.clone(),
            page_size: tracker.page_size,
            target_year,
        })
    }

    async fn fetch_items(&self) -> Result<Vec<Issue>, SourceError> {
        let mut items = Vec::new();
        let mut page = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .list()
            .state(params::State::All)
            .per_page(self.page_size)
            .send()
            .await?;
        loop {
            items.append(&mut page.items);
            match self.octocrab.get_page::<Issue>(&page.next).await? {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(items)
    }

    async fn fetch_comments(&self, item_number: u64) -> Result<Vec<Comment>, SourceError> {
        let mut comments = Vec::new();
        let mut page = self
            .octocrab
            .issues(&self.owner, &self.repo)
            .list_comments(item_number)
            .per_page(self.page_size)
            .send()
            .await?;
        loop {
            comments.append(&mut page.items);
            match self.octocrab.get_page::<Comment>(&page.next).await? {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(comments)
    }

    fn record_from_comment(&self, item: &Issue, comment: &Comment) -> Option<RawRecord> {
        let body = comment.body.as_deref()?;
        let line = marker_line(body)?;

        // The notice usually opens with its own date; fall back to the
        // comment timestamp when it does not.
        let event_date_text = match line.split_whitespace().next() {
            Some(token) if parse_event_date(token).is_some() => token.to_string(),
            _ => comment
                .created_at
                .date_naive()
                .format(EVENT_DATE_FORMAT)
                .to_string(),
        };

        if let (Some(target), Some(event_date)) = (self.target_year, parse_event_date(&event_date_text))
        {
            if event_date.year() != target {
                return None;
            }
        }

        Some(RawRecord {
            item_key: item.number.to_string(),
            free_text: line.to_string(),
            event_date_text,
            cycle_week_text: week_token(line),
            spec_type: label_value(&item.labels, SPEC_TYPE_PREFIX).unwrap_or_default(),
            status: state_name(&item.state).to_string(),
            business_unit: label_value(&item.labels, BUSINESS_UNIT_PREFIX).unwrap_or_default(),
            product: label_value(&item.labels, PRODUCT_PREFIX).unwrap_or_default(),
            created_text: item
                .created_at
                .date_naive()
                .format(EVENT_DATE_FORMAT)
                .to_string(),
        })
    }
}

#[async_trait]
impl EventSource for RemoteSource {
    async fn fetch_all_raw_records(&self) -> Result<Vec<RawRecord>, SourceError> {
        let items = self.fetch_items().await?;
        info!(items = items.len(), repo = %self.repo, "tracker items fetched");

        let mut records = Vec::new();
        for item in &items {
            // The search endpoint mixes pull requests into the listing;
            // only plain items carry review notices.
            if item.pull_request.is_some() {
                continue;
            }
            let comments = self.fetch_comments(item.number).await?;
            let before = records.len();
            records.extend(
                comments
                    .iter()
                    .filter_map(|comment| self.record_from_comment(item, comment)),
            );
            debug!(
                item = item.number,
                notices = records.len() - before,
                "item comments scanned"
            );
        }

        info!(records = records.len(), "tracker scan complete");
        Ok(records)
    }
}

/// First line of a comment body that carries a notice marker.
fn marker_line(body: &str) -> Option<&str> {
    body.lines().find(|line| classify_marker(line).is_some())
}

/// The cycle token that follows the marker, stripped of its `W` prefix and
/// of trailing punctuation: `"... Approved in W32."` yields `"32"`.
fn week_token(line: &str) -> Option<String> {
    let rest = line
        .split_once(APPROVED_MARKER)
        .or_else(|| line.split_once(REJECTED_MARKER))
        .map(|(_, rest)| rest)?;
    let token = rest.split_whitespace().next()?;
    let digits = token
        .strip_prefix(CYCLE_WEEK_PREFIX)?
        .trim_end_matches(|c: char| !c.is_ascii_digit());
    if digits.is_empty() {
        None
    } else {
        Some(digits.to_string())
    }
}

fn label_value(labels: &[Label], prefix: &str) -> Option<String> {
    labels
        .iter()
        .find_map(|label| label.name.strip_prefix(prefix).map(str::to_string))
}

fn state_name(state: &IssueState) -> &'static str {
    match state {
        IssueState::Open => "Open",
        IssueState::Closed => "Closed",
        _ => "Unknown",
    }
}
