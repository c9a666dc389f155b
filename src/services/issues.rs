use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueId {
    Number(u64),
    Text(String),
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueId::Number(n) => write!(f, "{n}"),
            IssueId::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub file: String,
}

/// A public issue as returned by the listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: IssueId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<String>,
    pub category: Option<String>,
    pub grama_niladhari_division: Option<String>,
    pub ds_division: Option<String>,
    pub district: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl IssueRecord {
    /// "in_progress" -> "IN PROGRESS"; missing status reads as OPEN
    pub fn status_label(&self) -> String {
        non_empty(&self.status)
            .map(|s| s.replacen('_', " ", 1).to_uppercase())
            .unwrap_or_else(|| "OPEN".to_string())
    }

    /// Most specific administrative area available
    pub fn location_label(&self) -> &str {
        non_empty(&self.grama_niladhari_division)
            .or_else(|| non_empty(&self.ds_division))
            .or_else(|| non_empty(&self.district))
            .unwrap_or("Location")
    }

    pub fn category_label(&self) -> &str {
        non_empty(&self.category).unwrap_or("General Issue")
    }

    /// URL of the first attachment, if any
    pub fn thumbnail_url(&self, media_base_url: &str) -> Option<String> {
        self.attachments
            .first()
            .filter(|a| !a.file.is_empty())
            .map(|a| format!("{}{}", media_base_url, a.file))
    }

    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }
}

/// Listing responses come either paginated or as a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IssueListResponse {
    Paginated { results: Vec<IssueRecord> },
    Plain(Vec<IssueRecord>),
}

impl IssueListResponse {
    fn into_records(self) -> Vec<IssueRecord> {
        match self {
            IssueListResponse::Paginated { results } => results,
            IssueListResponse::Plain(records) => records,
        }
    }
}

pub fn parse_issue_list(body: &str, limit: usize) -> Result<Vec<IssueRecord>> {
    let response: IssueListResponse =
        serde_json::from_str(body).context("unexpected issue list body")?;
    let mut records = response.into_records();
    records.truncate(limit);
    Ok(records)
}

/// Read-only client for the public issue listing
pub struct IssuesClient {
    http_client: reqwest::Client,
    base_url: String,
    media_base_url: String,
}

impl IssuesClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.issues_api_url.clone(),
            media_base_url: config.media_base_url.clone(),
        })
    }

    pub fn media_base_url(&self) -> &str {
        &self.media_base_url
    }

    /// Newest public issues, at most `limit`
    pub async fn latest(&self, limit: usize) -> Result<Vec<IssueRecord>> {
        let limit_param = limit.to_string();
        let response = self
            .http_client
            .get(format!("{}/issues/", self.base_url))
            .query(&[("limit", limit_param.as_str()), ("ordering", "-created_at")])
            .send()
            .await
            .context("issue list request failed")?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            anyhow::bail!("issue list error: {}", status);
        }

        let records = parse_issue_list(&body, limit)?;
        log::debug!("Fetched {} public issues", records.len());
        Ok(records)
    }
}

/// Plain-text "latest issues" block
pub fn format_preview(issues: &[IssueRecord], media_base_url: &str) -> String {
    if issues.is_empty() {
        return "No public issues found".to_string();
    }

    let mut result = "Latest public issues:\n".to_string();
    for issue in issues {
        result.push_str(&format!(
            "• #{} [{}] {}\n  {} · {}",
            issue.id,
            issue.status_label(),
            issue.title,
            issue.location_label(),
            issue.category_label()
        ));
        if let Some(created) = issue.created() {
            result.push_str(&format!(" · {}", created.format("%Y-%m-%d")));
        }
        result.push('\n');
        if !issue.description.is_empty() {
            result.push_str(&format!("  {}\n", issue.description));
        }
        if let Some(url) = issue.thumbnail_url(media_base_url) {
            result.push_str(&format!("  {}\n", url));
        }
    }

    result
}
