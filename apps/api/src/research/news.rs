//! News search behind a trait so the research pipeline can run against a fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::companies::service::NewSource;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
pub const MAX_RESULTS: usize = 8;
/// Only articles from the last N days are requested.
const NEWS_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("News API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[async_trait]
pub trait NewsSearch: Send + Sync {
    async fn search(&self, company_name: &str) -> Result<Vec<NewSource>, NewsError>;
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: String,
    topic: &'static str,
    days: u32,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
}

/// Tavily search API client.
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
}

impl TavilyClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            api_key,
        })
    }
}

#[async_trait]
impl NewsSearch for TavilyClient {
    async fn search(&self, company_name: &str) -> Result<Vec<NewSource>, NewsError> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query: format!("{company_name} company news"),
            topic: "news",
            days: NEWS_WINDOW_DAYS,
            max_results: MAX_RESULTS,
        };

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NewsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: TavilyResponse = response.json().await?;
        debug!(
            "Tavily returned {} results for {company_name}",
            body.results.len()
        );
        Ok(body.results.into_iter().filter_map(into_source).collect())
    }
}

fn into_source(result: TavilyResult) -> Option<NewSource> {
    let url = result.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return None;
    }
    let title = result.title.trim();
    Some(NewSource {
        title: (if title.is_empty() { url } else { title }).to_string(),
        url: url.to_string(),
        snippet: result
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        published_at: result.published_date.as_deref().and_then(parse_published),
    })
}

/// Accepts RFC 3339 and RFC 2822 timestamps; anything else is dropped.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_published_formats() {
        let rfc2822 = parse_published("Mon, 14 Oct 2024 09:30:00 GMT").unwrap();
        assert_eq!(
            (rfc2822.year(), rfc2822.month(), rfc2822.day()),
            (2024, 10, 14)
        );
        assert_eq!(rfc2822.hour(), 9);

        let rfc3339 = parse_published("2024-10-14T09:30:00+09:00").unwrap();
        assert_eq!(rfc3339.hour(), 0);

        assert!(parse_published("last Tuesday").is_none());
    }

    #[test]
    fn test_into_source_filters_and_cleans() {
        let ok = into_source(TavilyResult {
            title: "  ".to_string(),
            url: " https://news.example.com/a ".to_string(),
            content: Some("  ".to_string()),
            published_date: None,
        })
        .unwrap();
        assert_eq!(ok.title, "https://news.example.com/a");
        assert_eq!(ok.snippet, None);

        assert!(into_source(TavilyResult {
            title: "bad".to_string(),
            url: "javascript:alert(1)".to_string(),
            content: None,
            published_date: None,
        })
        .is_none());
    }

    #[test]
    fn test_tavily_response_tolerates_missing_fields() {
        let body: TavilyResponse =
            serde_json::from_str(r#"{"results":[{"title":"t","url":"https://x.io"}]}"#).unwrap();
        assert_eq!(body.results.len(), 1);
        let empty: TavilyResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.results.is_empty());
    }
}
