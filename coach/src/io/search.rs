//! Web search capability for the planner and manager agents.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::io::config::SearchConfig;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Query in, ranked results out.
pub trait SearchTool {
    fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Search backed by the Tavily API.
pub struct TavilySearch {
    client: reqwest::blocking::Client,
    api_key: String,
    max_results: u32,
    search_depth: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

impl TavilySearch {
    pub fn new(config: &SearchConfig, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build search http client")?;
        Ok(Self {
            client,
            api_key,
            max_results: config.max_results,
            search_depth: config.search_depth.clone(),
        })
    }
}

impl SearchTool for TavilySearch {
    #[instrument(skip(self), fields(max_results = self.max_results))]
    fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
            "search_depth": self.search_depth,
        });
        let response = self
            .client
            .post(TAVILY_ENDPOINT)
            .json(&body)
            .send()
            .context("post tavily search")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            bail!("search api error {status}: {text}");
        }

        let parsed: TavilyResponse = response.json().context("parse tavily response")?;
        debug!(hits = parsed.results.len(), "search completed");
        Ok(parsed.results)
    }
}

/// Render hits as a numbered list for the model.
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let snippet = hit.content.replace('\n', " ");
            format!("{}. {} - {}\n   {}", i + 1, hit.title, hit.url, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
