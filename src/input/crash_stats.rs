//! crash-stats.mozilla.com client.
//!
//! GET https://<host>/dumps/<id>.jsonz returns the processed crash as JSON;
//! its `dump` field holds `minidump_stackwalk -m` output.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::report::html::{html_escape, html_link};

pub const CRASH_STATS_HOST: &str = "crash-stats.mozilla.com";

#[derive(Debug, Deserialize)]
struct ProcessedCrash {
    dump: Option<String>,
}

pub struct CrashStatsClient {
    http: reqwest::blocking::Client,
    host: String,
}

impl CrashStatsClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            host: CRASH_STATS_HOST.to_string(),
        })
    }

    pub fn dump_url(&self, crash_id: &str) -> String {
        format!("https://{}/dumps/{}.jsonz", self.host, crash_id)
    }

    pub fn report_url(&self, crash_id: &str) -> String {
        format!("https://{}/report/index/{}", self.host, crash_id)
    }

    /// `<h1>` linking back to the report page.
    pub fn report_heading(&self, crash_id: &str) -> String {
        format!(
            "<h1>Stack Blame for {}</h1>",
            html_link(
                &self.report_url(crash_id),
                &html_escape(&format!("bp-{}", crash_id)),
                Some("crashreport"),
                None
            )
        )
    }

    pub fn fetch_dump(&self, crash_id: &str) -> Result<String> {
        let url = self.dump_url(crash_id);
        tracing::info!("GET {}", url);

        let body = self.http.get(&url).send()?.error_for_status()?.text()?;
        extract_dump(&body)
    }
}

/// Pull the stack dump text out of a processed crash payload.
pub fn extract_dump(body: &str) -> Result<String> {
    let crash: ProcessedCrash = serde_json::from_str(body)
        .map_err(|e| AppError::Network(format!("crash report is not valid JSON: {}", e)))?;

    crash
        .dump
        .ok_or_else(|| AppError::Network("crash report has no `dump` field".to_string()))
}
