// Dashboard pages, read once at startup and validated by a process-start ETag

use crate::config::PagesConfig;
use anyhow::Context;

#[derive(Debug, Clone)]
pub struct PageCache {
    etag: String,
    index_html: String,
    stats_html: String,
}

impl PageCache {
    pub fn new(etag: impl Into<String>, index_html: impl Into<String>, stats_html: impl Into<String>) -> Self {
        Self {
            etag: etag.into(),
            index_html: index_html.into(),
            stats_html: stats_html.into(),
        }
    }

    /// Reads both pages; the ETag is the process start time in unix seconds.
    pub fn load(config: &PagesConfig) -> anyhow::Result<Self> {
        let index_html = std::fs::read_to_string(&config.index_path)
            .with_context(|| format!("reading {}", config.index_path.display()))?;
        let stats_html = std::fs::read_to_string(&config.stats_path)
            .with_context(|| format!("reading {}", config.stats_path.display()))?;
        let etag = chrono::Utc::now().timestamp().to_string();
        Ok(Self::new(etag, index_html, stats_html))
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }

    pub fn index_html(&self) -> &str {
        &self.index_html
    }

    pub fn stats_html(&self) -> &str {
        &self.stats_html
    }

    /// True when the client already holds the current version.
    pub fn is_fresh(&self, client_tag: Option<&str>) -> bool {
        client_tag.is_some_and(|tag| tag.trim().trim_matches('"') == self.etag)
    }
}
