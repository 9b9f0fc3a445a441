//! Aurora accessibility checklist retrieval.
//!
//! The checklist lives on the Aurora Design System site as an HTML page.
//! We fetch it, reduce it to structured text, and cache that on disk. When
//! the fetch fails the disk cache answers, and when that is also missing a
//! copy bundled into the binary does. The operation never errors.

use crate::config::{NetworkConfig, PathsConfig};
use crate::network::HttpClient;
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use tracing::{info, warn};

const AURORA_CHECKLIST_URL: &str =
    "https://appian-design.github.io/aurora/accessibility/checklist/";

const CHECKLIST_HEADER: &str = "\
# Appian A11y Checklist (Aurora Design System)
# Source: https://appian-design.github.io/aurora/accessibility/checklist/
# This is the authoritative checklist maintained by the Appian Accessibility team.

";

const BUNDLED_CHECKLIST: &str = include_str!("../resources/a11y-checklist.md");

/// Provider of the accessibility checklist text.
#[async_trait]
pub trait ChecklistSource: Send + Sync {
    /// The checklist, from the freshest source available.
    async fn fetch_or_fallback(&self) -> String;
}

/// Live Aurora site with disk-cache and bundled fallbacks.
pub struct AuroraChecklist {
    http: HttpClient,
    url: String,
    cache_path: PathBuf,
}

impl AuroraChecklist {
    pub fn new(cache_dir: impl Into<PathBuf>) -> crate::error::Result<Self> {
        Self::with_url(AURORA_CHECKLIST_URL, cache_dir)
    }

    /// Non-default checklist location, used by tests.
    pub fn with_url(
        url: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
    ) -> crate::error::Result<Self> {
        Ok(Self {
            http: HttpClient::with_timeout(NetworkConfig::CHECKLIST_TIMEOUT)?,
            url: url.into(),
            cache_path: cache_dir.into().join(PathsConfig::CHECKLIST_CACHE_FILENAME),
        })
    }

    async fn fetch_live(&self) -> crate::error::Result<String> {
        let response = self.http.get(&self.url).await?;
        let response = HttpClient::require_success(response, "Aurora checklist fetch")?;
        let html = response.text().await?;
        Ok(format!("{CHECKLIST_HEADER}{}", strip_html(&html)))
    }
}

#[async_trait]
impl ChecklistSource for AuroraChecklist {
    async fn fetch_or_fallback(&self) -> String {
        match self.fetch_live().await {
            Ok(text) => {
                if let Some(parent) = self.cache_path.parent() {
                    let _ = tokio::fs::create_dir_all(parent).await;
                }
                if let Err(e) = tokio::fs::write(&self.cache_path, &text).await {
                    warn!("Failed to cache Aurora checklist: {}", e);
                }
                text
            }
            Err(e) => {
                warn!("Failed to fetch Aurora checklist: {}", e);
                match tokio::fs::read_to_string(&self.cache_path).await {
                    Ok(cached) => {
                        info!("Using cached Aurora checklist");
                        cached
                    }
                    Err(_) => {
                        info!("Using bundled Aurora checklist");
                        BUNDLED_CHECKLIST.to_string()
                    }
                }
            }
        }
    }
}

/// Reduce the checklist page to plain text, one rule per line.
fn strip_html(html: &str) -> String {
    // Unwraps are on literal patterns.
    let script = Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    let style = Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();
    let line_break = Regex::new(r"(?i)<br\s*/?>").unwrap();
    let block_close = Regex::new(r"(?i)</(?:div|p|li|tr|h[1-6])>").unwrap();
    let any_tag = Regex::new(r"<[^>]+>").unwrap();

    let text = script.replace_all(html, "");
    let text = style.replace_all(&text, "");
    let text = line_break.replace_all(&text, "\n");
    let text = block_close.replace_all(&text, "\n");
    let text = any_tag.replace_all(&text, " ");

    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");

    // Collapse whitespace within lines, drop empty lines.
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
