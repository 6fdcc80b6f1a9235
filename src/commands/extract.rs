//! Article metadata extraction from published Second Thoughts pages

use anyhow::Result;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Only articles under this prefix can be imported
pub const ARTICLE_URL_PREFIX: &str = "https://secondthoughts.ai/p/";

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"(?is)<title\b([^>]*)>(.*?)</title>").unwrap();
    static ref META_RE: Regex = Regex::new(r"(?i)<meta\b([^>]*)>").unwrap();
    static ref ATTR_RE: Regex = Regex::new(
        r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#
    )
    .unwrap();
    static ref DATE_PUBLISHED_RE: Regex =
        Regex::new(r#""datePublished":"(\d{4}-\d{2}-\d{2})T[^"]*""#).unwrap();
}

/// Metadata scraped from an article page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleInfo {
    pub slug: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Slug of an article URL, the path segment after `/p/`
pub fn slug_from_url(url: &str) -> Result<String> {
    let Some(rest) = url.strip_prefix(ARTICLE_URL_PREFIX) else {
        anyhow::bail!("URL must start with {}", ARTICLE_URL_PREFIX);
    };

    let slug = rest
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    if slug.is_empty() {
        anyhow::bail!("URL must include a path after /p/");
    }
    Ok(slug.to_string())
}

/// Pull article metadata out of a page's HTML.
///
/// Title and description only count when set by the page's head manager
/// (`data-rh` or `data-preact-helmet`); the site-wide defaults carry neither.
pub fn parse_article(slug: &str, html: &str) -> ArticleInfo {
    let mut info = ArticleInfo {
        slug: slug.to_string(),
        ..Default::default()
    };

    for cap in TITLE_RE.captures_iter(html) {
        if is_managed(&parse_attrs(&cap[1])) {
            info.title = non_empty(unescape(cap[2].trim()));
        }
    }

    for cap in META_RE.captures_iter(html) {
        let attrs = parse_attrs(&cap[1]);
        match attrs.get("name").map(String::as_str) {
            Some("description") if is_managed(&attrs) => {
                info.subtitle = attrs.get("content").cloned().and_then(non_empty);
            }
            Some("author") => {
                info.author = attrs.get("content").cloned().and_then(non_empty);
            }
            _ => {}
        }
    }

    info.date = DATE_PUBLISHED_RE
        .captures(html)
        .and_then(|cap| NaiveDate::parse_from_str(&cap[1], "%Y-%m-%d").ok());

    info
}

/// Fetch an article page and extract its metadata
pub async fn fetch_article(url: &str) -> Result<ArticleInfo> {
    let slug = slug_from_url(url)?;

    tracing::info!("Fetching {}", url);
    let response = reqwest::Client::new()
        .get(url)
        .header(reqwest::header::USER_AGENT, "Mozilla/5.0")
        .send()
        .await?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to fetch {}: {}", url, response.status());
    }

    let html = response.text().await?;
    Ok(parse_article(&slug, &html))
}

fn is_managed(attrs: &HashMap<String, String>) -> bool {
    attrs.contains_key("data-rh") || attrs.contains_key("data-preact-helmet")
}

fn parse_attrs(raw: &str) -> HashMap<String, String> {
    ATTR_RE
        .captures_iter(raw)
        .map(|cap| {
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| unescape(m.as_str()))
                .unwrap_or_default();
            (cap[1].to_ascii_lowercase(), value)
        })
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Decode the character references that show up in head metadata
fn unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<!DOCTYPE html>
<html><head>
<title>Second Thoughts</title>
<meta name="description" content="A newsletter about AI">
<title data-rh="true">AI Agents Need Security &amp; Trust</title>
<meta data-rh="true" name="description" content="Why &quot;agents&quot; change the threat model"/>
<meta name="author" content="Jane Doe">
<script type="application/ld+json">{"@type":"NewsArticle","datePublished":"2024-06-03T12:30:00.000Z","dateModified":"2024-06-05T08:00:00.000Z"}</script>
</head><body></body></html>"#;

    #[test]
    fn test_slug_from_url() {
        assert_eq!(
            slug_from_url("https://secondthoughts.ai/p/ai-agent-security").unwrap(),
            "ai-agent-security"
        );
        assert_eq!(
            slug_from_url("https://secondthoughts.ai/p/ai-agent-security/?utm_source=x").unwrap(),
            "ai-agent-security"
        );
        assert!(slug_from_url("https://example.com/p/other").is_err());
        assert!(slug_from_url("https://secondthoughts.ai/p/").is_err());
    }

    #[test]
    fn test_parse_article() {
        let info = parse_article("ai-agent-security", ARTICLE);
        assert_eq!(info.slug, "ai-agent-security");
        assert_eq!(info.title.as_deref(), Some("AI Agents Need Security & Trust"));
        assert_eq!(
            info.subtitle.as_deref(),
            Some("Why \"agents\" change the threat model")
        );
        assert_eq!(info.author.as_deref(), Some("Jane Doe"));
        assert_eq!(info.date, NaiveDate::from_ymd_opt(2024, 6, 3));
    }

    #[test]
    fn test_unmanaged_tags_ignored() {
        let html = r#"<title>Site</title><meta name="description" content="Default">"#;
        let info = parse_article("x", html);
        assert_eq!(info.title, None);
        assert_eq!(info.subtitle, None);
        assert_eq!(info.author, None);
        assert_eq!(info.date, None);
    }

    #[test]
    fn test_preact_helmet_and_single_quotes() {
        let html = r#"<title data-preact-helmet>Helmet Title</title>
<meta data-preact-helmet name='description' content='Sub'>
<meta content="A. Writer" name=author>"#;
        let info = parse_article("x", html);
        assert_eq!(info.title.as_deref(), Some("Helmet Title"));
        assert_eq!(info.subtitle.as_deref(), Some("Sub"));
        assert_eq!(info.author.as_deref(), Some("A. Writer"));
    }
}
