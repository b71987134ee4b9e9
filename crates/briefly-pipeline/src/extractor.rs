use std::sync::LazyLock;

use briefly_core::error::BrieflyError;
use briefly_core::store::Store;
use briefly_core::types::{ExtractedContent, RawItem, RawItemStatus};
use regex::Regex;
use scraper::{Html, Selector};
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use std::sync::Arc;

const FETCH_TIMEOUT_SECS: u64 = 30;
const MIN_WORD_COUNT: usize = 50;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; BrieflyBot/0.1; +https://briefly.example/bot)";

static UNEXTRACTABLE_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(twitter\.com|x\.com|youtube\.com|youtu\.be|reddit\.com|news\.ycombinator\.com)")
        .unwrap()
});

/// Two-pass HTML cleanup: a precision-favoring pass, then a readability
/// fallback, both gated on a minimum word count (spec §4.2).
pub struct ContentExtractor {
    http: reqwest::Client,
    store: Arc<dyn Store>,
}

impl ContentExtractor {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
                .user_agent(USER_AGENT)
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()
                .expect("reqwest client builds"),
            store,
        }
    }

    pub async fn run_pending(&self, limit: i64) -> Result<usize, BrieflyError> {
        let items = self.store.fetch_pending(RawItemStatus::New, limit).await?;
        let mut processed = 0usize;
        for item in items {
            self.extract_item(&item).await?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Always advances the item to `extracted`, whether or not a body was
    /// recovered — the extractor is non-blocking for downstream stages.
    pub async fn extract_item(&self, item: &RawItem) -> Result<(), BrieflyError> {
        let Some(url) = item.url.as_deref() else {
            self.store.advance_status(item.id, RawItemStatus::Extracted).await?;
            return Ok(());
        };

        if is_unextractable(url) {
            self.store.advance_status(item.id, RawItemStatus::Extracted).await?;
            return Ok(());
        }

        match self.fetch_and_extract(item.id, url).await {
            Ok(Some(content)) => self.store.upsert_extracted_content(&content).await?,
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(raw_item_id = %item.id, error = %err, "extraction failed, advancing anyway");
            }
        }

        self.store.advance_status(item.id, RawItemStatus::Extracted).await?;
        Ok(())
    }

    async fn fetch_and_extract(
        &self,
        raw_item_id: uuid::Uuid,
        url: &str,
    ) -> Result<Option<ExtractedContent>, BrieflyError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?;
        let final_url = response.url().to_string();
        let html = response
            .bytes()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?;

        if let Some((text, word_count)) = primary_pass(&html, &final_url) {
            if word_count > MIN_WORD_COUNT {
                return Ok(Some(ExtractedContent {
                    raw_item_id,
                    final_url,
                    text,
                    word_count: word_count as i32,
                    method: "readability_markdown".to_string(),
                    quality: 0.9,
                    created_at: chrono::Utc::now(),
                }));
            }
        }

        if let Some((text, word_count)) = fallback_pass(&html) {
            if word_count > MIN_WORD_COUNT {
                return Ok(Some(ExtractedContent {
                    raw_item_id,
                    final_url,
                    text,
                    word_count: word_count as i32,
                    method: "plain_text_flatten".to_string(),
                    quality: 0.7,
                    created_at: chrono::Utc::now(),
                }));
            }
        }

        Ok(None)
    }
}

fn is_unextractable(url: &str) -> bool {
    UNEXTRACTABLE_DOMAIN.is_match(url)
}

fn primary_pass(html: &[u8], url: &str) -> Option<(String, usize)> {
    let parsed_url = url::Url::parse(url).ok();
    let config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html,
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };
    let text = transform_content_input(input, &config);
    let word_count = text.split_whitespace().count();
    if text.trim().is_empty() {
        None
    } else {
        Some((text, word_count))
    }
}

fn fallback_pass(html: &[u8]) -> Option<(String, usize)> {
    let html_str = String::from_utf8_lossy(html);
    let document = Html::parse_document(&html_str);
    let body_selector = Selector::parse("body").ok()?;
    let text: String = document
        .select(&body_selector)
        .next()?
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let word_count = collapsed.split_whitespace().count();
    if collapsed.is_empty() {
        None
    } else {
        Some((collapsed, word_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_known_unextractable_domains() {
        assert!(is_unextractable("https://twitter.com/foo/status/1"));
        assert!(is_unextractable("https://x.com/foo/status/1"));
        assert!(is_unextractable("https://www.youtube.com/watch?v=abc"));
        assert!(is_unextractable("https://reddit.com/r/rust/comments/1"));
        assert!(is_unextractable("https://news.ycombinator.com/item?id=123"));
        assert!(!is_unextractable("https://example.com/article"));
    }

    #[test]
    fn fallback_pass_extracts_body_text() {
        let html = b"<html><body><p>Hello world, this is a test of the fallback extraction pass with enough words to pass the minimum word count gate for sure absolutely definitely.</p></body></html>";
        let (text, count) = fallback_pass(html).unwrap();
        assert!(text.contains("Hello world"));
        assert!(count > 10);
    }
}
