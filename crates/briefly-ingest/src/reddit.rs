use std::sync::Arc;

use async_trait::async_trait;
use briefly_core::error::BrieflyError;
use briefly_core::types::{ItemKind, NormalizedItem, Source};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::Ingester;

const BASE_URL: &str = "https://oauth.reddit.com";
const AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const PUBLIC_BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RedditPost,
}

#[derive(Debug, Deserialize)]
struct RedditPost {
    id: String,
    title: String,
    url: Option<String>,
    permalink: String,
    selftext: Option<String>,
    author: Option<String>,
    subreddit: Option<String>,
    score: Option<i64>,
    upvote_ratio: Option<f64>,
    num_comments: Option<i64>,
    is_self: bool,
    created_utc: Option<f64>,
    link_flair_text: Option<String>,
    over_18: Option<bool>,
    spoiler: Option<bool>,
    #[serde(default)]
    removed_by_category: Option<String>,
}

/// Pulls subreddit listings (spec §4.1 reddit source type). Tries OAuth
/// client-credentials first; falls back to the public unauthenticated
/// `.json` endpoint (rate-limited, `limit` capped at 25) when no
/// credentials are configured or the token request fails.
pub struct RedditIngester {
    http: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    user_agent: String,
    max_items: usize,
    token: Arc<Mutex<Option<String>>>,
}

impl RedditIngester {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        user_agent: String,
        max_items: usize,
    ) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client builds"),
            client_id,
            client_secret,
            user_agent,
            max_items,
            token: Arc::new(Mutex::new(None)),
        }
    }

    async fn access_token(&self) -> Result<String, BrieflyError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                return Err(BrieflyError::MissingCapability(
                    "reddit OAuth credentials not configured".into(),
                ))
            }
        };

        let response = self
            .http
            .post(AUTH_URL)
            .basic_auth(client_id, Some(client_secret))
            .header("User-Agent", &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BrieflyError::TransientExternal(format!(
                "reddit token request failed: {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?;
        *guard = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    fn subreddit_and_sort(source: &Source) -> (String, String) {
        let subreddit = source
            .config
            .get("subreddit")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| extract_subreddit_from_url(&source.url))
            .unwrap_or_else(|| "programming".to_string());
        let sort = source
            .config
            .get("sort")
            .and_then(|v| v.as_str())
            .unwrap_or("hot")
            .to_string();
        (subreddit, sort)
    }

    async fn fetch_authenticated(
        &self,
        subreddit: &str,
        sort: &str,
    ) -> Result<Listing, BrieflyError> {
        let token = self.access_token().await?;
        let url = format!("{BASE_URL}/r/{subreddit}/{sort}");
        self.http
            .get(&url)
            .bearer_auth(token)
            .header("User-Agent", &self.user_agent)
            .query(&[("limit", self.max_items.to_string())])
            .send()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?
            .json()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))
    }

    async fn fetch_unauthenticated(
        &self,
        subreddit: &str,
        sort: &str,
    ) -> Result<Listing, BrieflyError> {
        let limit = self.max_items.min(25);
        let url = format!("{PUBLIC_BASE_URL}/r/{subreddit}/{sort}.json");
        self.http
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))?
            .json()
            .await
            .map_err(|e| BrieflyError::TransientExternal(e.to_string()))
    }
}

#[async_trait]
impl Ingester for RedditIngester {
    async fn fetch(&self, source: &Source) -> Result<Vec<NormalizedItem>, BrieflyError> {
        let (subreddit, sort) = Self::subreddit_and_sort(source);

        let listing = match self.fetch_authenticated(&subreddit, &sort).await {
            Ok(listing) => listing,
            Err(err) => {
                tracing::warn!(%subreddit, error = %err, "reddit oauth fetch failed, falling back to public endpoint");
                self.fetch_unauthenticated(&subreddit, &sort).await?
            }
        };

        let items = listing
            .data
            .children
            .into_iter()
            .map(|c| c.data)
            .filter(|post| {
                !post.title.is_empty()
                    && post.removed_by_category.is_none()
                    && post.selftext.as_deref() != Some("[removed]")
                    && post.selftext.as_deref() != Some("[deleted]")
            })
            .map(to_normalized)
            .collect();

        Ok(items)
    }
}

fn extract_subreddit_from_url(url: &str) -> Option<String> {
    let marker = "/r/";
    let idx = url.find(marker)?;
    let rest = &url[idx + marker.len()..];
    Some(rest.split('/').next()?.to_string())
}

fn to_normalized(post: RedditPost) -> NormalizedItem {
    let permalink_url = format!("https://reddit.com{}", post.permalink);
    let has_external_link = !post.is_self && post.url.as_deref() != Some(permalink_url.as_str());
    let kind = if has_external_link {
        ItemKind::Article
    } else {
        ItemKind::Post
    };

    let external_url = post.url.clone().unwrap_or_else(|| permalink_url.clone());
    let canonical_url = if has_external_link {
        Some(external_url.clone())
    } else {
        None
    };

    let raw_text = post.selftext.map(|t| t.chars().take(2000).collect());
    let published_at: Option<DateTime<Utc>> = post
        .created_utc
        .and_then(|t| Utc.timestamp_opt(t as i64, 0).single());

    NormalizedItem {
        external_id: post.id.clone(),
        url: Some(external_url),
        canonical_url,
        title: post.title,
        kind,
        raw_text,
        author: post.author,
        published_at,
        raw_payload: serde_json::json!({
            "reddit_id": post.id,
            "subreddit": post.subreddit,
            "score": post.score,
            "upvote_ratio": post.upvote_ratio,
            "num_comments": post.num_comments,
            "is_self": post.is_self,
            "link_flair_text": post.link_flair_text,
            "permalink": post.permalink,
            "over_18": post.over_18,
            "spoiler": post.spoiler,
        }),
    }
}
