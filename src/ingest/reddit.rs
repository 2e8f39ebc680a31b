//! Reddit API client — public JSON listing or OAuth client-credentials.
//!
//! The OAuth token lives in an explicit cache object behind a mutex inside
//! the client, refreshed lazily on expiry. Never global state.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

use crate::config::AppConfig;

/// Refresh the token this long before Reddit's stated expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(600);

const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const REDDIT_OAUTH_BASE: &str = "https://oauth.reddit.com";
const REDDIT_PUBLIC_BASE: &str = "https://old.reddit.com";

#[derive(Debug, Error)]
pub enum RedditError {
    #[error("Reddit API credentials not configured")]
    NotConfigured,

    #[error("Reddit OAuth failed ({status}): {body}")]
    OAuth { status: u16, body: String },

    #[error("Reddit API returned {status} for r/{subreddit}")]
    Api { status: u16, subreddit: String },

    #[error("Network error reaching Reddit: {0}")]
    Network(String),

    #[error("Failed to parse Reddit response: {0}")]
    ResponseParsing(String),
}

/// An image post pulled from a subreddit listing.
#[derive(Debug, Clone)]
pub struct RedditPost {
    pub title: String,
    pub url: String,
    pub permalink: String,
    pub score: i64,
    pub subreddit: String,
    pub author: String,
    pub created_utc: f64,
}

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// A cached OAuth token with its issuance time and TTL.
#[derive(Debug, Clone)]
pub struct CachedToken {
    token: String,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedToken {
    pub fn new(token: String, ttl: Duration) -> Self {
        Self {
            token,
            fetched_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() >= self.ttl
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

pub struct RedditClient {
    http: reqwest::Client,
    credentials: Option<RedditCredentials>,
    user_agent: String,
    token_cache: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    pub fn new(credentials: Option<RedditCredentials>, user_agent: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            credentials,
            user_agent: user_agent.to_string(),
            token_cache: Mutex::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let credentials = match (&config.reddit_client_id, &config.reddit_client_secret) {
            (Some(id), Some(secret)) => Some(RedditCredentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        };
        Self::new(credentials, &config.reddit_user_agent)
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Get a bearer token, reusing the cached one until it expires.
    async fn access_token(&self) -> Result<String, RedditError> {
        {
            let cache = self.token_cache.lock().expect("token cache poisoned");
            if let Some(cached) = cache.as_ref() {
                if !cached.is_expired() {
                    return Ok(cached.token().to_string());
                }
            }
        }

        let credentials = self
            .credentials
            .as_ref()
            .ok_or(RedditError::NotConfigured)?;

        tracing::info!("Requesting Reddit access token");
        let response = self
            .http
            .post(REDDIT_TOKEN_URL)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .header("User-Agent", &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| RedditError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RedditError::OAuth {
                status: status.as_u16(),
                body,
            });
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            #[serde(default)]
            expires_in: Option<u64>,
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| RedditError::ResponseParsing(e.to_string()))?;

        let ttl = Duration::from_secs(parsed.expires_in.unwrap_or(3600))
            .saturating_sub(TOKEN_EXPIRY_MARGIN);
        let token = parsed.access_token.clone();

        let mut cache = self.token_cache.lock().expect("token cache poisoned");
        *cache = Some(CachedToken::new(parsed.access_token, ttl));

        Ok(token)
    }

    /// Fetch the hot listing of a subreddit, keeping only image posts.
    ///
    /// Uses the OAuth endpoint when credentials are configured, otherwise
    /// the public JSON listing.
    pub async fn fetch_hot(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RedditPost>, RedditError> {
        let request = if self.has_credentials() {
            let token = self.access_token().await?;
            let url = format!("{REDDIT_OAUTH_BASE}/r/{subreddit}/hot?limit={limit}");
            self.http
                .get(url)
                .bearer_auth(token)
                .header("User-Agent", &self.user_agent)
        } else {
            let url = format!("{REDDIT_PUBLIC_BASE}/r/{subreddit}/hot.json?limit={limit}");
            self.http
                .get(url)
                .header("User-Agent", &self.user_agent)
                .header("Accept", "application/json, text/plain, */*")
        };

        let response = request
            .send()
            .await
            .map_err(|e| RedditError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RedditError::Api {
                status: status.as_u16(),
                subreddit: subreddit.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RedditError::Network(e.to_string()))?;

        let posts = parse_listing(&body)?;
        tracing::info!(
            subreddit,
            post_count = posts.len(),
            "Fetched subreddit listing"
        );
        Ok(posts)
    }
}

/// Whether a post URL looks like a directly-fetchable image: an image
/// extension, or one of Reddit's image hosts (which often omit extensions).
pub fn is_image_url(url: &str) -> bool {
    let path = url.split('?').next().unwrap_or(url);
    let image_extension = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .unwrap_or(false);
    image_extension
        || url.contains("i.redd.it")
        || url.contains("i.imgur.com")
        || url.contains("preview.redd.it")
}

// ── Listing wire shape ──────────────────────────────────────

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: RawPost,
}

#[derive(Deserialize)]
struct RawPost {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    created_utc: f64,
}

fn parse_listing(body: &str) -> Result<Vec<RedditPost>, RedditError> {
    let listing: Listing =
        serde_json::from_str(body).map_err(|e| RedditError::ResponseParsing(e.to_string()))?;

    Ok(listing
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .filter(|post| !post.url.is_empty() && is_image_url(&post.url))
        .map(|post| RedditPost {
            title: post.title,
            url: post.url,
            permalink: format!("https://www.reddit.com{}", post.permalink),
            score: post.score,
            subreddit: post.subreddit,
            author: post.author,
            created_utc: post.created_utc,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_detection() {
        assert!(is_image_url("https://i.redd.it/abc123.jpg"));
        assert!(is_image_url("https://example.com/pic.png"));
        assert!(is_image_url("https://example.com/pic.jpeg?width=640"));
        assert!(is_image_url("https://i.imgur.com/xyz"));
        assert!(is_image_url("https://preview.redd.it/def?format=pjpg"));
        assert!(!is_image_url("https://www.reddit.com/r/memes/comments/abc/"));
        assert!(!is_image_url("https://example.com/article.html"));
        assert!(!is_image_url("https://v.redd.it/video123"));
    }

    #[test]
    fn fresh_token_is_reused_expired_is_not() {
        let fresh = CachedToken::new("tok".to_string(), Duration::from_secs(3000));
        assert!(!fresh.is_expired());
        assert_eq!(fresh.token(), "tok");

        let expired = CachedToken::new("tok".to_string(), Duration::ZERO);
        assert!(expired.is_expired());
    }

    #[test]
    fn listing_parses_and_filters_non_images() {
        let body = r#"{
          "data": {
            "children": [
              {"data": {"title": "funny", "url": "https://i.redd.it/a.jpg",
                        "permalink": "/r/memes/comments/1/funny/", "score": 420,
                        "subreddit": "memes", "author": "u1", "created_utc": 1700000000.0}},
              {"data": {"title": "video", "url": "https://v.redd.it/clip",
                        "permalink": "/r/memes/comments/2/video/", "score": 999,
                        "subreddit": "memes", "author": "u2", "created_utc": 1700000001.0}},
              {"data": {"title": "imgur", "url": "https://i.imgur.com/b",
                        "permalink": "/r/memes/comments/3/imgur/", "score": 7,
                        "subreddit": "memes", "author": "u3", "created_utc": 1700000002.0}}
            ]
          }
        }"#;

        let posts = parse_listing(body).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "https://i.redd.it/a.jpg");
        assert_eq!(posts[0].score, 420);
        assert_eq!(
            posts[0].permalink,
            "https://www.reddit.com/r/memes/comments/1/funny/"
        );
    }

    #[test]
    fn malformed_listing_is_parse_error() {
        assert!(matches!(
            parse_listing("<html>rate limited</html>"),
            Err(RedditError::ResponseParsing(_))
        ));
    }

    #[test]
    fn client_without_credentials() {
        let client = RedditClient::new(None, "web:memecheck:test");
        assert!(!client.has_credentials());
    }
}
