use crate::config::Config;
use crate::models::{Category, MovieDetails, MovieSummary, ProviderInfo};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("not found on TMDB")]
    NotFound,
    #[error("TMDB rejected the API key")]
    Unauthorized,
    #[error("TMDB returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("JSON parse failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("fetch task aborted: {0}")]
    Aborted(String),
}

impl TmdbError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TmdbError::NotFound)
    }
}

// Object-safe so views and tests can swap in fakes.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn movie_list(&self, category: Category, page: u32)
        -> Result<Vec<MovieSummary>, TmdbError>;
    async fn movie_details(&self, id: i32) -> Result<MovieDetails, TmdbError>;
    async fn watch_providers(&self, id: i32) -> Result<ProviderInfo, TmdbError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    config: Config,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<MovieSummary>,
}

#[derive(Debug, Deserialize)]
struct ProvidersResponse {
    #[serde(default)]
    results: HashMap<String, ProviderInfo>,
}

impl TmdbClient {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let user_agent = format!("marquee/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self { client, config })
    }

    // The key is left out entirely when unset.
    fn url(&self, path: &str, extra: &[(&str, String)]) -> String {
        let mut params: Vec<String> = Vec::with_capacity(extra.len() + 1);
        if let Some(key) = &self.config.api_key {
            params.push(format!("api_key={}", urlencoding::encode(key)));
        }
        for (k, v) in extra {
            params.push(format!("{}={}", k, urlencoding::encode(v)));
        }
        if params.is_empty() {
            format!("{}{}", self.config.api_base, path)
        } else {
            format!("{}{}?{}", self.config.api_base, path, params.join("&"))
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, TmdbError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        match status {
            s if s.is_success() => Ok(serde_json::from_str(&text)?),
            StatusCode::NOT_FOUND => Err(TmdbError::NotFound),
            StatusCode::UNAUTHORIZED => Err(TmdbError::Unauthorized),
            status => Err(TmdbError::Status { status, body: text }),
        }
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn movie_list(
        &self,
        category: Category,
        page: u32,
    ) -> Result<Vec<MovieSummary>, TmdbError> {
        debug!(category = %category, page, "Fetching movie list");
        let url = self.url(
            &format!("/movie/{}", category.path_segment()),
            &[
                ("language", self.config.language.clone()),
                ("page", page.max(1).to_string()),
            ],
        );
        let data: ListResponse = self.get_json(&url).await?;
        Ok(data.results)
    }

    async fn movie_details(&self, id: i32) -> Result<MovieDetails, TmdbError> {
        debug!(id, "Fetching movie details");
        let url = self.url(
            &format!("/movie/{id}"),
            &[("append_to_response", "credits".to_string())],
        );
        self.get_json(&url).await
    }

    async fn watch_providers(&self, id: i32) -> Result<ProviderInfo, TmdbError> {
        debug!(id, region = %self.config.region, "Fetching watch providers");
        let url = self.url(&format!("/movie/{id}/watch/providers"), &[]);
        let mut data: ProvidersResponse = self.get_json(&url).await?;
        Ok(data
            .results
            .remove(&self.config.region)
            .unwrap_or_default())
    }
}

pub fn parse_tmdb_id(input: &str) -> Option<i32> {
    let input = input.trim();
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return input.parse().ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: Option<&str>) -> TmdbClient {
        let mut config = Config::default().with_api_base("http://tmdb.test/3");
        config.api_key = key.map(str::to_string);
        TmdbClient::new(config).expect("client")
    }

    #[test]
    fn builds_detail_url_with_credits() {
        let c = client(Some("k3y"));
        assert_eq!(
            c.url("/movie/550", &[("append_to_response", "credits".to_string())]),
            "http://tmdb.test/3/movie/550?api_key=k3y&append_to_response=credits"
        );
    }

    #[test]
    fn omits_key_when_unset() {
        let c = client(None);
        assert_eq!(
            c.url("/movie/550/watch/providers", &[]),
            "http://tmdb.test/3/movie/550/watch/providers"
        );
    }

    #[test]
    fn parses_tmdb_id_only_for_digits() {
        assert_eq!(parse_tmdb_id("550"), Some(550));
        assert_eq!(parse_tmdb_id(" 27205 "), Some(27205));
        assert_eq!(parse_tmdb_id("tt0137523"), None);
        assert_eq!(parse_tmdb_id(""), None);
        assert_eq!(parse_tmdb_id("99999999999"), None);
    }
}
