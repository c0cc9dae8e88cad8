use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;
use crate::recipe::{CategoriesResponse, MealsResponse, Recipe};

pub const DEFAULT_API_URL: &str = "https://www.themealdb.com/api/json/v1/1";

/// Read-only view of the remote recipe API.
///
/// Empty or `null` results come back as `Ok` with nothing in them; only real
/// failures are errors.
#[async_trait]
pub trait RecipeApi: Send + Sync {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Recipe>, ApiError>;
    async fn lookup_by_id(&self, id: &str) -> Result<Option<Recipe>, ApiError>;
    async fn search_by_first_letter(&self, letter: char) -> Result<Vec<Recipe>, ApiError>;
    async fn list_categories(&self) -> Result<Vec<String>, ApiError>;
    async fn filter_by_category(&self, category: &str) -> Result<Vec<Recipe>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpRecipeApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRecipeApi {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("build recipe api http client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: Option<(&str, &str)>) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}"))?;
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let endpoint = url.to_string();
        tracing::debug!(%endpoint, "GET");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, "mealbook/0.1")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { endpoint, status });
        }

        let raw = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        serde_json::from_slice(&raw).map_err(|source| ApiError::Decode { endpoint, source })
    }

    async fn get_meals(&self, url: Url) -> Result<Vec<Recipe>, ApiError> {
        let response: MealsResponse = self.get_json(url).await?;
        Ok(response.into_recipes())
    }
}

#[async_trait]
impl RecipeApi for HttpRecipeApi {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Recipe>, ApiError> {
        let url = self.endpoint("search.php", Some(("s", term)))?;
        self.get_meals(url).await
    }

    async fn lookup_by_id(&self, id: &str) -> Result<Option<Recipe>, ApiError> {
        let url = self.endpoint("lookup.php", Some(("i", id)))?;
        Ok(self.get_meals(url).await?.into_iter().next())
    }

    async fn search_by_first_letter(&self, letter: char) -> Result<Vec<Recipe>, ApiError> {
        let letter = letter.to_ascii_lowercase().to_string();
        let url = self.endpoint("search.php", Some(("f", &letter)))?;
        self.get_meals(url).await
    }

    async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint("categories.php", None)?;
        let response: CategoriesResponse = self.get_json(url).await?;
        Ok(response
            .categories
            .unwrap_or_default()
            .into_iter()
            .map(|category| category.name)
            .collect())
    }

    async fn filter_by_category(&self, category: &str) -> Result<Vec<Recipe>, ApiError> {
        let url = self.endpoint("filter.php", Some(("c", category)))?;
        self.get_meals(url).await
    }
}
