use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::api::DEFAULT_API_URL;
use crate::cli::GlobalArgs;
use crate::listing::DEFAULT_PAGE_SIZE;

pub const ENV_API_URL: &str = "MEALBOOK_API_URL";
pub const ENV_DATA_DIR: &str = "MEALBOOK_DATA_DIR";
pub const ENV_PAGE_SIZE: &str = "MEALBOOK_PAGE_SIZE";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "MEALBOOK_HTTP_TIMEOUT_SECS";

const DEFAULT_DATA_DIR: &str = ".mealbook";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: Url,
    pub data_dir: PathBuf,
    pub page_size: usize,
    /// No timeout unless configured; a hung request stalls only its own fetch.
    pub http_timeout: Option<Duration>,
}

impl Config {
    /// Defaults, then environment, then command-line flags.
    pub fn resolve(args: &GlobalArgs) -> anyhow::Result<Self> {
        Self::resolve_with(args, |name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(args: &GlobalArgs, env: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let api_url = match args.api_url.clone().or_else(|| env(ENV_API_URL)) {
            Some(raw) => parse_api_url(&raw)
                .with_context(|| format!("invalid api url (--api-url / {ENV_API_URL})"))?,
            None => parse_api_url(DEFAULT_API_URL)?,
        };

        let data_dir = args
            .data_dir
            .clone()
            .or_else(|| env(ENV_DATA_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let page_size = match args.page_size {
            Some(size) => size,
            None => match env(ENV_PAGE_SIZE) {
                Some(raw) => parse_positive(&raw)
                    .with_context(|| format!("invalid {ENV_PAGE_SIZE}={raw:?}"))?,
                None => DEFAULT_PAGE_SIZE,
            },
        };
        if page_size == 0 {
            anyhow::bail!("page size must be at least 1");
        }

        let http_timeout = match env(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => Some(Duration::from_secs(
                parse_positive(&raw)
                    .with_context(|| format!("invalid {ENV_HTTP_TIMEOUT_SECS}={raw:?}"))?
                    as u64,
            )),
            None => None,
        };

        Ok(Self {
            api_url,
            data_dir,
            page_size,
            http_timeout,
        })
    }
}

fn parse_api_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("parse url: {raw}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("api url must be http/https: {url}");
    }
    Ok(url)
}

fn parse_positive(raw: &str) -> anyhow::Result<usize> {
    let value: usize = raw.trim().parse().context("expected a positive integer")?;
    if value == 0 {
        anyhow::bail!("expected a positive integer, got 0");
    }
    Ok(value)
}
