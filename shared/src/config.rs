use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{AppError, ErrorKind};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3333";
pub const DEFAULT_GEOGRAPHY_BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";
pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base of the collection-point backend (`items`, `points`).
    pub api_base_url: String,
    /// Base of the geography service (`estados`, `municipios`).
    pub geography_base_url: String,
    pub map: MapConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            geography_base_url: DEFAULT_GEOGRAPHY_BASE_URL.to_string(),
            map: MapConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub zoom: f64,
    pub tile_url: String,
    pub attribution: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: 15.0,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"http://osm.org/copyright\">OpenStreetMap</a> contributors"
                .to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base(&self.api_base_url)?;
        parse_base(&self.geography_base_url)?;
        Ok(())
    }

    pub fn items_url(&self) -> Result<Url, ConfigError> {
        endpoint(&self.api_base_url, &["items"])
    }

    pub fn points_url(&self) -> Result<Url, ConfigError> {
        endpoint(&self.api_base_url, &["points"])
    }

    pub fn regions_url(&self) -> Result<Url, ConfigError> {
        let mut url = endpoint(&self.geography_base_url, &["estados"])?;
        url.query_pairs_mut().append_pair("orderBy", "nome");
        Ok(url)
    }

    pub fn cities_url(&self, region_code: &str) -> Result<Url, ConfigError> {
        endpoint(
            &self.geography_base_url,
            &["estados", region_code, "municipios"],
        )
    }
}

fn parse_base(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: truncate_url(raw),
        reason: reason.to_string(),
    };

    if raw.trim().is_empty() {
        return Err(invalid("URL cannot be empty"));
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(invalid("URL is too long"));
    }

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("only 'http' and 'https' are allowed"));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL must have a host"));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("credentials in URL are not allowed"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("base URL cannot carry a query or fragment"));
    }

    Ok(url)
}

fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ConfigError> {
    let mut url = parse_base(base)?;
    url.path_segments_mut()
        .map_err(|()| ConfigError::InvalidUrl {
            url: truncate_url(base),
            reason: "URL cannot be a base".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn truncate_url(url: &str) -> String {
    if url.len() <= 100 {
        url.to_string()
    } else {
        let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &url[..cut])
    }
}
