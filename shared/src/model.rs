use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::form::RegistrationForm;
use crate::router::Route;
use crate::{AppError, ErrorKind, NONE_SELECTED};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

impl From<CoordinateError> for AppError {
    fn from(e: CoordinateError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

/// Validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lng(self) -> f64 {
        self.lng
    }

    /// Latitude as sent in the registration payload.
    #[must_use]
    pub fn latitude_field(self) -> String {
        decimal_string(self.lat)
    }

    /// Longitude as sent in the registration payload.
    #[must_use]
    pub fn longitude_field(self) -> String {
        decimal_string(self.lng)
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self { lat: 0.0, lng: 0.0 }
    }
}

impl TryFrom<(f64, f64)> for Coordinate {
    type Error = CoordinateError;

    fn try_from((lat, lng): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(lat, lng)
    }
}

// Shortest round-trip form: 1.0 -> "1", -23.55 -> "-23.55". Negative zero is
// written as "0".
#[allow(clippy::float_cmp)]
fn decimal_string(value: f64) -> String {
    if value == 0.0 {
        "0".into()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("selection value cannot be empty")]
    Empty,
}

/// A dropdown value where `"0"` means nothing is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    None,
    Value(String),
}

impl Selection {
    pub fn parse(raw: &str) -> Result<Self, SelectionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SelectionError::Empty);
        }
        if trimmed == NONE_SELECTED {
            return Ok(Self::None);
        }
        Ok(Self::Value(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => NONE_SELECTED,
            Self::Value(v) => v,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Value(v) => Some(v),
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[derive(Debug, Clone)]
pub enum Page {
    /// Placeholder shown while the shell loads the page for `Route`.
    Loading(Route),
    Home,
    CreatePoint(Box<RegistrationForm>),
    NotFound,
}

impl Page {
    #[must_use]
    pub const fn route(&self) -> Option<Route> {
        match self {
            Self::Loading(route) => Some(*route),
            Self::Home => Some(Route::Home),
            Self::CreatePoint(_) => Some(Route::CreatePoint),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    pub config: Config,
    pub page: Page,
    pub active_error: Option<AppError>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            config: Config::default(),
            page: Page::Loading(Route::Home),
            active_error: None,
        }
    }
}

impl Model {
    pub fn form_mut(&mut self) -> Option<&mut RegistrationForm> {
        match &mut self.page {
            Page::CreatePoint(form) => Some(form),
            _ => None,
        }
    }

    #[must_use]
    pub fn form(&self) -> Option<&RegistrationForm> {
        match &self.page {
            Page::CreatePoint(form) => Some(form),
            _ => None,
        }
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }
}
