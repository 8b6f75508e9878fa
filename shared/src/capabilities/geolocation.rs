use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Coordinate;
use crate::{AppError, ErrorKind};

pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

/// Device position lookup, answered by the shell.
#[derive(Clone)]
pub struct Geolocation<E> {
    context: CapabilityContext<GeolocationOperation, E>,
}

impl<Ev> Capability<Ev> for Geolocation<Ev> {
    type Operation = GeolocationOperation;
    type MappedSelf<MappedEv> = Geolocation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geolocation::new(self.context.map_event(f))
    }
}

impl<E> Geolocation<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<GeolocationOperation, E>) -> Self {
        Self { context }
    }

    pub fn current_position<F>(&self, options: PositionOptions, callback: F)
    where
        F: FnOnce(GeolocationResult) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(GeolocationOperation::CurrentPosition(options))
                .await;
            ctx.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u32,
    /// Accept a cached position no older than this.
    pub maximum_age_ms: u32,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            maximum_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum GeolocationOperation {
    CurrentPosition(PositionOptions),
}

impl Operation for GeolocationOperation {
    type Output = GeolocationResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
}

impl TryFrom<Position> for Coordinate {
    type Error = AppError;

    fn try_from(p: Position) -> Result<Self, Self::Error> {
        Coordinate::new(p.latitude, p.longitude).map_err(|e| {
            AppError::new(ErrorKind::Location, "device reported an invalid position")
                .with_internal(e.to_string())
        })
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {message}")]
    PositionUnavailable { message: String },

    #[error("location request timed out")]
    Timeout,

    #[error("geolocation not supported on this platform")]
    NotSupported,
}

impl From<GeolocationError> for AppError {
    fn from(e: GeolocationError) -> Self {
        let kind = match e {
            GeolocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            GeolocationError::PositionUnavailable { .. }
            | GeolocationError::Timeout
            | GeolocationError::NotSupported => ErrorKind::Location,
        };
        AppError::new(kind, e.to_string())
    }
}

pub type GeolocationResult = Result<Position, GeolocationError>;
