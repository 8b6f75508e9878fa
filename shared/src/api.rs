//! Wire types of the collection-point backend and the geography service, and
//! helpers that turn HTTP results into application results.

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult, ErrorKind};

/// A recyclable-material category offered for selection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: u32,
    pub image_url: String,
    pub title: String,
}

/// Federative unit (state) as returned by the geography service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub id: u32,
    #[serde(rename = "sigla")]
    pub code: String,
    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct City {
    #[serde(rename = "nome")]
    pub name: String,
}

/// Extracts the decoded body of a successful response.
pub fn decode_json<T>(result: crux_http::Result<crux_http::Response<T>>) -> AppResult<T> {
    match result {
        Ok(mut response) => {
            let status: u16 = response.status().into();
            // 4xx and 5xx arrive as `Error::Http`; this catches 1xx/3xx.
            if !(200..300).contains(&status) {
                return Err(AppError::from_http_status(status, None));
            }
            response.take_body().ok_or_else(|| {
                AppError::new(ErrorKind::Deserialization, "response body was empty")
                    .with_context("http_status", status.to_string())
            })
        }
        Err(e) => Err(transport_error(e)),
    }
}

/// Accepts any 2xx and ignores the body.
pub fn decode_status(result: crux_http::Result<crux_http::Response<Vec<u8>>>) -> AppResult<()> {
    match result {
        Ok(response) => {
            let status: u16 = response.status().into();
            if (200..300).contains(&status) {
                Ok(())
            } else {
                Err(AppError::from_http_status(status, None))
            }
        }
        Err(e) => Err(transport_error(e)),
    }
}

fn transport_error(e: crux_http::Error) -> AppError {
    match e {
        crux_http::Error::Http(http) => {
            AppError::from_http_status(u16::from(http.code), http.body.as_deref())
                .with_internal(http.message)
        }
        crux_http::Error::Timeout => AppError::new(ErrorKind::Timeout, "request timed out"),
        crux_http::Error::Json(detail) => {
            AppError::new(ErrorKind::Deserialization, "unexpected response body").with_internal(detail)
        }
        crux_http::Error::Io(detail) | crux_http::Error::Url(detail) => {
            AppError::new(ErrorKind::Network, "request failed").with_internal(detail)
        }
    }
}
