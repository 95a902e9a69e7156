//! Query parameters handed to an action
//!
//! Actions never see an untyped parameter bag: each one declares a request
//! struct and calls [`ActionQuery::parse`] to obtain it.

use axum::{extract::Query, http::Uri};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Raw query string of an inbound action request
#[derive(Debug, Clone)]
pub struct ActionQuery {
    uri: Uri,
}

impl ActionQuery {
    /// Wrap the request URI; only its query component is used
    pub fn from_uri(uri: Uri) -> Self {
        Self { uri }
    }

    /// Build from a bare query string such as `file=a.mp3&x=1`
    pub fn from_query_str(query: &str) -> Result<Self> {
        let uri = if query.is_empty() {
            Uri::from_static("/")
        } else {
            format!("/?{}", query)
                .parse::<Uri>()
                .map_err(|e| Error::BadRequest(format!("Malformed query string: {}", e)))?
        };
        Ok(Self { uri })
    }

    /// Query with no parameters
    pub fn empty() -> Self {
        Self {
            uri: Uri::from_static("/"),
        }
    }

    /// The query string, if any
    pub fn as_str(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Deserialize the parameters into the action's request struct
    ///
    /// Values that cannot be converted (e.g. `level=loud` for a number) are a
    /// malformed request and reported as `BadRequest`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Query::<T>::try_from_uri(&self.uri)
            .map(|Query(value)| value)
            .map_err(|rejection| Error::BadRequest(rejection.body_text()))
    }
}

impl Default for ActionQuery {
    fn default() -> Self {
        Self::empty()
    }
}
