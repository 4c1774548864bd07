//! Request extractors shared by the Shutterdesk domain routers
//!
//! Every input problem (unreadable body, malformed JSON, failed validation)
//! is reported as `Error::Validation`, i.e. a 400 with the standard envelope.

use axum::{
    body::Body,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use validator::Validate;

use crate::Error;

/// One contact sheet
const DEFAULT_PAGE_SIZE: usize = 100;

const MAX_PAGE_SIZE: usize = 500;

/// `?offset=&limit=` query window for list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Rows to skip; negative values count as zero
    pub fn offset(&self) -> usize {
        self.offset
            .and_then(|offset| usize::try_from(offset).ok())
            .unwrap_or(0)
    }

    /// Page size, between 1 and 500
    pub fn limit(&self) -> usize {
        match self.limit {
            None => DEFAULT_PAGE_SIZE,
            Some(limit) => usize::try_from(limit).unwrap_or(1).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Cut the page out of an already ordered list
    pub fn window<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect()
    }
}

fn validated<T: Validate>(value: T) -> Result<T, Error> {
    value
        .validate()
        .map_err(|e| Error::Validation(format!("Validation failed: {}", e)))?;
    Ok(value)
}

/// JSON body, deserialized and then checked with its `Validate` rules
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| Error::Validation(e.body_text()))?;
        validated(value).map(ValidatedJson)
    }
}

/// Like [`ValidatedJson`] for requests whose fields are all optional: an empty
/// body yields `T::default()`, anything else must be valid JSON.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Validate + Default,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| Error::Validation(format!("Failed to read request body: {}", e)))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return validated(T::default()).map(OptionalJson);
        }
        let ValidatedJson(value) =
            ValidatedJson::from_request(Request::from_parts(parts, Body::from(bytes)), state)
                .await?;
        Ok(OptionalJson(value))
    }
}
