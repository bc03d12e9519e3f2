//! Request inputs as seen by the controller

use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::ApiError;

/// The three input sources of a request
///
/// Path and query values arrive as strings; schemas are expected to coerce
/// them. A query key that repeats becomes an array of its values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParts {
    pub body: Option<Map<String, Value>>,
    pub path: Map<String, Value>,
    pub query: Map<String, Value>,
}

impl RequestParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_path(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path.insert(name.to_string(), Value::String(value.into()));
        self
    }

    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        push_query(&mut self.query, name.to_string(), value.into());
        self
    }

    /// Shallow merge: body, then path, then query. Later sources win.
    pub fn merged(&self) -> Map<String, Value> {
        let mut payload = self.body.clone().unwrap_or_default();
        payload.extend(self.path.iter().map(|(k, v)| (k.clone(), v.clone())));
        payload.extend(self.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        payload
    }
}

fn push_query(query: &mut Map<String, Value>, name: String, value: String) {
    // `tag[]=a&tag[]=b` is the same list as `tag=a&tag=b`
    let name = match name.strip_suffix("[]") {
        Some(stripped) => stripped.to_string(),
        None => name,
    };
    match query.get_mut(&name) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            query.insert(name, Value::String(value));
        }
    }
}

/// Extractor collecting body, path and query into [`RequestParts`]
///
/// An empty body, or one that is not a JSON object, is treated as no body.
/// Malformed JSON is rejected.
pub struct CrudRequest(pub RequestParts);

impl<S> FromRequest<S> for CrudRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let path = match Path::<HashMap<String, String>>::from_request_parts(&mut parts, state).await {
            Ok(Path(params)) => params
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect(),
            Err(PathRejection::MissingPathParams(_)) => Map::new(),
            Err(rejection) => {
                return Err(ApiError::new(
                    axum::http::StatusCode::BAD_REQUEST,
                    "INVALID_PATH",
                    rejection.body_text(),
                ))
            }
        };

        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(&mut parts, state)
            .await
            .map_err(|rejection| {
                ApiError::new(axum::http::StatusCode::BAD_REQUEST, "INVALID_QUERY", rejection.body_text())
            })?;
        let mut query = Map::new();
        for (name, value) in pairs {
            push_query(&mut query, name, value);
        }

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|rejection| {
                ApiError::new(axum::http::StatusCode::BAD_REQUEST, "INVALID_BODY", rejection.body_text())
            })?;
        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => Some(map),
                // arrays and scalars carry no named fields
                Ok(_) => None,
                Err(e) => {
                    return Err(ApiError::new(
                        axum::http::StatusCode::BAD_REQUEST,
                        "INVALID_BODY",
                        format!("Malformed JSON body: {}", e),
                    ))
                }
            }
        };

        Ok(Self(RequestParts { body, path, query }))
    }
}
