//! Process-wide HTTP error handling
//!
//! Handlers return [`ApiError`]. Its response carries a failure envelope
//! without `details`; [`handle_errors`] then logs the failure with the request
//! path and method and, in development, re-renders the body with `details`.

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::sync::Arc;

use crate::controller::RequestError;
use crate::envelope::{Envelope, STATUS_GENERAL_ERROR};
use config::Environment;
use data_access::DataAccessError;

/// Error returned from HTTP handlers
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
    details: Option<Value>,
    #[source]
    source: Option<anyhow::Error>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// 500 with the general code and message
    pub fn internal() -> Self {
        Self::new(
            STATUS_GENERAL_ERROR.status,
            STATUS_GENERAL_ERROR.code,
            STATUS_GENERAL_ERROR.message,
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    fn report(&self) -> ErrorReport {
        ErrorReport {
            status: self.status,
            code: self.code.clone(),
            message: self.message.clone(),
            details: self.details.clone(),
            chain: self.source.as_ref().map(|source| format!("{:#}", source)),
        }
    }
}

/// What [`handle_errors`] needs after the handler has returned
#[derive(Debug, Clone)]
struct ErrorReport {
    status: StatusCode,
    code: String,
    message: String,
    details: Option<Value>,
    chain: Option<String>,
}

impl ErrorReport {
    fn envelope(&self, include_details: bool) -> Envelope<()> {
        let details = if include_details { self.details.clone() } else { None };
        Envelope::failure_with_details(self.message.clone(), Some(&self.code), details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report();
        let mut response = (report.status, report.envelope(false)).into_response();
        response.extensions_mut().insert(Arc::new(report));
        response
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        let mut error = Self::new(e.status(), e.code, e.message);
        error.details = e.details;
        error
    }
}

impl From<DataAccessError> for ApiError {
    fn from(e: DataAccessError) -> Self {
        Self::internal()
            .with_details(Value::String(e.to_string()))
            .with_source(e)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::internal()
            .with_details(Value::String(e.to_string()))
            .with_source(e)
    }
}

/// Middleware that logs every [`ApiError`] and applies the environment's detail policy
///
/// ```ignore
/// router.layer(axum::middleware::from_fn_with_state(environment, handle_errors))
/// ```
pub async fn handle_errors(State(environment): State<Environment>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    let Some(report) = response.extensions_mut().remove::<Arc<ErrorReport>>() else {
        return response;
    };

    let details = report.details.as_ref().map(|d| d.to_string());
    if report.status.is_server_error() {
        tracing::error!(
            code = %report.code,
            message = %report.message,
            status = report.status.as_u16(),
            %path,
            %method,
            details = ?details,
            chain = ?report.chain,
            "Request failed"
        );
    } else {
        tracing::warn!(
            code = %report.code,
            message = %report.message,
            status = report.status.as_u16(),
            %path,
            %method,
            details = ?details,
            "Request rejected"
        );
    }

    if environment.is_development() && report.details.is_some() {
        return (report.status, report.envelope(true)).into_response();
    }
    response
}

/// Fallback for unmatched routes
pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} {} not found", method, uri.path()))
}

/// Fallback for a known path hit with an unsupported method
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        format!("Method {} not allowed on {}", method, uri.path()),
    )
}
