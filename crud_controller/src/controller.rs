//! CRUD controller
//!
//! Validates incoming requests for the four CRUD operations. Validation never
//! fails by panicking or by an error escaping the boundary: the outcome is
//! always a [`ValidatedRequest`] or a [`RequestError`] the handler can return.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::request::RequestParts;
use crate::schema::{Schema, SchemaRejection};
use crate::security::{Authorizer, Credential, Permission, SecurityCheck};

/// Structured request failure
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct RequestError {
    pub status_code: u16,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl RequestError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 400 carrying the schema's violations
    pub fn validation(rejection: SchemaRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "Validation failed")
            .with_details(rejection.details())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Parameters that passed validation, plus who asked for them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRequest<P = Map<String, Value>> {
    pub credential: Credential,
    pub params: P,
}

/// Validator and authorizer for one resource
///
/// Holds the resource's security checks and the [`Authorizer`] that enforces
/// them. Every operation runs the same pipeline:
///
/// 1. merge body, path and query (later sources override earlier ones)
/// 2. parse the merged payload with the operation's schema
/// 3. resolve the caller and authorize the operation
#[derive(Clone)]
pub struct CrudController<A: Authorizer> {
    security_checks: Vec<SecurityCheck>,
    authorizer: A,
}

impl<A: Authorizer> fmt::Debug for CrudController<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudController")
            .field("security_checks", &self.security_checks)
            .finish_non_exhaustive()
    }
}

impl<A: Authorizer> CrudController<A> {
    pub fn new(security_checks: Vec<SecurityCheck>, authorizer: A) -> Self {
        Self {
            security_checks,
            authorizer,
        }
    }

    pub fn security_checks(&self) -> &[SecurityCheck] {
        &self.security_checks
    }

    pub fn authorizer(&self) -> &A {
        &self.authorizer
    }

    pub async fn create<S: Schema>(
        &self,
        request: &RequestParts,
        schema: &S,
    ) -> Result<ValidatedRequest<S::Output>, RequestError> {
        self.validate_request(request, schema, Permission::Create).await
    }

    pub async fn read<S: Schema>(
        &self,
        request: &RequestParts,
        schema: &S,
    ) -> Result<ValidatedRequest<S::Output>, RequestError> {
        self.validate_request(request, schema, Permission::Read).await
    }

    pub async fn update<S: Schema>(
        &self,
        request: &RequestParts,
        schema: &S,
    ) -> Result<ValidatedRequest<S::Output>, RequestError> {
        self.validate_request(request, schema, Permission::Update).await
    }

    pub async fn delete<S: Schema>(
        &self,
        request: &RequestParts,
        schema: &S,
    ) -> Result<ValidatedRequest<S::Output>, RequestError> {
        self.validate_request(request, schema, Permission::Delete).await
    }

    async fn validate_request<S: Schema>(
        &self,
        request: &RequestParts,
        schema: &S,
        permission: Permission,
    ) -> Result<ValidatedRequest<S::Output>, RequestError> {
        let params = schema
            .parse(request.merged())
            .await
            .map_err(RequestError::validation)?;

        let credential = self.authorizer.resolve(request).await?;
        self.authorizer
            .authorize(&credential, &self.security_checks, permission)
            .await?;

        Ok(ValidatedRequest { credential, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, ObjectSchema};
    use crate::security::PlaceholderAuthorizer;
    use async_trait::async_trait;
    use serde_json::json;

    fn controller() -> CrudController<PlaceholderAuthorizer> {
        CrudController::new(vec![SecurityCheck::Authenticated], PlaceholderAuthorizer)
    }

    #[tokio::test]
    async fn create_with_body() {
        let schema = ObjectSchema::new().field(Field::string("name"));
        let request = RequestParts::new().with_body(json!({"name": "Foo"}).as_object().cloned().unwrap());

        let validated = controller().create(&request, &schema).await.unwrap();
        assert_eq!(
            serde_json::to_value(&validated).unwrap(),
            json!({"credential": {"idAccount": 1, "idUser": 1}, "params": {"name": "Foo"}})
        );
    }

    #[tokio::test]
    async fn update_coerces_path_and_query() {
        let schema = ObjectSchema::new()
            .field(Field::integer("id"))
            .field(Field::boolean("force"));
        let request = RequestParts::new().with_path("id", "42").with_query("force", "true");

        let validated = controller().update(&request, &schema).await.unwrap();
        assert_eq!(Value::Object(validated.params), json!({"id": 42, "force": true}));
    }

    #[tokio::test]
    async fn schema_failure_is_400() {
        let schema = ObjectSchema::new().field(Field::integer("id"));
        let request = RequestParts::new().with_path("id", "abc");

        let err = controller().read(&request, &schema).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.message, "Validation failed");
        assert_eq!(err.details.unwrap()[0]["path"], json!("id"));
    }

    #[tokio::test]
    async fn query_overrides_path_and_body() {
        let schema = ObjectSchema::new().field(Field::string("slug"));
        let request = RequestParts::new()
            .with_body(json!({"slug": "from-body"}).as_object().cloned().unwrap())
            .with_path("slug", "from-path")
            .with_query("slug", "from-query");

        let validated = controller().read(&request, &schema).await.unwrap();
        assert_eq!(validated.params["slug"], json!("from-query"));
    }

    struct DenyDeletes;

    #[async_trait]
    impl Authorizer for DenyDeletes {
        async fn resolve(&self, _request: &RequestParts) -> Result<Credential, RequestError> {
            Ok(Credential {
                id_account: 7,
                id_user: 9,
            })
        }

        async fn authorize(
            &self,
            _credential: &Credential,
            _checks: &[SecurityCheck],
            permission: Permission,
        ) -> Result<(), RequestError> {
            match permission {
                Permission::Delete => Err(RequestError::forbidden("Deletes are not allowed")),
                _ => Ok(()),
            }
        }
    }

    #[tokio::test]
    async fn authorizer_decides_and_supplies_credential() {
        let controller = CrudController::new(vec![SecurityCheck::role("editor")], DenyDeletes);
        let schema = ObjectSchema::new().field(Field::integer("id"));
        let request = RequestParts::new().with_path("id", "1");

        let read = controller.read(&request, &schema).await.unwrap();
        assert_eq!(read.credential.id_user, 9);

        let err = controller.delete(&request, &schema).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code, "FORBIDDEN");
    }
}
