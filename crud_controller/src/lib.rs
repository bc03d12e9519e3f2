//! CRUD Controller - request validation, response envelopes and the HTTP error handler
//!
//! Every endpoint validates its merged body/path/query input through a
//! [`Schema`], resolves the caller's [`Credential`] through an [`Authorizer`]
//! and answers with an [`Envelope`]. Errors that reach the boundary are
//! rendered by [`ApiError`].

pub mod controller;
pub mod envelope;
pub mod error;
pub mod prelude;
pub mod request;
pub mod schema;
pub mod security;

pub use controller::{CrudController, RequestError, ValidatedRequest};
pub use envelope::{Envelope, ErrorBody, GeneralError, STATUS_GENERAL_ERROR};
pub use error::{handle_errors, method_not_allowed, not_found, ApiError};
pub use request::{CrudRequest, RequestParts};
pub use schema::{Field, FieldKind, FieldViolation, ObjectSchema, Schema, SchemaRejection, TypedSchema};
pub use security::{Authorizer, Credential, Permission, PlaceholderAuthorizer, SecurityCheck};
