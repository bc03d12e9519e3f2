//! Prelude module for convenient imports
//!
//! Route modules can `use crud_controller::prelude::*;` to get the
//! controller, schemas, envelopes and error types in one line.

pub use crate::controller::{CrudController, RequestError, ValidatedRequest};
pub use crate::envelope::{Envelope, ErrorBody, STATUS_GENERAL_ERROR};
pub use crate::error::ApiError;
pub use crate::request::{CrudRequest, RequestParts};
pub use crate::schema::{Field, FieldKind, ObjectSchema, Schema, SchemaRejection, TypedSchema};
pub use crate::security::{Authorizer, Credential, Permission, PlaceholderAuthorizer, SecurityCheck};
