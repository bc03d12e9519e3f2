//! Security checks and caller identity

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::controller::RequestError;
use crate::request::RequestParts;

/// Operation being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Declarative requirement attached to a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SecurityCheck {
    /// Caller must be signed in
    Authenticated,
    /// Caller must hold the named role
    Role { name: String },
    /// Caller must own the resource identified by the payload field
    Owner { field: String },
}

impl SecurityCheck {
    pub fn role(name: impl Into<String>) -> Self {
        Self::Role { name: name.into() }
    }

    pub fn owner(field: impl Into<String>) -> Self {
        Self::Owner { field: field.into() }
    }
}

/// Identity attached to every validated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id_account: i64,
    pub id_user: i64,
}

/// Resolves who is calling and decides whether they may proceed
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn resolve(&self, request: &RequestParts) -> Result<Credential, RequestError>;

    async fn authorize(
        &self,
        credential: &Credential,
        checks: &[SecurityCheck],
        permission: Permission,
    ) -> Result<(), RequestError>;
}

#[async_trait]
impl<A: Authorizer + ?Sized> Authorizer for Arc<A> {
    async fn resolve(&self, request: &RequestParts) -> Result<Credential, RequestError> {
        (**self).resolve(request).await
    }

    async fn authorize(
        &self,
        credential: &Credential,
        checks: &[SecurityCheck],
        permission: Permission,
    ) -> Result<(), RequestError> {
        (**self).authorize(credential, checks, permission).await
    }
}

/// Fixed identity, no enforcement
///
/// Resolves every caller to account 1 / user 1 and allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderAuthorizer;

impl PlaceholderAuthorizer {
    pub const CREDENTIAL: Credential = Credential {
        id_account: 1,
        id_user: 1,
    };
}

#[async_trait]
impl Authorizer for PlaceholderAuthorizer {
    async fn resolve(&self, _request: &RequestParts) -> Result<Credential, RequestError> {
        Ok(Self::CREDENTIAL)
    }

    async fn authorize(
        &self,
        _credential: &Credential,
        checks: &[SecurityCheck],
        permission: Permission,
    ) -> Result<(), RequestError> {
        if !checks.is_empty() {
            // TODO: enforce checks once the identity provider is wired in
            tracing::debug!(?checks, %permission, "Security checks not enforced");
        }
        Ok(())
    }
}
