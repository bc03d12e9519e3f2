//! HTTP routes
//!
//! Public (`external`) and back-office (`internal`) endpoints under `/api/v1`,
//! plus `/health`. Handlers validate with the audience's controller, run one
//! routine (or a transaction) and wrap the result in an envelope.

pub mod health;
pub mod media;
pub mod news;

use axum::Router;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::routines;
use crate::state::AppState;
use crud_controller::{method_not_allowed, not_found, ApiError, Credential, Field, ObjectSchema};
use data_access::{
    DataAccessError, ExpectedReturn, ProcedureCall, ProcedureOutput, Procedures, RecordSet, RoutineExecutor, Row,
};

pub const PAGE: &str = "pagina_atual";
pub const PAGE_SIZE: &str = "itens_por_pagina";
pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Application router; layers are added by [`crate::server`]
pub fn router<E: RoutineExecutor + 'static>(state: AppState<E>) -> Router {
    Router::new()
        .merge(health::router::<E>())
        .nest(
            "/api/v1/external",
            Router::new()
                .merge(news::external::<E>())
                .merge(media::external::<E>()),
        )
        .nest(
            "/api/v1/internal",
            Router::new()
                .merge(news::internal::<E>())
                .merge(media::internal::<E>()),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(state)
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<Row>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl Page {
    /// Build from the `items` and `total` sets; `total` is read from its first row
    pub fn from_sets(mut sets: BTreeMap<String, RecordSet>, page: i64, page_size: i64) -> Self {
        let items = sets.remove("items").unwrap_or_default().recordset;
        let total = sets
            .remove("total")
            .and_then(|set| set.recordset.into_iter().next())
            .and_then(|row| row.get("total").and_then(Value::as_i64))
            .unwrap_or(items.len() as i64);
        let total_pages = if page_size > 0 { (total + page_size - 1) / page_size } else { 0 };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

/// Paging fields shared by every list schema
pub(crate) fn paging_fields() -> [Field; 2] {
    [
        Field::integer(PAGE).min(1.0).default_value(1),
        Field::integer(PAGE_SIZE)
            .min(1.0)
            .max(MAX_PAGE_SIZE as f64)
            .default_value(DEFAULT_PAGE_SIZE),
    ]
}

/// Path `{id}` field
pub(crate) fn id_field() -> Field {
    Field::string("id").min_len(1).max_len(64)
}

/// Append the caller's identity to a back-office call
pub(crate) fn on_behalf_of(call: ProcedureCall, credential: &Credential) -> ProcedureCall {
    call.param("id_account", credential.id_account)
        .param("id_user", credential.id_user)
}

/// Run a paged list routine
pub(crate) async fn list_page<E: RoutineExecutor>(
    procedures: &Procedures<E>,
    routine: &str,
    schema: &ObjectSchema,
    params: Map<String, Value>,
    credential: Option<&Credential>,
) -> Result<Page, ApiError> {
    let page = params.get(PAGE).and_then(Value::as_i64).unwrap_or(1);
    let page_size = params
        .get(PAGE_SIZE)
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let mut call = ProcedureCall::new(routine, ExpectedReturn::Multi)
        .with_parameters(schema.arguments(params))
        .result_sets(routines::PAGE_SETS);
    if let Some(credential) = credential {
        call = on_behalf_of(call, credential);
    }

    let sets = procedures.execute(call).await?.into_named()?;
    Ok(Page::from_sets(sets, page, page_size))
}

/// Rows of the first result set of a `Multi` call
pub(crate) fn first_set(output: ProcedureOutput) -> Result<Vec<Row>, DataAccessError> {
    Ok(output
        .into_multi()?
        .into_iter()
        .next()
        .map(|set| set.recordset)
        .unwrap_or_default())
}

/// 404 for a `Single` call that returned no row
pub(crate) fn found(row: Option<Row>, resource: &str) -> Result<Row, ApiError> {
    row.ok_or_else(|| ApiError::not_found(format!("{} not found", resource)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(rows: Value) -> RecordSet {
        RecordSet {
            recordset: rows
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r.as_object().cloned().unwrap())
                .collect(),
            rows_affected: vec![],
        }
    }

    #[test]
    fn page_reads_total_from_its_own_set() {
        let mut sets = BTreeMap::new();
        sets.insert("items".to_string(), set(json!([{"id": "a"}, {"id": "b"}])));
        sets.insert("total".to_string(), set(json!([{"total": 25}])));

        let page = Page::from_sets(sets, 2, 12);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({
                "items": [{"id": "a"}, {"id": "b"}],
                "total": 25,
                "page": 2,
                "pageSize": 12,
                "totalPages": 3
            })
        );
    }

    #[test]
    fn page_without_total_counts_items() {
        let mut sets = BTreeMap::new();
        sets.insert("items".to_string(), set(json!([{"id": "a"}])));
        sets.insert("total".to_string(), RecordSet::default());

        let page = Page::from_sets(sets, 1, 12);
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
    }
}
