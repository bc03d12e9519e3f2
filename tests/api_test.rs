//! HTTP tests for the portal routes
//!
//! Routes run against the in-memory executor, so every routine call and
//! transaction event can be asserted without a database.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use data_access::memory::{MemoryExecutor, TransactionEvent};
use portal::prelude::*;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

fn rows(values: Value) -> Vec<Row> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
}

fn app(executor: &MemoryExecutor, environment: Environment) -> Router {
    let server = ServerConfig::new("127.0.0.1".to_string(), 0, environment);
    Portal::with_procedures(Procedures::new(executor.clone()), server).router()
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn public_news_list_is_paged() {
    let executor = MemoryExecutor::new();
    executor.respond(
        routines::news::LIST_PUBLISHED,
        RawResult::from_sets(vec![
            rows(json!([{"id_noticia": "a"}, {"id_noticia": "b"}])),
            rows(json!([{"total": 14}])),
        ]),
    );

    let (status, body) = send(
        app(&executor, Environment::Production),
        Method::GET,
        "/api/v1/external/news?filtro_categoria%5B%5D=futebol&filtro_categoria%5B%5D=basquete&termo_busca=final",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(
        body["data"],
        json!({
            "items": [{"id_noticia": "a"}, {"id_noticia": "b"}],
            "total": 14,
            "page": 1,
            "pageSize": 12,
            "totalPages": 2
        })
    );

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].expected, ExpectedReturn::Multi);
    let params = &calls[0].parameters;
    assert_eq!(params["pagina_atual"], PostgresValue::Integer(1));
    assert_eq!(params["itens_por_pagina"], PostgresValue::Integer(12));
    assert_eq!(params["ordenacao"], PostgresValue::Text("mais_recentes".into()));
    assert_eq!(
        params["filtro_categoria"],
        PostgresValue::TextArray(vec!["futebol".into(), "basquete".into()])
    );
    assert_eq!(params["termo_busca"], PostgresValue::Text("final".into()));
    // Public calls carry no identity
    assert!(!params.contains_key("id_user"));
}

#[tokio::test]
async fn invalid_query_is_rejected_before_any_call() {
    let executor = MemoryExecutor::new();

    let (status, body) = send(
        app(&executor, Environment::Production),
        Method::GET,
        "/api/v1/external/news?itens_por_pagina=500&ordenacao=aleatoria",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
    assert_eq!(body["error"]["message"], json!("Validation failed"));
    assert!(body["error"].get("details").is_none());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn development_exposes_violations() {
    let executor = MemoryExecutor::new();

    let (status, body) = send(
        app(&executor, Environment::Development),
        Method::GET,
        "/api/v1/external/news?pagina_atual=zero",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"],
        json!([{
            "path": "pagina_atual",
            "code": "invalid_type",
            "message": "Expected integer, received string"
        }])
    );
}

#[tokio::test]
async fn missing_news_is_404() {
    let executor = MemoryExecutor::new();
    executor.respond(routines::news::GET_PUBLISHED, RawResult::from_sets(vec![vec![]]));

    let (status, body) = send(
        app(&executor, Environment::Production),
        Method::GET,
        "/api/v1/external/news/n404",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
    assert_eq!(body["error"]["message"], json!("News not found"));
    assert_eq!(
        executor.calls()[0].parameters["id"],
        PostgresValue::Text("n404".into())
    );
}

#[tokio::test]
async fn create_writes_row_and_categories_in_one_transaction() {
    let executor = MemoryExecutor::new();
    executor.respond(
        routines::news::CREATE,
        RawResult::from_sets(vec![rows(json!([{"id_noticia": "n1", "titulo": "Foo"}]))]),
    );

    let (status, body) = send(
        app(&executor, Environment::Production),
        Method::POST,
        "/api/v1/internal/news",
        Some(json!({
            "titulo": "Foo",
            "conteudo": "Bar",
            "imagem_destaque": "https://cdn.example.com/foo.jpg",
            "categorias": ["esportes"],
            "isAdmin": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["data"],
        json!({"id_noticia": "n1", "titulo": "Foo", "categorias": ["esportes"]})
    );

    let calls = executor.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].routine, routines::news::CREATE);
    assert_eq!(calls[0].parameters["titulo"], PostgresValue::Text("Foo".into()));
    assert_eq!(calls[0].parameters["id_account"], PostgresValue::BigInt(1));
    assert_eq!(calls[0].parameters["id_user"], PostgresValue::BigInt(1));
    assert!(!calls[0].parameters.contains_key("categorias"));
    assert!(!calls[0].parameters.contains_key("isAdmin"));

    assert_eq!(calls[1].routine, routines::news::REPLACE_CATEGORIES);
    assert_eq!(calls[1].parameters["id"], PostgresValue::Text("n1".into()));
    assert_eq!(
        calls[1].parameters["categorias"],
        PostgresValue::TextArray(vec!["esportes".into()])
    );
    assert!(calls.iter().all(|c| c.transaction == Some(1)));
    assert_eq!(
        executor.events(),
        vec![TransactionEvent::Begin(1), TransactionEvent::Commit(1)]
    );
}

#[tokio::test]
async fn create_requires_categories() {
    let executor = MemoryExecutor::new();

    let (status, body) = send(
        app(&executor, Environment::Development),
        Method::POST,
        "/api/v1/internal/news",
        Some(json!({"titulo": "Foo", "conteudo": "Bar", "imagem_destaque": "x", "categorias": []})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["path"], json!("categorias"));
    assert_eq!(body["error"]["details"][0]["code"], json!("too_small"));
    assert!(executor.events().is_empty());
}

#[tokio::test]
async fn failed_category_replace_rolls_back_update() {
    let executor = MemoryExecutor::new();
    executor.respond(
        routines::news::UPDATE,
        RawResult::from_sets(vec![rows(json!([{"id_noticia": "42"}]))]),
    );
    executor.fail(routines::news::REPLACE_CATEGORIES, "foreign key violation");

    let (status, body) = send(
        app(&executor, Environment::Development),
        Method::PUT,
        "/api/v1/internal/news/42",
        Some(json!({"categorias": ["inexistente"]})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], json!("INTERNAL_SERVER_ERROR"));
    assert!(body["error"]["details"]
        .as_str()
        .unwrap()
        .contains("foreign key violation"));
    assert_eq!(
        executor.events(),
        vec![TransactionEvent::Begin(1), TransactionEvent::Rollback(1)]
    );
}

#[tokio::test]
async fn updating_missing_news_is_404_and_rolls_back() {
    let executor = MemoryExecutor::new();
    executor.respond(routines::news::UPDATE, RawResult::from_sets(vec![vec![]]));

    let (status, _) = send(
        app(&executor, Environment::Production),
        Method::PUT,
        "/api/v1/internal/news/42",
        Some(json!({"titulo": "Novo", "status": "publicado"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(executor.calls().len(), 1);
    assert_eq!(
        executor.events(),
        vec![TransactionEvent::Begin(1), TransactionEvent::Rollback(1)]
    );
}

#[tokio::test]
async fn media_share_validates_platform() {
    let executor = MemoryExecutor::new();
    let app = app(&executor, Environment::Production);

    let (status, body) = send(
        app.clone(),
        Method::POST,
        "/api/v1/external/media/m1/share",
        Some(json!({"platform": "whatsapp"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);

    let (status, _) = send(
        app,
        Method::POST,
        "/api/v1/external/media/m1/share",
        Some(json!({"platform": "myspace"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].routine, routines::media::REGISTER_SHARE);
    assert_eq!(calls[0].parameters["platform"], PostgresValue::Text("whatsapp".into()));
    assert_eq!(calls[0].expected, ExpectedReturn::None);
}

#[tokio::test]
async fn galleries_route_wins_over_media_id() {
    let executor = MemoryExecutor::new();
    executor.respond(
        routines::media::LIST_GALLERIES,
        RawResult::from_sets(vec![rows(json!([{"id_galeria": "g1"}]))]),
    );

    let (status, body) = send(
        app(&executor, Environment::Production),
        Method::GET,
        "/api/v1/external/media/galleries",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([{"id_galeria": "g1"}]));
}

#[tokio::test]
async fn unknown_route_is_404_envelope() {
    let executor = MemoryExecutor::new();

    let (status, body) = send(
        app(&executor, Environment::Production),
        Method::GET,
        "/api/v1/external/podcasts",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["error"]["message"],
        json!("Route GET /api/v1/external/podcasts not found")
    );
}

#[tokio::test]
async fn health_reflects_database() {
    let executor = MemoryExecutor::new();

    let (status, body) = send(app(&executor, Environment::Production), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("ok"));

    executor.fail_ping();
    let (status, body) = send(app(&executor, Environment::Production), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], json!("SERVICE_UNAVAILABLE"));
}

#[tokio::test]
async fn bound_types_follow_declared_fields() {
    let executor = MemoryExecutor::new();
    let midnight = PostgresValue::Timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

    for uri in [
        "/api/v1/external/news?filtro_data_inicio=2024-05-01",
        "/api/v1/external/news?filtro_data_inicio=2024-05-01T00:00:00Z",
        "/api/v1/external/news?termo_busca=2024-05-01T10:00:00Z",
    ] {
        let (status, _) = send(app(&executor, Environment::Production), Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
    }

    let calls = executor.calls();
    assert_eq!(calls[0].parameters["filtro_data_inicio"], midnight);
    assert_eq!(calls[1].parameters["filtro_data_inicio"], midnight);
    assert_eq!(
        calls[2].parameters["termo_busca"],
        PostgresValue::Text("2024-05-01T10:00:00Z".into())
    );
}

#[tokio::test]
async fn missing_server_section_hides_details() {
    let config: AppConfig = r#"
        [database]
        host = "db.internal"
        port = 5432
        database = "portal"
        username = "portal_app"
        password = "secret"
        min_connections = 1
        max_connections = 4
        connection_timeout_seconds = 5
        idle_timeout_seconds = 60
        max_lifetime_seconds = 0
    "#
    .parse()
    .unwrap();
    assert_eq!(config.server.environment, Environment::Production);

    let executor = MemoryExecutor::new();
    executor.fail(
        routines::news::GET_PUBLISHED,
        "relation news.noticia does not exist",
    );
    let app = Portal::with_procedures(Procedures::new(executor.clone()), config.server).router();

    let (status, body) = send(app, Method::GET, "/api/v1/external/news/abc", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], json!("INTERNAL_SERVER_ERROR"));
    assert!(body["error"].get("details").is_none());
    assert!(!body.to_string().contains("noticia"));
}

#[tokio::test]
async fn wrong_method_is_405_envelope() {
    let executor = MemoryExecutor::new();

    let (status, body) = send(
        app(&executor, Environment::Production),
        Method::PATCH,
        "/api/v1/internal/news/1",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("METHOD_NOT_ALLOWED"));
    assert!(executor.calls().is_empty());
}
