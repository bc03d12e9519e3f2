//! Media endpoints

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;

use super::{first_set, found, id_field, list_page, on_behalf_of, paging_fields, Page};
use crate::routines::media as routine;
use crate::state::AppState;
use crud_controller::{ApiError, CrudRequest, Envelope, Field, ObjectSchema, ValidatedRequest};
use data_access::{ExpectedReturn, ProcedureCall, RoutineExecutor, Row};

const CATEGORIES: [&str; 4] = ["times", "campeonatos", "jogadores", "eventos"];
const KINDS: [&str; 2] = ["foto", "video"];
const ORDERINGS: [&str; 4] = [
    "mais_recentes",
    "mais_antigos",
    "mais_visualizados",
    "mais_compartilhados",
];
const STATUSES: [&str; 4] = ["publicado", "rascunho", "em_moderacao", "rejeitado"];
const PLATFORMS: [&str; 5] = ["whatsapp", "facebook", "twitter", "telegram", "link"];

/// Public routes, nested under `/api/v1/external`
pub fn external<E: RoutineExecutor + 'static>() -> Router<AppState<E>> {
    Router::new()
        .route("/media", get(list_published::<E>))
        .route("/media/galleries", get(galleries::<E>))
        .route("/media/galleries/{id}", get(gallery_media::<E>))
        .route("/media/{id}", get(get_published::<E>))
        .route("/media/{id}/view", post(register_view::<E>))
        .route("/media/{id}/share", post(register_share::<E>))
}

/// Back-office routes, nested under `/api/v1/internal`
pub fn internal<E: RoutineExecutor + 'static>() -> Router<AppState<E>> {
    Router::new()
        .route("/media", get(list::<E>))
        .route("/media/{id}", get(get_one::<E>))
}

fn list_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(Field::string("filtro_categoria").one_of(CATEGORIES).optional())
        .field(Field::string("filtro_subcategoria").max_len(100).optional())
        .field(Field::datetime("filtro_data_inicio").optional())
        .field(Field::datetime("filtro_data_fim").optional())
        .field(Field::string_list("filtro_tipo_midia").one_of(KINDS).optional())
        .field(Field::string_list("filtro_tags").optional())
        .field(Field::string("galeria_tematica").max_len(100).optional())
        .field(Field::string("ordenacao").one_of(ORDERINGS).default_value("mais_recentes"))
        .with_fields(paging_fields())
}

fn id_schema() -> ObjectSchema {
    ObjectSchema::new().field(id_field())
}

fn share_schema() -> ObjectSchema {
    id_schema().field(Field::string("platform").one_of(PLATFORMS))
}

async fn list_published<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<Page>, ApiError> {
    let schema = list_schema();
    let validated = state.external.read(&request, &schema).await?;
    let page = list_page(&state.procedures, routine::LIST_PUBLISHED, &schema, validated.params, None).await?;
    Ok(Envelope::success(page))
}

async fn galleries<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
) -> Result<Envelope<Vec<Row>>, ApiError> {
    let output = state
        .procedures
        .execute(ProcedureCall::new(routine::LIST_GALLERIES, ExpectedReturn::Multi))
        .await?;
    Ok(Envelope::success(first_set(output)?))
}

async fn gallery_media<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<Vec<Row>>, ApiError> {
    let schema = id_schema();
    let validated = state.external.read(&request, &schema).await?;
    let output = state
        .procedures
        .execute(
            ProcedureCall::new(routine::GALLERY_MEDIA, ExpectedReturn::Multi)
                .with_parameters(schema.arguments(validated.params)),
        )
        .await?;
    Ok(Envelope::success(first_set(output)?))
}

async fn get_published<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<Row>, ApiError> {
    let schema = id_schema();
    let validated = state.external.read(&request, &schema).await?;
    let row = state
        .procedures
        .execute(
            ProcedureCall::new(routine::GET_PUBLISHED, ExpectedReturn::Single)
                .with_parameters(schema.arguments(validated.params)),
        )
        .await?
        .into_single()?;
    Ok(Envelope::success(found(row, "Media")?))
}

async fn register_view<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<()>, ApiError> {
    let schema = id_schema();
    let validated = state.external.update(&request, &schema).await?;
    state
        .procedures
        .execute(
            ProcedureCall::new(routine::REGISTER_VIEW, ExpectedReturn::None)
                .with_parameters(schema.arguments(validated.params)),
        )
        .await?;
    Ok(Envelope::success(()))
}

async fn register_share<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<()>, ApiError> {
    let schema = share_schema();
    let validated = state.external.update(&request, &schema).await?;
    state
        .procedures
        .execute(
            ProcedureCall::new(routine::REGISTER_SHARE, ExpectedReturn::None)
                .with_parameters(schema.arguments(validated.params)),
        )
        .await?;
    Ok(Envelope::success(()))
}

async fn list<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<Page>, ApiError> {
    let schema = list_schema().field(Field::string("status").one_of(STATUSES).optional());
    let ValidatedRequest { credential, params } = state.internal.read(&request, &schema).await?;
    let page = list_page(&state.procedures, routine::LIST, &schema, params, Some(&credential)).await?;
    Ok(Envelope::success(page))
}

async fn get_one<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<Row>, ApiError> {
    let schema = id_schema();
    let ValidatedRequest { credential, params } = state.internal.read(&request, &schema).await?;
    let call = ProcedureCall::new(routine::GET, ExpectedReturn::Single).with_parameters(schema.arguments(params));
    let row = state
        .procedures
        .execute(on_behalf_of(call, &credential))
        .await?
        .into_single()?;
    Ok(Envelope::success(found(row, "Media")?))
}
