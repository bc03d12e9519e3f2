//! News endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;

use super::{first_set, found, id_field, list_page, on_behalf_of, paging_fields, Page};
use crate::routines::news as routine;
use crate::state::AppState;
use crud_controller::{ApiError, CrudRequest, Envelope, Field, ObjectSchema, ValidatedRequest};
use data_access::{ExpectedReturn, ProcedureCall, RoutineExecutor, Row, UnitOfWork};
use type_mapping::value_from_json;

const STATUSES: [&str; 8] = [
    "rascunho",
    "em_revisao",
    "em_revisao_sensivel",
    "aprovado_parcial",
    "aprovado",
    "publicado",
    "arquivado",
    "rejeitado",
];

const ORDERINGS: [&str; 4] = ["mais_recentes", "mais_antigas", "mais_lidas", "relevancia"];

const CATEGORIES: &str = "categorias";

/// Public routes, nested under `/api/v1/external`
pub fn external<E: RoutineExecutor + 'static>() -> Router<AppState<E>> {
    Router::new()
        .route("/news", get(list_published::<E>))
        .route("/news/{id}", get(get_published::<E>))
        .route("/news/{id}/related", get(related::<E>))
        .route("/news/{id}/view", post(register_view::<E>))
}

/// Back-office routes, nested under `/api/v1/internal`
pub fn internal<E: RoutineExecutor + 'static>() -> Router<AppState<E>> {
    Router::new()
        .route("/news", get(list::<E>).post(create::<E>))
        .route("/news/{id}", get(get_one::<E>).put(update::<E>).delete(delete::<E>))
}

fn list_schema() -> ObjectSchema {
    ObjectSchema::new()
        .field(Field::string_list("filtro_categoria").optional())
        .field(Field::string_list("filtro_time").optional())
        .field(Field::string_list("filtro_campeonato").optional())
        .field(Field::string_list("filtro_jogador").optional())
        .field(Field::datetime("filtro_data_inicio").optional())
        .field(Field::datetime("filtro_data_fim").optional())
        .field(Field::string("termo_busca").max_len(200).optional())
        .field(Field::string("ordenacao").one_of(ORDERINGS).default_value("mais_recentes"))
        .with_fields(paging_fields())
}

fn id_schema() -> ObjectSchema {
    ObjectSchema::new().field(id_field())
}

fn related_schema() -> ObjectSchema {
    id_schema().field(Field::integer("limite").min(1.0).max(20.0).default_value(4))
}

/// Writable fields; `required` is false for updates
fn content_fields(required: bool) -> Vec<Field> {
    let on_create = |field: Field| if required { field } else { field.optional() };
    vec![
        on_create(Field::string("titulo").min_len(1).max_len(200)),
        Field::string("subtitulo").max_len(300).optional(),
        on_create(Field::string("conteudo").min_len(1)),
        on_create(Field::string("imagem_destaque").min_len(1).max_len(500)),
        on_create(Field::string_list(CATEGORIES).min_len(1)),
        Field::string_list("tags").optional(),
        Field::string_list("times_relacionados").optional(),
        Field::string_list("campeonatos_relacionados").optional(),
        Field::string_list("jogadores_relacionados").optional(),
        Field::boolean("destaque").optional(),
        Field::string("fonte_externa_nome").max_len(200).optional(),
        Field::string("fonte_externa_url").max_len(500).optional(),
        Field::boolean("conteudo_sensivel").optional(),
        Field::string_list("criterios_sensibilidade").optional(),
    ]
}

fn create_schema() -> ObjectSchema {
    ObjectSchema::new().with_fields(content_fields(true))
}

fn update_schema() -> ObjectSchema {
    id_schema()
        .with_fields(content_fields(false))
        .field(Field::string("status").one_of(STATUSES).optional())
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
    Ok(Envelope::success(found(row, "News")?))
}

async fn related<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<Vec<Row>>, ApiError> {
    let schema = related_schema();
    let validated = state.external.read(&request, &schema).await?;
    let output = state
        .procedures
        .execute(
            ProcedureCall::new(routine::RELATED, ExpectedReturn::Multi).with_parameters(schema.arguments(validated.params)),
        )
        .await?;
    Ok(Envelope::success(first_set(output)?))
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
    Ok(Envelope::success(found(row, "News")?))
}

/// Point the news row's category links at `categories`
async fn replace_categories<E: RoutineExecutor>(
    uow: &mut UnitOfWork<'_, E>,
    id: Value,
    categories: Value,
) -> Result<(), ApiError> {
    uow.execute(
        ProcedureCall::new(routine::REPLACE_CATEGORIES, ExpectedReturn::None)
            .param("id", value_from_json(id))
            .param(CATEGORIES, value_from_json(categories)),
    )
    .await?;
    Ok(())
}

async fn create<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<(StatusCode, Envelope<Row>), ApiError> {
    let schema = create_schema();
    let ValidatedRequest { credential, mut params } = state.internal.create(&request, &schema).await?;
    let categories = params.remove(CATEGORIES).unwrap_or(Value::Array(Vec::new()));
    let arguments = schema.arguments(params);

    let created = state
        .procedures
        .transaction(move |uow| {
            Box::pin(async move {
                let call = ProcedureCall::new(routine::CREATE, ExpectedReturn::Single).with_parameters(arguments);
                let mut row = uow
                    .execute(on_behalf_of(call, &credential))
                    .await?
                    .into_single()?
                    .ok_or_else(|| ApiError::internal().with_details(Value::from("create_news returned no row")))?;

                let id = row.get("id_noticia").cloned().unwrap_or(Value::Null);
                replace_categories(uow, id, categories.clone()).await?;
                row.insert(CATEGORIES.to_string(), categories);
                Ok::<_, ApiError>(row)
            })
        })
        .await?;

    Ok((StatusCode::CREATED, Envelope::success(created)))
}

async fn update<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<Row>, ApiError> {
    let schema = update_schema();
    let ValidatedRequest { credential, mut params } = state.internal.update(&request, &schema).await?;
    let categories = params.remove(CATEGORIES);
    let id = params.get("id").cloned().unwrap_or(Value::Null);
    let arguments = schema.arguments(params);

    let updated = state
        .procedures
        .transaction(move |uow| {
            Box::pin(async move {
                let call = ProcedureCall::new(routine::UPDATE, ExpectedReturn::Single).with_parameters(arguments);
                let row = uow.execute(on_behalf_of(call, &credential)).await?.into_single()?;
                let mut row = found(row, "News")?;

                if let Some(categories) = categories {
                    replace_categories(uow, id, categories.clone()).await?;
                    row.insert(CATEGORIES.to_string(), categories);
                }
                Ok::<_, ApiError>(row)
            })
        })
        .await?;

    Ok(Envelope::success(updated))
}

async fn delete<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
    CrudRequest(request): CrudRequest,
) -> Result<Envelope<Row>, ApiError> {
    let schema = id_schema();
    let ValidatedRequest { credential, params } = state.internal.delete(&request, &schema).await?;
    let call = ProcedureCall::new(routine::DELETE, ExpectedReturn::Single).with_parameters(schema.arguments(params));
    let row = state
        .procedures
        .execute(on_behalf_of(call, &credential))
        .await?
        .into_single()?;
    Ok(Envelope::success(found(row, "News")?))
}
