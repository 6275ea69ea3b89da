//! Names REST API Routes
//!
//! The single resource of the service. The name travels as a query
//! parameter on GET and DELETE and inside the JSON body on POST, PUT and
//! PATCH.

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::{
    error::ApiResult,
    extractors::{JsonBody, QueryParams},
    services::{RecordService, Resolver},
    state::AppState,
    types::{ListNamesParams, ListNamesResponse, NameQuery, PersonPayload},
};

#[cfg(feature = "openapi")]
use crate::error::ApiError;
#[cfg(feature = "openapi")]
use nationalize_core::PersonRecord;

/// Base path of the resource. Served with and without a trailing slash.
pub const NAMES_PATH: &str = "/api/v1/names";

/// Header naming the tier that served a GET.
pub const SOURCE_HEADER: &str = "x-nationalize-source";

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/names/?name= - Resolve a name to its country distribution
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/names/",
    tag = "Names",
    params(NameQuery),
    responses(
        (status = 200, description = "Record from cache, store or nationalize.io", body = PersonRecord,
            headers(("x-nationalize-source" = String, description = "cache, store or external"))),
        (status = 400, description = "Missing name", body = ApiError),
        (status = 502, description = "Upstream unavailable", body = ApiError),
        (status = 504, description = "Upstream timed out", body = ApiError),
    ),
))]
pub async fn get_name(
    State(resolver): State<Resolver>,
    QueryParams(query): QueryParams<NameQuery>,
) -> ApiResult<Response> {
    let name = query.name()?;
    let resolution = resolver.resolve(name).await?;

    let source = HeaderValue::from_static(resolution.source());
    Ok((
        [(HeaderName::from_static(SOURCE_HEADER), source)],
        Json(resolution.into_record()),
    )
        .into_response())
}

/// POST /api/v1/names/ - Store a new record
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/names/",
    tag = "Names",
    request_body = PersonPayload,
    responses(
        (status = 201, description = "Record created", body = PersonRecord),
        (status = 400, description = "Invalid body", body = ApiError),
        (status = 409, description = "Name already stored", body = ApiError),
        (status = 500, description = "Persistence failure", body = ApiError),
    ),
))]
pub async fn create_name(
    State(records): State<RecordService>,
    JsonBody(payload): JsonBody<PersonPayload>,
) -> ApiResult<impl IntoResponse> {
    let record = payload.into_record()?;
    let created = records.create(record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/names/ - Replace count and countries of a stored record
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/v1/names/",
    tag = "Names",
    request_body = PersonPayload,
    responses(
        (status = 200, description = "Record replaced", body = PersonRecord),
        (status = 400, description = "Missing or invalid field", body = ApiError),
        (status = 404, description = "No record for name", body = ApiError),
    ),
))]
pub async fn replace_name(
    State(records): State<RecordService>,
    JsonBody(payload): JsonBody<PersonPayload>,
) -> ApiResult<impl IntoResponse> {
    let name = payload.name()?.to_string();
    let record = match payload.into_record() {
        Ok(record) => record,
        Err(invalid) => {
            // An unknown name reports 404 even when the body is incomplete.
            records.require(&name).await?;
            return Err(invalid.into());
        }
    };
    let replaced = records.replace(&name, record).await?;
    Ok(Json(replaced))
}

/// PATCH /api/v1/names/ - Merge a partial update into a stored record
#[cfg_attr(feature = "openapi", utoipa::path(
    patch,
    path = "/api/v1/names/",
    tag = "Names",
    request_body = PersonPayload,
    responses(
        (status = 200, description = "Merged record", body = PersonRecord),
        (status = 400, description = "Missing name or invalid field", body = ApiError),
        (status = 404, description = "No record for name", body = ApiError),
    ),
))]
pub async fn patch_name(
    State(records): State<RecordService>,
    JsonBody(payload): JsonBody<PersonPayload>,
) -> ApiResult<impl IntoResponse> {
    let (name, patch) = payload.into_patch()?;
    let merged = records.patch(&name, patch).await?;
    Ok(Json(merged))
}

/// DELETE /api/v1/names/?name= - Remove a stored record
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/v1/names/",
    tag = "Names",
    params(NameQuery),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 400, description = "Missing name", body = ApiError),
        (status = 404, description = "No record for name", body = ApiError),
    ),
))]
pub async fn delete_name(
    State(records): State<RecordService>,
    QueryParams(query): QueryParams<NameQuery>,
) -> ApiResult<StatusCode> {
    records.delete(query.name()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/names/list - List stored records
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/names/list",
    tag = "Names",
    params(ListNamesParams),
    responses(
        (status = 200, description = "Page of stored records", body = ListNamesResponse),
        (status = 400, description = "Invalid query", body = ApiError),
    ),
))]
pub async fn list_names(
    State(records): State<RecordService>,
    QueryParams(params): QueryParams<ListNamesParams>,
) -> ApiResult<Json<ListNamesResponse>> {
    let query = params.to_query();
    let page = records.list(&query).await?;
    Ok(Json(ListNamesResponse {
        items: page.items,
        total: page.total,
        limit: query.limit,
        offset: query.offset,
    }))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the names router.
///
/// Routes are registered with full paths so both `/api/v1/names` and
/// `/api/v1/names/` resolve.
pub fn create_router(state: AppState) -> Router {
    let resource = get(get_name)
        .post(create_name)
        .put(replace_name)
        .patch(patch_name)
        .delete(delete_name);

    Router::new()
        .route(NAMES_PATH, resource.clone())
        .route(&format!("{}/", NAMES_PATH), resource)
        .route(&format!("{}/list", NAMES_PATH), get(list_names))
        .with_state(state)
}
