//! OpenAPI Specification for the Nationalize API
//!
//! Builds the OpenAPI document from the route annotations and the schema
//! derives on the wire types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{health, names};
use crate::telemetry::metrics;
use crate::types::{ListNamesResponse, PersonPayload};

use nationalize_core::{CountryProbability, PersonPatch, PersonRecord};

/// OpenAPI document for the Nationalize API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Nationalize API",
        description = "Name to nationality lookups backed by a cache, a record store and nationalize.io",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local Development")
    ),
    tags(
        (name = "Names", description = "Nationality lookups and stored record management"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        names::get_name,
        names::create_name,
        names::replace_name,
        names::patch_name,
        names::delete_name,
        names::list_names,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        PersonRecord,
        CountryProbability,
        PersonPatch,
        PersonPayload,
        ListNamesResponse,
        ApiError,
        ErrorCode,
        HealthResponse,
        HealthStatus,
        HealthDetails,
        ComponentHealth,
    ))
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a pretty-printed JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
