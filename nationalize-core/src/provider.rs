//! Nationality provider trait.
//!
//! The HTTP implementation against nationalize.io lives in nationalize-api;
//! tests plug in scripted providers.

use async_trait::async_trait;

use crate::entities::PersonRecord;
use crate::error::NationalizeResult;

/// A third-party source of country predictions for a name.
#[async_trait]
pub trait NationalityProvider: Send + Sync {
    /// Identifier used in logs and metrics.
    fn provider_id(&self) -> &str;

    /// Fetch a prediction for `name`.
    ///
    /// Non-success responses surface as `UpstreamError::Status` carrying the
    /// upstream status code.
    async fn predict(&self, name: &str) -> NationalizeResult<PersonRecord>;
}
