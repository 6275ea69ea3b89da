//! Nationalize Core - Entity Types
//!
//! Person records, the country merge rule, the error taxonomy and the
//! provider seam shared by the storage and API crates.

pub mod country;
pub mod entities;
pub mod error;
pub mod provider;

use std::time::Duration;

pub use country::{merge_countries, CountryIndex};
pub use entities::{validate_name, CountryProbability, PersonPatch, PersonRecord, MAX_NAME_LEN};
pub use error::{
    CacheError, NationalizeError, NationalizeResult, StorageError, UpstreamError, ValidationError,
};
pub use provider::NationalityProvider;

/// Lifetime of a cached person record (one hour).
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
