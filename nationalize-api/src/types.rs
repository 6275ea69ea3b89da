//! Request and Response Types
//!
//! Wire shapes for the names API. Bodies arrive with every field optional so
//! a missing field is reported as `MISSING_FIELD` rather than a generic
//! deserialization failure.

use nationalize_core::{CountryProbability, PersonPatch, PersonRecord, ValidationError};
use nationalize_storage::{ListQuery, DEFAULT_LIST_LIMIT};
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUEST BODIES
// ============================================================================

/// Body of POST, PUT and PATCH on `/api/v1/names/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PersonPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub country: Option<Vec<CountryProbability>>,
}

impl PersonPayload {
    /// The record key. Blank counts as missing.
    pub fn name(&self) -> Result<&str, ValidationError> {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ValidationError::missing("name"))
    }

    /// Full record for create and replace. Every field is required.
    pub fn into_record(self) -> Result<PersonRecord, ValidationError> {
        let name = self.name()?.to_string();
        let count = self.count.ok_or_else(|| ValidationError::missing("count"))?;
        let country = self
            .country
            .ok_or_else(|| ValidationError::missing("country"))?;
        Ok(PersonRecord::new(name, count, country))
    }

    /// Split into the key and the partial update.
    pub fn into_patch(self) -> Result<(String, PersonPatch), ValidationError> {
        let name = self.name()?.to_string();
        Ok((
            name,
            PersonPatch {
                count: self.count,
                country: self.country,
            },
        ))
    }
}

impl From<PersonRecord> for PersonPayload {
    fn from(record: PersonRecord) -> Self {
        Self {
            name: Some(record.name),
            count: Some(record.count),
            country: Some(record.country),
        }
    }
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

/// `?name=` on GET and DELETE.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct NameQuery {
    /// Person name, case-sensitive.
    pub name: Option<String>,
}

impl NameQuery {
    pub fn name(&self) -> Result<&str, ValidationError> {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ValidationError::missing("name"))
    }
}

/// Filters for `/api/v1/names/list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListNamesParams {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Exact mention count.
    pub count: Option<i64>,
    /// Page size (default 100, max 1000).
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListNamesParams {
    pub fn to_query(&self) -> ListQuery {
        let mut query = ListQuery::new()
            .with_limit(self.limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .with_offset(self.offset.unwrap_or(0));
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.with_search(search);
        }
        if let Some(count) = self.count {
            query = query.with_count(count);
        }
        query
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Response for `/api/v1/names/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListNamesResponse {
    pub items: Vec<PersonRecord>,
    /// Number of stored records matching `search` and `count`.
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}
