//! Person records and their country-probability lists.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::country::merge_countries;
use crate::error::ValidationError;

/// Upper bound on stored name length (matches the `VARCHAR(255)` column).
pub const MAX_NAME_LEN: usize = 255;

/// One entry of a country distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CountryProbability {
    /// ISO 3166-1 alpha-2 code as reported by the upstream API.
    pub country_id: String,
    pub probability: f64,
}

impl CountryProbability {
    pub fn new(country_id: impl Into<String>, probability: f64) -> Self {
        Self {
            country_id: country_id.into(),
            probability,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.country_id.trim().is_empty() {
            return Err(ValidationError::missing("country_id"));
        }
        if !self.probability.is_finite() || !(0.0..=1.0).contains(&self.probability) {
            return Err(ValidationError::invalid(
                "probability",
                format!(
                    "{} for {} must be between 0 and 1",
                    self.probability, self.country_id
                ),
            ));
        }
        Ok(())
    }
}

/// A stored person: the only entity in the system.
///
/// `name` is the unique, case-sensitive lookup key. The same shape is used
/// for cache values and for the upstream API payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PersonRecord {
    pub name: String,
    pub count: i64,
    pub country: Vec<CountryProbability>,
}

impl PersonRecord {
    pub fn new(name: impl Into<String>, count: i64, country: Vec<CountryProbability>) -> Self {
        Self {
            name: name.into(),
            count,
            country,
        }
    }

    /// Check field constraints before the record is persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_count(self.count)?;
        validate_countries(&self.country)
    }

    /// Apply a partial update.
    ///
    /// `count` is overwritten when present. `country` is merged by
    /// `country_id`: existing entries stay in place with their probability
    /// updated, unseen ids are appended in the order received.
    pub fn merged_with(mut self, patch: PersonPatch) -> Self {
        if let Some(count) = patch.count {
            self.count = count;
        }
        if let Some(incoming) = patch.country {
            self.country = merge_countries(std::mem::take(&mut self.country), incoming);
        }
        self
    }

    /// Look up the probability for a single country.
    pub fn probability_of(&self, country_id: &str) -> Option<f64> {
        self.country
            .iter()
            .find(|c| c.country_id == country_id)
            .map(|c| c.probability)
    }
}

/// Partial body of a PATCH request. The name travels separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PersonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Vec<CountryProbability>>,
}

impl PersonPatch {
    pub fn is_empty(&self) -> bool {
        self.count.is_none() && self.country.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(count) = self.count {
            validate_count(count)?;
        }
        if let Some(country) = &self.country {
            validate_countries(country)?;
        }
        Ok(())
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::missing("name"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::invalid(
            "name",
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    Ok(())
}

fn validate_count(count: i64) -> Result<(), ValidationError> {
    if count < 0 {
        return Err(ValidationError::invalid("count", "must not be negative"));
    }
    Ok(())
}

fn validate_countries(country: &[CountryProbability]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(country.len());
    for entry in country {
        entry.validate()?;
        if !seen.insert(entry.country_id.as_str()) {
            return Err(ValidationError::DuplicateCountry {
                country_id: entry.country_id.clone(),
            });
        }
    }
    Ok(())
}
