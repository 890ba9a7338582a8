// ── Network domain types ──

use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::CoreError;

/// Product families a network can manage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum ProductType {
    Appliance,
    Switch,
    Wireless,
    Camera,
    CellularGateway,
    Sensor,
    SystemsManager,
}

impl ProductType {
    /// Parse a wire name, listing the accepted values on failure.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::from_str(raw.trim()).map_err(|_| {
            let accepted: Vec<String> = Self::iter().map(|p| p.to_string()).collect();
            CoreError::validation(
                "product type",
                format!("'{raw}' is not one of {}", accepted.join(", ")),
            )
        })
    }
}

/// Non-empty set of product types, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProductTypes(IndexSet<ProductType>);

impl ProductTypes {
    pub fn new(types: impl IntoIterator<Item = ProductType>) -> Result<Self, CoreError> {
        let set: IndexSet<ProductType> = types.into_iter().collect();
        if set.is_empty() {
            return Err(CoreError::validation(
                "product types",
                "at least one product type is required",
            ));
        }
        Ok(Self(set))
    }

    /// Parse wire names, e.g. `["appliance", "switch"]`.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, CoreError> {
        let types = raw
            .iter()
            .map(|s| ProductType::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(types)
    }

    pub fn iter(&self) -> impl Iterator<Item = ProductType> + '_ {
        self.0.iter().copied()
    }

    /// Wire names in order, as the create-network body expects them.
    pub fn to_wire(&self) -> Vec<String> {
        self.iter().map(|p| p.to_string()).collect()
    }
}

impl fmt::Display for ProductTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire().join(", "))
    }
}

// ── TimeZone ────────────────────────────────────────────────────────

const IANA_AREAS: &[&str] = &[
    "Africa",
    "America",
    "Antarctica",
    "Arctic",
    "Asia",
    "Atlantic",
    "Australia",
    "Etc",
    "Europe",
    "Indian",
    "Pacific",
];

/// IANA time zone name (`Europe/London`, `America/Argentina/Salta`, `UTC`).
///
/// Checks the shape of the name only; the Dashboard validates it against
/// the zone database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TimeZone(String);

impl TimeZone {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CoreError> {
        let tz = raw.as_ref().trim();
        let invalid = |reason: &str| CoreError::validation("timezone", format!("'{tz}' {reason}"));

        if tz == "UTC" {
            return Ok(Self(tz.to_owned()));
        }

        let mut parts = tz.split('/');
        let area = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        if !IANA_AREAS.contains(&area) {
            return Err(invalid("is not an IANA zone (expected Area/Location, e.g. Europe/London)"));
        }
        if rest.is_empty() || rest.iter().any(|p| p.is_empty()) {
            return Err(invalid("is missing a location after the area"));
        }
        let valid_chars = |p: &&str| {
            p.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'))
        };
        if !rest.iter().all(valid_chars) {
            return Err(invalid("contains characters not used in IANA zone names"));
        }

        Ok(Self(tz.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── NetworkSpec ─────────────────────────────────────────────────────

/// Everything needed to create the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSpec {
    pub name: String,
    pub time_zone: TimeZone,
    pub product_types: ProductTypes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NetworkSpec {
    pub fn new(
        name: impl Into<String>,
        time_zone: TimeZone,
        product_types: ProductTypes,
    ) -> Result<Self, CoreError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(CoreError::validation("network name", "must not be empty"));
        }
        Ok(Self {
            name,
            time_zone,
            product_types,
            tags: Vec::new(),
            notes: None,
        })
    }

    /// Attach tags; blank entries are dropped and whitespace trimmed.
    #[must_use]
    pub fn with_tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.tags = tags
            .iter()
            .map(|t| t.as_ref().trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }
}
