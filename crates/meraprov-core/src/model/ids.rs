// ── Identity types ──
//
// Opaque identifiers issued by the Dashboard (organizations, networks,
// templates) and the hardware serial printed on every device. All are
// validated once at construction and immutable afterwards.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Reject empty identifiers and anything that would escape a URL path
/// segment.
fn validate_opaque(field: &str, raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    if trimmed.contains('/') || trimmed.chars().any(char::is_whitespace) {
        return Err(CoreError::validation(
            field,
            format!("'{trimmed}' must not contain '/' or whitespace"),
        ));
    }
    Ok(trimmed.to_owned())
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl AsRef<str>) -> Result<Self, CoreError> {
                validate_opaque($field, raw.as_ref()).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

opaque_id!(
    /// Organization the network is created under.
    OrganizationId,
    "organization id"
);

opaque_id!(
    /// Identifier the Dashboard assigns to a newly created network.
    NetworkId,
    "network id"
);

opaque_id!(
    /// Configuration template to bind.
    TemplateId,
    "template id"
);

// ── Serial ──────────────────────────────────────────────────────────

/// Hardware serial number, normalized to uppercase (e.g. `Q2BN-TXYH-KJLU`).
///
/// The Dashboard matches serials case-insensitively, so two spellings of
/// the same serial compare equal here too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Serial(String);

impl Serial {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CoreError> {
        validate_opaque("serial", raw.as_ref()).map(|s| Self(s.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Serial {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
