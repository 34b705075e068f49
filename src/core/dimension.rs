use serde::Serialize;

use crate::core::error::ValidationError;

/// The categorical axis costs are split by within each sub-period.
///
/// A closed set: the tag case carries its key, so a tag grouping without
/// a key cannot be represented, only rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Service,
    Account,
    Region,
    Tag { key: String },
}

impl Dimension {
    /// Build a dimension from the CLI/config `group-by` id plus the
    /// optional tag key. `tag` without a key is a validation failure; a
    /// tag key given with any other dimension is ignored.
    pub fn parse(id: &str, tag_key: Option<String>) -> Result<Self, ValidationError> {
        match id.to_lowercase().as_str() {
            "service" => Ok(Self::Service),
            "account" => Ok(Self::Account),
            "region" => Ok(Self::Region),
            "tag" => match tag_key {
                Some(key) if !key.is_empty() => Ok(Self::Tag { key }),
                _ => Err(ValidationError::MissingTagKey),
            },
            other => Err(ValidationError::UnknownDimension(other.to_string())),
        }
    }

    /// Column-header style label: "Service", "Account", "Region", "Tag".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Service => "Service",
            Self::Account => "Account",
            Self::Region => "Region",
            Self::Tag { .. } => "Tag",
        }
    }

    /// The tag key, for the tag case only.
    pub fn tag_key(&self) -> Option<&str> {
        match self {
            Self::Tag { key } => Some(key),
            _ => None,
        }
    }
}
