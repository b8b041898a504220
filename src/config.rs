use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{FieldDataError, Result};

/// Physical encoding of a field's per-segment term dictionary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDataFormat {
    /// One owned buffer per distinct term
    Concrete,
    /// Terms packed into fixed-size pages
    PagedBytes,
    /// Terms held in a finite state transducer
    Fst,
}

impl FieldDataFormat {
    pub const ALL: [FieldDataFormat; 3] = [
        FieldDataFormat::Concrete,
        FieldDataFormat::PagedBytes,
        FieldDataFormat::Fst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldDataFormat::Concrete => "concrete",
            FieldDataFormat::PagedBytes => "paged_bytes",
            FieldDataFormat::Fst => "fst",
        }
    }
}

impl fmt::Display for FieldDataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldDataFormat {
    type Err = FieldDataError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "concrete" => Ok(FieldDataFormat::Concrete),
            "paged_bytes" => Ok(FieldDataFormat::PagedBytes),
            "fst" => Ok(FieldDataFormat::Fst),
            other => Err(FieldDataError::InvalidSettings(format!(
                "unknown field data format [{}]",
                other
            ))),
        }
    }
}

/// Per-field overrides
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSettings {
    #[serde(default)]
    pub format: Option<FieldDataFormat>,
}

/// Field data settings for one index
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDataSettings {
    /// Format used for fields without an override
    pub default_format: FieldDataFormat,
    /// Page size in bytes for the paged bytes format (power of two)
    pub page_size: usize,
    /// Per-field overrides keyed by field name
    pub fields: HashMap<String, FieldSettings>,
}

impl FieldDataSettings {
    pub const MIN_PAGE_SIZE: usize = 1 << 6;
    pub const MAX_PAGE_SIZE: usize = 1 << 24;

    /// Parse settings from JSON and validate them
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let settings: Self = serde_json::from_slice(data)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.page_size.is_power_of_two()
            || self.page_size < Self::MIN_PAGE_SIZE
            || self.page_size > Self::MAX_PAGE_SIZE
        {
            return Err(FieldDataError::InvalidSettings(format!(
                "page_size must be a power of two in [{}, {}], got {}",
                Self::MIN_PAGE_SIZE,
                Self::MAX_PAGE_SIZE,
                self.page_size
            )));
        }
        Ok(())
    }

    /// Format for a field, falling back to the default
    pub fn format_for(&self, field: &str) -> FieldDataFormat {
        self.fields
            .get(field)
            .and_then(|f| f.format)
            .unwrap_or(self.default_format)
    }

    pub fn with_default_format(mut self, format: FieldDataFormat) -> Self {
        self.default_format = format;
        self
    }

    pub fn with_field_format(mut self, field: impl Into<String>, format: FieldDataFormat) -> Self {
        self.fields.entry(field.into()).or_default().format = Some(format);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

impl Default for FieldDataSettings {
    fn default() -> Self {
        Self {
            default_format: FieldDataFormat::PagedBytes,
            page_size: 1 << 15,
            fields: HashMap::new(),
        }
    }
}
