use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Environmental,
    Social,
    Governance,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Environmental => "Environmental",
            Self::Social => "Social",
            Self::Governance => "Governance",
        }
    }
}

/// Reporting framework a topic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framework {
    #[serde(rename = "SASB")]
    Sasb,
    #[serde(rename = "GRI")]
    Gri,
    #[serde(rename = "TCFD")]
    Tcfd,
    Custom,
}

impl Framework {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sasb => "SASB",
            Self::Gri => "GRI",
            Self::Tcfd => "TCFD",
            Self::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub framework: Framework,
}

impl Topic {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        framework: Framework,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            framework,
        }
    }

    pub fn custom(id: impl Into<String>, name: impl Into<String>, category: Category) -> Self {
        Self::new(id, name, category, Framework::Custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("topic at position {0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate topic id: {0}")]
    DuplicateId(String),
}

/// Appends `extra` to `base`, keeping order. Ids must be non-empty and
/// unique across the combined catalog.
pub fn build_catalog(base: Vec<Topic>, extra: Vec<Topic>) -> Result<Vec<Topic>, CatalogError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(base.len() + extra.len());
    for (idx, topic) in base.into_iter().chain(extra).enumerate() {
        if topic.id.trim().is_empty() {
            return Err(CatalogError::EmptyId(idx));
        }
        if !seen.insert(topic.id.clone()) {
            return Err(CatalogError::DuplicateId(topic.id));
        }
        out.push(topic);
    }
    Ok(out)
}
