use serde::{Deserialize, Serialize};

/// Response envelope every backend endpoint wraps its payload in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// A field the backend sends either as a bare id or as the populated record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Id(String),
    Record(Box<T>),
}

impl<T: HasId> Reference<T> {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Record(record) => record.id(),
        }
    }

    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Record(record) => Some(record),
        }
    }
}

pub trait HasId {
    fn id(&self) -> &str;
}
