use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::appointment::optional_flexible_datetime;
use super::{null_as_default, HasId};

/// A medical document the patient uploaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "_id")]
    pub id: String,
    pub file_name: String,
    pub file_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub report_type: String,
    #[serde(default, deserialize_with = "optional_flexible_datetime")]
    pub report_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "optional_flexible_datetime")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Human readable size, e.g. `1.5 MB`
    pub fn display_size(&self) -> String {
        const KB: f64 = 1024.0;
        const MB: f64 = KB * 1024.0;
        let size = self.file_size as f64;
        if size >= MB {
            format!("{:.1} MB", size / MB)
        } else if size >= KB {
            format!("{:.1} KB", size / KB)
        } else {
            format!("{} B", self.file_size)
        }
    }
}

impl HasId for Report {
    fn id(&self) -> &str {
        &self.id
    }
}
