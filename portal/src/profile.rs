//! Edit-in-place profile form.
//!
//! The editor keeps the last server copy as a snapshot next to a working
//! draft. Nested edits (address, emergency contact, arbitrary fields) are
//! expressed as RFC 7396 merge patches against the draft's JSON form.

use serde_json::{Map, Value};

use crate::api::ApiClient;
use crate::error::{PortalError, Result};
use crate::models::Profile;

/// Fields the backend owns or that identify the login
const READ_ONLY_FIELDS: [&str; 3] = ["_id", "mobile", "facilities"];

/// The free-form tag lists of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Allergies,
    Conditions,
    Medications,
}

impl ListField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allergies" | "knownallergies" => Some(Self::Allergies),
            "conditions" | "medicalconditions" => Some(Self::Conditions),
            "medications" => Some(Self::Medications),
            _ => None,
        }
    }

    fn of(self, profile: &mut Profile) -> &mut Vec<String> {
        match self {
            Self::Allergies => &mut profile.known_allergies,
            Self::Conditions => &mut profile.medical_conditions,
            Self::Medications => &mut profile.medications,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileEditor {
    snapshot: Profile,
    draft: Profile,
    editing: bool,
}

impl ProfileEditor {
    pub fn new(profile: Profile) -> Self {
        Self {
            draft: profile.clone(),
            snapshot: profile,
            editing: false,
        }
    }

    pub async fn load(api: &ApiClient) -> Result<Self> {
        api.get_profile().await.map(Self::new)
    }

    pub fn snapshot(&self) -> &Profile {
        &self.snapshot
    }

    pub fn draft(&self) -> &Profile {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.snapshot
    }

    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    /// Discard the draft
    pub fn cancel(&mut self) {
        self.draft = self.snapshot.clone();
        self.editing = false;
    }

    fn ensure_editing(&self) -> Result<()> {
        if !self.editing {
            return Err(PortalError::validation(
                "profile",
                "Click Edit Profile before making changes",
            ));
        }
        Ok(())
    }

    /// Merge `patch` into the draft. The draft is left as it was if the
    /// patched document no longer reads as a profile.
    pub fn apply_patch(&mut self, patch: &Value) -> Result<()> {
        self.ensure_editing()?;
        if let Some(field) = patch
            .as_object()
            .and_then(|fields| READ_ONLY_FIELDS.iter().find(|f| fields.contains_key(**f)))
        {
            return Err(PortalError::validation(
                *field,
                format!("{} cannot be changed here", field),
            ));
        }

        let mut doc = serde_json::to_value(&self.draft)?;
        json_patch::merge(&mut doc, patch);
        self.draft = serde_json::from_value(doc)?;
        Ok(())
    }

    /// Set one field by dotted path, e.g. `address.city` or `bloodGroup`.
    /// `null` removes it.
    pub fn set_field(&mut self, path: &str, value: Value) -> Result<()> {
        self.apply_patch(&field_patch(path, value)?)
    }

    /// Append a trimmed entry; blanks and duplicates are ignored.
    /// Returns whether the list changed.
    pub fn add_entry(&mut self, field: ListField, value: &str) -> Result<bool> {
        self.ensure_editing()?;
        let value = value.trim();
        let list = field.of(&mut self.draft);
        if value.is_empty() || list.iter().any(|existing| existing == value) {
            return Ok(false);
        }
        list.push(value.to_string());
        Ok(true)
    }

    pub fn remove_entry(&mut self, field: ListField, index: usize) -> Result<Option<String>> {
        self.ensure_editing()?;
        let list = field.of(&mut self.draft);
        Ok((index < list.len()).then(|| list.remove(index)))
    }

    /// PUT the whole draft. On success the server copy becomes both
    /// snapshot and draft; on failure editing continues with edits intact.
    pub async fn save(&mut self, api: &ApiClient) -> Result<&Profile> {
        self.ensure_editing()?;
        let saved = api.update_profile(&self.draft).await?;
        self.snapshot = saved.clone();
        self.draft = saved;
        self.editing = false;
        Ok(&self.snapshot)
    }
}

/// Build the merge patch that sets `path` (dot separated) to `value`
pub fn field_patch(path: &str, value: Value) -> Result<Value> {
    let keys: Vec<&str> = path.split('.').map(str::trim).collect();
    if keys.iter().any(|k| k.is_empty()) {
        return Err(PortalError::validation(
            "profile",
            format!("invalid field path '{}'", path),
        ));
    }
    Ok(keys.iter().rev().fold(value, |inner, key| {
        let mut object = Map::new();
        object.insert((*key).to_string(), inner);
        Value::Object(object)
    }))
}
