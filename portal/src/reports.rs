use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::api::{ApiClient, ReportUpload};
use crate::error::{PortalError, Result};
use crate::models::Report;
use crate::notify::Confirm;

pub const ALLOWED_REPORT_MIME_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

pub const MAX_REPORT_BYTES: u64 = 10 * 1024 * 1024;

pub const REPORT_TYPES: [&str; 8] = [
    "Lab Report",
    "Prescription",
    "X-Ray",
    "MRI",
    "CT Scan",
    "Ultrasound",
    "Blood Test",
    "Other",
];

/// A file picked for upload, not yet read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub mime_type: String,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, size: u64, mime_type: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            size,
            mime_type: mime_type.into(),
        }
    }

    /// Stat the file and infer its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(PortalError::validation(
                "reportFile",
                format!("{} is not a file", path.display()),
            ));
        }
        Ok(Self::new(path, metadata.len(), mime_for(path)))
    }
}

fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        _ => "application/octet-stream",
    }
}

/// Type and size checks, run before anything is sent
pub fn validate_file(file: &SelectedFile) -> Result<()> {
    if !ALLOWED_REPORT_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(PortalError::validation(
            "reportFile",
            "Only PDF and Word documents are allowed",
        ));
    }
    if file.size > MAX_REPORT_BYTES {
        return Err(PortalError::validation(
            "reportFile",
            "Maximum file size is 10MB",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    file: Option<SelectedFile>,
    pub report_type: String,
    pub report_date: Option<NaiveDate>,
    pub notes: String,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `file` only if it passes validation; a rejected file leaves
    /// the previous selection in place.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<()> {
        validate_file(&file)?;
        self.file = Some(file);
        Ok(())
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn validate(&self) -> Result<(&SelectedFile, NaiveDate)> {
        match (&self.file, self.report_type.trim(), self.report_date) {
            (Some(file), report_type, Some(date)) if !report_type.is_empty() => Ok((file, date)),
            _ => Err(PortalError::validation(
                "reportFile",
                "Please select a file, report type, and date",
            )),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Upload the form's file with progress reporting. On success the form is
/// cleared and the refreshed report list returned; on failure it is untouched.
pub async fn upload<F>(api: &ApiClient, form: &mut UploadForm, progress: F) -> Result<Vec<Report>>
where
    F: Fn(u8) + Send + Sync + 'static,
{
    let (file, date) = form.validate()?;
    validate_file(file)?;

    let contents = tokio::fs::read(&file.path).await?;
    if contents.len() as u64 > MAX_REPORT_BYTES {
        return Err(PortalError::validation(
            "reportFile",
            "Maximum file size is 10MB",
        ));
    }

    let upload = ReportUpload {
        file_name: file.name.clone(),
        mime_type: file.mime_type.clone(),
        contents,
        report_type: form.report_type.trim().to_string(),
        report_date: date.format("%Y-%m-%d").to_string(),
        notes: form.notes.clone(),
    };
    api.upload_report(upload, progress).await?;
    form.reset();

    api.get_reports().await
}

/// Delete after confirmation. `None` means the user declined and nothing was sent.
pub async fn delete_report(
    api: &ApiClient,
    confirm: &impl Confirm,
    id: &str,
) -> Result<Option<Vec<Report>>> {
    if !confirm.confirm("Are you sure you want to delete this report?") {
        return Ok(None);
    }
    api.delete_report(id).await?;
    api.get_reports().await.map(Some)
}

pub async fn download_url(api: &ApiClient, id: &str) -> Result<String> {
    api.report_download_url(id).await
}
