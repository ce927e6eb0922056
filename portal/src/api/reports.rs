use std::sync::Arc;

use futures::stream::{self, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};

use super::ApiClient;
use crate::error::Result;
use crate::models::Report;

const UPLOAD_CHUNK: usize = 64 * 1024;

/// A fully validated report, ready to send
#[derive(Debug, Clone)]
pub struct ReportUpload {
    pub file_name: String,
    pub mime_type: String,
    pub contents: Vec<u8>,
    pub report_type: String,
    pub report_date: String,
    pub notes: String,
}

/// Medical report endpoints
impl ApiClient {
    pub async fn get_reports(&self) -> Result<Vec<Report>> {
        self.get("patient/reports").await
    }

    pub async fn get_report(&self, id: &str) -> Result<Report> {
        self.get(&format!("patient/reports/{}", id)).await
    }

    pub async fn delete_report(&self, id: &str) -> Result<()> {
        self.delete(&format!("patient/reports/{}", id)).await?;
        tracing::info!("report {} deleted", id);
        Ok(())
    }

    /// Multipart upload. `progress` receives the percentage of the file sent so far,
    /// and always ends at 100 once the backend accepts the file.
    pub async fn upload_report<F>(&self, upload: ReportUpload, progress: F) -> Result<Report>
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        let total = upload.contents.len() as u64;
        let chunks: Vec<Vec<u8>> = upload
            .contents
            .chunks(UPLOAD_CHUNK)
            .map(<[u8]>::to_vec)
            .collect();

        let progress = Arc::new(progress);
        let on_chunk = Arc::clone(&progress);
        let mut sent = 0u64;
        let body = stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            on_chunk(percent(sent, total));
            Ok::<_, std::io::Error>(chunk)
        });

        let file_part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;

        let form = Form::new()
            .part("reportFile", file_part)
            .text("reportType", upload.report_type)
            .text("reportDate", upload.report_date)
            .text("notes", upload.notes);

        let report: Report = self
            .send(self.request(Method::POST, "patient/reports/upload").multipart(form))
            .await?;
        // an empty file has no chunks to report on
        if total == 0 {
            progress(100);
        }
        tracing::info!("report {} uploaded ({} bytes)", report.id, total);
        Ok(report)
    }

    /// Absolute download link for a report's stored file
    pub async fn report_download_url(&self, id: &str) -> Result<String> {
        let report = self.get_report(id).await?;
        Ok(self.config().file_url(&report.file_url))
    }
}

fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 200), 0);
        assert_eq!(percent(50, 200), 25);
        assert_eq!(percent(200, 200), 100);
        assert_eq!(percent(300, 200), 100);
        assert_eq!(percent(0, 0), 100);
    }
}
