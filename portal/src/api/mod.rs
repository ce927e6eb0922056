pub mod auth;
pub mod client;
pub mod patient;
pub mod reports;

pub use client::ApiClient;
pub use reports::ReportUpload;
