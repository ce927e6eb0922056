//! Client library for the patient portal backend.
//!
//! [`api::ApiClient`] talks to the REST API and owns the session and the
//! global 401 handling. The page-level workflows built on top of it live in
//! [`booking`], [`appointments`], [`reports`] and [`profile`].

pub mod api;
pub mod appointments;
pub mod booking;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod navigation;
pub mod notify;
pub mod profile;
pub mod reports;
pub mod session;

pub use api::ApiClient;
pub use config::PortalConfig;
pub use error::{PortalError, Result};
pub use navigation::{Navigator, Route};
pub use notify::{Confirm, Level, Notification, Notifier};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
