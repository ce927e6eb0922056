mod commands;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use patient_portal::models::AppointmentType;
use patient_portal::{ApiClient, FileSessionStore, Notifier, PortalConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::terminal::{StderrNotifier, StdinConfirm, TerminalNavigator};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "portal")]
#[command(about = "Patient portal - appointments, prescriptions, reports and profile")]
#[command(version)]
struct Cli {
    /// Backend URL, overrides PORTAL_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with a one-time password sent to your mobile
    Login {
        #[command(subcommand)]
        step: LoginStep,
    },
    /// Register as a new patient
    Signup(SignupArgs),
    /// Forget the stored session
    Logout,
    /// Request a password reset email
    ForgotPassword { email: String },
    /// Set a new password with the token from the reset email
    ResetPassword {
        token: String,
        #[arg(long)]
        password: String,
    },
    /// Stats and the next few appointments
    Dashboard,
    /// List, inspect and cancel appointments [default: list]
    Appointments {
        #[command(subcommand)]
        action: Option<AppointmentsAction>,
    },
    /// Book an appointment; missing choices are listed instead of booked
    Book(BookArgs),
    /// Browse doctors
    Doctors {
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Browse facilities
    Facilities {
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Prescriptions issued to you
    Prescriptions,
    /// Medical reports [default: list]
    Reports {
        #[command(subcommand)]
        action: Option<ReportsAction>,
    },
    /// View or edit your profile [default: show]
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LoginStep {
    /// Send an OTP to a 10-digit mobile number
    SendOtp { mobile: String },
    /// Verify the OTP and start a session
    Verify { mobile: String, otp: String },
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub gender: String,
    /// Date of birth, YYYY-MM-DD
    #[arg(long)]
    pub dob: String,
}

#[derive(Subcommand, Debug)]
pub enum AppointmentsAction {
    List,
    Show {
        id: String,
    },
    /// Cancel with an optional reason
    Cancel {
        id: String,
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Cancel without a reason
    QuickCancel {
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct BookArgs {
    #[arg(long)]
    pub facility: Option<String>,
    #[arg(long)]
    pub doctor: Option<String>,
    /// Appointment date, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    /// Slot id from the listed slots
    #[arg(long)]
    pub slot: Option<String>,
    /// onsite, voiceCall, videoCall or homeVisit
    #[arg(long = "type", value_parser = parse_appointment_type, default_value = "onsite")]
    pub appointment_type: AppointmentType,
    #[arg(long, default_value = "")]
    pub reason: String,
    /// Booking link or query, e.g. "facilityId=..&doctorId=.."
    #[arg(long)]
    pub link: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ReportsAction {
    List,
    /// Upload a PDF or Word document (max 10MB)
    Upload {
        path: PathBuf,
        #[arg(long = "type")]
        report_type: String,
        /// Report date, YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Delete {
        id: String,
    },
    /// Print the download link of a report
    Download {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    Show,
    /// Apply edits and save
    Edit {
        /// field=value, dotted paths for nested fields (address.city=Pune)
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// list=value, e.g. allergies=Dust
        #[arg(long = "add", value_parser = parse_assignment)]
        add: Vec<(String, String)>,
        /// list=index, e.g. medications=0
        #[arg(long = "remove", value_parser = parse_assignment)]
        remove: Vec<(String, String)>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_appointment_type(s: &str) -> Result<AppointmentType, String> {
    AppointmentType::parse(s).ok_or_else(|| {
        let names: Vec<&str> = AppointmentType::ALL.iter().map(|t| t.wire_name()).collect();
        format!("expected one of {}", names.join(", "))
    })
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = PortalConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config = PortalConfig::new(url)
            .with_session_file(config.session_file)
            .with_timeout(config.timeout);
    }
    tracing::debug!("using backend {}", config.api_base());

    let store = Arc::new(FileSessionStore::new(&config.session_file));
    let api = ApiClient::new(config, store, Arc::new(TerminalNavigator))?;
    let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier);

    let ctx = commands::Context {
        api,
        notifier: notifier.clone(),
        confirm: StdinConfirm::new(cli.yes),
    };

    let (title, fallback) = cli.command.failure_text();
    if let Err(e) = commands::run(&ctx, cli.command).await {
        tracing::debug!("command failed: {:?}", e);
        notifier.notify(e.notification(title, fallback));
        std::process::exit(1);
    }
    Ok(())
}
