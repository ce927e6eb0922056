use std::sync::Arc;

use chrono::{Local, Utc};
use patient_portal::appointments::{self, AppointmentDetail, CancellationFlow};
use patient_portal::booking::BookingWizard;
use patient_portal::directory;
use patient_portal::models::{Appointment, Profile, SignupRequest};
use patient_portal::profile::{ListField, ProfileEditor};
use patient_portal::reports::{self, SelectedFile, UploadForm};
use patient_portal::{
    ApiClient, Confirm, Notification, Notifier, PortalError, Result, Route, SessionStore,
};
use serde_json::Value;

use crate::terminal::StdinConfirm;
use crate::{
    AppointmentsAction, BookArgs, Command, LoginStep, ProfileAction, ReportsAction, SignupArgs,
};

pub struct Context {
    pub api: ApiClient,
    pub notifier: Arc<dyn Notifier>,
    pub confirm: StdinConfirm,
}

impl Context {
    fn success(&self, title: &str, description: impl Into<String>) {
        self.notifier.notify(Notification::success(title, description));
    }

    fn info(&self, title: &str, description: impl Into<String>) {
        self.notifier.notify(Notification::info(title, description));
    }
}

impl Command {
    /// Toast title and fallback text shown when the command fails
    pub fn failure_text(&self) -> (&'static str, &'static str) {
        match self {
            Self::Login { step: LoginStep::SendOtp { .. } } => ("Error", "Failed to send OTP"),
            Self::Login { step: LoginStep::Verify { .. } } => ("Login Failed", "Invalid OTP"),
            Self::Signup(_) => ("Registration Failed", "Failed to register"),
            Self::Logout => ("Error", "Failed to log out"),
            Self::ForgotPassword { .. } => ("Error", "Failed to send reset email"),
            Self::ResetPassword { .. } => ("Error", "Failed to reset password"),
            Self::Dashboard => ("Error", "Failed to load dashboard"),
            Self::Appointments { action } => match action {
                Some(AppointmentsAction::Cancel { .. })
                | Some(AppointmentsAction::QuickCancel { .. }) => {
                    ("Cancellation Failed", "Failed to cancel appointment")
                }
                Some(AppointmentsAction::Show { .. }) => ("Error", "Failed to load appointment"),
                _ => ("Error", "Failed to load appointments"),
            },
            Self::Book(_) => ("Booking Failed", "Failed to book appointment"),
            Self::Doctors { .. } => ("Error", "Failed to load doctors"),
            Self::Facilities { .. } => ("Error", "Failed to load facilities"),
            Self::Prescriptions => ("Error", "Failed to load prescriptions"),
            Self::Reports { action } => match action {
                Some(ReportsAction::Upload { .. }) => ("Upload Failed", "Failed to upload report"),
                Some(ReportsAction::Delete { .. }) => ("Delete Failed", "Failed to delete report"),
                Some(ReportsAction::Download { .. }) => {
                    ("Download Failed", "Failed to download report")
                }
                _ => ("Error", "Failed to load reports"),
            },
            Self::Profile { action } => match action {
                Some(ProfileAction::Edit { .. }) => ("Update Failed", "Failed to update profile"),
                _ => ("Error", "Failed to load profile"),
            },
        }
    }
}

pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Login { step } => login(ctx, step).await,
        Command::Signup(args) => signup(ctx, args).await,
        Command::Logout => {
            ctx.api.logout()?;
            ctx.success("Logged Out", "");
            Ok(())
        }
        Command::ForgotPassword { email } => {
            ctx.api.forgot_password(&email).await?;
            ctx.success("Email Sent", "Check your inbox for the reset link");
            Ok(())
        }
        Command::ResetPassword { token, password } => {
            ctx.api.reset_password(&token, &password).await?;
            ctx.success("Password Reset", "You can now log in with your new password");
            Ok(())
        }
        Command::Dashboard => show_dashboard(ctx).await,
        Command::Appointments { action } => {
            run_appointments(ctx, action.unwrap_or(AppointmentsAction::List)).await
        }
        Command::Book(args) => book(ctx, args).await,
        Command::Doctors { query } => {
            let doctors = ctx.api.get_doctors().await?;
            for doctor in directory::filter_doctors(&doctors, query.as_deref().unwrap_or("")) {
                println!(
                    "{:<26} {:<30} {}",
                    doctor.id,
                    doctor.name,
                    doctor.specialization
                );
            }
            Ok(())
        }
        Command::Facilities { query } => {
            let facilities = ctx.api.get_facilities().await?;
            for facility in
                directory::filter_facilities(&facilities, query.as_deref().unwrap_or(""))
            {
                println!(
                    "{:<26} {:<30} {:<9} {}",
                    facility.id,
                    facility.name,
                    facility.facility_type,
                    facility.formatted_address()
                );
            }
            Ok(())
        }
        Command::Prescriptions => list_prescriptions(ctx).await,
        Command::Reports { action } => run_reports(ctx, action.unwrap_or(ReportsAction::List)).await,
        Command::Profile { action } => run_profile(ctx, action.unwrap_or(ProfileAction::Show)).await,
    }
}

async fn login(ctx: &Context, step: LoginStep) -> Result<()> {
    match step {
        LoginStep::SendOtp { mobile } => {
            ctx.api.send_otp(&mobile).await?;
            ctx.success("OTP Sent", format!("An OTP was sent to {}", mobile.trim()));
        }
        LoginStep::Verify { mobile, otp } => {
            let session = ctx.api.login_with_otp(&mobile, &otp).await?;
            ctx.success("Login Successful", format!("Welcome, {}", session.user.name));
            ctx.api.navigator().navigate(Route::Dashboard);
        }
    }
    Ok(())
}

async fn signup(ctx: &Context, args: SignupArgs) -> Result<()> {
    let request = SignupRequest {
        name: args.name,
        email: args.email,
        phone: args.phone,
        gender: args.gender,
        date_of_birth: args.dob,
    };
    ctx.api.signup(&request).await?;
    ctx.success("Registration Successful", "You can now log in with your mobile number");
    Ok(())
}

async fn show_dashboard(ctx: &Context) -> Result<()> {
    if let Some(session) = ctx.api.session().load()? {
        println!("Welcome back, {}", session.user.name);
    }

    let stats = ctx.api.get_dashboard_stats().await?;
    println!(
        "Upcoming: {}   Doctors: {}   Completed: {}",
        stats.upcoming_appointments, stats.total_doctors, stats.completed_appointments
    );

    let list = ctx.api.get_appointments().await?;
    let next = appointments::upcoming_preview(&list, &Local::now(), 3);
    println!();
    if next.is_empty() {
        println!("No upcoming appointments. Book one with: portal book");
    } else {
        println!("Upcoming appointments");
        for apt in &next {
            print_appointment_row(apt);
        }
    }
    Ok(())
}

fn print_appointment_row(apt: &Appointment) {
    let when = match apt.slot {
        Some(slot) => slot
            .start
            .with_timezone(&Local)
            .format("%Y-%m-%d %I:%M %p")
            .to_string(),
        None => apt
            .appointment_date
            .with_timezone(&Local)
            .format("%Y-%m-%d")
            .to_string(),
    };
    println!(
        "  {:<26} {:<19} {:<24} {:<24} {:<14} {}",
        apt.id,
        when,
        apt.doctor_name(),
        apt.facility_name(),
        apt.appointment_type,
        apt.status
    );
}

async fn run_appointments(ctx: &Context, action: AppointmentsAction) -> Result<()> {
    match action {
        AppointmentsAction::List => {
            let split = appointments::partition_now(ctx.api.get_appointments().await?);
            println!("Upcoming ({})", split.upcoming.len());
            split.upcoming.iter().for_each(print_appointment_row);
            println!("Past ({})", split.past.len());
            split.past.iter().for_each(print_appointment_row);
        }
        AppointmentsAction::Show { id } => {
            let detail = AppointmentDetail::load(&ctx.api, &id).await?;
            print_detail(&detail);
        }
        AppointmentsAction::Cancel { id, reason } => {
            let apt = ctx.api.get_appointment_by_id(&id).await?;
            let flow = CancellationFlow::begin(&apt, &Utc::now())?
                .with_reason(reason.unwrap_or_default());
            if !ctx
                .confirm
                .confirm("Are you sure you want to cancel this appointment?")
            {
                ctx.info("Cancelled", "The appointment was left unchanged");
                return Ok(());
            }
            flow.confirm(&ctx.api).await?;
            ctx.success("Appointment Cancelled", "Your appointment has been cancelled");
        }
        AppointmentsAction::QuickCancel { id } => {
            let apt = ctx.api.get_appointment_by_id(&id).await?;
            match appointments::quick_cancel(&ctx.api, &ctx.confirm, &apt, &Utc::now()).await? {
                Some(list) => {
                    ctx.success("Appointment Cancelled", "Your appointment has been cancelled");
                    let split = appointments::partition_now(list);
                    println!("Upcoming ({})", split.upcoming.len());
                    split.upcoming.iter().for_each(print_appointment_row);
                }
                None => ctx.info("Cancelled", "The appointment was left unchanged"),
            }
        }
    }
    Ok(())
}

fn print_detail(detail: &AppointmentDetail) {
    let apt = &detail.appointment;
    println!("Appointment {}", apt.id);
    println!("  Status:   {}", apt.status);
    println!("  Date:     {}", apt.appointment_date.with_timezone(&Local).format("%A, %d %B %Y"));
    if let Some(slot) = apt.slot {
        println!(
            "  Time:     {} - {}",
            slot.start.with_timezone(&Local).format("%I:%M %p"),
            slot.end.with_timezone(&Local).format("%I:%M %p")
        );
    }
    println!("  Type:     {}", apt.appointment_type);
    println!("  Doctor:   {}", apt.doctor_name());
    if let Some(doctor) = apt.doctor() {
        println!("            {}", doctor.specialization);
    }
    println!("  Facility: {}", apt.facility_name());
    if let Some(facility) = apt.facility() {
        println!("            {}", facility.formatted_address());
    }
    if let Some(reason) = &apt.reason_for_visit {
        println!("  Reason:   {}", reason);
    }
    if let Some(reason) = &apt.cancellation_reason {
        println!("  Cancelled because: {}", reason);
    }
    if detail.can_cancel(&Utc::now()) {
        println!("  Cancel with: portal appointments cancel {}", apt.id);
    }

    if let Some(rx) = detail.visible_prescription() {
        println!();
        println!("Prescription ({})", rx.prescription_type.label());
        if let Some(diagnosis) = &rx.diagnosis {
            println!("  Diagnosis: {}", diagnosis);
        }
        for med in &rx.medications {
            println!(
                "  - {} {} {} for {}",
                med.name, med.dosage, med.frequency, med.duration
            );
            if let Some(instructions) = &med.instructions {
                println!("    {}", instructions);
            }
        }
        if let Some(follow_up) = rx.follow_up_date {
            println!("  Follow-up: {}", follow_up.with_timezone(&Local).format("%Y-%m-%d"));
        }
    }
}

async fn book(ctx: &Context, args: BookArgs) -> Result<()> {
    let api = &ctx.api;
    let mut wizard = BookingWizard::new();

    if let Some(link) = args.link.as_deref() {
        if let Route::BookAppointment {
            facility_id,
            doctor_id,
        } = Route::book_from_query(link)
        {
            wizard
                .apply_deep_link(api, facility_id.as_deref(), doctor_id.as_deref())
                .await?;
        }
    }
    wizard.load_facilities(api).await?;

    if let Some(facility_id) = args.facility.as_deref() {
        wizard.select_facility(api, facility_id).await?;
    }
    if wizard.selected_facility().is_none() {
        println!("Choose a facility with --facility <id>:");
        for facility in wizard.facilities() {
            println!("  {:<26} {} ({})", facility.id, facility.name, facility.facility_type);
        }
        return Ok(());
    }

    if let Some(doctor_id) = args.doctor.as_deref() {
        wizard.select_doctor(doctor_id)?;
    }
    if wizard.selected_doctor().is_none() {
        println!("Choose a doctor with --doctor <id>:");
        for doctor in wizard.doctors() {
            println!("  {:<26} {} - {}", doctor.id, doctor.name, doctor.specialization);
        }
        return Ok(());
    }
    wizard.next()?;

    let Some(date) = args.date else {
        println!("Choose a date with --date YYYY-MM-DD");
        return Ok(());
    };
    wizard.select_date(api, date, Local::now().date_naive()).await?;

    let Some(slot_id) = args.slot.as_deref() else {
        if wizard.slots().is_empty() {
            ctx.info("No Slots", format!("No slots available on {}", date));
        } else {
            println!("Choose a slot with --slot <id>:");
            for slot in wizard.slots() {
                println!("  {:<26} {}", slot.id, slot.label());
            }
        }
        return Ok(());
    };
    wizard.select_slot(slot_id)?;
    wizard.set_modality(args.appointment_type);
    wizard.set_reason(args.reason);
    wizard.next()?;

    let review = wizard.review()?;
    println!("Review your appointment");
    println!("  Facility: {}", review.facility);
    println!("  Doctor:   {} ({})", review.doctor, review.specialization);
    println!("  Date:     {}", review.date.format("%A, %d %B %Y"));
    println!("  Time:     {}", review.slot);
    println!("  Type:     {}", review.modality);
    if !review.reason.trim().is_empty() {
        println!("  Reason:   {}", review.reason.trim());
    }
    println!("  Fee:      ₹{:.0}", review.fee);

    if !ctx.confirm.confirm("Book this appointment?") {
        ctx.info("Not Booked", "Nothing was sent");
        return Ok(());
    }

    let appointment = wizard.submit(api).await?;
    ctx.success(
        "Appointment Booked",
        format!("Your appointment {} has been booked", appointment.id),
    );
    api.navigator().navigate(Route::Appointments);
    Ok(())
}

async fn list_prescriptions(ctx: &Context) -> Result<()> {
    let list = ctx.api.get_prescriptions().await?;
    if list.is_empty() {
        println!("No prescriptions yet");
    }
    for rx in &list {
        let issued = rx
            .issued_on()
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let doctor = rx.prescriber().map(|d| d.name.as_str()).unwrap_or("-");
        println!(
            "{:<26} {:<10} {:<24} {:<24} {}",
            rx.id,
            issued,
            doctor,
            rx.prescription_type.label(),
            rx.diagnosis.as_deref().unwrap_or("")
        );
        if let Some(url) = rx.file_url.as_deref().filter(|_| !rx.is_generated()) {
            println!("    {}", ctx.api.config().file_url(url));
        }
    }
    Ok(())
}

async fn run_reports(ctx: &Context, action: ReportsAction) -> Result<()> {
    match action {
        ReportsAction::List => print_reports(&ctx.api.get_reports().await?),
        ReportsAction::Upload {
            path,
            report_type,
            date,
            notes,
        } => {
            let mut form = UploadForm::new();
            form.select_file(SelectedFile::from_path(&path).await?)?;
            form.report_type = report_type;
            form.report_date = Some(date);
            form.notes = notes;

            let list = reports::upload(&ctx.api, &mut form, |percent| {
                eprint!("\rUploading... {:>3}%", percent);
            })
            .await;
            eprintln!();
            let list = list?;
            ctx.success("Success", "Report uploaded successfully");
            print_reports(&list);
        }
        ReportsAction::Delete { id } => {
            match reports::delete_report(&ctx.api, &ctx.confirm, &id).await? {
                Some(list) => {
                    ctx.success("Success", "Report deleted successfully");
                    print_reports(&list);
                }
                None => ctx.info("Not Deleted", "The report was kept"),
            }
        }
        ReportsAction::Download { id } => {
            println!("{}", reports::download_url(&ctx.api, &id).await?);
        }
    }
    Ok(())
}

fn print_reports(list: &[patient_portal::models::Report]) {
    if list.is_empty() {
        println!("No reports uploaded yet");
    }
    for report in list {
        let date = report
            .report_date
            .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<26} {:<12} {:<10} {:>9}  {}",
            report.id,
            report.report_type,
            date,
            report.display_size(),
            report.file_name
        );
    }
}

async fn run_profile(ctx: &Context, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Show => print_profile(&ctx.api.get_profile().await?),
        ProfileAction::Edit { set, add, remove } => {
            let mut editor = ProfileEditor::load(&ctx.api).await?;
            editor.begin_edit();

            for (path, raw) in set {
                // Plain text unless it parses as JSON (numbers, null, lists)
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                editor.set_field(&path, value)?;
            }
            for (field, value) in add {
                editor.add_entry(list_field(&field)?, &value)?;
            }
            for (field, index) in remove {
                let index: usize = index.trim().parse().map_err(|_| {
                    PortalError::validation(field.as_str(), "Index must be a number")
                })?;
                editor.remove_entry(list_field(&field)?, index)?;
            }

            if !editor.is_dirty() {
                editor.cancel();
                ctx.info("No Changes", "Profile left as it was");
                return Ok(());
            }
            let saved = editor.save(&ctx.api).await?;
            print_profile(saved);
            ctx.success("Profile Updated", "Your profile has been updated successfully");
        }
    }
    Ok(())
}

fn list_field(name: &str) -> Result<ListField> {
    ListField::parse(name).ok_or_else(|| {
        PortalError::validation(name, "Expected allergies, conditions or medications")
    })
}

fn print_profile(profile: &Profile) {
    let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    println!("{}", profile.full_name);
    println!("  Email:          {}", or_dash(&profile.email));
    println!("  Mobile:         {}", or_dash(&profile.mobile));
    println!("  Date of birth:  {}", or_dash(&profile.date_of_birth));
    println!("  Gender:         {}", or_dash(&profile.gender));
    println!("  Blood group:    {}", or_dash(&profile.blood_group));
    if let Some(address) = &profile.address {
        println!("  Address:        {}", address.formatted());
    }
    println!("  Allergies:      {}", profile.known_allergies.join(", "));
    println!("  Conditions:     {}", profile.medical_conditions.join(", "));
    println!("  Medications:    {}", profile.medications.join(", "));
    if let Some(contact) = &profile.emergency_contact {
        println!(
            "  Emergency:      {} ({}) {}",
            or_dash(&contact.name),
            or_dash(&contact.relationship),
            or_dash(&contact.phone)
        );
    }
    for facility in &profile.facilities {
        println!(
            "  Registered at {} [{}] MRN {}",
            facility.name,
            facility.status.as_deref().unwrap_or("-"),
            facility.mrn.as_deref().unwrap_or("-")
        );
    }
}
