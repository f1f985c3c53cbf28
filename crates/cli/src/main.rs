use anyhow::{bail, Context};
use api_shared::{
    DashboardRes, MenuEntryRes, PatientDetailsRes, PatientsRes, StaffRes, SummariesRes,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use openroom_core::constants::DEFAULT_DATASET_PATH;
use openroom_core::forms::{AddStaffForm, StaffFields};
use openroom_core::views::patients::find_patient;
use openroom_core::{
    open_backend, App, CoreConfig, EqualityFilter, PatientStatus, Role, StayPolicy,
    SummaryStatus,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "openroom")]
#[command(about = "OpenRoom ward dashboard CLI")]
struct Cli {
    /// Dataset YAML file
    #[arg(long, env = "OPENROOM_DATA", default_value = DEFAULT_DATASET_PATH)]
    data: PathBuf,
    /// Write inserts back to the dataset file
    #[arg(long, env = "OPENROOM_PERSIST")]
    persist: bool,
    /// How discharged patients count towards the average stay
    #[arg(long, env = "OPENROOM_STAY_POLICY", default_value = "since-admission")]
    stay_policy: StayPolicy,
    /// Sign-in email
    #[arg(long, env = "OPENROOM_EMAIL")]
    email: String,
    /// Sign-in password
    #[arg(long, env = "OPENROOM_PASSWORD", hide_env_values = true)]
    password: String,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the navigation menu for your role
    Menu,
    /// Show today's ward statistics
    Dashboard,
    /// List patients
    Patients {
        /// Search by name
        #[arg(long)]
        search: Option<String>,
        /// ACTIVE, REVIEW_PENDING, DISCHARGED or all
        #[arg(long, default_value = "all")]
        status: EqualityFilter<PatientStatus>,
    },
    /// Show one patient with summaries and documents
    Patient {
        /// Patient UUID
        id: Uuid,
    },
    /// List discharge summaries
    Summaries {
        /// Search by patient name
        #[arg(long)]
        search: Option<String>,
        /// DRAFT, REVIEW_PENDING, APPROVED or all
        #[arg(long, default_value = "all")]
        status: EqualityFilter<SummaryStatus>,
    },
    /// List staff (doctors only)
    Staff {
        /// Search by name or email
        #[arg(long)]
        search: Option<String>,
        /// DOCTOR, NURSE, JUNIOR_DOCTOR or all
        #[arg(long, default_value = "all")]
        role: EqualityFilter<Role>,
    },
    /// Add a patient
    AddPatient {
        /// Full name
        full_name: String,
        /// Date of birth (YYYY-MM-DD)
        date_of_birth: String,
        /// Room number
        room_number: String,
        /// Bed number
        bed_number: String,
        /// Date of admission (YYYY-MM-DD), defaults to today
        #[arg(long)]
        admitted: Option<String>,
    },
    /// Add a nurse or junior doctor (doctors only)
    AddStaff {
        /// First name
        first_name: String,
        /// Last name
        last_name: String,
        /// Email, used to sign in
        email: String,
        /// Temporary password
        temp_password: String,
        /// NURSE or JUNIOR_DOCTOR
        #[arg(long, default_value = "NURSE")]
        role: Role,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_hint(hint: Option<&str>) {
    if let Some(hint) = hint {
        println!("Nothing to show. {hint}.");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("openroom=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = Arc::new(CoreConfig::new(Some(cli.data), cli.persist, cli.stay_policy)?);
    let client = open_backend(&cfg).context("failed to open dataset")?;

    let mut app = App::new(client.clone(), cfg);
    app.start(None);
    app.login_form_mut().email = cli.email;
    app.login_form_mut().password = cli.password;
    if !app.submit_login() {
        bail!(
            "sign-in failed: {}",
            app.login_form().error().unwrap_or("unknown error")
        );
    }
    let viewer = app
        .user()
        .cloned()
        .context("signed in without a profile")?;

    match cli.command {
        Some(Commands::Menu) => {
            let entries: Vec<MenuEntryRes> = app.menu().into_iter().map(Into::into).collect();
            if cli.json {
                print_json(&entries)?;
            } else {
                for entry in entries {
                    println!("{:<10} {}", entry.page.id(), entry.label);
                }
            }
        }
        Some(Commands::Dashboard) => {
            let dashboard = DashboardRes::from(&app.open_dashboard(Utc::now())?);
            if cli.json {
                print_json(&dashboard)?;
            } else {
                let stats = dashboard.stats;
                println!("{}", dashboard.greeting);
                println!("Admitted today:    {}", stats.patients_admitted_today);
                println!("Discharged today:  {}", stats.patients_discharged_today);
                println!("Avg. stay (days):  {}", stats.average_length_of_stay);
                println!("Pending summaries: {}", stats.pending_summaries);
                println!("Active patients:   {}", stats.active_patients);
                println!("Total staff:       {}", stats.total_staff);
                let actions: Vec<_> = dashboard
                    .quick_actions
                    .iter()
                    .map(|a| a.label.as_str())
                    .collect();
                println!("Quick actions: {}", actions.join(", "));
            }
        }
        Some(Commands::Patients { search, status }) => {
            let mut list = app.open_patients()?;
            list.set_search(search.unwrap_or_default());
            list.set_status(status);
            if cli.json {
                print_json(&PatientsRes::from(&list))?;
            } else {
                for p in list.visible() {
                    println!(
                        "{}  {:<24} room {:<5} bed {:<3} {:<15} admitted {}",
                        p.id,
                        p.full_name,
                        p.room_number,
                        p.bed_number,
                        p.status.label(),
                        p.date_of_admission
                    );
                }
                print_hint(list.empty_hint());
            }
        }
        Some(Commands::Patient { id }) => {
            let Some(patient) = find_patient(&client, viewer.institution_id, id)? else {
                bail!("patient {id} not found");
            };
            app.select_patient(patient);
            let Some(details) = app.open_patient_details()? else {
                bail!("patient {id} not found");
            };
            let details = PatientDetailsRes::from(details);
            if cli.json {
                print_json(&details)?;
            } else {
                let p = &details.patient;
                println!("{} ({})", p.full_name, p.status.label());
                println!("Born {}, admitted {}", p.date_of_birth, p.date_of_admission);
                println!("Room {}, bed {}", p.room_number, p.bed_number);
                println!("Summaries:");
                for s in &details.summaries {
                    println!("  v{} {:<15} {}", s.version_number, s.status.label(), s.generated_at);
                }
                println!("Documents:");
                for d in &details.documents {
                    println!("  {} ({}, {} bytes)", d.file_name, d.file_type, d.file_size);
                }
            }
        }
        Some(Commands::Summaries { search, status }) => {
            let mut list = app.open_summaries()?;
            list.set_search(search.unwrap_or_default());
            list.set_status(status);
            let res = SummariesRes::from(&list);
            if cli.json {
                print_json(&res)?;
            } else {
                for row in &res.summaries {
                    let mut actions = Vec::new();
                    if row.can_approve {
                        actions.push("approve");
                    }
                    if row.can_edit {
                        actions.push("edit");
                    }
                    println!(
                        "{:<24} v{} {:<15} {}  [{}]",
                        row.patient.full_name,
                        row.summary.version_number,
                        row.summary.status.label(),
                        row.summary.generated_at,
                        actions.join(", ")
                    );
                }
                print_hint(list.empty_hint());
            }
        }
        Some(Commands::Staff { search, role }) => {
            let mut list = app.open_staff()?;
            list.set_search(search.unwrap_or_default());
            list.set_role(role);
            let res = StaffRes::from(&list);
            if cli.json {
                print_json(&res)?;
            } else {
                for row in &res.staff {
                    let m = &row.member;
                    println!(
                        "{:<24} {:<28} {}",
                        m.full_name(),
                        m.email,
                        m.role.label()
                    );
                }
                print_hint(list.empty_hint());
            }
        }
        Some(Commands::AddPatient {
            full_name,
            date_of_birth,
            room_number,
            bed_number,
            admitted,
        }) => {
            let mut list = app.open_patients()?;
            let form = app.open_add_patient(Utc::now().date_naive());
            form.fields.full_name = full_name;
            form.fields.date_of_birth = date_of_birth;
            form.fields.room_number = room_number;
            form.fields.bed_number = bed_number;
            if let Some(admitted) = admitted {
                form.fields.date_of_admission = admitted;
            }
            let patient = app.submit_add_patient(&mut list)?;
            if cli.json {
                print_json(&patient)?;
            } else {
                println!("Added patient {} with ID: {}", patient.full_name, patient.id);
            }
        }
        Some(Commands::AddStaff {
            first_name,
            last_name,
            email,
            temp_password,
            role,
        }) => {
            let mut form = AddStaffForm {
                fields: StaffFields {
                    first_name,
                    last_name,
                    email,
                    role,
                    temp_password,
                },
            };
            let member = form.submit(&client, &viewer)?;
            if cli.json {
                print_json(&member)?;
            } else {
                println!(
                    "Added {} {} with ID: {}",
                    member.role.label(),
                    member.full_name(),
                    member.id
                );
            }
        }
        None => {
            println!("Signed in as {} ({})", viewer.full_name(), viewer.role.label());
            println!("Use --help for more information.");
        }
    }

    Ok(())
}
