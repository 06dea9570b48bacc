//! ptms-admin - Administrative CLI for the track transition engine
//!
//! Drives the engine operations (track finalize/change, Internship-1
//! sub-track change, application review) and the supporting CRUD from the
//! command line. The HTTP layer shares the same engine; this binary exists
//! for operators and for exercising the engine end to end.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ptms_common::db::settings;
use ptms_engine::db::{applications, groups, notifications, projects, students};
use ptms_engine::types::{ApplicationType, ProjectType, Track, VerificationStatus};
use ptms_engine::TransitionEngine;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ptms-admin", version, about = "PTMS administration tool")]
struct Cli {
    /// Root folder holding ptms.db (falls back to PTMS_ROOT_FOLDER, then
    /// the config file, then the platform default)
    #[arg(long, global = true)]
    root_folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and schema
    InitDb,
    /// Set the current academic year (YYYY-YY)
    SetAcademicYear { year: String },
    /// Register a student
    AddStudent {
        #[arg(long)]
        roll: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        semester: i64,
    },
    /// Record a student's own track choice for a semester
    SubmitChoice {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        semester: i64,
        #[arg(long)]
        track: String,
    },
    /// Register a project for a student or a group
    RegisterProject {
        #[arg(long, conflicts_with = "group")]
        student: Option<Uuid>,
        #[arg(long)]
        group: Option<Uuid>,
        #[arg(long = "type")]
        project_type: String,
        #[arg(long)]
        title: String,
    },
    /// Allocate a faculty to a project
    AllocateFaculty {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        faculty: Uuid,
    },
    /// Create a project group
    CreateGroup {
        #[arg(long)]
        name: String,
    },
    /// Add a student to a group
    AddMember {
        #[arg(long)]
        group: Uuid,
        #[arg(long)]
        student: Uuid,
    },
    /// Submit an internship application for a student
    SubmitApplication {
        #[arg(long)]
        student: Uuid,
        #[arg(long = "type")]
        app_type: String,
        #[arg(long)]
        company: String,
    },
    /// Finalize or change a student's semester track (admin)
    FinalizeTrack {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        semester: i64,
        #[arg(long)]
        track: String,
        #[arg(long)]
        verification_status: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Move a student between the Internship-1 project and application
    /// sub-tracks (admin)
    ChangeInternship1Track {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        target: String,
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Transition an application's review status (admin)
    ReviewApplication {
        #[arg(long)]
        application: Uuid,
        #[arg(long)]
        status: String,
        #[arg(long)]
        remarks: Option<String>,
        #[arg(long)]
        reviewer: String,
    },
    /// Show a student's track selection for a semester
    ShowSelection {
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        semester: i64,
    },
    /// List notifications for a faculty
    Notifications {
        #[arg(long)]
        faculty: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting ptms-admin v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let root_folder =
        ptms_common::config::resolve_root_folder(cli.root_folder.as_deref(), "PTMS_ROOT_FOLDER");
    let db_path = ptms_common::config::database_path(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = ptms_common::db::init_database_pool(&db_path).await?;
    let engine = TransitionEngine::new(pool.clone());

    match cli.command {
        Command::InitDb => {
            // Schema creation already happened in init_database_pool
            println!("Database initialized at {}", db_path.display());
        }
        Command::SetAcademicYear { year } => {
            settings::set_current_academic_year(&pool, year.clone()).await?;
            println!("Academic year set to {year}");
        }
        Command::AddStudent {
            roll,
            name,
            email,
            semester,
        } => {
            let student = students::Student::new(roll, name, email, semester);
            students::create_student(&pool, &student).await?;
            println!("{}", student.guid);
        }
        Command::SubmitChoice {
            student,
            semester,
            track,
        } => {
            let track = Track::parse(&track).ok_or_else(|| anyhow!("invalid track: {track}"))?;
            let year = settings::get_current_academic_year(&pool).await?;
            let selection =
                students::submit_track_choice(&pool, student, semester, &year, track).await?;
            println!("{}", serde_json::to_string_pretty(&selection)?);
        }
        Command::RegisterProject {
            student,
            group,
            project_type,
            title,
        } => {
            let project_type = ProjectType::parse(&project_type)
                .ok_or_else(|| anyhow!("invalid project type: {project_type}"))?;
            let project = match (student, group) {
                (Some(student_id), None) => {
                    projects::Project::new_for_student(project_type, student_id, title)
                }
                (None, Some(group_id)) => {
                    projects::Project::new_for_group(project_type, group_id, title)
                }
                _ => return Err(anyhow!("exactly one of --student/--group is required")),
            };
            projects::register_project(&pool, &project).await?;
            println!("{}", project.guid);
        }
        Command::AllocateFaculty { project, faculty } => {
            projects::allocate_faculty(&pool, project, faculty).await?;
            println!("Faculty allocated");
        }
        Command::CreateGroup { name } => {
            let guid = groups::create_group(&pool, &name).await?;
            println!("{guid}");
        }
        Command::AddMember { group, student } => {
            groups::add_group_member(&pool, group, student).await?;
            println!("Member added");
        }
        Command::SubmitApplication {
            student,
            app_type,
            company,
        } => {
            let app_type = ApplicationType::parse(&app_type)
                .ok_or_else(|| anyhow!("invalid application type: {app_type}"))?;
            let app = applications::Application::new(student, app_type, company);
            applications::submit_application(&pool, &app).await?;
            println!("{}", app.guid);
        }
        Command::FinalizeTrack {
            student,
            semester,
            track,
            verification_status,
            remarks,
        } => {
            let verification_status = verification_status
                .as_deref()
                .map(|s| {
                    VerificationStatus::parse(s)
                        .ok_or_else(|| anyhow!("invalid verification status: {s}"))
                })
                .transpose()?;
            let selection = engine
                .finalize_track(student, semester, &track, verification_status, remarks)
                .await?;
            println!("{}", serde_json::to_string_pretty(&selection)?);
        }
        Command::ChangeInternship1Track {
            student,
            target,
            remarks,
        } => {
            engine
                .change_internship1_track(student, &target, remarks)
                .await?;
            println!("Internship 1 sub-track changed to {target}");
        }
        Command::ReviewApplication {
            application,
            status,
            remarks,
            reviewer,
        } => {
            let outcome = engine
                .review_application(application, &status, remarks, &reviewer)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome.application)?);
            match outcome.project_retirement {
                Ok(Some(project_id)) => println!("Retired Internship 1 project {project_id}"),
                Ok(None) => {}
                Err(e) => eprintln!("warning: project retirement failed: {e}"),
            }
            if let Err(e) = outcome.outcome_sync {
                eprintln!("warning: outcome sync failed: {e}");
            }
        }
        Command::ShowSelection { student, semester } => {
            let year = settings::get_current_academic_year(&pool).await?;
            let mut conn = pool.acquire().await.context("acquire connection")?;
            match students::load_selection(&mut conn, student, semester, &year).await? {
                Some(selection) => println!("{}", serde_json::to_string_pretty(&selection)?),
                None => println!("No selection for semester {semester} ({year})"),
            }
        }
        Command::Notifications { faculty } => {
            let list = notifications::list_for_faculty(&pool, faculty).await?;
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
    }

    Ok(())
}
