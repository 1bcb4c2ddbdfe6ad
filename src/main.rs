use std::env;
use std::path::Path;
use std::process;

use anyhow::Result;

use clinic_warehouse::{
    statistics, users, ClinicResult, Config, Department, NotesRegistry, UsageLog, User, VisitDraft,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        print_usage();
        process::exit(2);
    }

    let config = Config::from_env();
    let usage_log = UsageLog::new(config.usage_log());

    let username = &args[1];
    let password = &args[2];
    let command = args[3].as_str();
    let rest = &args[4..];

    let user = match users::authenticate(config.credentials_file(), username, password)? {
        Some(user) => user,
        None => {
            usage_log.record(username, "Unknown", "Login Failed")?;
            eprintln!("Invalid credentials. Access denied.");
            process::exit(1);
        }
    };
    usage_log.record(&user.username, user.role.as_str(), "Login Success")?;
    println!("Logged in as: {} ({})\n", user.username, user.role.as_str());

    if let Err(err) = run_command(&config, &usage_log, &user, command, rest) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }

    Ok(())
}

fn run_command(
    config: &Config,
    usage_log: &UsageLog,
    user: &User,
    command: &str,
    rest: &[String],
) -> ClinicResult<()> {
    match command {
        "add-visit" => {
            check(user.role.can_add_patient(), "add patient visits");
            require_args(rest, 4, "add-visit <patient-id> <date> <department> <complaint>");

            let draft = VisitDraft {
                visit_time: rest[1].clone(),
                visit_department: rest[2].clone(),
                chief_complaint: rest[3].clone(),
                gender: rest.get(4).cloned(),
                race: rest.get(5).cloned(),
                age: rest.get(6).and_then(|raw| raw.parse().ok()),
                ethnicity: rest.get(7).cloned(),
                insurance: rest.get(8).cloned(),
                zip_code: rest.get(9).cloned(),
                note_type: rest.get(10).cloned(),
                ..VisitDraft::default()
            };

            let mut department = Department::load("General", config.data_file())?;
            let visit_id = department.add_or_update_visit(&rest[0], draft)?;
            usage_log.record(
                &user.username,
                user.role.as_str(),
                &format!("Added visit for {}", rest[0]),
            )?;
            println!("✓ Visit {} recorded for patient {}", visit_id, rest[0]);
        }

        "remove-patient" => {
            check(user.role.can_remove_patient(), "remove patients");
            require_args(rest, 1, "remove-patient <patient-id>");

            let mut department = Department::load("General", config.data_file())?;
            department.remove_patient(&rest[0])?;
            usage_log.record(
                &user.username,
                user.role.as_str(),
                &format!("Removed patient {}", rest[0]),
            )?;
            println!("✓ Patient {} removed", rest[0]);
        }

        "latest" => {
            check(user.role.can_retrieve_patient(), "retrieve patients");
            require_args(rest, 1, "latest <patient-id>");

            let department = Department::load("General", config.data_file())?;
            let (patient, visit) = department.retrieve_latest_visit(&rest[0])?;
            usage_log.record(
                &user.username,
                user.role.as_str(),
                &format!("Retrieved patient {}", rest[0]),
            )?;

            println!("Patient ID: {}", patient.patient_id);
            println!("Gender: {}", patient.gender);
            println!("Race: {}", patient.race);
            println!("Age: {}", patient.age);
            println!("Ethnicity: {}", patient.ethnicity);
            println!("Insurance: {}", patient.insurance);
            println!("Zip Code: {}", patient.zip_code);
            println!("Visit ID: {}", visit.visit_id);
            println!("Visit Time: {}", visit.visit_time);
            println!("Department: {}", visit.visit_department);
            println!("Chief Complaint: {}", visit.chief_complaint);
        }

        "count-visits" => {
            check(user.role.can_count_visits(), "count visits");
            require_args(rest, 1, "count-visits <date>");

            let department = Department::load("General", config.data_file())?;
            let count = department.count_visits_on(&rest[0])?;
            usage_log.record(
                &user.username,
                user.role.as_str(),
                &format!("Counted visits on {}", rest[0]),
            )?;
            println!("Total visits on {}: {}", rest[0], count);
        }

        "note" => {
            check(user.role.can_view_note(), "view notes");
            require_args(rest, 2, "note <patient-id> <date>");

            let department = Department::load("General", config.data_file())?;
            let notes = NotesRegistry::load(config.notes_file())?;
            let found = notes.notes_for(&rest[0], &rest[1], &department)?;
            usage_log.record(
                &user.username,
                user.role.as_str(),
                &format!("Viewed notes for {}", rest[0]),
            )?;

            if found.is_empty() {
                println!("No notes found for given date.");
            } else {
                for note in found {
                    println!("Note ID: {}", note.note_id);
                    println!("{}\n", note.note_text);
                }
            }
        }

        "stats" => {
            check(user.role.can_generate_statistics(), "generate statistics");

            let department = Department::load("General", config.data_file())?;
            if department.is_empty() {
                println!("No valid data available for statistics.");
                return Ok(());
            }
            let report = statistics::generate(&department);
            usage_log.record(
                &user.username,
                user.role.as_str(),
                "Generated key statistics",
            )?;
            print!("{}", statistics::render(&report));
        }

        "export-stats" => {
            check(user.role.can_generate_statistics(), "export statistics");
            require_args(rest, 1, "export-stats <output-file>");

            let department = Department::load("General", config.data_file())?;
            statistics::export(&department, Path::new(&rest[0]))?;
            usage_log.record(
                &user.username,
                user.role.as_str(),
                "Exported statistics summary",
            )?;
            println!("✓ Summary statistics exported to {}", rest[0]);
        }

        "export-patient" => {
            check(user.role.can_retrieve_patient(), "retrieve patients");
            require_args(rest, 2, "export-patient <patient-id> <output-file>");

            let department = Department::load("General", config.data_file())?;
            department.export_patient(&rest[0], Path::new(&rest[1]))?;
            usage_log.record(
                &user.username,
                user.role.as_str(),
                &format!("Retrieved patient {}", rest[0]),
            )?;
            println!("✓ Patient data saved to {}", rest[1]);
        }

        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(2);
        }
    }

    Ok(())
}

fn check(allowed: bool, action: &str) {
    if !allowed {
        eprintln!("Permission denied: your role may not {}.", action);
        process::exit(1);
    }
}

fn require_args(rest: &[String], count: usize, usage: &str) {
    if rest.len() < count {
        eprintln!("Usage: clinic-warehouse <username> <password> {}", usage);
        process::exit(2);
    }
}

fn print_usage() {
    eprintln!("Clinic Record Keeper");
    eprintln!();
    eprintln!("Usage: clinic-warehouse <username> <password> <command> [args...]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  add-visit <patient-id> <date> <department> <complaint>");
    eprintln!("            [gender] [race] [age] [ethnicity] [insurance] [zip] [note-type]");
    eprintln!("  remove-patient <patient-id>");
    eprintln!("  latest <patient-id>");
    eprintln!("  count-visits <date>");
    eprintln!("  note <patient-id> <date>");
    eprintln!("  stats");
    eprintln!("  export-stats <output-file>");
    eprintln!("  export-patient <patient-id> <output-file>");
    eprintln!();
    eprintln!("Dates are YYYY-MM-DD. File locations come from CLINIC_DATA_FILE,");
    eprintln!("CLINIC_NOTES_FILE, CLINIC_CREDENTIALS_FILE and CLINIC_USAGE_LOG.");
}
