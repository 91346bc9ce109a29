//! CRAS Agenda - command-line front end

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use cras_agenda::{
    agenda::{DayAgenda, SlotState},
    config::Config,
    db::Store,
    services::Services,
    validation::{format_cpf, format_phone},
};

#[derive(Parser)]
#[command(name = "cras-agenda")]
#[command(about = "Inspect CRAS appointment agendas and validate citizen documents")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Override the seed file from the configuration
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reception view: every interviewer of a unit for one day
    Day {
        #[arg(long)]
        cras: Uuid,
        #[arg(long)]
        date: NaiveDate,
    },
    /// One interviewer's agenda for one day
    Agenda {
        #[arg(long)]
        interviewer: Uuid,
        #[arg(long)]
        date: NaiveDate,
    },
    /// One interviewer's agenda over a date range
    Mine {
        #[arg(long)]
        interviewer: Uuid,
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Earliest free slot of an interviewer
    Next {
        #[arg(long)]
        interviewer: Uuid,
        /// First day to look at (defaults to today)
        #[arg(long)]
        from: Option<NaiveDate>,
    },
    /// Appointments of a unit on one day
    Appointments {
        #[arg(long)]
        cras: Uuid,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Validate and format a CPF
    CheckCpf { cpf: String },
    /// Validate and format a phone number
    CheckPhone { phone: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load_with_env(&args.config)?;
    if let Some(seed) = &args.seed {
        config.data.seed_path = seed.clone();
    }

    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Configuration loaded from {}", args.config.display());

    match &args.command {
        Command::CheckCpf { cpf } => {
            if !print_check(args.json, "cpf", cpf, format_cpf(cpf))? {
                std::process::exit(1);
            }
            return Ok(());
        }
        Command::CheckPhone { phone } => {
            if !print_check(args.json, "phone", phone, format_phone(phone))? {
                std::process::exit(1);
            }
            return Ok(());
        }
        _ => {}
    }

    let store = Store::in_memory();
    store.load_seed(&config.data.seed_path).await?;
    let services = Services::new(store, &config).context("Invalid agenda configuration")?;

    match args.command {
        Command::Day { cras, date } => {
            let view = services.agenda.reception_day(cras, date).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", date.format("%d/%m/%Y"));
                for column in &view.interviewers {
                    println!();
                    println!("{}", column.interviewer_name);
                    print_agenda(&column.agenda);
                }
            }
        }
        Command::Agenda { interviewer, date } => {
            let agenda = services.agenda.interviewer_day(interviewer, date).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&agenda)?);
            } else {
                println!("{}", date.format("%d/%m/%Y"));
                print_agenda(&agenda);
            }
        }
        Command::Mine { interviewer, from, to } => {
            let days = services.agenda.my_agenda(interviewer, from, to).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&days)?);
            } else {
                for agenda in &days {
                    let summary = agenda.summary();
                    println!(
                        "{}  livres {:>2}  agendados {:>2}  bloqueados {:>2}",
                        agenda.date.format("%a %d/%m/%Y"),
                        summary.free,
                        summary.booked,
                        summary.blocked
                    );
                }
            }
        }
        Command::Next { interviewer, from } => {
            let next = services.agenda.next_available(interviewer, from).await?;
            match (next, args.json) {
                (Some((date, time)), true) => {
                    println!("{}", serde_json::json!({ "date": date, "time": time }));
                }
                (Some((date, time)), false) => {
                    println!("{} {}", date.format("%d/%m/%Y"), time.format("%H:%M"));
                }
                (None, true) => println!("null"),
                (None, false) => println!("Nenhum horário livre"),
            }
        }
        Command::Appointments { cras, date } => {
            let list = services.appointments.list_for_day(cras, date).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for a in &list {
                    println!(
                        "{}  {:<10}  {}  {}",
                        a.time.format("%H:%M"),
                        a.status,
                        format_cpf(&a.citizen_cpf).unwrap_or_else(|| a.citizen_cpf.clone()),
                        a.citizen_name
                    );
                }
            }
        }
        Command::CheckCpf { .. } | Command::CheckPhone { .. } => {}
    }

    Ok(())
}

/// Print a document check; returns whether the document is valid
fn print_check(json: bool, kind: &str, input: &str, formatted: Option<String>) -> Result<bool> {
    let valid = formatted.is_some();
    if json {
        let value = serde_json::json!({
            "kind": kind,
            "input": input,
            "valid": valid,
            "formatted": formatted,
        });
        println!("{}", serde_json::to_string(&value)?);
    } else {
        match formatted {
            Some(f) => println!("valid: {}", f),
            None => println!("invalid"),
        }
    }
    Ok(valid)
}

fn print_agenda(agenda: &DayAgenda) {
    for slot in &agenda.slots {
        let label = match &slot.state {
            SlotState::Free => "livre".to_string(),
            SlotState::Booked { citizen_name, status, .. } => format!("{} ({})", citizen_name, status),
            SlotState::Blocked { reason } if reason.is_empty() => "bloqueado".to_string(),
            SlotState::Blocked { reason } => format!("bloqueado: {}", reason),
            SlotState::Past => "encerrado".to_string(),
            SlotState::Closed => "fechado".to_string(),
        };
        println!("  {}  {}", slot.time.format("%H:%M"), label);
    }
}
