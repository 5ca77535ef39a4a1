//! Operator probe for the scheduling core.
//!
//! Without arguments prints core ping/version. With a config file it answers
//! slot and vacancy queries against the configured database:
//!
//! ```text
//! slotbook_cli <config.json> slots <YYYY-MM-DD> <duration>
//! slotbook_cli <config.json> vacancy <YYYY-MM-DD>
//! ```

use slotbook_core::{
    init_logging_from_config, open_db, BookingService, CoreConfig, SlotQuery, SqliteAgendaStore,
};
use std::error::Error;
use std::process::ExitCode;

const USAGE: &str = "usage: slotbook_cli [<config.json> slots <YYYY-MM-DD> <duration> | <config.json> vacancy <YYYY-MM-DD>]";

enum Command {
    Slots { day_key: String, duration: u32 },
    Vacancy { day_key: String },
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        println!("slotbook_core ping={}", slotbook_core::ping());
        println!("slotbook_core version={}", slotbook_core::core_version());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let (config_path, command) = parse_args(args)?;
    let config = CoreConfig::load(config_path)?;
    init_logging_from_config(&config)?;

    let conn = open_db(&config.db_path)?;
    let store = SqliteAgendaStore::try_new(&conn)?;
    let booking = BookingService::new(store).with_default_step(config.default_slot_step_minutes);

    match command {
        Command::Slots { day_key, duration } => {
            let slots = booking.generate_slots_with(&SlotQuery::new(day_key, duration))?;
            if slots.is_empty() {
                println!("no slots");
            }
            for slot in slots {
                println!("{slot}");
            }
        }
        Command::Vacancy { day_key } => {
            println!("{}", booking.day_has_vacancy(&day_key)?);
        }
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<(&str, Command), String> {
    match args {
        [config, cmd, day_key, duration] if cmd == "slots" => {
            let duration = duration
                .parse::<u32>()
                .map_err(|_| format!("duration must be a positive integer, got `{duration}`"))?;
            Ok((
                config.as_str(),
                Command::Slots {
                    day_key: day_key.clone(),
                    duration,
                },
            ))
        }
        [config, cmd, day_key] if cmd == "vacancy" => Ok((
            config.as_str(),
            Command::Vacancy {
                day_key: day_key.clone(),
            },
        )),
        _ => Err(USAGE.to_string()),
    }
}
