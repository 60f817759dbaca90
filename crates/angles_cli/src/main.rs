//! Command-line entry point over a SQLite-backed catalog store.
//!
//! # Responsibility
//! - Exercise the store lifecycle (`open` → command → `close`) end to end.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `angles_cli <db-path> <show|export|import FILE|backups|restore INDEX>`
//! or `angles_cli version`. Set `ANGLES_LOG_DIR` to an absolute directory to
//! enable file logging.

use angles_core::{
    core_version, default_log_level, init_logging, SqliteStorage, Store, StoreConfig,
    SystemClock, TransferService,
};
use std::process::ExitCode;

const USAGE: &str =
    "usage: angles_cli <db-path> <show|export|import FILE|backups|restore INDEX> | angles_cli version";

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("ANGLES_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let (db_path, command, rest) = match args {
        [single] if single == "version" => {
            println!("angles_core version={}", core_version());
            return Ok(());
        }
        [db_path, command, rest @ ..] => (db_path, command.as_str(), rest),
        _ => return Err(USAGE.to_string()),
    };

    let storage = SqliteStorage::open(db_path).map_err(|err| err.to_string())?;
    let mut store = Store::open(storage, SystemClock, StoreConfig::default())
        .map_err(|err| err.to_string())?;

    match (command, rest) {
        ("show", []) => {
            let snapshot = store.snapshot();
            for hold in &snapshot.holds {
                let (primary, secondary) = snapshot.category_counts(hold);
                let cover = if snapshot.hold_images.contains_key(hold) {
                    " [cover]"
                } else {
                    ""
                };
                println!("{hold}: primary={primary} secondary={secondary}{cover}");
            }
            match store.last_modified() {
                Some(epoch_ms) => println!("last_modified_ms={epoch_ms}"),
                None => println!("last_modified_ms=never"),
            }
        }
        ("export", []) => {
            let text = TransferService::new(&mut store)
                .export_document()
                .map_err(|err| err.to_string())?;
            println!("{text}");
        }
        ("import", [file]) => {
            let bytes =
                std::fs::read(file).map_err(|err| format!("failed to read `{file}`: {err}"))?;
            let report = TransferService::new(&mut store)
                .import_document(&bytes)
                .map_err(|err| err.to_string())?;
            println!(
                "imported holds={} angles={} cover_images={} backup_written={}",
                report.holds, report.angles, report.cover_images, report.backup_written
            );
        }
        ("backups", []) => {
            let entries = store.backups().map_err(|err| err.to_string())?;
            for (index, entry) in entries.iter().enumerate() {
                println!(
                    "{index}: timestamp_ms={} holds={} angles={}",
                    entry.timestamp,
                    entry.snapshot.holds.len(),
                    entry.snapshot.angles.len()
                );
            }
        }
        ("restore", [index]) => {
            let index = index
                .parse::<usize>()
                .map_err(|_| format!("invalid backup index `{index}`"))?;
            store.restore_backup(index).map_err(|err| err.to_string())?;
            println!("restored backup {index}");
        }
        _ => return Err(USAGE.to_string()),
    }

    store.close().map_err(|err| err.to_string())?;
    Ok(())
}
