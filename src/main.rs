use std::fs::File;
use std::io::{self, Read, Write};
use std::process;

use tracing::{error, info};
use transect::request::{Engine, InputDocument, StatsInput};
use transect::snapshot::Snapshot;

const WRONG_USAGE_EXIT_CODE: i32 = 5;

fn usage(program: &str) -> String {
    format!("Usage: {program} [make_base|process_requests]")
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("{}", usage(args.first().map(String::as_str).unwrap_or("transect")));
        process::exit(WRONG_USAGE_EXIT_CODE);
    }

    let result = match args[1].as_str() {
        "make_base" => make_base(),
        "process_requests" => process_requests(),
        other => {
            eprintln!("{}", usage(&args[0]));
            error!(mode = other, "unknown mode");
            process::exit(WRONG_USAGE_EXIT_CODE);
        }
    };

    if let Err(err) = result {
        error!(error = %err, "run failed");
        process::exit(1);
    }
}

fn read_stdin_json() -> Result<serde_json::Value, transect::Error> {
    let mut raw = String::new();
    io::stdin().read_to_string(&mut raw)?;
    Ok(serde_json::from_str(&raw)?)
}

fn make_base() -> Result<(), transect::Error> {
    let doc = read_stdin_json()?;
    let input = InputDocument::parse(&doc)?;
    info!(stops = input.descriptions.len(), "building base");

    let engine = Engine::build(&input)?;
    let snapshot = engine.into_snapshot();

    let mut file = File::create(&input.file)?;
    snapshot.write_to(&mut file)?;
    info!(file = input.file, "snapshot written");
    Ok(())
}

fn process_requests() -> Result<(), transect::Error> {
    let doc = read_stdin_json()?;
    let input = StatsInput::parse(&doc)?;

    let mut file = File::open(&input.file)?;
    let snapshot = Snapshot::read_from(&mut file)?;
    let engine = Engine::from_snapshot(snapshot)?;
    info!(requests = input.stat_requests.len(), "answering requests");

    let responses = engine.process_all(&input.stat_requests)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer(&mut handle, &responses)?;
    handle.write_all(b"\n")?;
    Ok(())
}
