use std::io::{self, BufRead, Write};
use std::{env, fs, process};

use rowdb::{Database, EngineConfig};
use tracing::debug;

/// Line oriented shell: one command per line on stdin, results on stdout.
///
/// An optional first argument names a JSON file holding an [EngineConfig].
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("rowdb: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match env::args().nth(1) {
        Some(path) => serde_json::from_str::<EngineConfig>(&fs::read_to_string(&path)?)?,
        None => EngineConfig::default(),
    };
    debug!(?config, "starting shell");
    let mut db = Database::with_config(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
            break;
        }

        match db.execute(command) {
            Ok(outcome) => writeln!(stdout, "{outcome}")?,
            Err(err) => writeln!(stdout, "ERROR: {err}")?,
        }
        stdout.flush()?;
    }
    Ok(())
}
