use std::path::Path;

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

mod parser;
mod sqlite;

use parser::parse_select;
use sqlite::query_engine::{EngineConfig, QueryEngine};

fn main() -> Result<()> {
    // diagnostics go to stderr so query output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = std::env::args().collect::<Vec<_>>();
    match args.len() {
        0 | 1 => bail!("Missing <database path> and <command>"),
        2 => bail!("Missing <command>"),
        _ => {}
    }

    let path = Path::new(&args[1]);
    let command = args[2].as_str();

    let mut engine = QueryEngine::open(path, EngineConfig::from_env())?;
    let lines = match command {
        ".dbinfo" => engine.db_info()?,
        ".tables" => engine.tables()?,
        _ if command.as_bytes().len() >= 6
            && command.as_bytes()[..6].eq_ignore_ascii_case(b"select") =>
        {
            let statement = parse_select(command)?;
            engine.select(&statement)?
        }
        _ => bail!("Unknown command {command}"),
    };

    for line in lines {
        println!("{line}");
    }
    Ok(())
}
