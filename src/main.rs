use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use clubstats::error::StatsError;
use clubstats::events::parse_match_upload;
use clubstats::ingest::{EntityLocks, ingest_match};
use clubstats::store;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let (club_name, upload_path) = parse_args()?;
    let db_path = parse_db_path_arg()
        .or_else(|| std::env::var("STATS_DB_PATH").ok().map(PathBuf::from))
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let raw = std::fs::read_to_string(&upload_path)
        .with_context(|| format!("read upload {}", upload_path.display()))?;
    let upload = parse_match_upload(&raw)?;

    let mut conn = store::open_db(&db_path)?;
    let locks = EntityLocks::new();
    match ingest_match(&mut conn, &locks, &club_name, &upload.meta, upload.events) {
        Ok(summary) => {
            println!("Match ingest complete");
            println!("DB: {}", db_path.display());
            println!("Match id: {}", summary.match_id);
            println!("Events inserted: {}", summary.events_inserted);
            println!("Goals recorded: {}", summary.goals_recorded);
            println!("Player profiles touched: {}", summary.players_updated);
            for warning in &summary.warnings {
                println!("  warning: {warning}");
            }
            Ok(())
        }
        Err(err) => {
            let tag = match &err {
                StatsError::Validation { .. } => "validation",
                StatsError::NotFound { .. } => "not-found",
                StatsError::Conflict { .. } => "conflict",
                StatsError::Storage { .. } => "internal",
            };
            Err(anyhow!("{tag}: {err}"))
        }
    }
}

fn parse_args() -> Result<(String, PathBuf)> {
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--db" {
            args.next();
            continue;
        }
        positional.push(arg);
    }
    if positional.len() != 2 {
        return Err(anyhow!("usage: clubstats <club-name> <upload.json> [--db <path>]"));
    }
    let club_name = positional[0].trim().to_string();
    if club_name.is_empty() {
        return Err(anyhow!("club name must not be empty"));
    }
    Ok((club_name, PathBuf::from(&positional[1])))
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if arg == "--db" {
            if let Some(value) = args.get(idx + 1) {
                return Some(PathBuf::from(value));
            }
        }
    }
    None
}
