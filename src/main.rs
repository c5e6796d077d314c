mod cli;

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, error, info, warn};

use cli::Args;
use music_minds::config::{Config, DEFAULT_CONFIG_FILE};
use music_minds::data::loader::load_source;
use music_minds::output::{write_table, write_to_path, EMPTY_MESSAGE};
use music_minds::session::Session;

fn main() {
    let args = Args::parse_args();

    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
        return;
    }

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    info!("music-minds v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Handle --init-config: write a default music-minds.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        bail!("{DEFAULT_CONFIG_FILE} already exists. Remove it first or edit it manually.");
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {DEFAULT_CONFIG_FILE}"))?;
    println!("Created {DEFAULT_CONFIG_FILE} with default settings.");
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    args.merge_into(&mut config);
    config.validate()?;

    let dataset = load_source(&config.source.location)?;
    let mut session = Session::new(dataset, config)?;
    info!("{} respondent(s) loaded", session.dataset().len());
    let view = session.config().defaults.view;
    let format = session.config().defaults.format;

    if let Some((lo, hi)) = args.age {
        warn_outside("age", (lo, hi), session.age_span());
        session.set_age_range(lo, hi);
    }
    if let Some((lo, hi)) = args.hours {
        warn_outside("hours", (lo, hi), session.hours_span());
        session.set_hours_range(lo, hi);
    }
    if !args.genre.is_empty() {
        for genre in &args.genre {
            if !session.genres().contains(genre) {
                warn!("genre '{genre}' does not occur in the dataset");
            }
        }
        session.select_genres(args.genre.iter().cloned());
    }
    if let Some(group) = &args.age_group {
        if !session.age_groups().contains(group) {
            bail!(
                "unknown age group '{group}' (expected one of: {})",
                session.age_groups().join(", ")
            );
        }
        session.set_age_group(Some(group.clone()));
    }

    let table = session.render(view)?;
    if table.is_empty() {
        println!("{EMPTY_MESSAGE}");
        return Ok(());
    }

    match &args.output {
        Some(path) => {
            write_to_path(&table, format, path)?;
            println!("Wrote {} row(s) to {}", table.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_table(&table, format, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}

fn warn_outside(what: &str, (lo, hi): (f64, f64), span: Option<(f64, f64)>) {
    if let Some((min, max)) = span {
        if hi < min || lo > max {
            warn!("{what} range {lo}..{hi} lies outside the data ({min}..{max})");
        }
    }
}
