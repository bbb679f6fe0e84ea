use std::io::{self, BufWriter, Write};

use lineage_delay::settings::SETTINGS_FILE;
use lineage_delay::{BitstringEngine, RunSettings, StatsRecord};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    // configure Rayon's global thread pool once at startup so worker threads get nice names like "rayon-0".
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    // an explicit path must load; the default file falls back to defaults when absent
    let (settings, source) = match std::env::args().nth(1) {
        Some(path) => (RunSettings::load_from(&path)?, path),
        None => (RunSettings::load(), SETTINGS_FILE.to_string()),
    };
    tracing::info!(%source, seed = settings.rng_seed, "settings loaded");
    let mut engine = BitstringEngine::from_settings(settings)?;

    // statistics go to stdout as JSON lines, logs to stderr
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    engine.run(|report| -> Result<(), Box<dyn std::error::Error>> {
        for record in &report.dominant {
            serde_json::to_writer(&mut out, &StatsRecord::Dominant(record.clone()))?;
            writeln!(out)?;
        }
        if let Some(snapshot) = report.snapshot {
            serde_json::to_writer(&mut out, &StatsRecord::Generation(snapshot))?;
            writeln!(out)?;
        }
        Ok(())
    })?;
    out.flush()?;
    Ok(())
}
