use clap::Parser;
use recipe_harvest::{Harvest, RecipeRecord};
use std::fs::File;
use std::io::{self, BufWriter, Write};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = match args.run_config() {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let mut sink = match open_sink(&args) {
        Ok(sink) => sink,
        Err(e) => {
            ::log::error!("Failed to open output: {}", e);
            std::process::exit(2);
        }
    };

    // Start the crawler and get a receiver for records
    let mut rx = match Harvest::new(config).generate().await {
        Ok(rx) => rx,
        Err(e) => {
            ::log::error!("Failed to start crawler: {}", e);
            std::process::exit(1);
        }
    };

    let mut saved = 0;
    let start_time = std::time::Instant::now();

    while let Some(record) = rx.recv().await {
        match save_record(&mut sink, &record) {
            Ok(()) => saved += 1,
            Err(e) => ::log::error!("Failed to save {}: {}", record.source_url, e),
        }
    }

    if let Err(e) = sink.flush() {
        ::log::error!("Failed to flush output: {}", e);
    }

    let duration = start_time.elapsed();
    ::log::info!(
        "Scraping completed. Total recipes saved: {} in {:.2} seconds",
        saved,
        duration.as_secs_f64()
    );
}

/// The JSON Lines sink: the output file when given, stdout otherwise
fn open_sink(args: &Args) -> io::Result<Box<dyn Write>> {
    Ok(match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Write one record as a single JSON line
fn save_record(sink: &mut dyn Write, record: &RecipeRecord) -> io::Result<()> {
    serde_json::to_writer(&mut *sink, record)?;
    sink.write_all(b"\n")
}
