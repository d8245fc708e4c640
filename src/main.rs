use clap::{Parser, ValueEnum};
use scte35_cue::Cue;
use serde_json::json;
use std::process;
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

/// Decode an SCTE-35 cue and print it.
#[derive(Debug, Parser)]
#[command(name = "scte35-cue", version)]
struct Args {
    /// Base64 payload, or hex when prefixed with `0x`.
    payload: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new(Level::DEBUG.as_str()),
        _ => EnvFilter::new(Level::TRACE.as_str()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!(payload = %args.payload, "decoding");

    match args.payload.trim().parse::<Cue>() {
        Ok(cue) => match args.output {
            OutputFormat::Text => print!("{cue}"),
            OutputFormat::Json => {
                let document = json!({ "status": "success", "data": cue });
                match serde_json::to_string_pretty(&document) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("Error serializing cue: {e}");
                        process::exit(1);
                    }
                }
            }
        },
        Err(e) => {
            match args.output {
                OutputFormat::Text => eprintln!("Error decoding cue: {e}"),
                OutputFormat::Json => {
                    println!("{}", json!({ "status": "error", "error": e.to_string() }))
                }
            }
            process::exit(1);
        }
    }
}
