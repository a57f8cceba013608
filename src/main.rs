//! Pipeline Canvas CLI
//!
//! Usage:
//!   pipeline-canvas [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>  Canvas configuration (TOML format)
//!   -l, --layout         Run auto-layout before writing the pipeline out
//!   --check              Only run the integrity check
//!   --order              Only print the execution order
//!   -h, --help           Print help

use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pipeline_canvas::{load, read_source, serialize, Canvas, CanvasConfig};

#[derive(Parser)]
#[command(name = "pipeline-canvas")]
#[command(about = "Check, order and lay out pipeline descriptions")]
struct Cli {
    /// Pipeline description in JSON (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Canvas configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Lay the pipeline out again before writing it
    #[arg(short, long)]
    layout: bool,

    /// Run the integrity check and report the result
    #[arg(long)]
    check: bool,

    /// Print the execution order, one phase per line
    #[arg(long)]
    order: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,pipeline_canvas=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match CanvasConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => CanvasConfig::default(),
    };

    let filename = match &cli.input {
        Some(path) => path.display().to_string(),
        None => "<stdin>".to_string(),
    };
    let source = match read_source(cli.input.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading '{}': {}", filename, e);
            std::process::exit(1);
        }
    };

    let mut canvas = match load(&source, config) {
        Ok(canvas) => canvas,
        Err(e) => {
            eprintln!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
    };

    if cli.layout {
        if let Err(e) = canvas.auto_layout() {
            eprintln!("Warning: layout skipped: {}", e);
        }
    }

    if cli.check {
        match canvas.graph().assert_integrity() {
            Ok(()) => println!("ok"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if cli.order {
        print_order(&canvas);
        return;
    }

    match serialize(&canvas) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_order(canvas: &Canvas) {
    let Some(order) = canvas.exec_order() else {
        eprintln!("Error: execution order is indeterminate");
        std::process::exit(1);
    };
    let graph = canvas.graph();
    for (i, phase) in order.layers().iter().enumerate() {
        let labels: Vec<&str> = phase
            .iter()
            .filter_map(|&id| graph.shape(id))
            .map(|s| s.label.as_str())
            .collect();
        println!("{}: {}", i + 1, labels.join(", "));
    }
    if order.is_ambiguous() {
        eprintln!("Note: execution order is ambiguous; shared phases follow canvas reading order");
    }
}
