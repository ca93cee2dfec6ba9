//! `vellum`: print the frames of the ID3v2 tag at the front of a file.
//!
//! ```bash
//! vellum song.mp3
//! vellum --json song.mp3
//! RUST_LOG=vellum_proto=debug vellum song.mp3
//! ```

use std::{fs::File, io::BufReader, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vellum_proto::{DecodeOptions, Tag};

/// Print the frames of an ID3v2 tag
#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(about = "Print the frames of an ID3v2 tag")]
struct Args {
    /// File starting with an ID3v2 tag
    file: PathBuf,

    /// Print the decoded tag as JSON
    #[arg(long)]
    json: bool,

    /// Refuse tags declaring more than this many bytes
    #[arg(long, default_value_t = DecodeOptions::DEFAULT_MAX_TAG_SIZE)]
    max_tag_size: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("vellum: {err:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> Result<()> {
    let file = File::open(&args.file).with_context(|| format!("cannot open {}", args.file.display()))?;
    let options = DecodeOptions::with_max_tag_size(args.max_tag_size);
    let (tag, consumed) = Tag::decode_with(BufReader::new(file), &options)
        .with_context(|| format!("cannot decode tag in {}", args.file.display()))?;
    debug!(consumed, frames = tag.frames.len(), "decoded");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tag)?);
    } else {
        for line in vellum_cli::lines(&tag) {
            println!("{line}");
        }
    }
    Ok(())
}
