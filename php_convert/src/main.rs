use std::fs;
use std::io::{self, Read as _};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde_php::Codec;

mod config;
mod convert;
mod logging;

/// Converts between PHP's serialization format and JSON.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// An additional configuration file to load.
    ///
    /// It takes precedence over `php_convert.toml` in the working directory,
    /// but not over `PHP_CONVERT_` environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// The maximum nesting depth of arrays when decoding.
    ///
    /// 0 removes the limit. Overrides the configured value.
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Converts serialized data to JSON.
    Decode {
        /// The input file. Reads stdin if missing or `-`.
        input: Option<PathBuf>,

        /// The output file. Writes to stdout if missing or `-`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indent the JSON output.
        #[arg(short, long)]
        pretty: bool,
    },
    /// Converts JSON to serialized data.
    Encode {
        /// The input file. Reads stdin if missing or `-`.
        input: Option<PathBuf>,

        /// The output file. Writes to stdout if missing or `-`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validates serialized data and summarizes its content.
    Check {
        /// The input file. Reads stdin if missing or `-`.
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::build(cli.config.as_deref())?;
    logging::init(&config.log)?;

    // run the program and clean up
    let res = run(cli, &config);
    if let Err(why) = &res {
        log::error!("Exiting due to error: {why:?}");
    }

    log::logger().flush();
    res
}

fn run(cli: Cli, config: &config::Config) -> Result<()> {
    let max_depth = match cli.max_depth {
        Some(0) => None,
        Some(depth) => Some(depth),
        None => config.depth_limit(),
    };

    let codec = Codec::new().max_depth(max_depth);
    log::debug!("decoding with depth limit {max_depth:?}");

    match cli.command {
        Command::Decode {
            input,
            output,
            pretty,
        } => {
            let input = read_input(input.as_deref())?;
            let output = open_output(output.as_deref())?;
            convert::decode(&codec, &input, output, pretty || config.pretty)
        },
        Command::Encode { input, output } => {
            let input = read_input(input.as_deref())?;
            let output = open_output(output.as_deref())?;
            convert::encode(&codec, &input, output)
        },
        Command::Check { input } => {
            let input = read_input(input.as_deref())?;
            let summary = convert::check(&codec, &input)?;
            println!("{summary}");
            Ok(())
        },
    }
}

/// Treats `-` the same as a missing path.
fn file_path(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| *p != Path::new("-"))
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match file_path(path) {
        Some(path) => {
            fs::read(path).with_context(|| format!("cannot read input {path:?}"))
        },
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("cannot read stdin")?;
            Ok(buf)
        },
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn io::Write>> {
    match file_path(path) {
        Some(path) => {
            let file =
                fs::File::create(path).with_context(|| format!("cannot create output {path:?}"))?;
            Ok(Box::new(file))
        },
        None => Ok(Box::new(io::stdout().lock())),
    }
}
