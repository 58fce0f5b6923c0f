mod info;
mod list;

use std::fs::File;
use std::io::{stderr, stdin, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use ccsds_decoder::spacepacket::Apid;
use ccsds_decoder::PrimaryHeader;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the primary headers of all packets in a spacepacket file.
    ///
    /// Decoding stops at the first truncated packet. Packets decoded before it are
    /// listed and the command exits with an error.
    List {
        /// Input spacepacket file, or - for stdin
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: list::Format,

        /// Include these apids or apid ranges.
        ///
        /// This accepts a CSV of APIDs as well as ranges of the format <start>-<end>
        /// where start and end are inclusive. For example, you can specify
        /// --include 0,1,2,3,4,5,10,20,30 or --include 0-5,10,20,30
        ///
        /// If used with --exclude, values are first included, then excluded.
        #[arg(short, long, value_name = "csv", value_delimiter = ',')]
        include: Vec<String>,

        /// Exclude these apids or apid ranges.
        ///
        /// Accepts the same values as --include.
        #[arg(short, long, value_name = "csv", value_delimiter = ',')]
        exclude: Vec<String>,
    },
    /// Show packet and sequence gap counts for a spacepacket file
    Info {
        /// Input spacepacket file, or - for stdin
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: info::Format,
    },
}

fn parse_number_ranges(list: Vec<String>) -> Result<Vec<u32>> {
    let rx = regex::Regex::new(r"^(?:(\d+)|(\d+)-(\d+))$").expect("regex to compile");
    let mut values = Vec::default();
    for (i, s) in list.into_iter().enumerate() {
        let Some(cap) = rx.captures(s.trim()) else {
            bail!("invalid number or range at {i}: {s:?}");
        };

        if let Some(x) = cap.get(1) {
            let x = x
                .as_str()
                .parse::<u32>()
                .map_err(|_| anyhow!("invalid number value"))?;
            values.push(x);
        } else {
            let start = cap[2]
                .parse::<u32>()
                .map_err(|_| anyhow!("invalid range value"))?;
            let end = cap[3]
                .parse::<u32>()
                .map_err(|_| anyhow!("invalid range value"))?;
            if start > end {
                bail!("invalid range at {i}: {s:?}")
            }
            values.extend(start..=end);
        }
    }

    Ok(values)
}

fn parse_apids(list: &[String]) -> Result<Vec<Apid>> {
    Ok(parse_number_ranges(list.to_vec())?
        .iter()
        .filter_map(|v| Apid::try_from(*v).ok())
        .filter(|apid| *apid <= PrimaryHeader::APID_MAX)
        .collect())
}

pub(crate) fn open_input(input: &Path) -> Result<Box<dyn Read>> {
    if input == Path::new("-") {
        return Ok(Box::new(stdin().lock()));
    }
    let file = File::open(input).with_context(|| format!("opening input {input:?}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("CCSDS_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::List {
            input,
            format,
            include,
            exclude,
        } => {
            let include = parse_apids(include)?;
            let exclude = parse_apids(exclude)?;
            debug!("including apids {:?}", include);
            debug!("excluding apids {:?}", exclude);

            list::list(open_input(input)?, format, &include, &exclude)
        }
        Commands::Info { input, format } => info::info(input, format),
    }
}
