use std::collections::HashSet;
use std::io::{stdout, Read, Write};

use anyhow::{Context, Result};
use ccsds_decoder::spacepacket::Apid;
use ccsds_decoder::{PacketDecoder, PrimaryHeader};
use serde::Serialize;
use tracing::{error, info, trace};

#[derive(Debug, Clone)]
pub enum Format {
    Json,
    Text,
}

impl clap::ValueEnum for Format {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Json, Self::Text]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Self::Json => Some(clap::builder::PossibleValue::new("json")),
            Self::Text => Some(clap::builder::PossibleValue::new("text")),
        }
    }
}

#[derive(Debug, Serialize)]
struct Line<'a> {
    offset: u64,
    #[serde(flatten)]
    header: &'a PrimaryHeader,
}

fn write_line<W: Write>(mut writer: W, format: &Format, line: &Line) -> Result<()> {
    match format {
        Format::Json => {
            serde_json::to_writer(&mut writer, line).context("serializing to json")?;
            writeln!(writer)?;
        }
        Format::Text => {
            let hdr = line.header;
            writeln!(
                writer,
                "[offset:{:10} ver:{} type:{} shdr:{:5} apid:{:4} flags:{} seq:{:5} len:{:5}]",
                line.offset,
                hdr.version,
                hdr.type_flag,
                hdr.has_secondary_header,
                hdr.apid,
                hdr.sequence_flags,
                hdr.sequence_count,
                hdr.data_length,
            )?;
        }
    }
    Ok(())
}

/// Write a line for each packet decoded from `input` that passes the APID filters.
pub fn list_to<R, W>(
    input: R,
    mut writer: W,
    format: &Format,
    include: &[Apid],
    exclude: &[Apid],
) -> Result<usize>
where
    R: Read,
    W: Write,
{
    let including = !include.is_empty();
    let include: HashSet<Apid> = include.iter().copied().collect();
    let excluding = !exclude.is_empty();
    let exclude: HashSet<Apid> = exclude.iter().copied().collect();

    let mut decoder = PacketDecoder::new(input);
    let mut count = 0usize;
    loop {
        let offset = decoder.offset();
        let packet = match decoder.read_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => break,
            Err(err) => {
                error!(offset, decoded = count, "decoding failed: {err}");
                return Err(err).with_context(|| format!("decoding packet at offset {offset}"));
            }
        };
        count += 1;

        let apid = packet.header.apid;
        if including && !include.contains(&apid) {
            trace!(apid, offset, "skip not included");
            continue;
        }
        if excluding && exclude.contains(&apid) {
            trace!(apid, offset, "skip excluded");
            continue;
        }
        write_line(
            &mut writer,
            format,
            &Line {
                offset,
                header: &packet.header,
            },
        )?;
    }

    Ok(count)
}

pub fn list<R: Read>(input: R, format: &Format, include: &[Apid], exclude: &[Apid]) -> Result<()> {
    let count = list_to(input, stdout().lock(), format, include, exclude)?;
    info!("decoded {count} packets");
    Ok(())
}
