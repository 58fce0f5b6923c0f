use anyhow::{Context, Result};
use ccsds_decoder::spacepacket::Summary;
use ccsds_decoder::PacketDecoder;
use handlebars::handlebars_helper;
use serde::Serialize;
use std::{
    io::{stdout, Read, Write},
    path::Path,
};
use tracing::{debug, error};

use crate::open_input;

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

#[derive(Debug, Clone, Serialize)]
struct Info {
    filename: String,
    summary: Summary,
}

fn summarize<R: Read>(filename: String, input: R) -> Result<Info> {
    let mut decoder = PacketDecoder::new(input);
    let (packets, err) = decoder.read_all_packets();
    if let Some(err) = err {
        error!(
            decoded = packets.len(),
            offset = decoder.offset(),
            "decoding failed: {err}"
        );
        return Err(err).with_context(|| format!("decoding {filename}"));
    }
    debug!("decoded {} packets from {filename}", packets.len());

    let mut summary = Summary::default();
    packets.iter().for_each(|p| summary.add(p));

    Ok(Info { filename, summary })
}

pub fn info(fpath: &Path, format: &Format) -> Result<()> {
    let info = summarize(fpath.to_string_lossy().to_string(), open_input(fpath)?)?;

    match format {
        Format::Json => {
            serde_json::to_writer_pretty(stdout(), &info).context("serializing to json")
        }
        Format::Text => {
            let data = render_text(&info).context("serializing info")?;
            stdout()
                .write_all(str::as_bytes(&data))
                .context("writing to stdout")
        }
    }
}

fn render_text(info: &Info) -> Result<String> {
    handlebars_helper!(left_pad: |num: u64, v: Json| {
        let v = match v {
            serde_json::Value::String(s) => s.to_owned(),
            serde_json::Value::Null => String::new(),
            _ => v.to_string()
        };
        format!("{v:>width$}", width = num as usize)
    });
    let mut hb = handlebars::Handlebars::new();
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("lpad", Box::new(left_pad));
    hb.register_template_string("info", TEXT_TEMPLATE)
        .context("compiling text template")?;

    hb.render("info", &info).context("rendering text")
}

const TEXT_TEMPLATE: &str = r"{{ filename }}
===============================================
APIDS:    {{ #each summary.apids }}{{ @key }}{{ #if @last }}{{ else }}, {{ /if }}{{ /each }}
Count:    {{ summary.count }}
Bytes:    {{ summary.bytes }}
Missing:  {{ summary.missing }}
-----------------------------------------------
  APID     Count         Bytes   Missing
-----------------------------------------------
{{ #each summary.apids }}{{ lpad 6 @key }}  {{ lpad 8 count }}  {{ lpad 12 bytes }}  {{ lpad 8 missing }}
{{/each }}
";
