use std::io::Write;

use anyhow::Context;
use nodeflake::{IdAllocator, MonotonicClock, ParsedId, SnowflakeId, SystemClock, TimeSource};
use serde::Serialize;

use super::config::{ClockArg, Command, Config, OutputFormat};

/// One line of JSON output.
#[derive(Serialize)]
struct IdRecord {
    id: SnowflakeId,
    #[serde(flatten)]
    parsed: ParsedId,
}

impl From<SnowflakeId> for IdRecord {
    fn from(id: SnowflakeId) -> Self {
        Self {
            id,
            parsed: id.parse(),
        }
    }
}

pub fn run(config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    match &config.command {
        Command::Generate { count, format } => match config.clock {
            ClockArg::System => {
                let allocator =
                    IdAllocator::with_clock(config.node_id, config.backoff, SystemClock::default())?;
                generate(&allocator, *count, *format, out)
            }
            ClockArg::Monotonic => {
                let allocator = IdAllocator::with_clock(
                    config.node_id,
                    config.backoff,
                    MonotonicClock::default(),
                )?;
                generate(&allocator, *count, *format, out)
            }
        },
        Command::Parse { ids, json } => parse(ids, *json, out),
    }
}

fn generate<T>(
    allocator: &IdAllocator<T>,
    count: usize,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()>
where
    T: TimeSource,
{
    tracing::info!(
        node_id = allocator.node_id(),
        backoff = %allocator.backoff(),
        count,
        "generating ids"
    );

    for n in 0..count {
        let id = allocator
            .generate()
            .with_context(|| format!("failed to generate id {} of {count}", n + 1))?;

        match format {
            OutputFormat::Decimal => writeln!(out, "{id}")?,
            OutputFormat::Padded => writeln!(out, "{}", id.to_padded_string())?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, &IdRecord::from(id))?;
                writeln!(out)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn parse(ids: &[i64], json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    for &raw in ids {
        let id = SnowflakeId::from_raw(raw as u64);
        if !id.is_valid() {
            tracing::warn!(raw, "reserved bit set; decoded fields are not meaningful");
        }

        let record = IdRecord {
            id,
            parsed: nodeflake::parse_id(raw),
        };
        if json {
            serde_json::to_writer(&mut *out, &record)?;
            writeln!(out)?;
        } else {
            writeln!(
                out,
                "{}\ttimestamp_ms={}\tnode_id={}\tsequence={}",
                raw, record.parsed.timestamp_ms, record.parsed.node_id, record.parsed.sequence
            )?;
        }
    }

    out.flush()?;
    Ok(())
}
