use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;
use strum::IntoEnumIterator;
use time::OffsetDateTime;

use crate::app::App;
use crate::records::{derive_tags, Period, RecordSource, RunRecord, SplitColumn};
use crate::timefmt;

#[derive(Args, Debug, Clone)]
pub struct RecordsArgs {
    /// Period to index: today, yesterday, week, month or all
    #[arg(value_parser = parse_period, default_value = "today")]
    pub period: Period,
    /// Print the raw records as JSON instead of a table
    #[arg(long)]
    pub json: bool,
    /// Limit the number of rows printed
    #[arg(long)]
    pub limit: Option<usize>,
}

fn parse_period(raw: &str) -> Result<Period, String> {
    Period::from_str(raw)
        .map_err(|_| format!("unknown period `{raw}` (expected today, yesterday, week, month or all)"))
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn print_records(source: &dyn RecordSource, args: RecordsArgs) -> Result<()> {
    let mut records = source
        .fetch(args.period)
        .with_context(|| format!("indexing records for {}", args.period))?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&records).context("serializing records")?;
        println!("{json}");
        return Ok(());
    }

    print!("{}", format_records_table(args.period, &records));
    Ok(())
}

fn format_records_table(period: Period, records: &[RunRecord]) -> String {
    let mut out = String::new();
    if records.is_empty() {
        let _ = writeln!(&mut out, "No records for {}.", period.label().to_lowercase());
        return out;
    }

    let _ = writeln!(
        &mut out,
        "{:<24} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}  {:<10}  {}",
        "World",
        "IGT",
        "Nether",
        "Bastion",
        "Fortress",
        "NExit",
        "SHold",
        "End",
        "RTA",
        "Date",
        "Tags"
    );
    for record in records {
        let mut world = record.world_name.clone();
        if world.chars().count() > 24 {
            world = world.chars().take(23).collect();
            world.push('…');
        }
        let tags: Vec<String> = derive_tags(record)
            .into_iter()
            .map(|tag| tag.label)
            .collect();
        let splits: Vec<String> = SplitColumn::iter()
            .map(|column| timefmt::format_split(record.split(column)))
            .collect();
        let _ = writeln!(
            &mut out,
            "{:<24} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}  {:<10}  {}",
            world,
            timefmt::format_split(record.final_igt),
            splits[0],
            splits[1],
            splits[2],
            splits[3],
            splits[4],
            splits[5],
            timefmt::format_split(record.final_rta),
            format_date(record.date),
            tags.join(",")
        );
    }
    let _ = writeln!(
        &mut out,
        "\n{} record(s) for {}.",
        records.len(),
        period.label().to_lowercase()
    );
    out
}

fn format_date(epoch_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch_ms / 1000)
        .map(|dt| dt.date().to_string())
        .unwrap_or_else(|_| epoch_ms.to_string())
}
