use std::cmp;
use std::collections::BTreeSet;
use std::io;

use anyhow::Result;
use serde::Serialize;

use crate::export;
use crate::models::{LookupResult, Parity, ResultRow};
use crate::scan::AddressPrefill;

/// Internal representation of a row rendered by the CLI.
///
/// Both text and table formats are derived from the same data.
struct DisplayRow {
    suburb: String,
    street: String,
    range: String,
    side: &'static str,
    beat: String,
    team: String,
    postcode: String,
    map_link: String,
}

/// Render a `LookupResult` in human-readable text form.
///
/// Each row is rendered as:
/// `SUBURB: STREET MIN-MAX (side): beat B, team T, NSW postcode`
/// followed by the map link on an indented line.
pub fn print_text(result: &LookupResult) -> Result<()> {
    if let Some(no_match) = result.summary.no_match {
        println!("{no_match}");
        return Ok(());
    }

    println!("Found {} match(es).", result.summary.total);

    for row in build_rows(&result.rows) {
        println!(
            "{}: {} {} ({}): beat {}, team {}, NSW {}",
            row.suburb, row.street, row.range, row.side, row.beat, row.team, row.postcode
        );
        println!("    {}", row.map_link);
    }

    Ok(())
}

/// Render a `LookupResult` as a simple table.
///
/// Columns:
/// - SUBURB
/// - STREET
/// - RANGE
/// - SIDE
/// - BEAT
/// - TEAM
/// - POSTCODE
/// - MAP LINK
pub fn print_table(result: &LookupResult) -> Result<()> {
    if let Some(no_match) = result.summary.no_match {
        println!("{no_match}");
        return Ok(());
    }

    let rows = build_rows(&result.rows);

    const MAX_SUBURB_WIDTH: usize = 24;
    const MAX_STREET_WIDTH: usize = 30;

    let suburb_header = "SUBURB";
    let street_header = "STREET";
    let range_header = "RANGE";
    let side_header = "SIDE";
    let beat_header = "BEAT";
    let team_header = "TEAM";
    let postcode_header = "POSTCODE";
    let map_link_header = "MAP LINK";

    let max_suburb_len = rows.iter().map(|r| r.suburb.chars().count()).max().unwrap_or(0);
    let max_street_len = rows.iter().map(|r| r.street.chars().count()).max().unwrap_or(0);
    let max_range_len = rows.iter().map(|r| r.range.len()).max().unwrap_or(0);
    let max_beat_len = rows.iter().map(|r| r.beat.len()).max().unwrap_or(0);
    let max_team_len = rows.iter().map(|r| r.team.len()).max().unwrap_or(0);

    let suburb_width = cmp::min(cmp::max(suburb_header.len(), max_suburb_len), MAX_SUBURB_WIDTH);
    let street_width = cmp::min(cmp::max(street_header.len(), max_street_len), MAX_STREET_WIDTH);
    let range_width = cmp::max(range_header.len(), max_range_len);
    let side_width = side_header.len();
    let beat_width = cmp::max(beat_header.len(), max_beat_len);
    let team_width = cmp::max(team_header.len(), max_team_len);
    let postcode_width = cmp::max(
        postcode_header.len(),
        rows.iter().map(|r| r.postcode.len()).max().unwrap_or(0),
    );

    println!(
        "{:<suburb_width$} {:<street_width$} {:>range_width$} {:<side_width$} {:>beat_width$} {:>team_width$} {:<postcode_width$} {}",
        suburb_header,
        street_header,
        range_header,
        side_header,
        beat_header,
        team_header,
        postcode_header,
        map_link_header
    );

    for row in rows {
        let suburb = truncate(&row.suburb, suburb_width);
        let street = truncate(&row.street, street_width);

        println!(
            "{:<suburb_width$} {:<street_width$} {:>range_width$} {:<side_width$} {:>beat_width$} {:>team_width$} {:<postcode_width$} {}",
            suburb, street, row.range, row.side, row.beat, row.team, row.postcode, row.map_link
        );
    }

    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer(io::stdout(), value)?;
    println!();
    Ok(())
}

/// Write the export CSV layout to stdout.
pub fn print_csv(result: &LookupResult) -> Result<()> {
    export::write_csv(&result.rows, io::stdout().lock())?;
    Ok(())
}

/// Print a derived lookup list (street names or suburbs), one per line.
pub fn print_list(values: &BTreeSet<String>) -> Result<()> {
    for value in values {
        println!("{value}");
    }
    Ok(())
}

/// Render the scan pre-fill in human-readable form.
pub fn print_prefill_text(prefill: &AddressPrefill) -> Result<()> {
    let text = if prefill.recognized_text.is_empty() {
        "(none)"
    } else {
        prefill.recognized_text.as_str()
    };
    println!("recognized : {text}");
    println!("street     : {}", prefill.street.as_deref().unwrap_or("-"));
    println!("number     : {}", prefill.house_no.as_deref().unwrap_or("-"));

    if prefill.street.is_none() {
        println!("No street recognized; enter the address with `beatlookup address`.");
    }

    Ok(())
}

fn build_rows(rows: &[ResultRow]) -> Vec<DisplayRow> {
    rows.iter()
        .map(|row| {
            let record = &row.record;
            DisplayRow {
                suburb: record.suburb.clone(),
                street: record.street_name.clone(),
                range: format!("{}-{}", record.street_no_min, record.street_no_max),
                side: match record.parity {
                    Parity::Odd => "odd",
                    Parity::Even => "even",
                },
                beat: record.beat_no.to_string(),
                team: record.team_no.to_string(),
                postcode: record.postcode.clone(),
                map_link: row.map_link.clone(),
            }
        })
        .collect()
}

fn truncate(s: &str, max_width: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        "…".to_string()
    } else {
        s.chars()
            .take(max_width.saturating_sub(1))
            .collect::<String>()
            + "…"
    }
}
