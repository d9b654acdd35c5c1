//! Snapshot rendering: aligned text table, JSON, CSV.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use indexwatch_core::{Instrument, Summary, SummaryTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub const NO_DATA: &str = "No data available yet";

/// One flattened summary, as written to JSON and CSV.
#[derive(Debug, Serialize)]
pub struct SummaryRow<'a> {
    pub symbol: &'a str,
    pub name: &'a str,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub current: f64,
    pub gain: f64,
    pub pct_gain: Option<f64>,
    pub loss: f64,
    pub pct_loss: Option<f64>,
    pub signal: &'static str,
    pub samples: usize,
    pub as_of: String,
}

impl<'a> SummaryRow<'a> {
    pub fn new(instrument: &'a Instrument, s: &Summary) -> Self {
        Self {
            symbol: &instrument.symbol,
            name: &instrument.name,
            open: s.open,
            high: s.high,
            low: s.low,
            current: s.current,
            gain: s.gain,
            pct_gain: s.pct_gain,
            loss: s.loss,
            pct_loss: s.pct_loss,
            signal: s.signal.label(),
            samples: s.samples,
            as_of: s.as_of.to_rfc3339(),
        }
    }
}

pub fn write_table<W: Write>(out: &mut W, table: &SummaryTable) -> Result<()> {
    if table.is_empty() {
        writeln!(out, "{NO_DATA}")?;
        return Ok(());
    }

    let name_width = table.keys().map(|i| i.name.len()).max().unwrap_or(5).max(5);
    writeln!(
        out,
        "{:<name_width$}  {:>10} {:>10} {:>10} {:>10} {:>9} {:>8} {:>9} {:>8}  {}",
        "Index", "Open", "High", "Low", "Current", "Gain", "% Gain", "Loss", "% Loss", "Signal"
    )?;
    for (inst, s) in table {
        writeln!(
            out,
            "{:<name_width$}  {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>9.2} {:>8} {:>9.2} {:>8}  {}",
            inst.name,
            s.open,
            s.high,
            s.low,
            s.current,
            s.gain,
            pct(s.pct_gain),
            s.loss,
            pct(s.pct_loss),
            s.signal
        )?;
    }
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, table: &SummaryTable) -> Result<()> {
    let rows: Vec<SummaryRow> = table.iter().map(|(i, s)| SummaryRow::new(i, s)).collect();
    serde_json::to_writer_pretty(&mut *out, &rows)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_csv<W: Write>(out: &mut W, table: &SummaryTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for (inst, s) in table {
        writer.serialize(SummaryRow::new(inst, s))?;
    }
    writer.flush()?;
    Ok(())
}

fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use indexwatch_core::Sample;

    fn table() -> SummaryTable {
        let ts = FixedOffset::east_opt(19800).unwrap().with_ymd_and_hms(2024, 3, 4, 9, 15, 0).unwrap();
        let samples = [
            Sample { timestamp: ts, open: 100.0, high: 105.0, low: 99.0, close: 102.0 },
            Sample { timestamp: ts, open: 102.0, high: 108.0, low: 101.0, close: 107.0 },
        ];
        let mut table = SummaryTable::new();
        table.insert(
            Instrument::new("^NSEI", "Nifty 50 (India)"),
            Summary::from_samples(&samples).unwrap(),
        );
        table
    }

    fn render(f: fn(&mut Vec<u8>, &SummaryTable) -> Result<()>, table: &SummaryTable) -> String {
        let mut buf = Vec::new();
        f(&mut buf, table).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_table() {
        let text = render(write_table, &table());
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("Index"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Nifty 50 (India)"));
        assert!(row.contains("100.00"));
        assert!(row.contains("8.00%"));
        assert!(row.contains("-1.00%"));
        assert!(row.ends_with("Bullish Breakout"));
    }

    #[test]
    fn empty_table_says_so() {
        assert_eq!(render(write_table, &SummaryTable::new()).trim(), NO_DATA);
    }

    #[test]
    fn json_rows() {
        let text = render(write_json, &table());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["symbol"], "^NSEI");
        assert_eq!(value[0]["gain"], 8.0);
        assert_eq!(value[0]["signal"], "Bullish Breakout");
        assert_eq!(value[0]["as_of"], "2024-03-04T09:15:00+05:30");
    }

    #[test]
    fn csv_has_header_and_row() {
        let text = render(write_csv, &table());
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "symbol,name,open,high,low,current,gain,pct_gain,loss,pct_loss,signal,samples,as_of"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("^NSEI,Nifty 50 (India),100.0,108.0,99.0,107.0,8.0,8.0,-1.0,-1.0,Bullish Breakout,2,"));
    }
}
