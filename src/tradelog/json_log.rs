//! Trade log writer
//!
//! Appends one JSON line per executed trade (including dry runs) to an
//! annual file, the same JSONL-append shape the teacher uses for its tax
//! backup log.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Datelike;

use crate::types::TradeLogEntry;

pub struct TradeLogWriter {
    base_dir: PathBuf,
    current_year: i32,
}

impl TradeLogWriter {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> std::io::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir, current_year: chrono::Utc::now().year() })
    }

    fn file_path_for_year(&self, year: i32) -> PathBuf {
        self.base_dir.join(format!("trades_{}.jsonl", year))
    }

    fn current_file_path(&self) -> PathBuf {
        self.file_path_for_year(self.current_year)
    }

    pub fn append(&mut self, entry: &TradeLogEntry) -> std::io::Result<()> {
        let year = chrono::Utc::now().year();
        if year != self.current_year {
            self.current_year = year;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(self.current_file_path())?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    pub fn read_year(&self, year: i32) -> std::io::Result<Vec<TradeLogEntry>> {
        let path = self.file_path_for_year(year);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                if let Ok(entry) = serde_json::from_str(&line) {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{Direction, Impacts, LegExpectation, RunMode};

    fn entry() -> TradeLogEntry {
        TradeLogEntry {
            timestamp_iso: "2026-07-30T00:00:00.000Z".to_string(),
            mode: RunMode::DryRun,
            token: "GALA".to_string(),
            trade_size: Money::from_i64(1500),
            direction: Direction::Forward,
            strategy_id: "s1".to_string(),
            success: true,
            expected: LegExpectation {
                gc_proceeds: Money::from_i64(2),
                sol_cost: Money::from_i64(1),
                net_edge: Money::from_i64(1),
                net_edge_bps: 80,
                impacts: Impacts { primary_bps: 10, secondary_bps: 5 },
            },
            actual: None,
            primary_txid: None,
            secondary_txid: None,
            primary_error: None,
            secondary_error: None,
            execution_duration_ms: 120,
        }
    }

    #[test]
    fn append_then_read_roundtrips() {
        let dir = std::env::temp_dir().join(format!("tradelog-test-{}", std::process::id()));
        let mut writer = TradeLogWriter::new(&dir).unwrap();
        writer.append(&entry()).unwrap();
        writer.append(&entry()).unwrap();

        let year = chrono::Utc::now().year();
        let entries = writer.read_year(year).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].token, "GALA");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_year_file_returns_empty() {
        let dir = std::env::temp_dir().join(format!("tradelog-test-empty-{}", std::process::id()));
        let writer = TradeLogWriter::new(&dir).unwrap();
        let entries = writer.read_year(1999).unwrap();
        assert!(entries.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
