//! Price history / run-log (supplemented)
//!
//! Appends one CSV row per evaluated strategy per tick, for offline spread
//! analysis. Purely observational: nothing here feeds back into trading
//! decisions. Gated by `observability.price_log_enabled`; a disabled logger
//! is a harmless no-op.
//!
//! Author: AI-Generated
//! Created: 2026-07-30

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::money::Money;
use crate::types::Direction;

const CSV_HEADER: &str = "timestamp,token,strategy_id,direction,primary_price,secondary_price,net_edge_bps";

/// One evaluated strategy's prices and resulting edge, logged regardless of
/// whether the strategy was selected for execution.
pub struct PriceLogRow<'a> {
    pub token: &'a str,
    pub strategy_id: &'a str,
    pub direction: Direction,
    pub primary_price: Money,
    pub secondary_price: Money,
    pub net_edge_bps: i64,
}

pub struct PriceLogger {
    log_dir: PathBuf,
    enabled: bool,
    current_date: Option<NaiveDate>,
    file: Option<File>,
}

impl PriceLogger {
    pub fn new(log_dir: &str, enabled: bool) -> Self {
        if enabled {
            if let Err(e) = fs::create_dir_all(log_dir) {
                warn!(error = %e, "failed to create price log directory");
            }
            info!(dir = log_dir, "price logger initialized");
        }
        Self { log_dir: PathBuf::from(log_dir), enabled, current_date: None, file: None }
    }

    pub fn log_row(&mut self, row: &PriceLogRow<'_>) {
        if !self.enabled {
            return;
        }

        let now = Utc::now();
        let today = now.date_naive();
        if self.current_date != Some(today) {
            self.rotate_file(today);
        }

        let Some(file) = self.file.as_mut() else {
            return;
        };

        let direction = match row.direction {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        };
        let line = format!(
            "{},{},{},{},{},{},{}\n",
            now.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            row.token,
            row.strategy_id,
            direction,
            row.primary_price,
            row.secondary_price,
            row.net_edge_bps,
        );

        if let Err(e) = file.write_all(line.as_bytes()) {
            warn!(error = %e, "price log write failed");
        }
    }

    fn rotate_file(&mut self, date: NaiveDate) {
        self.file = None;
        self.current_date = None;

        let filename = format!("prices_{}.csv", date.format("%Y%m%d"));
        let filepath = self.log_dir.join(&filename);
        let file_exists = filepath.exists();

        match OpenOptions::new().create(true).append(true).open(&filepath) {
            Ok(mut f) => {
                if !file_exists {
                    if let Err(e) = writeln!(f, "{}", CSV_HEADER) {
                        warn!(error = %e, "failed to write price log header");
                        return;
                    }
                }
                self.file = Some(f);
                self.current_date = Some(date);
            }
            Err(e) => warn!(error = %e, file = %filename, "failed to open price log file"),
        }
    }
}
