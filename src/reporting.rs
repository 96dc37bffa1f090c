// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Report Writers
 * Buffered JSON/TXT report output and realtime terminal lines
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use crate::types::{ProbeClass, ScanResult};

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Txt,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "txt" => Ok(ReportFormat::Txt),
            other => anyhow::bail!("unsupported report format '{other}' (supported: json, txt)"),
        }
    }
}

/// Final report wrapper serialized around the result records.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub scan_duration: String,
    pub total_found: usize,
    pub public_buckets: usize,
    pub private_buckets: usize,
    pub results: &'a [ScanResult],
}

/// Output sink for scan results.
pub trait ResultWriter {
    /// Accepts a single scan result.
    fn write_result(&mut self, result: &ScanResult) -> Result<()>;

    /// Ensures all buffered data reaches its destination.
    fn flush(&mut self) -> Result<()>;
}

/// Buffers results in memory and writes the final report on flush.
pub struct ReportWriter {
    path: PathBuf,
    format: ReportFormat,
    results: Vec<ScanResult>,
    started_at: Instant,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>, format: ReportFormat) -> Self {
        Self {
            path: path.into(),
            format,
            results: Vec::new(),
            started_at: Instant::now(),
        }
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    fn flush_json(&self) -> Result<()> {
        let public = self
            .results
            .iter()
            .filter(|result| result.probe == ProbeClass::Exists)
            .count();
        let private = self
            .results
            .iter()
            .filter(|result| result.probe == ProbeClass::Forbidden)
            .count();

        let report = Report {
            generated_at: Utc::now(),
            scan_duration: format!("{}s", self.started_at.elapsed().as_secs()),
            total_found: self.results.len(),
            public_buckets: public,
            private_buckets: private,
            results: &self.results,
        };

        let file = File::create(&self.path)
            .with_context(|| format!("failed to create report file {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &report).context("failed to encode report")?;
        writer.flush().context("failed to flush report")?;
        Ok(())
    }

    fn flush_txt(&self) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("failed to create report file {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);

        for result in &self.results {
            let tag = match result.probe {
                ProbeClass::Exists => "[PUBLIC]",
                ProbeClass::Forbidden => "[PRIVATE]",
                _ => continue,
            };

            let mut line = format!("{tag} {}", result.bucket);

            if let Some(inspect) = &result.inspect {
                if !inspect.region.is_empty() && inspect.region != "unknown" {
                    line.push_str(&format!(" | region: {}", inspect.region));
                }
                if inspect.object_count > 0 {
                    line.push_str(&format!(" | objects: {}", inspect.object_count));
                }
                if !inspect.sample_keys.is_empty() {
                    let sample: Vec<&str> = inspect
                        .sample_keys
                        .iter()
                        .take(3)
                        .map(String::as_str)
                        .collect();
                    line.push_str(&format!(" | sample: {sample:?}"));
                }
            }

            writeln!(writer, "{line}").context("failed to write report line")?;
        }

        writer.flush().context("failed to flush report")?;
        Ok(())
    }
}

impl ResultWriter for ReportWriter {
    fn write_result(&mut self, result: &ScanResult) -> Result<()> {
        self.results.push(result.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.format {
            ReportFormat::Json => self.flush_json(),
            ReportFormat::Txt => self.flush_txt(),
        }
    }
}

/// Prints one line per surfaced result as the scan runs.
pub struct RealtimeWriter {
    use_colors: bool,
    verbose: bool,
}

impl RealtimeWriter {
    pub fn new(use_colors: bool, verbose: bool) -> Self {
        Self {
            use_colors,
            verbose,
        }
    }

    fn format_line(&self, result: &ScanResult) -> Option<String> {
        let (tag, color) = match result.probe {
            ProbeClass::Exists => ("[PUBLIC] ", "\x1b[92m"),
            ProbeClass::Forbidden => ("[PRIVATE]", "\x1b[93m"),
            ProbeClass::Error if self.verbose => ("[ERROR]  ", "\x1b[91m"),
            _ => return None,
        };

        let mut line = if self.use_colors {
            format!("{color}{tag}\x1b[0m {}", result.bucket)
        } else {
            format!("{tag} {}", result.bucket)
        };

        if let Some(inspect) = &result.inspect {
            line.push_str(&format!(" ({}, {})", inspect.region, inspect.acl));
            if inspect.object_count >= 0 {
                line.push_str(&format!(" {} objects", inspect.object_count));
            }
        }

        Some(line)
    }
}

impl ResultWriter for RealtimeWriter {
    fn write_result(&mut self, result: &ScanResult) -> Result<()> {
        if let Some(line) = self.format_line(result) {
            println!("{line}");
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Fans every result out to several writers.
pub struct MultiWriter {
    writers: Vec<Box<dyn ResultWriter>>,
}

impl MultiWriter {
    pub fn new(writers: Vec<Box<dyn ResultWriter>>) -> Self {
        Self { writers }
    }
}

impl ResultWriter for MultiWriter {
    fn write_result(&mut self, result: &ScanResult) -> Result<()> {
        for writer in &mut self.writers {
            writer.write_result(result)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}
