// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Configuration
 * Validated scan settings and wordlist loading
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::errors::ScanError;

/// Full scan configuration, assembled by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    // Scanner settings
    #[validate(range(min = 1, max = 1000))]
    pub workers: usize,

    #[validate(range(min = 1, max = 100))]
    pub inspect_workers: usize,

    #[validate(range(min = 1.0, max = 10000.0))]
    pub max_rps: f64,

    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,

    pub deep_inspect: bool,

    // Input settings
    #[serde(default)]
    pub seed: Option<String>,

    #[serde(default)]
    pub wordlist: Option<PathBuf>,

    #[serde(default)]
    pub domain: Option<String>,

    #[validate(range(min = 1, max = 10000))]
    pub ct_limit: usize,

    // AI settings
    pub ai_enabled: bool,
    pub ai_provider: String,
    pub ai_model: String,

    #[serde(default)]
    pub ai_key: Option<String>,

    #[serde(default)]
    pub ai_base_url: Option<String>,

    #[validate(range(min = 1, max = 1000))]
    pub ai_count: usize,

    // Output settings
    pub output_file: PathBuf,
    pub output_format: String,
    pub no_color: bool,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workers: 50,
            inspect_workers: 10,
            max_rps: 150.0,
            timeout_secs: 15,
            deep_inspect: true,
            seed: None,
            wordlist: None,
            domain: None,
            ct_limit: 100,
            ai_enabled: false,
            ai_provider: "openai".to_string(),
            // Empty selects the provider's own default model
            ai_model: String::new(),
            ai_key: None,
            ai_base_url: None,
            ai_count: 50,
            output_file: PathBuf::from("results.json"),
            output_format: "json".to_string(),
            no_color: false,
            verbose: false,
        }
    }
}

impl AppConfig {
    /// True when at least one name source is configured.
    pub fn has_input_source(&self) -> bool {
        self.seed.is_some() || self.wordlist.is_some() || self.domain.is_some() || self.ai_enabled
    }
}

const WORDLIST_DIR: &str = "wordlists";
const BUNDLED_WORDLIST: &str = "common.txt";

/// Resolves which wordlist to load. An explicitly provided path always
/// wins. Otherwise the bundled `wordlists/common.txt` is searched next
/// to the executable, then in the working directory; `None` means no
/// wordlist source for this scan.
pub fn find_wordlist(provided: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = provided {
        return Some(path.to_path_buf());
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let candidate = exe_dir.join(WORDLIST_DIR).join(BUNDLED_WORDLIST);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    let candidate = PathBuf::from(WORDLIST_DIR).join(BUNDLED_WORDLIST);
    if candidate.is_file() {
        return Some(candidate);
    }

    None
}

/// Reads a wordlist file: one entry per line, trimmed, empty lines
/// skipped. Entries are taken as-is; normalization and validation happen
/// in the generator.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, ScanError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ScanError::Wordlist {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}
