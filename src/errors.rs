// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Error Types
 * Error taxonomy for the scan pipeline, built with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the scan pipeline.
///
/// Per-name failures never appear here: they become `error`-classified
/// result records and the scan keeps going. These variants are the fatal
/// or driver-level conditions only.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The generator produced nothing to scan; the scan refuses to start.
    #[error("no valid bucket names to scan")]
    NoCandidates,

    /// The scan-wide cancellation token fired while waiting.
    #[error("scan cancelled")]
    Cancelled,

    #[error("failed to read wordlist {path}: {source}")]
    Wordlist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
