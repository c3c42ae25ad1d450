// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Druckwahl.

use thiserror::Error;

/// Top-level error type for all Druckwahl operations.
///
/// Driver resolution itself never fails; these errors cover the two
/// caller-level conditions (empty catalog, unusable policy document)
/// plus I/O and serialization failures around them.
#[derive(Debug, Error)]
pub enum DruckwahlError {
    #[error("driver catalog is empty")]
    EmptyCatalog,

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown fit level {0:?}")]
    UnknownFitLevel(String),

    #[error("policy document error: {0}")]
    PolicyParse(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DruckwahlError>;
