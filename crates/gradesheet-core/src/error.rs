// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Gradesheet.
//
// Page-level detection problems (no zone, no candidates, no rows) are not
// errors: they travel as `PageStatus` values in the page outcome. Only
// conditions that end a unit of work live here.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Gradesheet operations.
#[derive(Debug, Error)]
pub enum GradesheetError {
    // -- Input errors --
    #[error("document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("document produced no pages: {0}")]
    EmptyDocument(String),

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Identity / security --
    #[error("identity decode failed: {0}")]
    IdentityDecode(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("key error: {0}")]
    KeyError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GradesheetError>;
