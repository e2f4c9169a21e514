// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for exam operators.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the command-line front end reports the failure.

use crate::error::GradesheetError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth retrying as-is (busy disk, interrupted write).
    Transient,
    /// The operator must fix something (missing file, bad setting, key).
    ActionRequired,
    /// Cannot be fixed by retrying: the input itself is unusable.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
    /// Whether re-running the same command may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `GradesheetError` into a `HumanError`.
pub fn humanize_error(err: &GradesheetError) -> HumanError {
    match err {
        GradesheetError::DocumentNotFound(path) => HumanError {
            message: "The exam document couldn't be found.".into(),
            suggestion: format!("Check the path and try again. ({})", path.display()),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        GradesheetError::EmptyDocument(_) => HumanError {
            message: "The document doesn't contain any scanned pages.".into(),
            suggestion: "Make sure the file is a scan of the answer sheets, not an empty or text-only PDF.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        GradesheetError::UnsupportedDocument(detail) => HumanError {
            message: "This type of document isn't supported.".into(),
            suggestion: format!("Provide a scanned PDF or PNG/JPEG/TIFF page images. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        GradesheetError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try exporting the scan again from the scanner software.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        GradesheetError::ImageError(_) => HumanError {
            message: "There's a problem with a scanned page image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try re-scanning as PNG or JPEG.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        GradesheetError::InvalidConfig(detail) => HumanError {
            message: "The exam settings aren't valid.".into(),
            suggestion: format!("Fix the configuration file and run again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        GradesheetError::IdentityDecode(_) => HumanError {
            message: "The student QR code couldn't be read.".into(),
            suggestion: "Check that the QR code is printed in the expected corner and scanned clearly.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        GradesheetError::Encryption(_) | GradesheetError::Decryption(_) => HumanError {
            message: "The student identity couldn't be unlocked.".into(),
            suggestion: "Make sure you are using the same secret.key that was used to print the sheets.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        GradesheetError::KeyError(_) => HumanError {
            message: "The secret key couldn't be loaded.".into(),
            suggestion: "Check that secret.key exists and is readable, or let Gradesheet create a new one.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        GradesheetError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "A file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Gradesheet doesn't have permission to use that file.".into(),
                    suggestion: "Check the file and folder permissions, or choose another output folder.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        GradesheetError::Serialization(_) => HumanError {
            message: "A settings or results file is malformed.".into(),
            suggestion: "Check the JSON file for typos, or recreate it with `gradesheet config init`.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
