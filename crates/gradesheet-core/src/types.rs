// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Gradesheet: geometry, per-question grades, the
// validation/grading reports and the persisted submission summary.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Literal written for a question with no checked option.
pub const MISSING_GRADE: &str = "missing";

/// Axis-aligned rectangle in pixel coordinates, relative to the image it was
/// measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Pixel area.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clip to an image of `width` x `height`. Returns `None` when nothing of
    /// the rectangle lies inside the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let clipped = Region {
            x: self.x,
            y: self.y,
            width: self.width.min(width - self.x),
            height: self.height.min(height - self.y),
        };
        (!clipped.is_empty()).then_some(clipped)
    }

    /// Translate by an offset (used to map zone-relative boxes onto the page).
    pub fn offset(&self, dx: u32, dy: u32) -> Region {
        Region {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}x{}", self.x, self.y, self.width, self.height)
    }
}

/// The answer recorded for one question: one of the configured option labels,
/// or `missing` when no option was confidently checked.
///
/// Serialised as a plain string; the literal `"missing"` maps to
/// [`Grade::Missing`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Grade {
    Label(String),
    Missing,
}

impl Grade {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Label(label) => label,
            Self::Missing => MISSING_GRADE,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Label(label) => Some(label),
            Self::Missing => None,
        }
    }
}

impl From<String> for Grade {
    fn from(value: String) -> Self {
        if value.is_empty() || value == MISSING_GRADE {
            Self::Missing
        } else {
            Self::Label(value)
        }
    }
}

impl From<&str> for Grade {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Grade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Grade::from(String::deserialize(deserializer)?))
    }
}

/// Final per-question result. `question` is 1-based and contiguous across the
/// whole submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: u32,
    pub grade: Grade,
}

/// Aggregate sanity report over a set of question results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_questions: usize,
    pub answered_questions: usize,
    pub warnings: Vec<String>,
}

/// Letter band for a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Letter {
    /// Fixed breakpoints: >=90 A, >=80 B, >=70 C, >=60 D, >=50 E, else F.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::A
        } else if score >= 80.0 {
            Self::B
        } else if score >= 70.0 {
            Self::C
        } else if score >= 60.0 {
            Self::D
        } else if score >= 50.0 {
            Self::E
        } else {
            Self::F
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        };
        f.write_str(s)
    }
}

/// Score out of 100 (two decimals) and its letter band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub score: f64,
    pub letter: Letter,
}

/// Identity of the student who filled in the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    pub id: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub university: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StudentRecord {
    /// Placeholder used when the identity could not be decoded. The reason is
    /// kept in `error` so the summary records why.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            name: "Unknown".into(),
            id: "0000".into(),
            class_name: "N/A".into(),
            university: "N/A".into(),
            error: Some(reason.into()),
        }
    }
}

/// Persisted per-document summary (`<document>_grades.json`).
///
/// Field order and key names are a compatibility contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub student: StudentRecord,
    pub results: Vec<QuestionResult>,
    pub total_questions: usize,
    pub validation: ValidationReport,
    pub grading: GradingResult,
    pub visualizations: Vec<String>,
}

/// Input document types accepted by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Jpeg,
    Png,
    Tiff,
}

impl DocumentType {
    /// Infer document type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn is_raster(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}
