// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Student identity: the QR payload printed on the first page of each answer
// sheet, and the decode step that turns a scanned first page back into a
// `StudentRecord`.
//
// Payload JSON: {"enc_name", "enc_id", "class", "university"}. Name and id
// are sealed with the exam key; class and university travel in clear.

use gradesheet_core::error::GradesheetError;
use gradesheet_core::{ExamConfig, StudentRecord};
use gradesheet_document::PageImage;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cipher::PassphraseCipher;

/// Wire form of the identity QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPayload {
    pub enc_name: String,
    pub enc_id: String,
    #[serde(rename = "class", default)]
    pub class_name: String,
    #[serde(default)]
    pub university: String,
}

/// Plain identity fields before sealing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentIdentity {
    pub name: String,
    pub id: String,
    pub class_name: String,
    pub university: String,
}

/// Seals and opens identity payloads with one exam key.
pub struct IdentityCodec {
    cipher: PassphraseCipher,
}

impl IdentityCodec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            cipher: PassphraseCipher::new(key),
        }
    }

    /// Build the payload JSON to print as a QR code.
    pub fn seal(&self, identity: &StudentIdentity) -> Result<String, GradesheetError> {
        let payload = IdentityPayload {
            enc_name: self.cipher.seal_text(&identity.name)?,
            enc_id: self.cipher.seal_text(&identity.id)?,
            class_name: identity.class_name.clone(),
            university: identity.university.clone(),
        };
        Ok(serde_json::to_string(&payload)?)
    }

    /// Parse and decrypt payload JSON read from a QR code.
    pub fn open(&self, text: &str) -> Result<StudentRecord, GradesheetError> {
        let payload: IdentityPayload = serde_json::from_str(text).map_err(|e| {
            GradesheetError::IdentityDecode(format!("decoded QR is not a valid payload: {e}"))
        })?;
        Ok(StudentRecord {
            name: self.cipher.open_text(&payload.enc_name)?,
            id: self.cipher.open_text(&payload.enc_id)?,
            class_name: payload.class_name,
            university: payload.university,
            error: None,
        })
    }
}

/// Reads the text content of a QR code from an image.
pub trait QrScanner: Send + Sync {
    fn scan(&self, image: &DynamicImage) -> Result<String, GradesheetError>;
}

/// Stand-in when no QR decoder is linked in. Always fails, so every
/// submission falls back to an unknown student.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableQrScanner;

impl QrScanner for UnavailableQrScanner {
    fn scan(&self, _image: &DynamicImage) -> Result<String, GradesheetError> {
        Err(GradesheetError::IdentityDecode(
            "no QR decoder is available".to_string(),
        ))
    }
}

/// Recover the student from the first page. Never fails: any problem yields
/// [`StudentRecord::unknown`] carrying the reason.
#[instrument(skip_all)]
pub fn decode_identity(
    first_page: &DynamicImage,
    cfg: &ExamConfig,
    scanner: &dyn QrScanner,
    codec: &IdentityCodec,
) -> StudentRecord {
    match try_decode(first_page, cfg, scanner, codec) {
        Ok(student) => {
            info!("Student identity decoded");
            student
        }
        Err(err) => {
            warn!(%err, "Identity decode failed");
            StudentRecord::unknown(err.to_string())
        }
    }
}

fn try_decode(
    first_page: &DynamicImage,
    cfg: &ExamConfig,
    scanner: &dyn QrScanner,
    codec: &IdentityCodec,
) -> Result<StudentRecord, GradesheetError> {
    let mut page = PageImage::from_dynamic(first_page.clone());
    if cfg.enable_deskew {
        page = page.deskew();
    }
    let qr_area = match cfg.qr_crop_region {
        Some(region) => page.crop(region).ok_or_else(|| {
            GradesheetError::IdentityDecode(format!("QR region {region} lies outside the page"))
        })?,
        None => page.into_dynamic(),
    };
    let text = scanner.scan(&qr_area)?;
    codec.open(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradesheet_core::Region;

    fn identity() -> StudentIdentity {
        StudentIdentity {
            name: "Amina Diallo".into(),
            id: "2026-0042".into(),
            class_name: "L2-B".into(),
            university: "Universite de Dakar".into(),
        }
    }

    /// Returns a fixed text and records the size of the image it was given.
    struct CannedScanner {
        text: String,
        expected_size: (u32, u32),
    }

    impl QrScanner for CannedScanner {
        fn scan(&self, image: &DynamicImage) -> Result<String, GradesheetError> {
            assert_eq!((image.width(), image.height()), self.expected_size);
            Ok(self.text.clone())
        }
    }

    #[test]
    fn sealed_payload_opens_to_the_same_student() {
        let codec = IdentityCodec::new("exam-key");
        let text = codec.seal(&identity()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["class"], "L2-B");
        assert_ne!(json["enc_name"], "Amina Diallo");

        let student = codec.open(&text).unwrap();
        assert_eq!(student.name, "Amina Diallo");
        assert_eq!(student.id, "2026-0042");
        assert_eq!(student.university, "Universite de Dakar");
        assert!(student.error.is_none());
    }

    #[test]
    fn decode_crops_the_qr_region() {
        let codec = IdentityCodec::new("exam-key");
        let scanner = CannedScanner {
            text: codec.seal(&identity()).unwrap(),
            expected_size: (40, 30),
        };
        let cfg = ExamConfig {
            qr_crop_region: Some(Region::new(10, 10, 40, 30)),
            ..ExamConfig::default()
        };
        let page = DynamicImage::new_luma8(100, 100);
        let student = decode_identity(&page, &cfg, &scanner, &codec);
        assert_eq!(student.name, "Amina Diallo");
    }

    #[test]
    fn missing_decoder_gives_unknown_student() {
        let student = decode_identity(
            &DynamicImage::new_luma8(1600, 400),
            &ExamConfig::default(),
            &UnavailableQrScanner,
            &IdentityCodec::new("k"),
        );
        assert_eq!(student.name, "Unknown");
        assert_eq!(student.id, "0000");
        assert!(student.error.unwrap().contains("no QR decoder"));
    }

    #[test]
    fn wrong_key_gives_unknown_student_with_reason() {
        let text = IdentityCodec::new("right").seal(&identity()).unwrap();
        let scanner = CannedScanner {
            text,
            expected_size: (20, 20),
        };
        let cfg = ExamConfig {
            qr_crop_region: None,
            ..ExamConfig::default()
        };
        let student = decode_identity(
            &DynamicImage::new_luma8(20, 20),
            &cfg,
            &scanner,
            &IdentityCodec::new("wrong"),
        );
        assert_eq!(student.class_name, "N/A");
        assert!(student.error.is_some());
    }

    #[test]
    fn non_json_qr_text_is_a_decode_error() {
        let err = IdentityCodec::new("k").open("hello").unwrap_err();
        assert!(matches!(err, GradesheetError::IdentityDecode(_)));
    }

    #[test]
    fn qr_region_outside_page_is_reported() {
        let student = decode_identity(
            &DynamicImage::new_luma8(100, 100),
            &ExamConfig::default(),
            &UnavailableQrScanner,
            &IdentityCodec::new("k"),
        );
        assert!(student.error.unwrap().contains("outside the page"));
    }
}
