// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Passphrase cipher: age (scrypt recipient) encryption of short identity
// fields. Ciphertexts travel inside QR payload JSON, so the text helpers
// hex-encode the raw age file.

use std::io::{Read, Write};

use age::secrecy::SecretString;
use gradesheet_core::error::GradesheetError;
use tracing::{debug, instrument};

/// Passphrase-based cipher backed by the `age` crate.
///
/// The passphrase is held only for the lifetime of the `PassphraseCipher`
/// value so that callers can drop it promptly after use.
pub struct PassphraseCipher {
    /// Zeroised on drop.
    passphrase: SecretString,
}

impl PassphraseCipher {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: SecretString::from(passphrase.into()),
        }
    }

    /// Seal one identity field as a complete age file (header + payload).
    ///
    /// Only reached through [`PassphraseCipher::seal_text`]; QR payloads carry
    /// the hex form, never the raw bytes.
    #[instrument(skip_all, fields(field_len = field.len()))]
    fn encrypt(&self, field: &[u8]) -> Result<Vec<u8>, GradesheetError> {
        let sealing = |e: &dyn std::fmt::Display| GradesheetError::Encryption(e.to_string());

        let mut sealed = Vec::new();
        let mut writer = age::Encryptor::with_user_passphrase(self.passphrase.clone())
            .wrap_output(&mut sealed)
            .map_err(|e| sealing(&e))?;
        writer.write_all(field).map_err(|e| sealing(&e))?;
        writer.finish().map_err(|e| sealing(&e))?;

        debug!(sealed_len = sealed.len(), "identity field sealed");
        Ok(sealed)
    }

    /// Open an age file produced by [`PassphraseCipher::encrypt`]. A wrong
    /// key file surfaces here as `Decryption`, which the identity step turns
    /// into an `Unknown` student.
    #[instrument(skip_all, fields(sealed_len = sealed.len()))]
    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, GradesheetError> {
        let opening = |e: &dyn std::fmt::Display| GradesheetError::Decryption(e.to_string());

        let identity = age::scrypt::Identity::new(self.passphrase.clone());
        let mut reader = age::Decryptor::new(sealed)
            .map_err(|e| opening(&e))?
            .decrypt(std::iter::once(&identity as &dyn age::Identity))
            .map_err(|e| opening(&e))?;

        let mut field = Vec::new();
        reader.read_to_end(&mut field).map_err(|e| opening(&e))?;

        debug!(field_len = field.len(), "identity field opened");
        Ok(field)
    }

    /// Encrypt a string and hex-encode the age file.
    pub fn seal_text(&self, text: &str) -> Result<String, GradesheetError> {
        self.encrypt(text.as_bytes()).map(hex::encode)
    }

    /// Reverse of [`PassphraseCipher::seal_text`].
    pub fn open_text(&self, sealed: &str) -> Result<String, GradesheetError> {
        let raw = hex::decode(sealed.trim())
            .map_err(|e| GradesheetError::Decryption(format!("ciphertext is not hex: {e}")))?;
        let plaintext = self.decrypt(&raw)?;
        String::from_utf8(plaintext)
            .map_err(|e| GradesheetError::Decryption(format!("plaintext is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cipher = PassphraseCipher::new("correct-horse-battery-staple");
        let plaintext = b"Student 2026-0042";

        let ciphertext = cipher.encrypt(plaintext).expect("encrypt failed");
        assert_ne!(
            &ciphertext[..],
            plaintext,
            "ciphertext must differ from plaintext"
        );

        let decrypted = cipher.decrypt(&ciphertext).expect("decrypt failed");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn wrong_passphrase_fails() {
        let cipher_a = PassphraseCipher::new("passphrase-alpha");
        let cipher_b = PassphraseCipher::new("passphrase-beta");

        let ciphertext = cipher_a.encrypt(b"secret").expect("encrypt failed");
        let result = cipher_b.decrypt(&ciphertext);

        assert!(matches!(result, Err(GradesheetError::Decryption(_))));
    }

    #[test]
    fn sealed_text_is_hex_and_opens() {
        let cipher = PassphraseCipher::new("hex-test");
        let sealed = cipher.seal_text("Amina Diallo").unwrap();
        assert!(sealed.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(cipher.open_text(&sealed).unwrap(), "Amina Diallo");
    }

    #[test]
    fn non_hex_text_is_a_decryption_error() {
        let cipher = PassphraseCipher::new("hex-test");
        assert!(matches!(
            cipher.open_text("zz-not-hex"),
            Err(GradesheetError::Decryption(_))
        ));
    }
}
