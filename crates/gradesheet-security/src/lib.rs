// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! gradesheet-security: Student identity protection.
//!
//! Student names and ids are printed on answer sheets as an encrypted QR
//! payload. This crate seals and opens those payloads with an age passphrase
//! key, manages the key file, and turns a scanned first page back into a
//! student record through a pluggable QR scanner.

pub mod cipher;
pub mod identity;
pub mod key;

// PUBLIC API: Re-export the identity primitives
pub use cipher::PassphraseCipher;
pub use identity::{
    IdentityCodec, IdentityPayload, QrScanner, StudentIdentity, UnavailableQrScanner,
    decode_identity,
};
pub use key::{KeySource, load_key};
