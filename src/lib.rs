// Copyright 2025, Horizen Labs, Inc.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Attestation key management and ECDSA quote signing for an SGX-style
//! quoting enclave.
//!
//! The enclave primitives (key derivation, reports, randomness, address
//! checks) are reached through [`platform::Platform`]. Everything else is
//! pure computation over caller supplied buffers.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]

extern crate alloc;

pub mod error;
mod intel;
pub mod platform;

pub use crate::{
    error::{ParseError, PlatformError, QeError, VerificationError},
    intel::{
        ecdsa_id, read_plaintext, AttestationKeyPair, CpuSvn, EvidenceSubject,
        KeyId, Measurement, PceEncryptionKey, PlaintextData, PlatformId, PpidEvidence, Quote,
        QuoteNonce, Report, ReportBody, ReportData, SecretData, SignedQuote, TargetInfo,
        TrustState, UnsealedBlob, VerifiedBlob,
    },
};
#[cfg(feature = "cleartext-ppid")]
pub use crate::intel::PpidDecryptionSession;

/// Wire sizes and identifiers callers need to size and inspect buffers.
pub mod constants {
    pub use crate::intel::constants::{
        AUTHENTICATION_DATA_SIZE, BLOB_CIPHERTEXT_OFFSET, BLOB_PLAINTEXT_OFFSET,
        CERT_DATA_HEADER_SIZE, CERT_DATA_TYPE_PCK_CHAIN, CERT_DATA_TYPE_PPID_CLEARTEXT,
        CERT_DATA_TYPE_PPID_RSA3072_ENCRYPTED, CPU_SVN_SIZE, FLAGS_PROVISION_KEY, KEY_ID_SIZE,
        PCE_ALG_RSA_OAEP_3072, PPID_ENCRYPTION_KEY_E, PPID_ENCRYPTION_KEY_N, QUOTE_FIXED_SIZE,
        QUOTE_NONCE_SIZE, QUOTE_SIGNED_SIZE, REPORT_DATA_SIZE, RSA_3072_MOD_SIZE,
        SEALED_BLOB_SIZE,
    };
}

use crate::platform::{slice_within, value_within, Platform};

// =============================================================================
// Key derivation
// =============================================================================

/// Derive the 16-byte platform identifier (QE_ID).
pub fn derive_platform_identifier<P: Platform + ?Sized>(
    platform: &P,
) -> Result<PlatformId, QeError> {
    intel::keys::derive_platform_identifier(platform)
}

/// Derive the P-256 attestation key bound to the current trust state and `key_id`.
pub fn derive_attestation_key<P: Platform + ?Sized>(
    platform: &P,
    key_id: &KeyId,
) -> Result<AttestationKeyPair, QeError> {
    intel::keys::derive_attestation_key(platform, key_id)
}

// =============================================================================
// Sealed blob
// =============================================================================

/// Encrypt and authenticate the attestation key state into `blob`.
pub fn seal<P: Platform + ?Sized>(
    platform: &P,
    state: &TrustState,
    plaintext: &PlaintextData,
    secret: &SecretData,
    blob: &mut [u8],
) -> Result<(), QeError> {
    if !slice_within(platform, blob)
        || !value_within(platform, plaintext)
        || !value_within(platform, secret)
    {
        return Err(QeError::InvalidParameter);
    }
    intel::blob::seal(platform, state, plaintext, secret, blob)
}

/// Authenticate and decrypt `blob`.
pub fn unseal<P: Platform + ?Sized>(
    platform: &P,
    blob: &[u8],
) -> Result<UnsealedBlob, QeError> {
    if !slice_within(platform, blob) {
        return Err(QeError::InvalidParameter);
    }
    intel::blob::unseal(platform, blob)
}

/// Authenticate `blob`, re-sealing it in place when the trust state moved.
pub fn verify_and_refresh<P: Platform + ?Sized>(
    platform: &P,
    blob: &mut [u8],
    want_secret: bool,
) -> Result<VerifiedBlob, QeError> {
    if !slice_within(platform, blob) {
        return Err(QeError::InvalidParameter);
    }
    intel::lifecycle::verify_and_refresh(platform, blob, want_secret)
}

/// Integrity status of a sealed blob, as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobStatus {
    /// The blob was re-sealed to a newer trust state.
    pub resealed: bool,
    /// Key id of the seal key the blob is bound to now.
    pub key_id: KeyId,
    /// Report body of the quoting enclave at verification time.
    pub report_body: ReportBody,
}

/// Check `blob` without handing out any secret material.
pub fn verify_blob<P: Platform + ?Sized>(
    platform: &P,
    blob: &mut [u8],
) -> Result<BlobStatus, QeError> {
    if !slice_within(platform, blob) || blob.len() != constants::SEALED_BLOB_SIZE {
        return Err(QeError::InvalidParameter);
    }
    let verified = intel::lifecycle::verify_and_refresh(platform, blob, false)?;
    Ok(BlobStatus {
        resealed: verified.resealed,
        key_id: *verified.key_id(),
        report_body: verified.report_body,
    })
}

// =============================================================================
// Certification
// =============================================================================

/// Generate the attestation key into `blob` and return the report the PCE certifies.
pub fn generate_attestation_key<P: Platform + ?Sized>(
    platform: &P,
    blob: &mut [u8],
    pce_target_info: &TargetInfo,
    authentication_data: Option<&[u8]>,
) -> Result<Report, QeError> {
    intel::certification::generate_attestation_key(
        platform,
        blob,
        pce_target_info,
        authentication_data,
    )
}

/// Get the RSA key the PCE encrypts the PPID with, and a report binding it.
pub fn pce_encrypt_key<P: Platform + ?Sized>(
    platform: &P,
    pce_target_info: &TargetInfo,
    crypto_suite: u8,
    certification_key_type: u16,
) -> Result<PceEncryptionKey, QeError> {
    intel::certification::pce_encrypt_key(
        platform,
        pce_target_info,
        crypto_suite,
        certification_key_type,
    )
}

/// Get the public half of `session` for the PCE to encrypt the PPID with.
#[cfg(feature = "cleartext-ppid")]
pub fn pce_session_encrypt_key<P: Platform + ?Sized>(
    platform: &P,
    pce_target_info: &TargetInfo,
    crypto_suite: u8,
    certification_key_type: u16,
    session: &PpidDecryptionSession,
) -> Result<PceEncryptionKey, QeError> {
    intel::certification::pce_session_encrypt_key(
        platform,
        pce_target_info,
        crypto_suite,
        certification_key_type,
        session,
    )
}

/// Merge the PCE's certification into `blob`.
pub fn store_certification<P: Platform + ?Sized>(
    platform: &P,
    new_plaintext: &PlaintextData,
    evidence: PpidEvidence<'_>,
    blob: &mut [u8],
) -> Result<(), QeError> {
    intel::certification::store_certification(platform, new_plaintext, evidence, blob)
}

// =============================================================================
// Quotes
// =============================================================================

/// Size of the buffer [`sign_quote`] needs.
pub fn quote_size<P: Platform + ?Sized>(
    platform: &P,
    blob: &mut [u8],
    external_cert: Option<&[u8]>,
) -> Result<usize, QeError> {
    intel::quote::quote_size(platform, blob, external_cert)
}

/// Sign a quote over `app_report` with the sealed attestation key.
#[allow(clippy::too_many_arguments)]
pub fn sign_quote<P: Platform + ?Sized>(
    platform: &P,
    blob: &mut [u8],
    app_report: &Report,
    nonce: Option<&QuoteNonce>,
    app_target_info: Option<&TargetInfo>,
    quote_buf: &mut [u8],
    pce_svn: u16,
    external_cert: Option<&[u8]>,
) -> Result<SignedQuote, QeError> {
    intel::quote::sign_quote(
        platform,
        blob,
        app_report,
        nonce,
        app_target_info,
        quote_buf,
        pce_svn,
        external_cert,
    )
}

/// Parse an ECDSA quote v3 from binary data.
pub fn parse_quote(input: &[u8]) -> Result<Quote, ParseError> {
    intel::quote::parse_quote(input)
}
