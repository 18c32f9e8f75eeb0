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

//! Error types returned by the quoting core and by platform primitives.

use core::fmt;

/// Failure of an opaque platform primitive (key derivation, report creation, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// The primitive ran out of memory.
    OutOfMemory,
    /// The key request names a trust state the platform cannot serve.
    InvalidKeyRequest,
    /// The identity report is malformed or its MAC does not match.
    InvalidReport,
    /// The primitive is not available or failed for another reason.
    Unavailable,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::OutOfMemory => write!(f, "platform out of memory"),
            PlatformError::InvalidKeyRequest => write!(f, "invalid key request"),
            PlatformError::InvalidReport => write!(f, "invalid identity report"),
            PlatformError::Unavailable => write!(f, "platform primitive unavailable"),
        }
    }
}

/// Error returned by every quoting operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QeError {
    /// A buffer is outside the trusted context, has the wrong size, or carries
    /// inconsistent contents.
    InvalidParameter,
    /// The sealed blob failed a size, version or authentication check.
    BlobFormat,
    /// A cryptographic primitive failed.
    Crypto,
    /// The application report did not verify.
    InvalidReport,
    /// Internal failure with no better classification.
    Unexpected,
    /// Memory exhaustion in a platform primitive.
    OutOfMemory,
    /// The attestation key could not be derived.
    AttestationKeyGeneration,
    /// The report for the certifying authority or requester could not be created.
    QeReportGeneration,
}

impl fmt::Display for QeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QeError::InvalidParameter => write!(f, "invalid parameter"),
            QeError::BlobFormat => write!(f, "invalid attestation key blob"),
            QeError::Crypto => write!(f, "cryptographic failure"),
            QeError::InvalidReport => write!(f, "invalid application report"),
            QeError::Unexpected => write!(f, "unexpected error"),
            QeError::OutOfMemory => write!(f, "out of memory"),
            QeError::AttestationKeyGeneration => write!(f, "attestation key generation failed"),
            QeError::QeReportGeneration => write!(f, "QE report generation failed"),
        }
    }
}

/// Error returned while decoding wire structures (reports, target info, quotes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Quote header is truncated.
    InvalidHeader,
    /// Quote body is truncated.
    InvalidBody,
    /// Identity report is truncated.
    InvalidReport,
    /// Target info is truncated.
    InvalidTargetInfo,
    /// Sealed plaintext region is truncated.
    InvalidPlaintext,
    /// Signature data is truncated or its declared length is inconsistent.
    InvalidSignatureData,
    /// Authentication data is truncated.
    InvalidAuthenticationData,
    /// Certification data is truncated.
    InvalidCertificationData,
    /// Quote version other than 3.
    UnsupportedVersion,
    /// Attestation key type other than ECDSA P-256.
    UnsupportedAttestationKeyType,
    /// Unknown QE vendor.
    UnsupportedVendorId,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidHeader => write!(f, "invalid quote header"),
            ParseError::InvalidBody => write!(f, "invalid quote body"),
            ParseError::InvalidReport => write!(f, "invalid report"),
            ParseError::InvalidTargetInfo => write!(f, "invalid target info"),
            ParseError::InvalidPlaintext => write!(f, "invalid blob plaintext"),
            ParseError::InvalidSignatureData => write!(f, "invalid signature data"),
            ParseError::InvalidAuthenticationData => write!(f, "invalid authentication data"),
            ParseError::InvalidCertificationData => write!(f, "invalid certification data"),
            ParseError::UnsupportedVersion => write!(f, "unsupported quote version"),
            ParseError::UnsupportedAttestationKeyType => {
                write!(f, "unsupported attestation key type")
            }
            ParseError::UnsupportedVendorId => write!(f, "unsupported QE vendor id"),
        }
    }
}

/// Error returned while checking a produced quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    /// The embedded attestation key is not a valid P-256 point.
    InvalidAttestationKey,
    /// The quote signature does not match the signed region.
    BadSignature,
    /// The QE report data does not commit to the attestation key and authentication data.
    ReportDataMismatch,
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationError::InvalidAttestationKey => write!(f, "invalid attestation key"),
            VerificationError::BadSignature => write!(f, "bad quote signature"),
            VerificationError::ReportDataMismatch => write!(f, "QE report data mismatch"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QeError {}

#[cfg(feature = "std")]
impl std::error::Error for PlatformError {}

impl QeError {
    /// Maps a failed platform call where only memory exhaustion is singled out.
    pub(crate) fn oom_or(err: PlatformError, other: QeError) -> QeError {
        match err {
            PlatformError::OutOfMemory => QeError::OutOfMemory,
            _ => other,
        }
    }
}
