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

//! ECDSA quote v3 assembly and the relying-party view of produced quotes.

extern crate alloc;
use alloc::vec::Vec;

use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{ParseError, QeError, VerificationError};
use crate::intel::blob::{EvidenceSubject, PlaintextData};
use crate::intel::constants::*;
use crate::intel::keys::{derive_platform_identifier, PlatformId};
use crate::intel::lifecycle::verify_and_refresh;
use crate::intel::report::{Report, ReportBody, ReportData, TargetInfo};
use crate::platform::{slice_within, value_within, Platform};

/// Requester supplied freshness value.
pub type QuoteNonce = [u8; QUOTE_NONCE_SIZE];

/// Result of [`sign_quote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedQuote {
    /// Bytes written at the start of the quote buffer.
    pub size: usize,
    /// Report addressed to the requester proving the quote answers its nonce.
    pub qe_report: Option<Report>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QuoteHeader {
    /// Version of the quote data structure.
    version: u16,
    /// Type of the Attestation Key used by the Quoting Enclave.
    /// 2 (ECDSA-256-with-P-256 curve)
    attestation_key_type: u16,
    /// Reserved, zero.
    att_key_data_0: u32,
    /// Security version of the Quoting Enclave.
    qe_svn: u16,
    /// Security version of the PCE, supplied by the caller.
    pce_svn: u16,
    /// Unique identifier of the QE Vendor.
    /// Value: 939A7233F79C4CA9940A0DB3957F0607 (Intel® SGX QE Vendor)
    qe_vendor_id: [u8; HEADER_QE_VENDOR_ID_SIZE],
    /// The first 16 bytes hold the platform identifier (QE_ID), the rest is zero.
    user_data: [u8; HEADER_USER_DATA_SIZE],
}

impl QuoteHeader {
    fn new(qe_svn: u16, pce_svn: u16, qe_id: &PlatformId) -> Self {
        let mut user_data = [0u8; HEADER_USER_DATA_SIZE];
        user_data[..QE_ID_SIZE].copy_from_slice(qe_id);
        QuoteHeader {
            version: QE_QUOTE_VERSION,
            attestation_key_type: ATTESTATION_KEY_TYPE_ECDSA_256_P256,
            att_key_data_0: 0,
            qe_svn,
            pce_svn,
            qe_vendor_id: INTEL_VENDOR_ID,
            user_data,
        }
    }

    fn from_bytes(input: &[u8]) -> Result<Self, ParseError> {
        let input = input.get(..QUOTE_HEADER_SIZE).ok_or(ParseError::InvalidHeader)?;
        Ok(QuoteHeader {
            version: u16::from_le_bytes(
                input[HEADER_VERSION_OFFSET..HEADER_ATTESTATION_KEY_TYPE_OFFSET]
                    .try_into()
                    .map_err(|_| ParseError::InvalidHeader)?,
            ),
            attestation_key_type: u16::from_le_bytes(
                input[HEADER_ATTESTATION_KEY_TYPE_OFFSET..HEADER_ATT_KEY_DATA_OFFSET]
                    .try_into()
                    .map_err(|_| ParseError::InvalidHeader)?,
            ),
            att_key_data_0: u32::from_le_bytes(
                input[HEADER_ATT_KEY_DATA_OFFSET..HEADER_QE_SVN_OFFSET]
                    .try_into()
                    .map_err(|_| ParseError::InvalidHeader)?,
            ),
            qe_svn: u16::from_le_bytes(
                input[HEADER_QE_SVN_OFFSET..HEADER_PCE_SVN_OFFSET]
                    .try_into()
                    .map_err(|_| ParseError::InvalidHeader)?,
            ),
            pce_svn: u16::from_le_bytes(
                input[HEADER_PCE_SVN_OFFSET..HEADER_QE_VENDOR_ID_OFFSET]
                    .try_into()
                    .map_err(|_| ParseError::InvalidHeader)?,
            ),
            qe_vendor_id: input[HEADER_QE_VENDOR_ID_OFFSET..HEADER_USER_DATA_OFFSET]
                .try_into()
                .map_err(|_| ParseError::InvalidHeader)?,
            user_data: input[HEADER_USER_DATA_OFFSET..QUOTE_HEADER_SIZE]
                .try_into()
                .map_err(|_| ParseError::InvalidHeader)?,
        })
    }

    fn to_bytes(&self, output: &mut [u8]) {
        output[HEADER_VERSION_OFFSET..HEADER_ATTESTATION_KEY_TYPE_OFFSET]
            .copy_from_slice(&self.version.to_le_bytes());
        output[HEADER_ATTESTATION_KEY_TYPE_OFFSET..HEADER_ATT_KEY_DATA_OFFSET]
            .copy_from_slice(&self.attestation_key_type.to_le_bytes());
        output[HEADER_ATT_KEY_DATA_OFFSET..HEADER_QE_SVN_OFFSET]
            .copy_from_slice(&self.att_key_data_0.to_le_bytes());
        output[HEADER_QE_SVN_OFFSET..HEADER_PCE_SVN_OFFSET]
            .copy_from_slice(&self.qe_svn.to_le_bytes());
        output[HEADER_PCE_SVN_OFFSET..HEADER_QE_VENDOR_ID_OFFSET]
            .copy_from_slice(&self.pce_svn.to_le_bytes());
        output[HEADER_QE_VENDOR_ID_OFFSET..HEADER_USER_DATA_OFFSET]
            .copy_from_slice(&self.qe_vendor_id);
        output[HEADER_USER_DATA_OFFSET..QUOTE_HEADER_SIZE].copy_from_slice(&self.user_data);
    }
}

/// Certification data appended after the authentication data.
enum CertificationPayload<'a> {
    /// Caller supplied, header included, copied verbatim.
    External(&'a [u8]),
    /// Encrypted PPID | CPUSVN | PCE ISVSVN | PCE ID
    EncryptedPpid(&'a [u8; RSA_3072_MOD_SIZE]),
    /// PPID | CPUSVN | PCE ISVSVN | PCE ID
    #[cfg(feature = "cleartext-ppid")]
    CleartextPpid(&'a [u8; PPID_SIZE]),
}

impl<'a> CertificationPayload<'a> {
    fn select(
        subject: &'a EvidenceSubject,
        external_cert: Option<&'a [u8]>,
    ) -> Result<Self, QeError> {
        match subject {
            #[cfg(feature = "cleartext-ppid")]
            EvidenceSubject::Cleartext { ppid } => Ok(CertificationPayload::CleartextPpid(ppid)),
            #[cfg(not(feature = "cleartext-ppid"))]
            EvidenceSubject::Cleartext { .. } => {
                log::debug!("blob holds a cleartext PPID but cleartext mode is disabled");
                Err(QeError::Unexpected)
            }
            EvidenceSubject::Encrypted { encrypted_ppid, .. } => Ok(match external_cert {
                Some(cert) => CertificationPayload::External(cert),
                None => CertificationPayload::EncryptedPpid(encrypted_ppid),
            }),
        }
    }

    /// Size including the type and size fields.
    fn size(&self) -> usize {
        match self {
            CertificationPayload::External(cert) => cert.len(),
            CertificationPayload::EncryptedPpid(_) => {
                CERT_DATA_HEADER_SIZE + PPID_RSA3072_CERT_INFO_SIZE
            }
            #[cfg(feature = "cleartext-ppid")]
            CertificationPayload::CleartextPpid(_) => {
                CERT_DATA_HEADER_SIZE + PPID_CLEARTEXT_CERT_INFO_SIZE
            }
        }
    }

    fn write(&self, plaintext: &PlaintextData, output: &mut [u8]) {
        let (cert_type, ppid): (u16, &[u8]) = match self {
            CertificationPayload::External(cert) => {
                output[..cert.len()].copy_from_slice(cert);
                return;
            }
            CertificationPayload::EncryptedPpid(encrypted) => {
                (CERT_DATA_TYPE_PPID_RSA3072_ENCRYPTED, &encrypted[..])
            }
            #[cfg(feature = "cleartext-ppid")]
            CertificationPayload::CleartextPpid(ppid) => (CERT_DATA_TYPE_PPID_CLEARTEXT, &ppid[..]),
        };
        let payload_size = (self.size() - CERT_DATA_HEADER_SIZE) as u32;
        output[..CERT_DATA_TYPE_FIELD_SIZE].copy_from_slice(&cert_type.to_le_bytes());
        output[CERT_DATA_TYPE_FIELD_SIZE..CERT_DATA_HEADER_SIZE]
            .copy_from_slice(&payload_size.to_le_bytes());

        let mut offset = CERT_DATA_HEADER_SIZE;
        for field in [
            ppid,
            &plaintext.cert_cpu_svn[..],
            &plaintext.cert_pce_isv_svn.to_le_bytes()[..],
            &plaintext.cert_pce_id.to_le_bytes()[..],
        ] {
            output[offset..offset + field.len()].copy_from_slice(field);
            offset += field.len();
        }
    }
}

/// Checks the self-describing header of caller supplied certification data.
fn check_external_cert(cert: &[u8]) -> Result<(), QeError> {
    if cert.len() < CERT_DATA_HEADER_SIZE {
        return Err(QeError::InvalidParameter);
    }
    let cert_type = u16::from_le_bytes([cert[0], cert[1]]);
    let size = u32::from_le_bytes([cert[2], cert[3], cert[4], cert[5]]) as usize;
    if !(CERT_DATA_TYPE_PPID_CLEARTEXT..=CERT_DATA_TYPE_MAX).contains(&cert_type)
        || size > MAX_CERT_DATA_SIZE
        || CERT_DATA_HEADER_SIZE + size != cert.len()
    {
        log::debug!("rejecting certification data type {cert_type} size {size}");
        return Err(QeError::InvalidParameter);
    }
    Ok(())
}

fn required_size(authentication_data: usize, certification: usize) -> Result<usize, QeError> {
    QUOTE_FIXED_SIZE
        .checked_add(ECDSA_SIG_DATA_SIZE + AUTH_DATA_SIZE_FIELD)
        .and_then(|s| s.checked_add(authentication_data))
        .and_then(|s| s.checked_add(certification))
        .filter(|s| *s <= u32::MAX as usize)
        .ok_or(QeError::InvalidParameter)
}

/// Buffer size [`sign_quote`] needs for `blob` and the optional external
/// certification data.
pub fn quote_size<P: Platform + ?Sized>(
    platform: &P,
    blob: &mut [u8],
    external_cert: Option<&[u8]>,
) -> Result<usize, QeError> {
    if !slice_within(platform, blob) || !external_cert.map_or(true, |c| slice_within(platform, c)) {
        return Err(QeError::InvalidParameter);
    }
    if blob.len() != SEALED_BLOB_SIZE {
        return Err(QeError::InvalidParameter);
    }
    if let Some(cert) = external_cert {
        check_external_cert(cert)?;
    }

    let verified = verify_and_refresh(platform, blob, true)?;
    let secret = verified.secret.as_ref().ok_or(QeError::Unexpected)?;
    let payload = CertificationPayload::select(secret.subject(), external_cert)?;
    required_size(verified.plaintext.authentication_data().len(), payload.size())
}

/// Signs a quote for `app_report` into `quote_buf`.
///
/// `nonce` and `app_target_info` are both present or both absent. With them a
/// second report, addressed to the requester, carries
/// `SHA256(nonce || quote)` in its report data.
///
/// The signature covers the header and body only. The signature data length
/// and everything after it can be replaced later without invalidating it.
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
    if !slice_within(platform, blob)
        || !value_within(platform, app_report)
        || !nonce.map_or(true, |n| value_within(platform, n))
        || !app_target_info.map_or(true, |t| value_within(platform, t))
        || !slice_within(platform, quote_buf)
        || !external_cert.map_or(true, |c| slice_within(platform, c))
    {
        return Err(QeError::InvalidParameter);
    }
    if blob.len() != SEALED_BLOB_SIZE {
        return Err(QeError::InvalidParameter);
    }
    let freshness = match (nonce, app_target_info) {
        (Some(nonce), Some(target)) => Some((nonce, target)),
        (None, None) => None,
        _ => return Err(QeError::InvalidParameter),
    };
    if let Some(cert) = external_cert {
        check_external_cert(cert)?;
    }

    platform.verify_report(app_report).map_err(|e| {
        log::debug!("application report rejected: {e}");
        QeError::InvalidReport
    })?;

    let verified = verify_and_refresh(platform, blob, true)?;
    let plaintext = &verified.plaintext;
    let secret = verified.secret.as_ref().ok_or(QeError::Unexpected)?;
    let payload = CertificationPayload::select(secret.subject(), external_cert)?;
    let auth_data = plaintext.authentication_data();
    let size = required_size(auth_data.len(), payload.size())?;
    if quote_buf.len() < size {
        return Err(QeError::InvalidParameter);
    }

    let qe_id = derive_platform_identifier(platform)?;
    let quote = &mut quote_buf[..size];
    quote.zeroize();

    let header = QuoteHeader::new(verified.report_body.isv_svn(), pce_svn, &qe_id);
    header.to_bytes(&mut quote[..QUOTE_HEADER_SIZE]);
    quote[QUOTE_HEADER_SIZE..QUOTE_SIGNED_SIZE].copy_from_slice(app_report.body.as_bytes());

    // p256 already encodes r and s big-endian
    let signature = match secret.key_pair().sign(&quote[..QUOTE_SIGNED_SIZE]) {
        Ok(signature) => signature,
        Err(e) => {
            quote.zeroize();
            return Err(e);
        }
    };

    let signature_data_len = (size - QUOTE_FIXED_SIZE) as u32;
    quote[SIGNATURE_DATA_LEN_OFFSET..QUOTE_FIXED_SIZE]
        .copy_from_slice(&signature_data_len.to_le_bytes());

    let sig_data = &mut quote[QUOTE_FIXED_SIZE..];
    sig_data[SIG_DATA_SIGNATURE_OFFSET..SIG_DATA_ATTESTATION_KEY_OFFSET].copy_from_slice(&signature);
    sig_data[SIG_DATA_ATTESTATION_KEY_OFFSET..SIG_DATA_QE_REPORT_OFFSET]
        .copy_from_slice(secret.public_key());
    sig_data[SIG_DATA_QE_REPORT_OFFSET..SIG_DATA_QE_REPORT_SIG_OFFSET]
        .copy_from_slice(plaintext.qe_report.body.as_bytes());
    sig_data[SIG_DATA_QE_REPORT_SIG_OFFSET..ECDSA_SIG_DATA_SIZE]
        .copy_from_slice(&plaintext.qe_report_cert_key_sig);

    let auth = &mut sig_data[ECDSA_SIG_DATA_SIZE..];
    auth[..AUTH_DATA_SIZE_FIELD].copy_from_slice(&(auth_data.len() as u16).to_le_bytes());
    auth[AUTH_DATA_SIZE_FIELD..AUTH_DATA_SIZE_FIELD + auth_data.len()].copy_from_slice(auth_data);
    payload.write(plaintext, &mut auth[AUTH_DATA_SIZE_FIELD + auth_data.len()..]);

    let qe_report = match freshness {
        None => None,
        Some((nonce, target)) => {
            let digest = {
                let mut hasher = Sha256::new();
                hasher.update(nonce);
                hasher.update(&quote_buf[..size]);
                hasher.finalize()
            };
            let mut report_data: ReportData = [0u8; REPORT_DATA_SIZE];
            report_data[..SHA256_SIZE].copy_from_slice(&digest);
            match platform.create_report(Some(target), Some(&report_data)) {
                Ok(report) => Some(report),
                Err(e) => {
                    quote_buf[..size].zeroize();
                    return Err(QeError::oom_or(e, QeError::Unexpected));
                }
            }
        }
    };

    log::trace!("signed quote of {size} bytes");
    Ok(SignedQuote { size, qe_report })
}

/// A parsed ECDSA quote v3.
#[derive(Debug, Clone)]
pub struct Quote {
    header: QuoteHeader,
    body: ReportBody,
    signature_data_len: u32,
    signature: [u8; ECDSA_SIGNATURE_SIZE],
    attestation_key: [u8; ATTESTATION_KEY_SIZE],
    qe_report_body: ReportBody,
    qe_report_signature: [u8; ECDSA_SIGNATURE_SIZE],
    authentication_data: Vec<u8>,
    certification_data_type: u16,
    certification_data: Vec<u8>,
}

impl Quote {
    /// Parses and checks header version, key type and vendor id.
    pub fn from_bytes(input: &[u8]) -> Result<Self, ParseError> {
        // HEADER
        let header = QuoteHeader::from_bytes(input)?;
        if header.version != QE_QUOTE_VERSION {
            return Err(ParseError::UnsupportedVersion);
        }
        if header.attestation_key_type != ATTESTATION_KEY_TYPE_ECDSA_256_P256 {
            return Err(ParseError::UnsupportedAttestationKeyType);
        }
        if header.qe_vendor_id != INTEL_VENDOR_ID {
            return Err(ParseError::UnsupportedVendorId);
        }

        // BODY
        let body = ReportBody::from_bytes(
            input
                .get(QUOTE_HEADER_SIZE..QUOTE_SIGNED_SIZE)
                .ok_or(ParseError::InvalidBody)?,
        )
        .map_err(|_| ParseError::InvalidBody)?;

        // SIGNATURE DATA
        let signature_data_len = u32::from_le_bytes(
            input
                .get(SIGNATURE_DATA_LEN_OFFSET..QUOTE_FIXED_SIZE)
                .ok_or(ParseError::InvalidSignatureData)?
                .try_into()
                .map_err(|_| ParseError::InvalidSignatureData)?,
        );
        let sig_data = QUOTE_FIXED_SIZE
            .checked_add(signature_data_len as usize)
            .and_then(|end| input.get(QUOTE_FIXED_SIZE..end))
            .filter(|data| data.len() >= ECDSA_SIG_DATA_SIZE)
            .ok_or(ParseError::InvalidSignatureData)?;

        let signature = sig_data[SIG_DATA_SIGNATURE_OFFSET..SIG_DATA_ATTESTATION_KEY_OFFSET]
            .try_into()
            .map_err(|_| ParseError::InvalidSignatureData)?;
        let attestation_key = sig_data[SIG_DATA_ATTESTATION_KEY_OFFSET..SIG_DATA_QE_REPORT_OFFSET]
            .try_into()
            .map_err(|_| ParseError::InvalidSignatureData)?;
        let qe_report_body =
            ReportBody::from_bytes(&sig_data[SIG_DATA_QE_REPORT_OFFSET..SIG_DATA_QE_REPORT_SIG_OFFSET])
                .map_err(|_| ParseError::InvalidSignatureData)?;
        let qe_report_signature = sig_data[SIG_DATA_QE_REPORT_SIG_OFFSET..ECDSA_SIG_DATA_SIZE]
            .try_into()
            .map_err(|_| ParseError::InvalidSignatureData)?;

        // AUTHENTICATION DATA
        let rest = &sig_data[ECDSA_SIG_DATA_SIZE..];
        let auth_size = u16::from_le_bytes(
            rest.get(..AUTH_DATA_SIZE_FIELD)
                .ok_or(ParseError::InvalidAuthenticationData)?
                .try_into()
                .map_err(|_| ParseError::InvalidAuthenticationData)?,
        ) as usize;
        let authentication_data = rest
            .get(AUTH_DATA_SIZE_FIELD..AUTH_DATA_SIZE_FIELD + auth_size)
            .ok_or(ParseError::InvalidAuthenticationData)?
            .to_vec();

        // CERTIFICATION DATA
        let cert = &rest[AUTH_DATA_SIZE_FIELD + auth_size..];
        let header_bytes = cert
            .get(..CERT_DATA_HEADER_SIZE)
            .ok_or(ParseError::InvalidCertificationData)?;
        let certification_data_type = u16::from_le_bytes([header_bytes[0], header_bytes[1]]);
        let cert_size = u32::from_le_bytes([
            header_bytes[2],
            header_bytes[3],
            header_bytes[4],
            header_bytes[5],
        ]) as usize;
        let certification_data = cert
            .get(CERT_DATA_HEADER_SIZE..CERT_DATA_HEADER_SIZE + cert_size)
            .ok_or(ParseError::InvalidCertificationData)?
            .to_vec();

        Ok(Quote {
            header,
            body,
            signature_data_len,
            signature,
            attestation_key,
            qe_report_body,
            qe_report_signature,
            authentication_data,
            certification_data_type,
            certification_data,
        })
    }

    /// QE ISVSVN at signing time.
    pub fn qe_svn(&self) -> u16 {
        self.header.qe_svn
    }

    /// PCE ISVSVN as supplied by the caller.
    pub fn pce_svn(&self) -> u16 {
        self.header.pce_svn
    }

    /// Platform identifier carried in the header user data.
    pub fn platform_id(&self) -> PlatformId {
        let mut id = [0u8; QE_ID_SIZE];
        id.copy_from_slice(&self.header.user_data[..QE_ID_SIZE]);
        id
    }

    /// Report body of the attested application enclave.
    pub fn body(&self) -> &ReportBody {
        &self.body
    }

    /// Length of everything after the signed region and the length field.
    pub fn signature_data_len(&self) -> u32 {
        self.signature_data_len
    }

    /// `r || s`, big-endian.
    pub fn signature(&self) -> &[u8; ECDSA_SIGNATURE_SIZE] {
        &self.signature
    }

    /// Big-endian `X || Y`.
    pub fn attestation_key(&self) -> &[u8; ATTESTATION_KEY_SIZE] {
        &self.attestation_key
    }

    /// QE report body certified by the PCE.
    pub fn qe_report_body(&self) -> &ReportBody {
        &self.qe_report_body
    }

    /// PCE signature over the QE report body.
    pub fn qe_report_signature(&self) -> &[u8; ECDSA_SIGNATURE_SIZE] {
        &self.qe_report_signature
    }

    /// Authentication data bound into the QE report.
    pub fn authentication_data(&self) -> &[u8] {
        &self.authentication_data
    }

    /// Certification data type, e.g. `CERT_DATA_TYPE_PPID_RSA3072_ENCRYPTED`.
    pub fn certification_data_type(&self) -> u16 {
        self.certification_data_type
    }

    /// Certification data without its type and size header.
    pub fn certification_data(&self) -> &[u8] {
        &self.certification_data
    }

    /// Checks the attestation key signature over header and body.
    pub fn verify_signature(&self) -> Result<(), VerificationError> {
        let mut signed_data = [0u8; QUOTE_SIGNED_SIZE];
        self.header.to_bytes(&mut signed_data);
        signed_data[QUOTE_HEADER_SIZE..].copy_from_slice(self.body.as_bytes());

        let mut sec1 = [0u8; ATTESTATION_KEY_SIZE + 1];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(&self.attestation_key);
        let key = VerifyingKey::from_sec1_bytes(&sec1)
            .map_err(|_| VerificationError::InvalidAttestationKey)?;
        let signature =
            Signature::from_slice(&self.signature).map_err(|_| VerificationError::BadSignature)?;
        key.verify(&signed_data, &signature)
            .map_err(|_| VerificationError::BadSignature)
    }

    /// Checks that the QE report data is
    /// `SHA256(attestation key || authentication data) || 32 zero bytes`.
    pub fn verify_qe_report_binding(&self) -> Result<(), VerificationError> {
        let hash = {
            let mut hasher = Sha256::new();
            hasher.update(self.attestation_key);
            hasher.update(self.authentication_data.as_slice());
            hasher.finalize()
        };

        let mut expected: ReportData = [0u8; REPORT_DATA_SIZE];
        expected[..SHA256_SIZE].copy_from_slice(&hash);
        if expected != self.qe_report_body.report_data() {
            return Err(VerificationError::ReportDataMismatch);
        }
        Ok(())
    }
}

/// Parses an ECDSA quote v3.
pub fn parse_quote(input: &[u8]) -> Result<Quote, ParseError> {
    Quote::from_bytes(input)
}
