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

//! Attestation key generation and certification by the PCE.

use sha2::{Digest, Sha256};

use crate::error::QeError;
use crate::intel::blob::{self, EvidenceSubject, PlaintextData, SecretData};
use crate::intel::constants::*;
use crate::intel::keys::{derive_attestation_key, derive_platform_identifier};
#[cfg(feature = "cleartext-ppid")]
use crate::intel::session::PpidDecryptionSession;
use crate::intel::report::{Report, ReportData, TargetInfo};
use crate::intel::lifecycle::verify_and_refresh;
use crate::platform::{slice_within, value_within, Platform};

/// PPID evidence handed over together with a certified QE report.
pub enum PpidEvidence<'a> {
    /// Keep the evidence already sealed in the blob (re-certification).
    Unchanged,
    /// PPID encrypted by the PCE to the verifier's RSA-3072 key.
    Rsa3072Encrypted(&'a [u8]),
    /// PPID encrypted by the PCE to a session key, stored in clear.
    #[cfg(feature = "cleartext-ppid")]
    Cleartext {
        /// PPID encrypted to the session's public key.
        encrypted_ppid: &'a [u8],
        /// Session whose key was handed to the PCE.
        session: &'a PpidDecryptionSession,
    },
}

/// RSA public key for PPID encryption plus a report binding it for the PCE.
#[derive(Debug, Clone)]
pub struct PceEncryptionKey {
    /// Always `PCE_ALG_RSA_OAEP_3072`.
    pub crypto_suite: u8,
    /// Big-endian modulus.
    pub modulus: [u8; RSA_3072_MOD_SIZE],
    /// Big-endian public exponent.
    pub exponent: [u8; RSA_3072_EXP_SIZE],
    /// Report targeted at the PCE, `report_data[0..32] = SHA256(crypto_suite || n || e)`.
    pub report: Report,
}

fn check_pce_target(target: &TargetInfo) -> Result<(), QeError> {
    if cfg!(feature = "debug-pce") {
        return Ok(());
    }
    if target.attributes_flags & FLAGS_PROVISION_KEY == 0
        || target.attributes_flags & FLAGS_DEBUG != 0
    {
        log::debug!("PCE target flags {:#x} rejected", target.attributes_flags);
        return Err(QeError::InvalidParameter);
    }
    Ok(())
}

/// SHA256(attestation public key || authentication data), the digest the
/// PCE certifies.
pub fn ecdsa_id(
    public_key: &[u8; ATTESTATION_KEY_SIZE],
    authentication_data: &[u8; AUTHENTICATION_DATA_SIZE],
) -> [u8; SHA256_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(public_key);
    hasher.update(authentication_data);
    let mut id = [0u8; SHA256_SIZE];
    id.copy_from_slice(&hasher.finalize());
    id
}

/// Derives the attestation key, seals it into `blob` and returns the report
/// the PCE certifies.
pub fn generate_attestation_key<P: Platform + ?Sized>(
    platform: &P,
    blob: &mut [u8],
    pce_target_info: &TargetInfo,
    authentication_data: Option<&[u8]>,
) -> Result<Report, QeError> {
    if !slice_within(platform, blob)
        || !value_within(platform, pce_target_info)
        || !authentication_data.map_or(true, |d| slice_within(platform, d))
    {
        return Err(QeError::InvalidParameter);
    }
    if blob.len() != SEALED_BLOB_SIZE {
        return Err(QeError::InvalidParameter);
    }
    check_pce_target(pce_target_info)?;

    let mut auth = [0u8; AUTHENTICATION_DATA_SIZE];
    let auth_size = match authentication_data {
        None => 0,
        Some(data) if data.len() == AUTHENTICATION_DATA_SIZE => {
            auth.copy_from_slice(data);
            AUTHENTICATION_DATA_SIZE as u16
        }
        Some(_) => return Err(QeError::InvalidParameter),
    };

    let into_keygen_error = |e| match e {
        QeError::Crypto => QeError::AttestationKeyGeneration,
        other => other,
    };
    let key_pair = derive_attestation_key(platform, &[0u8; KEY_ID_SIZE]).map_err(into_keygen_error)?;
    let qe_id = derive_platform_identifier(platform).map_err(into_keygen_error)?;

    let id = ecdsa_id(key_pair.public_key(), &auth);
    let mut report_data: ReportData = [0u8; REPORT_DATA_SIZE];
    report_data[..SHA256_SIZE].copy_from_slice(&id);
    let report = platform
        .create_report(Some(pce_target_info), Some(&report_data))
        .map_err(|e| QeError::oom_or(e, QeError::QeReportGeneration))?;
    let state = report.body.trust_state();

    let plaintext = PlaintextData {
        ecdsa_id: id,
        qe_id,
        authentication_data_size: auth_size,
        authentication_data: auth,
        raw_cpu_svn: state.cpu_svn,
        seal_cpu_svn: state.cpu_svn,
        seal_qe_isv_svn: state.isv_svn,
        pce_target_info: pce_target_info.clone(),
        ..PlaintextData::default()
    };
    let secret = SecretData::new(&key_pair, EvidenceSubject::uncertified());
    blob::seal(platform, &state, &plaintext, &secret, blob)?;

    log::debug!("generated attestation key {}", hex::encode(&id[..8]));
    Ok(report)
}

/// Returns the verifier's RSA-3072 key the PCE must encrypt the PPID with and
/// a report binding it, addressed to the PCE.
pub fn pce_encrypt_key<P: Platform + ?Sized>(
    platform: &P,
    pce_target_info: &TargetInfo,
    crypto_suite: u8,
    certification_key_type: u16,
) -> Result<PceEncryptionKey, QeError> {
    encryption_key_report(
        platform,
        pce_target_info,
        crypto_suite,
        certification_key_type,
        PPID_ENCRYPTION_KEY_N,
        PPID_ENCRYPTION_KEY_E,
    )
}

/// Same as [`pce_encrypt_key`] but hands out the public half of `session`, so
/// the PPID can later be decrypted and kept in clear.
#[cfg(feature = "cleartext-ppid")]
pub fn pce_session_encrypt_key<P: Platform + ?Sized>(
    platform: &P,
    pce_target_info: &TargetInfo,
    crypto_suite: u8,
    certification_key_type: u16,
    session: &PpidDecryptionSession,
) -> Result<PceEncryptionKey, QeError> {
    encryption_key_report(
        platform,
        pce_target_info,
        crypto_suite,
        certification_key_type,
        session.modulus()?,
        session.exponent()?,
    )
}

fn encryption_key_report<P: Platform + ?Sized>(
    platform: &P,
    pce_target_info: &TargetInfo,
    crypto_suite: u8,
    certification_key_type: u16,
    modulus: [u8; RSA_3072_MOD_SIZE],
    exponent: [u8; RSA_3072_EXP_SIZE],
) -> Result<PceEncryptionKey, QeError> {
    if !value_within(platform, pce_target_info) {
        return Err(QeError::InvalidParameter);
    }
    if crypto_suite != PCE_ALG_RSA_OAEP_3072
        || certification_key_type != CERT_DATA_TYPE_PPID_RSA3072_ENCRYPTED
    {
        return Err(QeError::InvalidParameter);
    }
    check_pce_target(pce_target_info)?;

    let digest = {
        let mut hasher = Sha256::new();
        hasher.update([crypto_suite]);
        hasher.update(modulus);
        hasher.update(exponent);
        hasher.finalize()
    };
    let mut report_data: ReportData = [0u8; REPORT_DATA_SIZE];
    report_data[..SHA256_SIZE].copy_from_slice(&digest);
    let report = platform
        .create_report(Some(pce_target_info), Some(&report_data))
        .map_err(|e| QeError::oom_or(e, QeError::QeReportGeneration))?;

    Ok(PceEncryptionKey {
        crypto_suite,
        modulus,
        exponent,
        report,
    })
}

/// Merges the certification returned by the PCE into `blob` and re-seals it.
///
/// `new_plaintext` must be about the key sealed in `blob`: its `ecdsa_id` and
/// the digest in its certified QE report both have to match.
pub fn store_certification<P: Platform + ?Sized>(
    platform: &P,
    new_plaintext: &PlaintextData,
    evidence: PpidEvidence<'_>,
    blob: &mut [u8],
) -> Result<(), QeError> {
    let evidence_within = match &evidence {
        PpidEvidence::Unchanged => true,
        PpidEvidence::Rsa3072Encrypted(buf) => slice_within(platform, buf),
        #[cfg(feature = "cleartext-ppid")]
        PpidEvidence::Cleartext {
            encrypted_ppid,
            session,
        } => slice_within(platform, encrypted_ppid) && value_within(platform, *session),
    };
    if !slice_within(platform, blob) || !value_within(platform, new_plaintext) || !evidence_within {
        return Err(QeError::InvalidParameter);
    }
    if blob.len() != SEALED_BLOB_SIZE {
        return Err(QeError::InvalidParameter);
    }
    match &evidence {
        PpidEvidence::Rsa3072Encrypted(buf) if buf.len() != RSA_3072_MOD_SIZE => {
            return Err(QeError::InvalidParameter)
        }
        #[cfg(feature = "cleartext-ppid")]
        PpidEvidence::Cleartext { encrypted_ppid, .. } if encrypted_ppid.len() != RSA_3072_MOD_SIZE => {
            return Err(QeError::InvalidParameter)
        }
        _ => {}
    }

    let verified = verify_and_refresh(platform, blob, true)?;
    let sealed_id = verified.plaintext.ecdsa_id;
    let certified_id = new_plaintext.qe_report.body.report_data();
    if new_plaintext.ecdsa_id != sealed_id || certified_id[..SHA256_SIZE] != sealed_id {
        log::debug!("certification is not about the sealed attestation key");
        return Err(QeError::InvalidParameter);
    }
    let mut secret = verified.secret.ok_or(QeError::Unexpected)?;

    match evidence {
        PpidEvidence::Unchanged => {
            if *secret.subject() == EvidenceSubject::uncertified() {
                return Err(QeError::InvalidParameter);
            }
        }
        PpidEvidence::Rsa3072Encrypted(buf) => {
            let mut encrypted_ppid = [0u8; RSA_3072_MOD_SIZE];
            encrypted_ppid.copy_from_slice(buf);
            secret.set_subject(EvidenceSubject::Encrypted {
                crypto_suite: PCE_ALG_RSA_OAEP_3072,
                encrypted_ppid,
            });
        }
        #[cfg(feature = "cleartext-ppid")]
        PpidEvidence::Cleartext {
            encrypted_ppid,
            session,
        } => {
            let ppid = session.decrypt_ppid(encrypted_ppid)?;
            secret.set_subject(EvidenceSubject::Cleartext { ppid: *ppid });
        }
    }

    let current = verified.report_body.trust_state();
    let plaintext = PlaintextData {
        certification_key_type: new_plaintext.certification_key_type,
        signature_scheme: new_plaintext.signature_scheme,
        qe_report: new_plaintext.qe_report.clone(),
        qe_report_cert_key_sig: new_plaintext.qe_report_cert_key_sig,
        cert_cpu_svn: new_plaintext.cert_cpu_svn,
        cert_pce_isv_svn: new_plaintext.cert_pce_isv_svn,
        cert_pce_id: new_plaintext.cert_pce_id,
        cert_qe_isv_svn: current.isv_svn,
        raw_cpu_svn: new_plaintext.raw_cpu_svn,
        raw_pce_isv_svn: new_plaintext.raw_pce_isv_svn,
        raw_pce_id: new_plaintext.raw_pce_id,
        seal_cpu_svn: current.cpu_svn,
        seal_qe_isv_svn: current.isv_svn,
        pce_target_info: new_plaintext.pce_target_info.clone(),
        ..verified.plaintext
    };
    blob::seal(platform, &current, &plaintext, &secret, blob)?;

    log::debug!(
        "stored certification, key type {}",
        plaintext.certification_key_type
    );
    Ok(())
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::intel::blob::unseal;
    use crate::intel::report::TrustState;
    use crate::platform::simulated::{EnclaveIdentity, SimulatedPlatform};
    use assert_ok::assert_ok;
    use rstest::rstest;

    const ROOT: [u8; KEY_128_SIZE] = [0x5E; KEY_128_SIZE];

    fn quoting() -> SimulatedPlatform {
        SimulatedPlatform::new(
            ROOT,
            EnclaveIdentity::new([0x51; 32], [0x8c; 32], 1, 0),
            TrustState::new([3; 16], 4),
        )
    }

    fn pce() -> SimulatedPlatform {
        SimulatedPlatform::new(
            ROOT,
            EnclaveIdentity::new([0xCE; 32], [0x8c; 32], 2, FLAGS_PROVISION_KEY),
            TrustState::new([3; 16], 10),
        )
    }

    fn certified_plaintext(blob: &[u8], report: &Report) -> PlaintextData {
        let mut plaintext = assert_ok!(blob::read_plaintext(blob));
        plaintext.qe_report = report.clone();
        plaintext.qe_report_cert_key_sig = [0x51; ECDSA_SIGNATURE_SIZE];
        plaintext.certification_key_type = CERT_DATA_TYPE_PPID_RSA3072_ENCRYPTED;
        plaintext.cert_cpu_svn = [3; CPU_SVN_SIZE];
        plaintext.cert_pce_isv_svn = 10;
        plaintext.cert_pce_id = 0;
        plaintext
    }

    #[test]
    fn bind_the_pce_report_to_key_and_authentication_data() {
        let qe = quoting();
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        let auth = [0xAD; AUTHENTICATION_DATA_SIZE];
        let report = assert_ok!(generate_attestation_key(&qe, &mut blob, &pce().target_info(), Some(&auth)));

        let unsealed = assert_ok!(unseal(&qe, &blob));
        let expected = ecdsa_id(unsealed.secret.public_key(), &auth);
        assert_eq!(report.body.report_data()[..SHA256_SIZE], expected);
        assert_eq!(unsealed.plaintext.ecdsa_id, expected);
        assert_eq!(unsealed.plaintext.authentication_data(), &auth[..]);
        assert_eq!(unsealed.plaintext.qe_id, assert_ok!(derive_platform_identifier(&qe)));
        assert_ok!(pce().verify_report(&report));
    }

    #[rstest]
    #[case(0)]
    #[case(FLAGS_PROVISION_KEY | FLAGS_DEBUG)]
    fn reject_pce_without_provisioning_rights(#[case] flags: u64) {
        let qe = quoting();
        let mut target = pce().target_info();
        target.attributes_flags = flags;
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        let expected = if cfg!(feature = "debug-pce") { None } else { Some(QeError::InvalidParameter) };
        assert_eq!(generate_attestation_key(&qe, &mut blob, &target, None).err(), expected);
    }

    #[rstest]
    #[case(16)]
    #[case(33)]
    fn reject_authentication_data_of_wrong_size(#[case] len: usize) {
        let qe = quoting();
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        let auth = vec![0u8; len];
        assert_eq!(
            generate_attestation_key(&qe, &mut blob, &pce().target_info(), Some(&auth)).err(),
            Some(QeError::InvalidParameter)
        );
    }

    #[test]
    fn refuse_untrusted_blob_buffers() {
        let qe = quoting();
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        qe.mark_untrusted(&blob);
        assert_eq!(
            generate_attestation_key(&qe, &mut blob, &pce().target_info(), None).err(),
            Some(QeError::InvalidParameter)
        );
    }

    #[test]
    fn commit_to_the_verifier_key_for_the_pce() {
        let qe = quoting();
        let key = assert_ok!(pce_encrypt_key(
            &qe,
            &pce().target_info(),
            PCE_ALG_RSA_OAEP_3072,
            CERT_DATA_TYPE_PPID_RSA3072_ENCRYPTED,
        ));

        let mut hasher = Sha256::new();
        hasher.update([PCE_ALG_RSA_OAEP_3072]);
        hasher.update(PPID_ENCRYPTION_KEY_N);
        hasher.update(PPID_ENCRYPTION_KEY_E);
        assert_eq!(key.report.body.report_data()[..SHA256_SIZE], hasher.finalize()[..]);
        assert_eq!(key.modulus, PPID_ENCRYPTION_KEY_N);
        assert_ok!(pce().verify_report(&key.report));
    }

    #[rstest]
    #[case(2, CERT_DATA_TYPE_PPID_RSA3072_ENCRYPTED)]
    #[case(PCE_ALG_RSA_OAEP_3072, CERT_DATA_TYPE_PPID_RSA2048_ENCRYPTED)]
    fn reject_unsupported_encryption_requests(#[case] suite: u8, #[case] key_type: u16) {
        assert_eq!(
            pce_encrypt_key(&quoting(), &pce().target_info(), suite, key_type).err(),
            Some(QeError::InvalidParameter)
        );
    }

    #[test]
    fn store_certification_for_the_sealed_key() {
        let qe = quoting();
        let pce = pce();
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        let report = assert_ok!(generate_attestation_key(&qe, &mut blob, &pce.target_info(), None));
        let plaintext = certified_plaintext(&blob, &report);

        assert_ok!(store_certification(
            &qe,
            &plaintext,
            PpidEvidence::Rsa3072Encrypted(&[0xE9; RSA_3072_MOD_SIZE]),
            &mut blob,
        ));

        let unsealed = assert_ok!(unseal(&qe, &blob));
        assert_eq!(unsealed.plaintext.qe_report, report);
        assert_eq!(unsealed.plaintext.cert_pce_isv_svn, 10);
        assert_eq!(unsealed.plaintext.cert_qe_isv_svn, 4);
        assert_eq!(unsealed.plaintext.seal_cpu_svn, [3; CPU_SVN_SIZE]);
        assert_eq!(
            unsealed.secret.subject(),
            &EvidenceSubject::Encrypted {
                crypto_suite: PCE_ALG_RSA_OAEP_3072,
                encrypted_ppid: [0xE9; RSA_3072_MOD_SIZE],
            }
        );
    }

    #[test]
    fn reject_certification_of_another_key() {
        let qe = quoting();
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        let report = assert_ok!(generate_attestation_key(&qe, &mut blob, &pce().target_info(), None));
        let mut plaintext = certified_plaintext(&blob, &report);
        let mut forged = plaintext.qe_report.body.report_data();
        forged[0] ^= 0xFF;
        plaintext.qe_report.body.set_report_data(&forged);

        let before = blob.clone();
        assert_eq!(
            store_certification(&qe, &plaintext, PpidEvidence::Rsa3072Encrypted(&[0; RSA_3072_MOD_SIZE]), &mut blob)
                .err(),
            Some(QeError::InvalidParameter)
        );
        assert_eq!(blob, before);
    }

    #[test]
    fn reject_truncated_encrypted_ppid() {
        let qe = quoting();
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        let report = assert_ok!(generate_attestation_key(&qe, &mut blob, &pce().target_info(), None));
        let plaintext = certified_plaintext(&blob, &report);
        assert_eq!(
            store_certification(&qe, &plaintext, PpidEvidence::Rsa3072Encrypted(&[0; 256]), &mut blob).err(),
            Some(QeError::InvalidParameter)
        );
    }

    #[test]
    fn recertify_without_new_evidence_only_once_certified() {
        let qe = quoting();
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        let report = assert_ok!(generate_attestation_key(&qe, &mut blob, &pce().target_info(), None));
        let plaintext = certified_plaintext(&blob, &report);

        assert_eq!(
            store_certification(&qe, &plaintext, PpidEvidence::Unchanged, &mut blob).err(),
            Some(QeError::InvalidParameter)
        );
        assert_ok!(store_certification(
            &qe,
            &plaintext,
            PpidEvidence::Rsa3072Encrypted(&[0x01; RSA_3072_MOD_SIZE]),
            &mut blob,
        ));
        assert_ok!(store_certification(&qe, &plaintext, PpidEvidence::Unchanged, &mut blob));
    }

    #[cfg(feature = "cleartext-ppid")]
    #[test]
    fn store_decrypted_ppid_in_cleartext_mode() {
        use rand_core::OsRng;
        use rsa::Oaep;

        let qe = quoting();
        let session = assert_ok!(PpidDecryptionSession::new(&mut OsRng));
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        let report = assert_ok!(generate_attestation_key(&qe, &mut blob, &pce().target_info(), None));
        let plaintext = certified_plaintext(&blob, &report);
        let encrypted = assert_ok!(session
            .public_key()
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &[0x77; PPID_SIZE]));

        assert_ok!(store_certification(
            &qe,
            &plaintext,
            PpidEvidence::Cleartext {
                encrypted_ppid: &encrypted,
                session: &session,
            },
            &mut blob,
        ));
        assert_eq!(
            assert_ok!(unseal(&qe, &blob)).secret.subject(),
            &EvidenceSubject::Cleartext { ppid: [0x77; PPID_SIZE] }
        );
    }
}
