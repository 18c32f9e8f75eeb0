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

//! Sealed attestation key blob: layout, sealing and unsealing.
//!
//! The blob is a fixed size container. The plaintext region and the key
//! request are integrity protected as additional data, the secret region is
//! encrypted with AES-128-GCM under a platform seal key.

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes128Gcm, KeyInit, Nonce, Tag};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{ParseError, QeError};
use crate::intel::constants::*;
use crate::intel::keys::{AttestationKeyPair, PlatformId};
use crate::intel::report::{CpuSvn, KeyId, Report, TargetInfo, TrustState};
use crate::platform::{KeyRequest, Platform};

const KR_CPU_SVN_OFFSET: usize = BLOB_KEY_REQUEST_OFFSET;
const KR_ISV_SVN_OFFSET: usize = KR_CPU_SVN_OFFSET + CPU_SVN_SIZE;
const KR_KEY_ID_OFFSET: usize = KR_ISV_SVN_OFFSET + 2;
const AAD_SIZE: usize = BLOB_CIPHERTEXT_OFFSET + BLOB_KEY_REQUEST_SIZE;

fn read_u16(input: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([input[offset], input[offset + 1]])
}

fn read_u32(input: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        input[offset],
        input[offset + 1],
        input[offset + 2],
        input[offset + 3],
    ])
}

fn read_array<const N: usize>(input: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&input[offset..offset + N]);
    out
}

/// Integrity protected, unencrypted part of the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaintextData {
    /// Always `SEAL_ECDSA_KEY_BLOB`.
    pub blob_type: u8,
    /// Layout version, `ECDSA_KEY_BLOB_VERSION_0`.
    pub version: u8,
    /// SHA256(attestation public key || authentication data).
    pub ecdsa_id: [u8; SHA256_SIZE],
    /// Platform identifier derived when the key was generated.
    pub qe_id: PlatformId,
    /// Bytes of `authentication_data` in use, 0 or 32.
    pub authentication_data_size: u16,
    /// Caller supplied data bound to the key through `ecdsa_id`.
    pub authentication_data: [u8; AUTHENTICATION_DATA_SIZE],
    /// Type of the PCE certification key.
    pub certification_key_type: u16,
    /// Signature scheme of the certification key.
    pub signature_scheme: u8,
    /// QE report certified by the PCE.
    pub qe_report: Report,
    /// PCE signature over the QE report body.
    pub qe_report_cert_key_sig: [u8; ECDSA_SIGNATURE_SIZE],
    /// CPUSVN the PCE certified at.
    pub cert_cpu_svn: CpuSvn,
    /// PCE ISVSVN the PCE certified at.
    pub cert_pce_isv_svn: u16,
    /// Identifier of the certifying PCE.
    pub cert_pce_id: u16,
    /// QE ISVSVN recorded when the certification was stored.
    pub cert_qe_isv_svn: u16,
    /// Raw TCB of the platform at generation or certification time.
    pub raw_cpu_svn: CpuSvn,
    /// Raw PCE ISVSVN.
    pub raw_pce_isv_svn: u16,
    /// Raw PCE id.
    pub raw_pce_id: u16,
    /// CPUSVN recorded at the last generation or certification.
    pub seal_cpu_svn: CpuSvn,
    /// QE ISVSVN recorded at the last generation or certification. Re-sealing
    /// after an upgrade leaves it unchanged, the key request tracks the seal.
    pub seal_qe_isv_svn: u16,
    /// Target info of the PCE the key was generated for.
    pub pce_target_info: TargetInfo,
}

impl Default for PlaintextData {
    fn default() -> Self {
        PlaintextData {
            blob_type: SEAL_ECDSA_KEY_BLOB,
            version: ECDSA_KEY_BLOB_VERSION_0,
            ecdsa_id: [0u8; SHA256_SIZE],
            qe_id: [0u8; QE_ID_SIZE],
            authentication_data_size: 0,
            authentication_data: [0u8; AUTHENTICATION_DATA_SIZE],
            certification_key_type: 0,
            signature_scheme: 0,
            qe_report: Report::default(),
            qe_report_cert_key_sig: [0u8; ECDSA_SIGNATURE_SIZE],
            cert_cpu_svn: [0u8; CPU_SVN_SIZE],
            cert_pce_isv_svn: 0,
            cert_pce_id: 0,
            cert_qe_isv_svn: 0,
            raw_cpu_svn: [0u8; CPU_SVN_SIZE],
            raw_pce_isv_svn: 0,
            raw_pce_id: 0,
            seal_cpu_svn: [0u8; CPU_SVN_SIZE],
            seal_qe_isv_svn: 0,
            pce_target_info: TargetInfo::default(),
        }
    }
}

impl PlaintextData {
    /// Decodes the plaintext region of a blob.
    pub fn from_bytes(input: &[u8]) -> Result<Self, ParseError> {
        if input.len() < PLAINTEXT_DATA_SIZE {
            return Err(ParseError::InvalidPlaintext);
        }
        Ok(PlaintextData {
            blob_type: input[PT_BLOB_TYPE_OFFSET],
            version: input[PT_BLOB_VERSION_OFFSET],
            ecdsa_id: read_array(input, PT_ECDSA_ID_OFFSET),
            qe_id: read_array(input, PT_QE_ID_OFFSET),
            authentication_data_size: read_u16(input, PT_AUTH_DATA_SIZE_OFFSET),
            authentication_data: read_array(input, PT_AUTH_DATA_OFFSET),
            certification_key_type: read_u16(input, PT_CERT_KEY_TYPE_OFFSET),
            signature_scheme: input[PT_SIGNATURE_SCHEME_OFFSET],
            qe_report: Report::from_bytes(&input[PT_QE_REPORT_OFFSET..PT_QE_REPORT_SIG_OFFSET])
                .map_err(|_| ParseError::InvalidPlaintext)?,
            qe_report_cert_key_sig: read_array(input, PT_QE_REPORT_SIG_OFFSET),
            cert_cpu_svn: read_array(input, PT_CERT_CPU_SVN_OFFSET),
            cert_pce_isv_svn: read_u16(input, PT_CERT_PCE_ISV_SVN_OFFSET),
            cert_pce_id: read_u16(input, PT_CERT_PCE_ID_OFFSET),
            cert_qe_isv_svn: read_u16(input, PT_CERT_QE_ISV_SVN_OFFSET),
            raw_cpu_svn: read_array(input, PT_RAW_CPU_SVN_OFFSET),
            raw_pce_isv_svn: read_u16(input, PT_RAW_PCE_ISV_SVN_OFFSET),
            raw_pce_id: read_u16(input, PT_RAW_PCE_ID_OFFSET),
            seal_cpu_svn: read_array(input, PT_SEAL_CPU_SVN_OFFSET),
            seal_qe_isv_svn: read_u16(input, PT_SEAL_QE_ISV_SVN_OFFSET),
            pce_target_info: TargetInfo::from_bytes(&input[PT_PCE_TARGET_INFO_OFFSET..])
                .map_err(|_| ParseError::InvalidPlaintext)?,
        })
    }

    /// Encodes into the first `PLAINTEXT_DATA_SIZE` bytes of `output`.
    pub fn to_bytes(&self, output: &mut [u8]) {
        let output = &mut output[..PLAINTEXT_DATA_SIZE];
        output.fill(0);
        output[PT_BLOB_TYPE_OFFSET] = self.blob_type;
        output[PT_BLOB_VERSION_OFFSET] = self.version;
        output[PT_ECDSA_ID_OFFSET..PT_QE_ID_OFFSET].copy_from_slice(&self.ecdsa_id);
        output[PT_QE_ID_OFFSET..PT_AUTH_DATA_SIZE_OFFSET].copy_from_slice(&self.qe_id);
        output[PT_AUTH_DATA_SIZE_OFFSET..PT_AUTH_DATA_OFFSET]
            .copy_from_slice(&self.authentication_data_size.to_le_bytes());
        output[PT_AUTH_DATA_OFFSET..PT_CERT_KEY_TYPE_OFFSET]
            .copy_from_slice(&self.authentication_data);
        output[PT_CERT_KEY_TYPE_OFFSET..PT_SIGNATURE_SCHEME_OFFSET]
            .copy_from_slice(&self.certification_key_type.to_le_bytes());
        output[PT_SIGNATURE_SCHEME_OFFSET] = self.signature_scheme;
        self.qe_report
            .to_bytes(&mut output[PT_QE_REPORT_OFFSET..PT_QE_REPORT_SIG_OFFSET]);
        output[PT_QE_REPORT_SIG_OFFSET..PT_CERT_CPU_SVN_OFFSET]
            .copy_from_slice(&self.qe_report_cert_key_sig);
        output[PT_CERT_CPU_SVN_OFFSET..PT_CERT_PCE_ISV_SVN_OFFSET]
            .copy_from_slice(&self.cert_cpu_svn);
        output[PT_CERT_PCE_ISV_SVN_OFFSET..PT_CERT_PCE_ID_OFFSET]
            .copy_from_slice(&self.cert_pce_isv_svn.to_le_bytes());
        output[PT_CERT_PCE_ID_OFFSET..PT_CERT_QE_ISV_SVN_OFFSET]
            .copy_from_slice(&self.cert_pce_id.to_le_bytes());
        output[PT_CERT_QE_ISV_SVN_OFFSET..PT_RAW_CPU_SVN_OFFSET]
            .copy_from_slice(&self.cert_qe_isv_svn.to_le_bytes());
        output[PT_RAW_CPU_SVN_OFFSET..PT_RAW_PCE_ISV_SVN_OFFSET].copy_from_slice(&self.raw_cpu_svn);
        output[PT_RAW_PCE_ISV_SVN_OFFSET..PT_RAW_PCE_ID_OFFSET]
            .copy_from_slice(&self.raw_pce_isv_svn.to_le_bytes());
        output[PT_RAW_PCE_ID_OFFSET..PT_SEAL_CPU_SVN_OFFSET]
            .copy_from_slice(&self.raw_pce_id.to_le_bytes());
        output[PT_SEAL_CPU_SVN_OFFSET..PT_SEAL_QE_ISV_SVN_OFFSET]
            .copy_from_slice(&self.seal_cpu_svn);
        output[PT_SEAL_QE_ISV_SVN_OFFSET..PT_PCE_TARGET_INFO_OFFSET]
            .copy_from_slice(&self.seal_qe_isv_svn.to_le_bytes());
        self.pce_target_info
            .to_bytes(&mut output[PT_PCE_TARGET_INFO_OFFSET..PLAINTEXT_DATA_SIZE]);
    }

    /// Authentication data actually in use.
    pub fn authentication_data(&self) -> &[u8] {
        let len = usize::from(self.authentication_data_size).min(AUTHENTICATION_DATA_SIZE);
        &self.authentication_data[..len]
    }
}

/// Evidence the certifying authority uses to identify the platform.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub enum EvidenceSubject {
    /// PPID encrypted to the verifier's RSA-3072 key.
    Encrypted {
        /// 0 until certified, then `PCE_ALG_RSA_OAEP_3072`.
        crypto_suite: u8,
        /// RSA-OAEP ciphertext of the PPID.
        encrypted_ppid: [u8; RSA_3072_MOD_SIZE],
    },
    /// PPID in clear, reference configurations only.
    Cleartext {
        /// Platform provisioning id.
        ppid: [u8; PPID_SIZE],
    },
}

impl core::fmt::Debug for EvidenceSubject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EvidenceSubject::Encrypted { crypto_suite, .. } => f
                .debug_struct("Encrypted")
                .field("crypto_suite", crypto_suite)
                .finish_non_exhaustive(),
            EvidenceSubject::Cleartext { .. } => f.write_str("Cleartext"),
        }
    }
}

impl EvidenceSubject {
    /// Subject of a freshly generated key, before certification.
    pub fn uncertified() -> Self {
        EvidenceSubject::Encrypted {
            crypto_suite: 0,
            encrypted_ppid: [0u8; RSA_3072_MOD_SIZE],
        }
    }
}

/// Encrypted part of the blob.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretData {
    private_key: [u8; ECDSA_PRIVATE_KEY_SIZE],
    public_key: [u8; ATTESTATION_KEY_SIZE],
    subject: EvidenceSubject,
}

impl core::fmt::Debug for SecretData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecretData")
            .field("public_key", &hex::encode(self.public_key))
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl SecretData {
    /// Secret region for `key_pair` and its evidence subject.
    pub fn new(key_pair: &AttestationKeyPair, subject: EvidenceSubject) -> Self {
        SecretData {
            private_key: *key_pair.private_key_le(),
            public_key: *key_pair.public_key(),
            subject,
        }
    }

    /// Decodes a decrypted secret region. Unknown subject kinds and
    /// inconsistent sizes are `BlobFormat`.
    pub fn from_bytes(input: &[u8]) -> Result<Self, QeError> {
        if input.len() < SECRET_DATA_SIZE {
            return Err(QeError::BlobFormat);
        }
        let subject = match input[SD_SUBJECT_KIND_OFFSET] {
            SUBJECT_KIND_ENCRYPTED => {
                let size = read_u32(input, SD_ENCRYPTED_SIZE_OFFSET);
                // an uncertified key carries an empty subject
                if size != 0 && size as usize != RSA_3072_MOD_SIZE {
                    return Err(QeError::BlobFormat);
                }
                EvidenceSubject::Encrypted {
                    crypto_suite: input[SD_CRYPTO_SUITE_OFFSET],
                    encrypted_ppid: read_array(input, SD_ENCRYPTED_PPID_OFFSET),
                }
            }
            SUBJECT_KIND_CLEARTEXT => EvidenceSubject::Cleartext {
                ppid: read_array(input, SD_CLEAR_PPID_OFFSET),
            },
            _ => return Err(QeError::BlobFormat),
        };
        Ok(SecretData {
            private_key: read_array(input, SD_PRIVATE_KEY_OFFSET),
            public_key: read_array(input, SD_PUBLIC_KEY_OFFSET),
            subject,
        })
    }

    /// Encodes into the first `SECRET_DATA_SIZE` bytes of `output`.
    pub fn to_bytes(&self, output: &mut [u8]) {
        let output = &mut output[..SECRET_DATA_SIZE];
        output.fill(0);
        output[SD_PRIVATE_KEY_OFFSET..SD_PUBLIC_KEY_OFFSET].copy_from_slice(&self.private_key);
        output[SD_PUBLIC_KEY_OFFSET..SD_SUBJECT_OFFSET].copy_from_slice(&self.public_key);
        match &self.subject {
            EvidenceSubject::Encrypted {
                crypto_suite,
                encrypted_ppid,
            } => {
                output[SD_SUBJECT_KIND_OFFSET] = SUBJECT_KIND_ENCRYPTED;
                output[SD_CRYPTO_SUITE_OFFSET] = *crypto_suite;
                let size = if *crypto_suite == 0 { 0u32 } else { RSA_3072_MOD_SIZE as u32 };
                output[SD_ENCRYPTED_SIZE_OFFSET..SD_ENCRYPTED_PPID_OFFSET]
                    .copy_from_slice(&size.to_le_bytes());
                output[SD_ENCRYPTED_PPID_OFFSET..SECRET_DATA_SIZE].copy_from_slice(encrypted_ppid);
            }
            EvidenceSubject::Cleartext { ppid } => {
                output[SD_SUBJECT_KIND_OFFSET] = SUBJECT_KIND_CLEARTEXT;
                output[SD_CLEAR_PPID_OFFSET..SD_CLEAR_PPID_OFFSET + PPID_SIZE].copy_from_slice(ppid);
            }
        }
    }

    /// The sealed attestation key pair.
    pub fn key_pair(&self) -> AttestationKeyPair {
        AttestationKeyPair::from_parts(&self.private_key, &self.public_key)
    }

    /// Big-endian `X || Y`.
    pub fn public_key(&self) -> &[u8; ATTESTATION_KEY_SIZE] {
        &self.public_key
    }

    /// Evidence subject stored with the key.
    pub fn subject(&self) -> &EvidenceSubject {
        &self.subject
    }

    pub(crate) fn set_subject(&mut self, subject: EvidenceSubject) {
        self.subject.zeroize();
        self.subject = subject;
    }
}

/// Contents of an authenticated blob.
#[derive(Debug)]
pub struct UnsealedBlob {
    /// Integrity protected plaintext.
    pub plaintext: PlaintextData,
    /// Decrypted secret region.
    pub secret: SecretData,
    /// Trust state the blob was sealed under.
    pub sealed_state: TrustState,
    /// Key id of the seal key request.
    pub key_id: KeyId,
}

fn additional_data(blob: &[u8]) -> [u8; AAD_SIZE] {
    let mut aad = [0u8; AAD_SIZE];
    aad[..BLOB_CIPHERTEXT_OFFSET].copy_from_slice(&blob[..BLOB_CIPHERTEXT_OFFSET]);
    aad[BLOB_CIPHERTEXT_OFFSET..]
        .copy_from_slice(&blob[BLOB_KEY_REQUEST_OFFSET..BLOB_NONCE_OFFSET]);
    aad
}

/// Seals `plaintext` and `secret` into `blob` under a fresh key id and nonce.
pub fn seal<P: Platform + ?Sized>(
    platform: &P,
    state: &TrustState,
    plaintext: &PlaintextData,
    secret: &SecretData,
    blob: &mut [u8],
) -> Result<(), QeError> {
    if blob.len() != SEALED_BLOB_SIZE {
        return Err(QeError::InvalidParameter);
    }

    let mut key_id = [0u8; KEY_ID_SIZE];
    let mut nonce = [0u8; BLOB_NONCE_SIZE];
    platform
        .read_rand(&mut key_id)
        .and_then(|_| platform.read_rand(&mut nonce))
        .map_err(|e| QeError::oom_or(e, QeError::Crypto))?;
    let key = platform
        .get_key(&KeyRequest::seal(state, &key_id))
        .map_err(|e| QeError::oom_or(e, QeError::Crypto))?;

    // the caller's blob is only overwritten once sealing succeeded
    let mut scratch = Zeroizing::new([0u8; SEALED_BLOB_SIZE]);
    let out = &mut scratch[..];
    out[BLOB_PLAINTEXT_LEN_OFFSET..BLOB_ENCRYPT_LEN_OFFSET]
        .copy_from_slice(&(PLAINTEXT_DATA_SIZE as u32).to_le_bytes());
    out[BLOB_ENCRYPT_LEN_OFFSET..BLOB_HEADER_SIZE]
        .copy_from_slice(&(SECRET_DATA_SIZE as u32).to_le_bytes());
    plaintext.to_bytes(&mut out[BLOB_PLAINTEXT_OFFSET..BLOB_CIPHERTEXT_OFFSET]);
    out[KR_CPU_SVN_OFFSET..KR_ISV_SVN_OFFSET].copy_from_slice(&state.cpu_svn);
    out[KR_ISV_SVN_OFFSET..KR_KEY_ID_OFFSET].copy_from_slice(&state.isv_svn.to_le_bytes());
    out[KR_KEY_ID_OFFSET..BLOB_NONCE_OFFSET].copy_from_slice(&key_id);
    out[BLOB_NONCE_OFFSET..BLOB_TAG_OFFSET].copy_from_slice(&nonce);

    let aad = additional_data(out);
    let cipher = Aes128Gcm::new_from_slice(&key[..]).map_err(|_| QeError::Crypto)?;
    let region = &mut out[BLOB_CIPHERTEXT_OFFSET..BLOB_KEY_REQUEST_OFFSET];
    secret.to_bytes(region);
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), &aad, region)
        .map_err(|_| QeError::Crypto)?;
    out[BLOB_TAG_OFFSET..SEALED_BLOB_SIZE].copy_from_slice(&tag);

    blob.copy_from_slice(out);
    Ok(())
}

/// Authenticates and decrypts `blob`.
///
/// The blob length and declared sizes must match this layout version. Any
/// size mismatch, key derivation or authentication failure is reported as
/// `BlobFormat`.
pub fn unseal<P: Platform + ?Sized>(platform: &P, blob: &[u8]) -> Result<UnsealedBlob, QeError> {
    if blob.len() != SEALED_BLOB_SIZE {
        log::debug!("rejecting blob of {} bytes", blob.len());
        return Err(QeError::BlobFormat);
    }
    if read_u32(blob, BLOB_PLAINTEXT_LEN_OFFSET) as usize != PLAINTEXT_DATA_SIZE
        || read_u32(blob, BLOB_ENCRYPT_LEN_OFFSET) as usize != SECRET_DATA_SIZE
    {
        log::debug!("rejecting blob with unexpected region sizes");
        return Err(QeError::BlobFormat);
    }

    let sealed_state = TrustState::new(
        read_array(blob, KR_CPU_SVN_OFFSET),
        read_u16(blob, KR_ISV_SVN_OFFSET),
    );
    let key_id: KeyId = read_array(blob, KR_KEY_ID_OFFSET);
    let key = platform
        .get_key(&KeyRequest::seal(&sealed_state, &key_id))
        .map_err(|e| {
            log::debug!("cannot derive seal key for blob: {e}");
            QeError::BlobFormat
        })?;

    let cipher = Aes128Gcm::new_from_slice(&key[..]).map_err(|_| QeError::BlobFormat)?;
    let mut scratch = Zeroizing::new([0u8; SECRET_DATA_SIZE]);
    scratch.copy_from_slice(&blob[BLOB_CIPHERTEXT_OFFSET..BLOB_KEY_REQUEST_OFFSET]);
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&blob[BLOB_NONCE_OFFSET..BLOB_TAG_OFFSET]),
            &additional_data(blob),
            &mut scratch[..],
            Tag::from_slice(&blob[BLOB_TAG_OFFSET..SEALED_BLOB_SIZE]),
        )
        .map_err(|_| {
            log::debug!("blob authentication failed");
            QeError::BlobFormat
        })?;

    Ok(UnsealedBlob {
        plaintext: PlaintextData::from_bytes(&blob[BLOB_PLAINTEXT_OFFSET..BLOB_CIPHERTEXT_OFFSET])
            .map_err(|_| QeError::BlobFormat)?,
        secret: SecretData::from_bytes(&scratch[..])?,
        sealed_state,
        key_id,
    })
}

pub(crate) fn sealed_key_id(blob: &[u8]) -> KeyId {
    read_array(blob, KR_KEY_ID_OFFSET)
}

/// Reads the plaintext region without authenticating it. Meant for hosts that
/// need to build certification input from a blob they store.
pub fn read_plaintext(blob: &[u8]) -> Result<PlaintextData, QeError> {
    if blob.len() != SEALED_BLOB_SIZE {
        return Err(QeError::InvalidParameter);
    }
    PlaintextData::from_bytes(&blob[BLOB_PLAINTEXT_OFFSET..BLOB_CIPHERTEXT_OFFSET])
        .map_err(|_| QeError::BlobFormat)
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::intel::keys::derive_attestation_key;
    use crate::platform::simulated::{EnclaveIdentity, SimulatedPlatform};
    use assert_ok::assert_ok;
    use rstest::rstest;

    fn platform() -> SimulatedPlatform {
        SimulatedPlatform::new(
            [0x23; KEY_128_SIZE],
            EnclaveIdentity::new([0x51; 32], [0x8c; 32], 1, 0),
            TrustState::new([2; 16], 2),
        )
    }

    fn sealed(p: &SimulatedPlatform) -> (PlaintextData, Vec<u8>) {
        let pair = assert_ok!(derive_attestation_key(p, &[0; KEY_ID_SIZE]));
        let mut plaintext = PlaintextData::default();
        plaintext.ecdsa_id = [0xEC; SHA256_SIZE];
        plaintext.cert_pce_id = 7;
        plaintext.pce_target_info.attributes_flags = FLAGS_PROVISION_KEY;
        let secret = SecretData::new(&pair, EvidenceSubject::uncertified());
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        assert_ok!(seal(p, &p.trust_state(), &plaintext, &secret, &mut blob));
        (plaintext, blob)
    }

    #[test]
    fn lay_out_regions_back_to_back() {
        assert_eq!(PLAINTEXT_DATA_SIZE, 1156);
        assert_eq!(SECRET_DATA_SIZE, 486);
        assert_eq!(BLOB_KEY_REQUEST_OFFSET, 1650);
        assert_eq!(SEALED_BLOB_SIZE, 1728);
    }

    #[test]
    fn unseal_what_was_sealed() {
        let p = platform();
        let (plaintext, blob) = sealed(&p);
        let unsealed = assert_ok!(unseal(&p, &blob));

        assert_eq!(unsealed.plaintext, plaintext);
        assert_eq!(unsealed.sealed_state, p.trust_state());
        assert_eq!(unsealed.secret.subject(), &EvidenceSubject::uncertified());
        assert_eq!(assert_ok!(read_plaintext(&blob)), plaintext);
    }

    #[test]
    fn not_leak_the_private_key_into_the_blob() {
        let p = platform();
        let pair = assert_ok!(derive_attestation_key(&p, &[0; KEY_ID_SIZE]));
        let (_, blob) = sealed(&p);
        let key = pair.private_key_le();
        assert!(!blob.windows(key.len()).any(|w| w == key));
    }

    #[rstest]
    #[case(BLOB_PLAINTEXT_OFFSET + PT_CERT_PCE_ID_OFFSET)]
    #[case(BLOB_CIPHERTEXT_OFFSET + 3)]
    #[case(BLOB_KEY_REQUEST_OFFSET + CPU_SVN_SIZE + 2)]
    #[case(BLOB_NONCE_OFFSET)]
    #[case(BLOB_TAG_OFFSET + 15)]
    fn reject_any_flipped_bit(#[case] offset: usize) {
        let p = platform();
        let (_, mut blob) = sealed(&p);
        blob[offset] ^= 0x01;
        assert_eq!(unseal(&p, &blob).err(), Some(QeError::BlobFormat));
    }

    #[rstest]
    #[case(BLOB_PLAINTEXT_LEN_OFFSET)]
    #[case(BLOB_ENCRYPT_LEN_OFFSET)]
    fn reject_unexpected_region_sizes(#[case] offset: usize) {
        let p = platform();
        let (_, mut blob) = sealed(&p);
        blob[offset] = blob[offset].wrapping_add(1);
        assert_eq!(unseal(&p, &blob).err(), Some(QeError::BlobFormat));
    }

    #[test]
    fn reject_blobs_of_wrong_length() {
        let p = platform();
        let (_, blob) = sealed(&p);
        assert_eq!(
            unseal(&p, &blob[..SEALED_BLOB_SIZE - 1]).err(),
            Some(QeError::BlobFormat)
        );
    }

    #[test]
    fn keep_existing_blob_when_sealing_fails() {
        let p = platform();
        let (plaintext, mut blob) = sealed(&p);
        let before = blob.clone();
        let secret = assert_ok!(unseal(&p, &blob)).secret;

        let ahead = TrustState::new([3; 16], 3);
        assert_eq!(
            seal(&p, &ahead, &plaintext, &secret, &mut blob),
            Err(QeError::Crypto)
        );
        assert_eq!(blob, before);
        assert_ok!(unseal(&p, &blob));
    }

    #[test]
    fn refuse_to_unseal_after_rollback() {
        let p = platform();
        let (_, blob) = sealed(&p);
        p.set_trust_state(TrustState::new([1; 16], 2));
        assert_eq!(unseal(&p, &blob).err(), Some(QeError::BlobFormat));
    }

    #[test]
    fn use_a_fresh_key_id_and_nonce_per_seal() {
        let p = platform();
        let (_, first) = sealed(&p);
        let (_, second) = sealed(&p);
        assert_ne!(
            &first[KR_KEY_ID_OFFSET..BLOB_TAG_OFFSET],
            &second[KR_KEY_ID_OFFSET..BLOB_TAG_OFFSET]
        );
    }

    #[test]
    fn keep_cleartext_subjects_across_encoding() {
        let p = platform();
        let pair = assert_ok!(derive_attestation_key(&p, &[0; KEY_ID_SIZE]));
        let secret = SecretData::new(&pair, EvidenceSubject::Cleartext { ppid: [0x99; PPID_SIZE] });
        let mut raw = [0u8; SECRET_DATA_SIZE];
        secret.to_bytes(&mut raw);

        assert_eq!(raw[SD_SUBJECT_KIND_OFFSET], SUBJECT_KIND_CLEARTEXT);
        let decoded = assert_ok!(SecretData::from_bytes(&raw));
        assert_eq!(decoded.subject(), secret.subject());
        assert_eq!(decoded.public_key(), pair.public_key());
    }

    #[test]
    fn reject_unknown_subject_kind() {
        let mut raw = [0u8; SECRET_DATA_SIZE];
        raw[SD_SUBJECT_KIND_OFFSET] = 2;
        assert_eq!(SecretData::from_bytes(&raw).err(), Some(QeError::BlobFormat));
    }
}
