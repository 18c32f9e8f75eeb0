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

//! Blob verification and transparent re-sealing after trust-state upgrades.

use crate::error::QeError;
use crate::intel::blob::{self, PlaintextData, SecretData};
use crate::intel::constants::*;
use crate::intel::report::{KeyId, ReportBody};
use crate::platform::Platform;

/// Outcome of [`verify_and_refresh`].
#[derive(Debug)]
pub struct VerifiedBlob {
    /// Authenticated plaintext region.
    pub plaintext: PlaintextData,
    /// Set when the blob was re-sealed to the current trust state.
    pub resealed: bool,
    /// Present only when requested.
    pub secret: Option<SecretData>,
    /// Self report taken during verification, reflects the current trust state.
    pub report_body: ReportBody,
    key_id: KeyId,
}

impl VerifiedBlob {
    /// Key id of the seal key the blob is bound to after this call.
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }
}

/// Authenticates `blob` and re-seals it in place when the platform trust
/// state moved since it was sealed.
pub fn verify_and_refresh<P: Platform + ?Sized>(
    platform: &P,
    blob: &mut [u8],
    want_secret: bool,
) -> Result<VerifiedBlob, QeError> {
    let unsealed = blob::unseal(platform, blob)?;

    if unsealed.plaintext.blob_type != SEAL_ECDSA_KEY_BLOB
        || unsealed.plaintext.version != ECDSA_KEY_BLOB_VERSION_0
    {
        log::debug!(
            "rejecting blob type {} version {}",
            unsealed.plaintext.blob_type,
            unsealed.plaintext.version
        );
        return Err(QeError::BlobFormat);
    }

    let report = platform
        .create_report(None, None)
        .map_err(|e| QeError::oom_or(e, QeError::Unexpected))?;
    let current = report.body.trust_state();

    let mut key_id = unsealed.key_id;
    let resealed = current != unsealed.sealed_state;
    if resealed {
        log::info!(
            "re-sealing attestation key blob from isv_svn {} to {}",
            unsealed.sealed_state.isv_svn,
            current.isv_svn
        );
        blob::seal(
            platform,
            &current,
            &unsealed.plaintext,
            &unsealed.secret,
            blob,
        )
        .map_err(|e| match e {
            QeError::OutOfMemory => QeError::OutOfMemory,
            _ => QeError::Unexpected,
        })?;
        key_id = blob::sealed_key_id(blob);
    }

    let blob::UnsealedBlob {
        plaintext, secret, ..
    } = unsealed;
    Ok(VerifiedBlob {
        plaintext,
        resealed,
        secret: want_secret.then_some(secret),
        report_body: report.body,
        key_id,
    })
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::intel::blob::{seal, unseal, EvidenceSubject};
    use crate::intel::keys::derive_attestation_key;
    use crate::intel::report::TrustState;
    use crate::platform::simulated::{EnclaveIdentity, SimulatedPlatform};
    use assert_ok::assert_ok;

    fn platform() -> SimulatedPlatform {
        SimulatedPlatform::new(
            [0x31; KEY_128_SIZE],
            EnclaveIdentity::new([0x51; 32], [0x8c; 32], 1, 0),
            TrustState::new([1; 16], 1),
        )
    }

    fn sealed_with(p: &SimulatedPlatform, plaintext: &PlaintextData) -> Vec<u8> {
        let pair = assert_ok!(derive_attestation_key(p, &[0; KEY_ID_SIZE]));
        let secret = SecretData::new(&pair, EvidenceSubject::uncertified());
        let mut blob = vec![0u8; SEALED_BLOB_SIZE];
        assert_ok!(seal(p, &p.trust_state(), plaintext, &secret, &mut blob));
        blob
    }

    #[test]
    fn leave_blob_untouched_without_upgrade() {
        let p = platform();
        let mut blob = sealed_with(&p, &PlaintextData::default());
        let before = blob.clone();

        let verified = assert_ok!(verify_and_refresh(&p, &mut blob, false));
        assert!(!verified.resealed);
        assert!(verified.secret.is_none());
        assert_eq!(blob, before);
        assert_eq!(verified.key_id()[..], before[BLOB_NONCE_OFFSET - KEY_ID_SIZE..BLOB_NONCE_OFFSET]);
    }

    #[test]
    fn return_the_secret_when_asked() {
        let p = platform();
        let mut blob = sealed_with(&p, &PlaintextData::default());
        let verified = assert_ok!(verify_and_refresh(&p, &mut blob, true));
        let pair = assert_ok!(derive_attestation_key(&p, &[0; KEY_ID_SIZE]));
        assert_eq!(
            verified.secret.as_ref().map(|s| *s.public_key()),
            Some(*pair.public_key())
        );
    }

    #[test]
    fn reseal_after_upgrade() {
        let p = platform();
        let mut blob = sealed_with(&p, &PlaintextData::default());
        let upgraded = TrustState::new([2; 16], 1);
        p.set_trust_state(upgraded);

        let verified = assert_ok!(verify_and_refresh(&p, &mut blob, false));
        assert!(verified.resealed);
        assert_eq!(assert_ok!(unseal(&p, &blob)).sealed_state, upgraded);
        assert!(!assert_ok!(verify_and_refresh(&p, &mut blob, false)).resealed);
    }

    #[test]
    fn carry_plaintext_and_key_through_reseal() {
        let p = platform();
        let plaintext = PlaintextData {
            cert_pce_isv_svn: 9,
            ..PlaintextData::default()
        };
        let mut blob = sealed_with(&p, &plaintext);
        let before = assert_ok!(unseal(&p, &blob));
        p.set_trust_state(TrustState::new([3; 16], 2));

        let verified = assert_ok!(verify_and_refresh(&p, &mut blob, true));
        assert!(verified.resealed);
        assert_eq!(verified.plaintext, plaintext);

        let after = assert_ok!(unseal(&p, &blob));
        assert_eq!(after.plaintext, before.plaintext);
        assert_eq!(after.secret.public_key(), before.secret.public_key());
        assert_eq!(
            after.secret.key_pair().private_key_le(),
            before.secret.key_pair().private_key_le()
        );
        assert_eq!(after.secret.subject(), before.secret.subject());
    }

    #[test]
    fn reject_wrong_sized_blob_as_format_error() {
        let p = platform();
        let mut blob = sealed_with(&p, &PlaintextData::default());
        blob.push(0);
        assert_eq!(
            verify_and_refresh(&p, &mut blob, false).err(),
            Some(QeError::BlobFormat)
        );
        blob.truncate(SEALED_BLOB_SIZE - 1);
        assert_eq!(
            verify_and_refresh(&p, &mut blob, false).err(),
            Some(QeError::BlobFormat)
        );
    }

    #[test]
    fn reject_unknown_blob_version() {
        let p = platform();
        let plaintext = PlaintextData {
            version: ECDSA_KEY_BLOB_VERSION_0 + 1,
            ..PlaintextData::default()
        };
        let mut blob = sealed_with(&p, &plaintext);
        assert_eq!(
            verify_and_refresh(&p, &mut blob, false).err(),
            Some(QeError::BlobFormat)
        );
    }

    #[test]
    fn map_report_failures() {
        let p = platform();
        let mut blob = sealed_with(&p, &PlaintextData::default());
        p.fail_reports_with(Some(crate::error::PlatformError::OutOfMemory));
        assert_eq!(
            verify_and_refresh(&p, &mut blob, false).err(),
            Some(QeError::OutOfMemory)
        );
        p.fail_reports_with(Some(crate::error::PlatformError::Unavailable));
        assert_eq!(
            verify_and_refresh(&p, &mut blob, false).err(),
            Some(QeError::Unexpected)
        );
    }
}
