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

//! Ephemeral RSA-3072 key for the cleartext PPID reference mode.

use rand_core::CryptoRngCore;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::QeError;
use crate::intel::constants::{PPID_SIZE, RSA_3072_EXP_SIZE, RSA_3072_MOD_SIZE};

const RSA_3072_BITS: usize = RSA_3072_MOD_SIZE * 8;

fn left_pad<const N: usize>(be: &[u8]) -> Result<[u8; N], QeError> {
    let start = N.checked_sub(be.len()).ok_or(QeError::Crypto)?;
    let mut out = [0u8; N];
    out[start..].copy_from_slice(be);
    Ok(out)
}

/// Key pair the PCE encrypts the PPID to when the platform keeps its PPID in
/// clear. The caller owns it between `pce_encrypt_key` and
/// `store_certification`; dropping it discards the key.
pub struct PpidDecryptionSession {
    key: RsaPrivateKey,
}

impl PpidDecryptionSession {
    /// Generates a fresh RSA-3072 key pair.
    pub fn new<R: CryptoRngCore + ?Sized>(rng: &mut R) -> Result<Self, QeError> {
        let key = RsaPrivateKey::new(rng, RSA_3072_BITS).map_err(|_| QeError::Crypto)?;
        Ok(PpidDecryptionSession { key })
    }

    /// Public half of the session key.
    pub fn public_key(&self) -> RsaPublicKey {
        self.key.to_public_key()
    }

    /// Big-endian modulus, left padded to 384 bytes.
    pub fn modulus(&self) -> Result<[u8; RSA_3072_MOD_SIZE], QeError> {
        left_pad(&self.key.n().to_bytes_be())
    }

    /// Big-endian public exponent, left padded to 4 bytes.
    pub fn exponent(&self) -> Result<[u8; RSA_3072_EXP_SIZE], QeError> {
        left_pad(&self.key.e().to_bytes_be())
    }

    pub(crate) fn decrypt_ppid(
        &self,
        encrypted_ppid: &[u8],
    ) -> Result<Zeroizing<[u8; PPID_SIZE]>, QeError> {
        let clear = Zeroizing::new(
            self.key
                .decrypt(Oaep::new::<Sha256>(), encrypted_ppid)
                .map_err(|_| QeError::Crypto)?,
        );
        if clear.len() != PPID_SIZE {
            return Err(QeError::Crypto);
        }
        let mut ppid = Zeroizing::new([0u8; PPID_SIZE]);
        ppid.copy_from_slice(&clear);
        Ok(ppid)
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use assert_ok::assert_ok;
    use rand_core::OsRng;

    #[test]
    fn decrypt_ppid_encrypted_to_its_public_key() {
        let session = assert_ok!(PpidDecryptionSession::new(&mut OsRng));
        let encrypted = assert_ok!(session
            .public_key()
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &[0x5A; PPID_SIZE]));

        assert_eq!(encrypted.len(), RSA_3072_MOD_SIZE);
        assert_eq!(*assert_ok!(session.decrypt_ppid(&encrypted)), [0x5A; PPID_SIZE]);
        assert_eq!(assert_ok!(session.exponent()), [0x00, 0x01, 0x00, 0x01]);
    }

    #[test]
    fn reject_ppid_of_wrong_length() {
        let session = assert_ok!(PpidDecryptionSession::new(&mut OsRng));
        let encrypted = assert_ok!(session
            .public_key()
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &[0x5A; 8]));
        assert_eq!(session.decrypt_ppid(&encrypted).err(), Some(QeError::Crypto));
    }
}
