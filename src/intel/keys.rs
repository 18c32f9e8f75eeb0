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

//! Platform identifier and attestation key derivation.
//!
//! Both secrets are derived from the platform seal key with AES-128-CMAC in
//! counter mode. The attestation key uses 64 extra bits of seed material so
//! the reduction into the P-256 scalar range is free of measurable bias.

use aes::Aes128;
use cmac::{Cmac, Mac};
use p256::ecdsa::{signature::Signer, Signature, SigningKey};
use p256::FieldBytes;
use zeroize::{Zeroize, Zeroizing};

use crate::error::QeError;
use crate::intel::constants::*;
use crate::intel::report::{KeyId, TrustState};
use crate::platform::{KeyRequest, Platform};

/// Platform identifier written into every quote header (QE_ID).
pub type PlatformId = [u8; QE_ID_SIZE];

const SEED_LIMBS: usize = ATT_KEY_SEED_SIZE / 8;

/// P-256 attestation key pair.
///
/// The private scalar is kept little-endian, the public key as big-endian
/// `X || Y` coordinates.
pub struct AttestationKeyPair {
    private_key: Zeroizing<[u8; ECDSA_PRIVATE_KEY_SIZE]>,
    public_key: [u8; ATTESTATION_KEY_SIZE],
}

impl core::fmt::Debug for AttestationKeyPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttestationKeyPair")
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

impl AttestationKeyPair {
    pub(crate) fn from_parts(
        private_key_le: &[u8; ECDSA_PRIVATE_KEY_SIZE],
        public_key: &[u8; ATTESTATION_KEY_SIZE],
    ) -> Self {
        AttestationKeyPair {
            private_key: Zeroizing::new(*private_key_le),
            public_key: *public_key,
        }
    }

    /// Big-endian `X || Y`, as it appears in quotes.
    pub fn public_key(&self) -> &[u8; ATTESTATION_KEY_SIZE] {
        &self.public_key
    }

    pub(crate) fn private_key_le(&self) -> &[u8; ECDSA_PRIVATE_KEY_SIZE] {
        &self.private_key
    }

    fn signing_key(&self) -> Result<SigningKey, QeError> {
        let mut be = Zeroizing::new(*self.private_key);
        be.reverse();
        let mut field = FieldBytes::clone_from_slice(&be[..]);
        let key = SigningKey::from_bytes(&field).map_err(|_| QeError::Crypto);
        field.zeroize();
        key
    }

    /// ECDSA-SHA256 signature over `data`, `r || s` big-endian.
    pub(crate) fn sign(&self, data: &[u8]) -> Result<[u8; ECDSA_SIGNATURE_SIZE], QeError> {
        let signature: Signature = self
            .signing_key()?
            .try_sign(data)
            .map_err(|_| QeError::Crypto)?;
        let mut out = [0u8; ECDSA_SIGNATURE_SIZE];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }
}

pub(crate) fn aes_cmac(
    key: &[u8; KEY_128_SIZE],
    data: &[u8],
) -> Result<Zeroizing<[u8; KEY_128_SIZE]>, QeError> {
    let mut mac = <Cmac<Aes128> as Mac>::new_from_slice(key).map_err(|_| QeError::Crypto)?;
    mac.update(data);
    let mut out = Zeroizing::new([0u8; KEY_128_SIZE]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Derives the platform identifier from the zero trust-state seal key.
pub fn derive_platform_identifier<P: Platform + ?Sized>(platform: &P) -> Result<PlatformId, QeError> {
    let request = KeyRequest::seal(&TrustState::default(), &[0u8; KEY_ID_SIZE]);
    let key = platform.get_key(&request).map_err(|_| QeError::Crypto)?;

    let mut context = [0u8; DERIVATION_CONTEXT_SIZE];
    context[1..1 + QE_ID_LABEL.len()].copy_from_slice(QE_ID_LABEL);
    context[DERIVATION_CONTEXT_SIZE - 2..].copy_from_slice(&QE_ID_DERIVATION_BITS);

    let id = aes_cmac(&key, &context)?;
    Ok(*id)
}

/// Derives the attestation key for the current trust state and `key_id`.
///
/// The same trust state and key id always produce the same key pair.
pub fn derive_attestation_key<P: Platform + ?Sized>(
    platform: &P,
    key_id: &KeyId,
) -> Result<AttestationKeyPair, QeError> {
    let report = platform
        .create_report(None, None)
        .map_err(|e| QeError::oom_or(e, QeError::Unexpected))?;
    let state = report.body.trust_state();

    let key = platform
        .get_key(&KeyRequest::seal(&state, key_id))
        .map_err(|_| QeError::Crypto)?;

    let mut blocks = Zeroizing::new([0u8; 3 * KEY_128_SIZE]);
    for (ctr, block) in (1u8..).zip(blocks.chunks_mut(KEY_128_SIZE)) {
        let mut context = [0u8; DERIVATION_CONTEXT_SIZE];
        context[0] = ctr;
        context[1..1 + QE_ATT_LABEL.len()].copy_from_slice(QE_ATT_LABEL);
        context[DERIVATION_CONTEXT_SIZE - 2..].copy_from_slice(&QE_ATT_DERIVATION_BITS);
        block.copy_from_slice(&aes_cmac(&key, &context)?[..]);
    }

    // Seed is a big-endian integer, limbs are little-endian.
    let mut seed = Zeroizing::new([0u8; ATT_KEY_SEED_SIZE]);
    seed.copy_from_slice(&blocks[..ATT_KEY_SEED_SIZE]);
    seed.reverse();
    let mut limbs = Zeroizing::new([0u64; SEED_LIMBS]);
    for (limb, bytes) in limbs.iter_mut().zip(seed.chunks_exact(8)) {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        *limb = u64::from_le_bytes(raw);
    }

    let scalar = scalar_from_seed(&limbs);
    let mut private_key = Zeroizing::new([0u8; ECDSA_PRIVATE_KEY_SIZE]);
    for (bytes, limb) in private_key.chunks_exact_mut(8).zip(scalar.iter()) {
        bytes.copy_from_slice(&limb.to_le_bytes());
    }

    let mut pair = AttestationKeyPair::from_parts(&private_key, &[0u8; ATTESTATION_KEY_SIZE]);
    let point = pair.signing_key()?.verifying_key().to_encoded_point(false);
    pair.public_key
        .copy_from_slice(point.as_bytes().get(1..).ok_or(QeError::Crypto)?);
    Ok(pair)
}

/// `(seed mod (n - 1)) + 1`, so the result is a valid non-zero P-256 scalar.
///
/// Shift and conditional subtract, no branches on secret data.
fn scalar_from_seed(seed: &[u64; SEED_LIMBS]) -> Zeroizing<[u64; 4]> {
    let modulus = [
        P256_ORDER_MINUS_ONE[0],
        P256_ORDER_MINUS_ONE[1],
        P256_ORDER_MINUS_ONE[2],
        P256_ORDER_MINUS_ONE[3],
        0,
    ];
    let mut rem = Zeroizing::new([0u64; 5]);
    let mut diff = Zeroizing::new([0u64; 5]);

    for bit in (0..SEED_LIMBS * 64).rev() {
        let mut carry = (seed[bit / 64] >> (bit % 64)) & 1;
        for limb in rem.iter_mut() {
            let out = *limb >> 63;
            *limb = (*limb << 1) | carry;
            carry = out;
        }

        let mut borrow = 0u64;
        for i in 0..5 {
            let (d1, b1) = rem[i].overflowing_sub(modulus[i]);
            let (d2, b2) = d1.overflowing_sub(borrow);
            diff[i] = d2;
            borrow = (b1 | b2) as u64;
        }
        // no borrow: rem >= modulus, keep the difference
        let keep_diff = borrow.wrapping_sub(1);
        for i in 0..5 {
            rem[i] = (diff[i] & keep_diff) | (rem[i] & !keep_diff);
        }
    }

    let mut scalar = Zeroizing::new([0u64; 4]);
    let mut carry = 1u64;
    for i in 0..4 {
        let (sum, overflow) = rem[i].overflowing_add(carry);
        scalar[i] = sum;
        carry = overflow as u64;
    }
    scalar
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::platform::simulated::{EnclaveIdentity, SimulatedPlatform};
    use assert_ok::assert_ok;
    use p256::ecdsa::{signature::Verifier, VerifyingKey};
    use rstest::rstest;

    fn platform(state: TrustState) -> SimulatedPlatform {
        SimulatedPlatform::new(
            [0x11; KEY_128_SIZE],
            EnclaveIdentity::new([0x51; 32], [0x8c; 32], 1, 0),
            state,
        )
    }

    fn order_minus_one_seed(plus: u64) -> [u64; SEED_LIMBS] {
        [
            P256_ORDER_MINUS_ONE[0] + plus,
            P256_ORDER_MINUS_ONE[1],
            P256_ORDER_MINUS_ONE[2],
            P256_ORDER_MINUS_ONE[3],
            0,
        ]
    }

    #[rstest]
    #[case([0, 0, 0, 0, 0], [1, 0, 0, 0])]
    #[case([41, 0, 0, 0, 0], [42, 0, 0, 0])]
    #[case(order_minus_one_seed(0), [1, 0, 0, 0])]
    #[case(order_minus_one_seed(6), [7, 0, 0, 0])]
    fn reduce_seed_into_scalar_range(#[case] seed: [u64; SEED_LIMBS], #[case] expected: [u64; 4]) {
        assert_eq!(*scalar_from_seed(&seed), expected);
    }

    #[test]
    fn keep_largest_seed_below_the_order() {
        let scalar = scalar_from_seed(&[u64::MAX; SEED_LIMBS]);
        let mut be = [0u8; 32];
        for (bytes, limb) in be.chunks_exact_mut(8).zip(scalar.iter().rev()) {
            bytes.copy_from_slice(&limb.to_be_bytes());
        }
        assert_ok!(SigningKey::from_bytes(&FieldBytes::clone_from_slice(&be)));
    }

    #[test]
    fn derive_the_same_key_for_the_same_trust_state_and_key_id() {
        let p = platform(TrustState::new([1; 16], 1));
        let first = assert_ok!(derive_attestation_key(&p, &[0; KEY_ID_SIZE]));
        let second = assert_ok!(derive_attestation_key(&p, &[0; KEY_ID_SIZE]));
        assert_eq!(first.public_key(), second.public_key());
        assert_eq!(first.private_key_le(), second.private_key_le());
    }

    #[test]
    fn derive_new_key_for_new_key_id_or_trust_state() {
        let p = platform(TrustState::new([1; 16], 1));
        let base = assert_ok!(derive_attestation_key(&p, &[0; KEY_ID_SIZE]));
        let refreshed = assert_ok!(derive_attestation_key(&p, &[1; KEY_ID_SIZE]));
        p.set_trust_state(TrustState::new([1; 16], 2));
        let upgraded = assert_ok!(derive_attestation_key(&p, &[0; KEY_ID_SIZE]));

        assert_ne!(base.public_key(), refreshed.public_key());
        assert_ne!(base.public_key(), upgraded.public_key());
    }

    #[test]
    fn sign_with_key_matching_the_public_key() {
        let p = platform(TrustState::new([1; 16], 1));
        let pair = assert_ok!(derive_attestation_key(&p, &[0; KEY_ID_SIZE]));
        let signature = assert_ok!(pair.sign(b"quote"));

        let mut sec1 = [0u8; 65];
        sec1[0] = 4;
        sec1[1..].copy_from_slice(pair.public_key());
        let key = assert_ok!(VerifyingKey::from_sec1_bytes(&sec1));
        let signature = assert_ok!(Signature::from_slice(&signature));
        assert_ok!(key.verify(b"quote", &signature));
    }

    #[test]
    fn map_report_failures_to_out_of_memory_or_unexpected() {
        let p = platform(TrustState::new([1; 16], 1));
        p.fail_reports_with(Some(crate::error::PlatformError::OutOfMemory));
        assert_eq!(
            derive_attestation_key(&p, &[0; KEY_ID_SIZE]).err(),
            Some(QeError::OutOfMemory)
        );
        p.fail_reports_with(Some(crate::error::PlatformError::Unavailable));
        assert_eq!(
            derive_attestation_key(&p, &[0; KEY_ID_SIZE]).err(),
            Some(QeError::Unexpected)
        );
    }

    #[test]
    fn derive_platform_identifier_independent_of_trust_state() {
        let p = platform(TrustState::new([1; 16], 1));
        let before = assert_ok!(derive_platform_identifier(&p));
        p.set_trust_state(TrustState::new([9; 16], 9));
        assert_eq!(assert_ok!(derive_platform_identifier(&p)), before);
    }

    #[test]
    fn place_derivation_labels_in_context_block() {
        let mut context = [0u8; DERIVATION_CONTEXT_SIZE];
        context[1..1 + QE_ID_LABEL.len()].copy_from_slice(QE_ID_LABEL);
        context[DERIVATION_CONTEXT_SIZE - 2..].copy_from_slice(&QE_ID_DERIVATION_BITS);
        assert_eq!(context, hex_literal::hex!("00 51455f49445f444552 00000000 0080"));
    }
}
