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

//! Opaque hardware primitives the quoting core depends on.
//!
//! Production builds implement [`Platform`] on top of the enclave runtime.
//! [`simulated::SimulatedPlatform`] is a software model used on hosted builds
//! and in tests.

use zeroize::Zeroizing;

use crate::error::PlatformError;
use crate::intel::constants::{FLAGS_MODE64BIT, KEY_128_SIZE};
use crate::intel::report::{CpuSvn, KeyId, Report, ReportData, TargetInfo, TrustState};

pub mod simulated;

/// Identity the derived key is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Bound to the enclave measurement.
    MrEnclave,
    /// Bound to the enclave signer and product id.
    MrSigner,
}

/// Parameters of a platform seal key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRequest {
    /// Identity the key is bound to.
    pub policy: KeyPolicy,
    /// CPU security version of the requested key.
    pub cpu_svn: CpuSvn,
    /// Enclave security version of the requested key.
    pub isv_svn: u16,
    /// Diversifies keys for the same trust state.
    pub key_id: KeyId,
    /// Attribute bits the key is bound to.
    pub attribute_mask: u64,
    /// Misc select bits the key is bound to.
    pub misc_mask: u32,
}

impl KeyRequest {
    /// Signer bound seal key request for the given trust state and key id.
    pub fn seal(state: &TrustState, key_id: &KeyId) -> Self {
        KeyRequest {
            policy: KeyPolicy::MrSigner,
            cpu_svn: state.cpu_svn,
            isv_svn: state.isv_svn,
            key_id: *key_id,
            attribute_mask: !FLAGS_MODE64BIT,
            misc_mask: 0xFFFF_FFFF,
        }
    }

    /// Trust state the request names.
    pub fn trust_state(&self) -> TrustState {
        TrustState::new(self.cpu_svn, self.isv_svn)
    }
}

/// Hardware primitives of the isolated execution context.
pub trait Platform {
    /// Derives a 128 bit key (EGETKEY). Fails when the request names a trust
    /// state above the current one.
    fn get_key(&self, request: &KeyRequest)
        -> Result<Zeroizing<[u8; KEY_128_SIZE]>, PlatformError>;

    /// Creates an identity report of the calling enclave (EREPORT). Without a
    /// target the report is addressed to the caller itself.
    fn create_report(
        &self,
        target: Option<&TargetInfo>,
        report_data: Option<&ReportData>,
    ) -> Result<Report, PlatformError>;

    /// Checks the MAC of a report addressed to the calling enclave.
    fn verify_report(&self, report: &Report) -> Result<(), PlatformError>;

    /// True when the `len` bytes starting at `addr` lie entirely inside the
    /// trusted context.
    fn is_within_enclave(&self, addr: usize, len: usize) -> bool;

    /// Fills `out` with random bytes.
    fn read_rand(&self, out: &mut [u8]) -> Result<(), PlatformError>;
}

/// Boundary check on a byte buffer.
pub fn slice_within<P: Platform + ?Sized>(platform: &P, buf: &[u8]) -> bool {
    platform.is_within_enclave(buf.as_ptr() as usize, buf.len())
}

/// Boundary check on the storage of any value.
pub fn value_within<P: Platform + ?Sized, T>(platform: &P, value: &T) -> bool {
    platform.is_within_enclave(value as *const T as usize, core::mem::size_of::<T>())
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn build_signer_bound_seal_requests() {
        let state = TrustState::new([4u8; 16], 9);
        let request = KeyRequest::seal(&state, &[1u8; 32]);

        assert_eq!(request.policy, KeyPolicy::MrSigner);
        assert_eq!(request.trust_state(), state);
        assert_eq!(request.attribute_mask & FLAGS_MODE64BIT, 0);
        assert_eq!(request.misc_mask, 0xFFFF_FFFF);
    }
}
