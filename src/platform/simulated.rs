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

//! Software model of the platform primitives.
//!
//! Every key is an AES-CMAC ladder over a per-platform root secret, so two
//! simulated enclaves created with the same root secret behave like two
//! enclaves on the same CPU: reports one addresses to the other verify.

extern crate alloc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use aes::Aes128;
use cmac::{Cmac, Mac};
use zeroize::Zeroizing;

use crate::error::PlatformError;
use crate::intel::constants::*;
use crate::intel::report::{Measurement, Report, ReportBody, ReportData, TargetInfo, TrustState};
use crate::platform::{KeyPolicy, KeyRequest, Platform};

const SEAL_LABEL: &[u8] = b"SIM_SEAL_KEY";
const REPORT_LABEL: &[u8] = b"SIM_REPORT_KEY";
const RAND_LABEL: &[u8] = b"SIM_RAND";

fn cmac(key: &[u8; KEY_128_SIZE], parts: &[&[u8]]) -> Result<Zeroizing<[u8; KEY_128_SIZE]>, PlatformError> {
    let mut mac = <Cmac<Aes128> as Mac>::new_from_slice(key).map_err(|_| PlatformError::Unavailable)?;
    for part in parts {
        mac.update(part);
    }
    let tag = mac.finalize().into_bytes();
    let mut out = Zeroizing::new([0u8; KEY_128_SIZE]);
    out.copy_from_slice(&tag);
    Ok(out)
}

/// Measurements and attributes of a simulated enclave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclaveIdentity {
    /// Enclave measurement.
    pub mr_enclave: Measurement,
    /// Signer measurement.
    pub mr_signer: Measurement,
    /// Product id.
    pub isv_prod_id: u16,
    /// Attribute flags, always initialized and 64-bit.
    pub flags: u64,
    /// XFRM, x87 and SSE.
    pub xfrm: u64,
    /// Misc select.
    pub misc_select: u32,
}

impl EnclaveIdentity {
    /// Identity of an initialized 64-bit enclave with the extra `flags` set.
    pub fn new(mr_enclave: Measurement, mr_signer: Measurement, isv_prod_id: u16, flags: u64) -> Self {
        EnclaveIdentity {
            mr_enclave,
            mr_signer,
            isv_prod_id,
            flags: flags | FLAGS_INITTED | FLAGS_MODE64BIT,
            xfrm: 0x3,
            misc_select: 0,
        }
    }
}

/// Software [`Platform`] for hosted builds and tests.
///
/// Interior mutability lets tests move the trust state, mark host memory and
/// inject report failures while the platform is borrowed by the code under
/// test. It is not `Sync`.
pub struct SimulatedPlatform {
    root_secret: Zeroizing<[u8; KEY_128_SIZE]>,
    identity: EnclaveIdentity,
    trust_state: Cell<TrustState>,
    rand_counter: Cell<u64>,
    untrusted: RefCell<Vec<(usize, usize)>>,
    report_failure: Cell<Option<PlatformError>>,
}

impl SimulatedPlatform {
    /// Creates an enclave on the machine identified by `root_secret`.
    pub fn new(root_secret: [u8; KEY_128_SIZE], identity: EnclaveIdentity, trust_state: TrustState) -> Self {
        SimulatedPlatform {
            root_secret: Zeroizing::new(root_secret),
            identity,
            trust_state: Cell::new(trust_state),
            rand_counter: Cell::new(0),
            untrusted: RefCell::new(Vec::new()),
            report_failure: Cell::new(None),
        }
    }

    /// Identity reports are created with.
    pub fn identity(&self) -> &EnclaveIdentity {
        &self.identity
    }

    /// Current trust state.
    pub fn trust_state(&self) -> TrustState {
        self.trust_state.get()
    }

    /// Moves the platform to another TCB. Raising it models a microcode or
    /// enclave upgrade, lowering it a rollback.
    pub fn set_trust_state(&self, state: TrustState) {
        log::debug!("simulated trust state moved to isv_svn {}", state.isv_svn);
        self.trust_state.set(state);
    }

    /// Target info other enclaves use to address reports to this one.
    pub fn target_info(&self) -> TargetInfo {
        TargetInfo {
            mr_enclave: self.identity.mr_enclave,
            attributes_flags: self.identity.flags,
            attributes_xfrm: self.identity.xfrm,
            config_svn: 0,
            misc_select: self.identity.misc_select,
            config_id: [0u8; CONFIG_ID_SIZE],
        }
    }

    /// Treats `buf` as host memory from now on.
    pub fn mark_untrusted(&self, buf: &[u8]) {
        self.mark_range(buf.as_ptr() as usize, buf.len());
    }

    /// Treats the storage of `value` as host memory from now on.
    pub fn mark_untrusted_value<T>(&self, value: &T) {
        self.mark_range(value as *const T as usize, core::mem::size_of::<T>());
    }

    /// Forgets every range marked untrusted.
    pub fn clear_untrusted(&self) {
        self.untrusted.borrow_mut().clear();
    }

    /// Makes every following `create_report` fail with `err` (or succeed again with `None`).
    pub fn fail_reports_with(&self, err: Option<PlatformError>) {
        self.report_failure.set(err);
    }

    fn mark_range(&self, addr: usize, len: usize) {
        self.untrusted
            .borrow_mut()
            .push((addr, addr.saturating_add(len)));
    }

    fn report_key(
        &self,
        target: &Measurement,
        key_id: &[u8],
    ) -> Result<Zeroizing<[u8; KEY_128_SIZE]>, PlatformError> {
        cmac(&self.root_secret, &[REPORT_LABEL, target, key_id])
    }
}

impl Platform for SimulatedPlatform {
    fn get_key(&self, request: &KeyRequest) -> Result<Zeroizing<[u8; KEY_128_SIZE]>, PlatformError> {
        if !self.trust_state.get().dominates(&request.trust_state()) {
            return Err(PlatformError::InvalidKeyRequest);
        }
        let (policy_tag, measurement): (u8, &[u8]) = match request.policy {
            KeyPolicy::MrEnclave => (0, &self.identity.mr_enclave),
            KeyPolicy::MrSigner => (1, &self.identity.mr_signer),
        };
        cmac(
            &self.root_secret,
            &[
                SEAL_LABEL,
                &[policy_tag],
                measurement,
                &self.identity.isv_prod_id.to_le_bytes(),
                &request.cpu_svn,
                &request.isv_svn.to_le_bytes(),
                &request.key_id,
                &(self.identity.flags & request.attribute_mask).to_le_bytes(),
                &(self.identity.misc_select & request.misc_mask).to_le_bytes(),
            ],
        )
    }

    fn create_report(
        &self,
        target: Option<&TargetInfo>,
        report_data: Option<&ReportData>,
    ) -> Result<Report, PlatformError> {
        if let Some(err) = self.report_failure.get() {
            return Err(err);
        }
        let state = self.trust_state.get();
        let mut body = ReportBody::default();
        body.set_cpu_svn(&state.cpu_svn);
        body.set_misc_select(self.identity.misc_select);
        body.set_attributes(self.identity.flags, self.identity.xfrm);
        body.set_mr_enclave(&self.identity.mr_enclave);
        body.set_mr_signer(&self.identity.mr_signer);
        body.set_isv_prod_id(self.identity.isv_prod_id);
        body.set_isv_svn(state.isv_svn);
        if let Some(data) = report_data {
            body.set_report_data(data);
        }

        let mut key_id = [0u8; KEY_ID_SIZE];
        self.read_rand(&mut key_id)?;
        let target_mr = target
            .map(|t| t.mr_enclave)
            .unwrap_or(self.identity.mr_enclave);
        let mac = cmac(&*self.report_key(&target_mr, &key_id)?, &[body.as_bytes()])?;

        Ok(Report {
            body,
            key_id,
            mac: *mac,
        })
    }

    fn verify_report(&self, report: &Report) -> Result<(), PlatformError> {
        let key = self.report_key(&self.identity.mr_enclave, &report.key_id)?;
        let mut mac =
            <Cmac<Aes128> as Mac>::new_from_slice(&key[..]).map_err(|_| PlatformError::Unavailable)?;
        mac.update(report.body.as_bytes());
        mac.verify_slice(&report.mac)
            .map_err(|_| PlatformError::InvalidReport)
    }

    fn is_within_enclave(&self, addr: usize, len: usize) -> bool {
        let end = match addr.checked_add(len) {
            Some(end) => end,
            None => return false,
        };
        !self
            .untrusted
            .borrow()
            .iter()
            .any(|(start, stop)| addr < *stop && *start < end)
    }

    fn read_rand(&self, out: &mut [u8]) -> Result<(), PlatformError> {
        for chunk in out.chunks_mut(KEY_128_SIZE) {
            let counter = self.rand_counter.get().wrapping_add(1);
            self.rand_counter.set(counter);
            let block = cmac(&self.root_secret, &[RAND_LABEL, &counter.to_le_bytes()])?;
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use assert_ok::assert_ok;
    use rstest::rstest;

    fn platform(mr_enclave: u8, state: TrustState) -> SimulatedPlatform {
        SimulatedPlatform::new(
            [0x42; KEY_128_SIZE],
            EnclaveIdentity::new([mr_enclave; 32], [0x77; 32], 1, 0),
            state,
        )
    }

    #[test]
    fn derive_stable_keys_for_the_same_request() {
        let p = platform(1, TrustState::new([2; 16], 2));
        let request = KeyRequest::seal(&TrustState::new([1; 16], 1), &[5; 32]);
        assert_eq!(*assert_ok!(p.get_key(&request)), *assert_ok!(p.get_key(&request)));
    }

    #[rstest]
    #[case(TrustState::new([3; 16], 1))]
    #[case(TrustState::new([2; 16], 3))]
    fn refuse_keys_above_the_current_trust_state(#[case] requested: TrustState) {
        let p = platform(1, TrustState::new([2; 16], 2));
        assert_eq!(
            p.get_key(&KeyRequest::seal(&requested, &[0; 32])),
            Err(PlatformError::InvalidKeyRequest)
        );
    }

    #[test]
    fn bind_seal_keys_to_the_signer_not_the_measurement() {
        let state = TrustState::new([1; 16], 1);
        let request = KeyRequest::seal(&state, &[0; 32]);
        let mut by_enclave = request.clone();
        by_enclave.policy = KeyPolicy::MrEnclave;

        let a = platform(1, state);
        let b = platform(2, state);
        assert_eq!(*assert_ok!(a.get_key(&request)), *assert_ok!(b.get_key(&request)));
        assert_ne!(*assert_ok!(a.get_key(&by_enclave)), *assert_ok!(b.get_key(&by_enclave)));
    }

    #[test]
    fn verify_reports_addressed_to_self() {
        let state = TrustState::new([1; 16], 1);
        let quoting = platform(1, state);
        let app = platform(2, state);

        let report = assert_ok!(app.create_report(Some(&quoting.target_info()), Some(&[9; 64])));
        assert_ok!(quoting.verify_report(&report));
        assert_eq!(app.verify_report(&report), Err(PlatformError::InvalidReport));
    }

    #[test]
    fn reject_reports_with_modified_body() {
        let p = platform(1, TrustState::new([1; 16], 1));
        let mut report = assert_ok!(p.create_report(None, None));
        report.body.set_isv_svn(7);
        assert_eq!(p.verify_report(&report), Err(PlatformError::InvalidReport));
    }

    #[test]
    fn report_current_trust_state() {
        let p = platform(1, TrustState::new([1; 16], 1));
        p.set_trust_state(TrustState::new([4; 16], 6));
        let report = assert_ok!(p.create_report(None, None));
        assert_eq!(report.body.trust_state(), TrustState::new([4; 16], 6));
    }

    #[test]
    fn flag_untrusted_ranges() {
        let p = platform(1, TrustState::default());
        let host = [0u8; 64];
        let enclave = [0u8; 64];
        p.mark_untrusted(&host[16..32]);

        assert!(!p.is_within_enclave(host.as_ptr() as usize, host.len()));
        assert!(p.is_within_enclave(host.as_ptr() as usize, 16));
        assert!(p.is_within_enclave(enclave.as_ptr() as usize, enclave.len()));
        assert!(!p.is_within_enclave(usize::MAX, 2));
    }

    #[test]
    fn produce_distinct_random_blocks() {
        let p = platform(1, TrustState::default());
        let mut a = [0u8; 20];
        let mut b = [0u8; 20];
        assert_ok!(p.read_rand(&mut a));
        assert_ok!(p.read_rand(&mut b));
        assert_ne!(a, b);
    }

    #[test]
    fn fail_reports_on_request() {
        let p = platform(1, TrustState::default());
        p.fail_reports_with(Some(PlatformError::OutOfMemory));
        assert_eq!(p.create_report(None, None), Err(PlatformError::OutOfMemory));
        p.fail_reports_with(None);
        assert_ok!(p.create_report(None, None));
    }
}
