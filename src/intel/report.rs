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

//! Identity report, target info and trust-state wire types.

use crate::error::ParseError;
use crate::intel::constants::*;

/// CPU security version.
pub type CpuSvn = [u8; CPU_SVN_SIZE];
/// Key id of a report or seal key request.
pub type KeyId = [u8; KEY_ID_SIZE];
/// User data carried in a report.
pub type ReportData = [u8; REPORT_DATA_SIZE];
/// SHA256 enclave or signer measurement.
pub type Measurement = [u8; MEASUREMENT_SIZE];

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

fn read_u64(input: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&input[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

fn read_array<const N: usize>(input: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&input[offset..offset + N]);
    out
}

/// Platform trust state: CPU security version plus the enclave's own ISV SVN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrustState {
    /// CPU security version.
    pub cpu_svn: CpuSvn,
    /// Security version of the enclave.
    pub isv_svn: u16,
}

impl TrustState {
    /// Trust state from its two components.
    pub fn new(cpu_svn: CpuSvn, isv_svn: u16) -> Self {
        TrustState { cpu_svn, isv_svn }
    }

    /// True when every CPUSVN component and the ISVSVN are at least those of `other`.
    pub fn dominates(&self, other: &TrustState) -> bool {
        self.isv_svn >= other.isv_svn
            && self
                .cpu_svn
                .iter()
                .zip(other.cpu_svn.iter())
                .all(|(mine, theirs)| mine >= theirs)
    }
}

/// The 384 byte body of an identity report. Kept in wire form, fields are read in place.
#[derive(Clone, PartialEq, Eq)]
pub struct ReportBody([u8; REPORT_BODY_SIZE]);

impl core::fmt::Debug for ReportBody {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReportBody")
            .field("cpu_svn", &hex::encode(self.cpu_svn()))
            .field("isv_svn", &self.isv_svn())
            .field("mr_enclave", &hex::encode(self.mr_enclave()))
            .field("flags", &self.attributes_flags())
            .finish()
    }
}

impl Default for ReportBody {
    fn default() -> Self {
        ReportBody([0u8; REPORT_BODY_SIZE])
    }
}

impl ReportBody {
    /// Copies the first 384 bytes of `input`.
    pub fn from_bytes(input: &[u8]) -> Result<Self, ParseError> {
        Ok(ReportBody(
            input
                .get(..REPORT_BODY_SIZE)
                .ok_or(ParseError::InvalidReport)?
                .try_into()
                .map_err(|_| ParseError::InvalidReport)?,
        ))
    }

    /// Raw 384-byte body.
    pub fn as_bytes(&self) -> &[u8; REPORT_BODY_SIZE] {
        &self.0
    }

    /// CPU security version the report was taken at.
    pub fn cpu_svn(&self) -> CpuSvn {
        read_array(&self.0, BODY_CPU_SVN_OFFSET)
    }

    /// Enabled extended SSA frame features.
    pub fn misc_select(&self) -> u32 {
        read_u32(&self.0, BODY_MISC_SELECT_OFFSET)
    }

    /// Attribute flags, see the `FLAGS_*` constants.
    pub fn attributes_flags(&self) -> u64 {
        read_u64(&self.0, BODY_ATTRIBUTES_FLAGS_OFFSET)
    }

    /// XSAVE feature request mask.
    pub fn attributes_xfrm(&self) -> u64 {
        read_u64(&self.0, BODY_ATTRIBUTES_XFRM_OFFSET)
    }

    /// Measurement of the enclave.
    pub fn mr_enclave(&self) -> Measurement {
        read_array(&self.0, BODY_MR_ENCLAVE_OFFSET)
    }

    /// Measurement of the enclave signer.
    pub fn mr_signer(&self) -> Measurement {
        read_array(&self.0, BODY_MR_SIGNER_OFFSET)
    }

    /// Product id of the enclave.
    pub fn isv_prod_id(&self) -> u16 {
        read_u16(&self.0, BODY_ISV_PROD_ID_OFFSET)
    }

    /// Security version of the enclave.
    pub fn isv_svn(&self) -> u16 {
        read_u16(&self.0, BODY_ISV_SVN_OFFSET)
    }

    /// Configuration security version.
    pub fn config_svn(&self) -> u16 {
        read_u16(&self.0, BODY_CONFIG_SVN_OFFSET)
    }

    /// User data carried by the report.
    pub fn report_data(&self) -> ReportData {
        read_array(&self.0, BODY_REPORT_DATA_OFFSET)
    }

    /// Trust state the report was produced under.
    pub fn trust_state(&self) -> TrustState {
        TrustState::new(self.cpu_svn(), self.isv_svn())
    }

    /// Sets the CPU security version.
    pub fn set_cpu_svn(&mut self, cpu_svn: &CpuSvn) {
        self.0[BODY_CPU_SVN_OFFSET..BODY_CPU_SVN_OFFSET + CPU_SVN_SIZE].copy_from_slice(cpu_svn);
    }

    /// Sets the misc select bits.
    pub fn set_misc_select(&mut self, misc_select: u32) {
        self.0[BODY_MISC_SELECT_OFFSET..BODY_MISC_SELECT_OFFSET + 4]
            .copy_from_slice(&misc_select.to_le_bytes());
    }

    /// Sets attribute flags and XFRM.
    pub fn set_attributes(&mut self, flags: u64, xfrm: u64) {
        self.0[BODY_ATTRIBUTES_FLAGS_OFFSET..BODY_ATTRIBUTES_XFRM_OFFSET]
            .copy_from_slice(&flags.to_le_bytes());
        self.0[BODY_ATTRIBUTES_XFRM_OFFSET..BODY_MR_ENCLAVE_OFFSET]
            .copy_from_slice(&xfrm.to_le_bytes());
    }

    /// Sets the enclave measurement.
    pub fn set_mr_enclave(&mut self, mr_enclave: &Measurement) {
        self.0[BODY_MR_ENCLAVE_OFFSET..BODY_MR_ENCLAVE_OFFSET + MEASUREMENT_SIZE]
            .copy_from_slice(mr_enclave);
    }

    /// Sets the signer measurement.
    pub fn set_mr_signer(&mut self, mr_signer: &Measurement) {
        self.0[BODY_MR_SIGNER_OFFSET..BODY_MR_SIGNER_OFFSET + MEASUREMENT_SIZE]
            .copy_from_slice(mr_signer);
    }

    /// Sets the product id.
    pub fn set_isv_prod_id(&mut self, isv_prod_id: u16) {
        self.0[BODY_ISV_PROD_ID_OFFSET..BODY_ISV_SVN_OFFSET]
            .copy_from_slice(&isv_prod_id.to_le_bytes());
    }

    /// Sets the enclave security version.
    pub fn set_isv_svn(&mut self, isv_svn: u16) {
        self.0[BODY_ISV_SVN_OFFSET..BODY_CONFIG_SVN_OFFSET].copy_from_slice(&isv_svn.to_le_bytes());
    }

    /// Sets the user data.
    pub fn set_report_data(&mut self, report_data: &ReportData) {
        self.0[BODY_REPORT_DATA_OFFSET..REPORT_BODY_SIZE].copy_from_slice(report_data);
    }
}

/// Identity report: body, key id and MAC.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Report {
    /// Report body.
    pub body: ReportBody,
    /// Identifies the report key the MAC was computed with.
    pub key_id: KeyId,
    /// AES-CMAC over the body under the target's report key.
    pub mac: [u8; REPORT_MAC_SIZE],
}

impl Report {
    /// Parses a 432-byte report.
    pub fn from_bytes(input: &[u8]) -> Result<Self, ParseError> {
        if input.len() < REPORT_SIZE {
            return Err(ParseError::InvalidReport);
        }
        Ok(Report {
            body: ReportBody::from_bytes(&input[..REPORT_KEY_ID_OFFSET])?,
            key_id: input[REPORT_KEY_ID_OFFSET..REPORT_MAC_OFFSET]
                .try_into()
                .map_err(|_| ParseError::InvalidReport)?,
            mac: input[REPORT_MAC_OFFSET..REPORT_SIZE]
                .try_into()
                .map_err(|_| ParseError::InvalidReport)?,
        })
    }

    /// Encodes into the first `REPORT_SIZE` bytes of `output`.
    pub fn to_bytes(&self, output: &mut [u8]) {
        output[..REPORT_KEY_ID_OFFSET].copy_from_slice(self.body.as_bytes());
        output[REPORT_KEY_ID_OFFSET..REPORT_MAC_OFFSET].copy_from_slice(&self.key_id);
        output[REPORT_MAC_OFFSET..REPORT_SIZE].copy_from_slice(&self.mac);
    }
}

/// Describes the enclave a report is destined for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    /// Measurement of the target enclave.
    pub mr_enclave: Measurement,
    /// Attribute flags of the target enclave.
    pub attributes_flags: u64,
    /// XFRM of the target enclave.
    pub attributes_xfrm: u64,
    /// Configuration security version of the target.
    pub config_svn: u16,
    /// Misc select of the target.
    pub misc_select: u32,
    /// Configuration id of the target.
    pub config_id: [u8; CONFIG_ID_SIZE],
}

impl Default for TargetInfo {
    fn default() -> Self {
        TargetInfo {
            mr_enclave: [0u8; MEASUREMENT_SIZE],
            attributes_flags: 0,
            attributes_xfrm: 0,
            config_svn: 0,
            misc_select: 0,
            config_id: [0u8; CONFIG_ID_SIZE],
        }
    }
}

impl TargetInfo {
    /// Parses a 512-byte target info. Reserved bytes are ignored.
    pub fn from_bytes(input: &[u8]) -> Result<Self, ParseError> {
        if input.len() < TARGET_INFO_SIZE {
            return Err(ParseError::InvalidTargetInfo);
        }
        Ok(TargetInfo {
            mr_enclave: read_array(input, TARGET_MR_ENCLAVE_OFFSET),
            attributes_flags: read_u64(input, TARGET_ATTRIBUTES_FLAGS_OFFSET),
            attributes_xfrm: read_u64(input, TARGET_ATTRIBUTES_XFRM_OFFSET),
            config_svn: read_u16(input, TARGET_CONFIG_SVN_OFFSET),
            misc_select: read_u32(input, TARGET_MISC_SELECT_OFFSET),
            config_id: read_array(input, TARGET_CONFIG_ID_OFFSET),
        })
    }

    /// Writes the 512 byte wire form, reserved ranges zeroed.
    pub fn to_bytes(&self, output: &mut [u8]) {
        output[..TARGET_INFO_SIZE].fill(0);
        output[TARGET_MR_ENCLAVE_OFFSET..TARGET_ATTRIBUTES_FLAGS_OFFSET]
            .copy_from_slice(&self.mr_enclave);
        output[TARGET_ATTRIBUTES_FLAGS_OFFSET..TARGET_ATTRIBUTES_XFRM_OFFSET]
            .copy_from_slice(&self.attributes_flags.to_le_bytes());
        output[TARGET_ATTRIBUTES_XFRM_OFFSET..TARGET_ATTRIBUTES_XFRM_OFFSET + 8]
            .copy_from_slice(&self.attributes_xfrm.to_le_bytes());
        output[TARGET_CONFIG_SVN_OFFSET..TARGET_MISC_SELECT_OFFSET]
            .copy_from_slice(&self.config_svn.to_le_bytes());
        output[TARGET_MISC_SELECT_OFFSET..TARGET_MISC_SELECT_OFFSET + 4]
            .copy_from_slice(&self.misc_select.to_le_bytes());
        output[TARGET_CONFIG_ID_OFFSET..TARGET_CONFIG_ID_OFFSET + CONFIG_ID_SIZE]
            .copy_from_slice(&self.config_id);
    }

    /// Target info addressing the enclave that produced `body`.
    pub fn from_report_body(body: &ReportBody) -> Self {
        TargetInfo {
            mr_enclave: body.mr_enclave(),
            attributes_flags: body.attributes_flags(),
            attributes_xfrm: body.attributes_xfrm(),
            config_svn: body.config_svn(),
            misc_select: body.misc_select(),
            config_id: read_array(body.as_bytes(), BODY_CONFIG_ID_OFFSET),
        }
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use assert_ok::assert_ok;
    use rstest::rstest;

    #[rstest]
    #[case([2u8; CPU_SVN_SIZE], 3, [1u8; CPU_SVN_SIZE], 3, true)]
    #[case([2u8; CPU_SVN_SIZE], 3, [2u8; CPU_SVN_SIZE], 3, true)]
    #[case([2u8; CPU_SVN_SIZE], 3, [2u8; CPU_SVN_SIZE], 4, false)]
    #[case([2u8; CPU_SVN_SIZE], 3, [3u8; CPU_SVN_SIZE], 1, false)]
    fn compare_trust_states_component_wise(
        #[case] cpu: CpuSvn,
        #[case] isv: u16,
        #[case] other_cpu: CpuSvn,
        #[case] other_isv: u16,
        #[case] expected: bool,
    ) {
        let mine = TrustState::new(cpu, isv);
        let other = TrustState::new(other_cpu, other_isv);
        assert_eq!(mine.dominates(&other), expected);
    }

    #[test]
    fn not_dominate_when_a_single_cpu_component_is_lower() {
        let mut lower = [5u8; CPU_SVN_SIZE];
        lower[7] = 4;
        let mine = TrustState::new(lower, 1);
        assert!(!mine.dominates(&TrustState::new([5u8; CPU_SVN_SIZE], 1)));
    }

    #[test]
    fn place_report_body_fields_at_wire_offsets() {
        let mut body = ReportBody::default();
        body.set_cpu_svn(&[0xAA; CPU_SVN_SIZE]);
        body.set_isv_svn(0x0102);
        body.set_attributes(FLAGS_INITTED | FLAGS_DEBUG, 0x3);
        body.set_report_data(&[0x55; REPORT_DATA_SIZE]);

        let bytes = body.as_bytes();
        assert_eq!(bytes[0], 0xAA);
        assert_eq!(&bytes[258..260], &[0x02, 0x01]);
        assert_eq!(bytes[48], 0x03);
        assert_eq!(bytes[56], 0x03);
        assert_eq!(bytes[320], 0x55);
        assert_eq!(body.attributes_flags(), FLAGS_INITTED | FLAGS_DEBUG);
        assert_eq!(body.trust_state(), TrustState::new([0xAA; CPU_SVN_SIZE], 0x0102));
    }

    #[test]
    fn decode_encoded_report() {
        let mut body = ReportBody::default();
        body.set_mr_enclave(&[7u8; MEASUREMENT_SIZE]);
        let report = Report {
            body,
            key_id: [9u8; KEY_ID_SIZE],
            mac: [3u8; REPORT_MAC_SIZE],
        };
        let mut raw = [0u8; REPORT_SIZE];
        report.to_bytes(&mut raw);

        let decoded = assert_ok!(Report::from_bytes(&raw));
        assert_eq!(decoded, report);
    }

    #[test]
    fn reject_truncated_report() {
        assert_eq!(
            Report::from_bytes(&[0u8; REPORT_SIZE - 1]),
            Err(ParseError::InvalidReport)
        );
    }

    #[test]
    fn keep_target_info_reserved_ranges_zero() {
        let target = TargetInfo {
            mr_enclave: [1u8; MEASUREMENT_SIZE],
            attributes_flags: FLAGS_PROVISION_KEY,
            attributes_xfrm: 7,
            config_svn: 2,
            misc_select: 0xFFFF_FFFF,
            config_id: [4u8; CONFIG_ID_SIZE],
        };
        let mut raw = [0xEEu8; TARGET_INFO_SIZE];
        target.to_bytes(&mut raw);

        assert_eq!(&raw[48..50], &[0, 0]);
        assert!(raw[128..].iter().all(|b| *b == 0));
        assert_eq!(assert_ok!(TargetInfo::from_bytes(&raw)), target);
    }
}
