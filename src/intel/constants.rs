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

//! Constants for SGX key derivation, sealed blobs and ECDSA quote layout.

// =============================================================================
// Top-level structure sizes
// =============================================================================

/// Size of a CPU security version.
pub const CPU_SVN_SIZE: usize = 16;
/// Size of a report or seal key id.
pub const KEY_ID_SIZE: usize = 32;
pub const KEY_128_SIZE: usize = 16;
pub const SHA256_SIZE: usize = 32;
/// Size of the user data in a report.
pub const REPORT_DATA_SIZE: usize = 64;
pub const REPORT_BODY_SIZE: usize = 384;
pub const REPORT_SIZE: usize = 432;
pub const TARGET_INFO_SIZE: usize = 512;
/// Size of the requester nonce.
pub const QUOTE_NONCE_SIZE: usize = 16;
pub const QE_ID_SIZE: usize = 16;
pub const ECDSA_PRIVATE_KEY_SIZE: usize = 32;
pub const ECDSA_SIGNATURE_SIZE: usize = 64;
pub const ATTESTATION_KEY_SIZE: usize = 64;
pub const QUOTE_HEADER_SIZE: usize = 48;
pub const QUOTE_BODY_SIZE: usize = REPORT_BODY_SIZE;

// =============================================================================
// Identity report body field offsets
// =============================================================================

pub const BODY_CPU_SVN_OFFSET: usize = 0;
pub const BODY_MISC_SELECT_OFFSET: usize = 16;
pub const BODY_ATTRIBUTES_FLAGS_OFFSET: usize = 48;
pub const BODY_ATTRIBUTES_XFRM_OFFSET: usize = 56;
pub const BODY_MR_ENCLAVE_OFFSET: usize = 64;
pub const BODY_MR_SIGNER_OFFSET: usize = 128;
pub const BODY_CONFIG_ID_OFFSET: usize = 192;
pub const BODY_ISV_PROD_ID_OFFSET: usize = 256;
pub const BODY_ISV_SVN_OFFSET: usize = 258;
pub const BODY_CONFIG_SVN_OFFSET: usize = 260;
pub const BODY_REPORT_DATA_OFFSET: usize = 320;

pub const MEASUREMENT_SIZE: usize = 32;
pub const CONFIG_ID_SIZE: usize = 64;

// Report = body | key_id | mac
pub const REPORT_KEY_ID_OFFSET: usize = REPORT_BODY_SIZE;
pub const REPORT_MAC_OFFSET: usize = REPORT_KEY_ID_OFFSET + KEY_ID_SIZE;
pub const REPORT_MAC_SIZE: usize = 16;

// =============================================================================
// Target info field offsets
// =============================================================================

pub const TARGET_MR_ENCLAVE_OFFSET: usize = 0;
pub const TARGET_ATTRIBUTES_FLAGS_OFFSET: usize = 32;
pub const TARGET_ATTRIBUTES_XFRM_OFFSET: usize = 40;
pub const TARGET_CONFIG_SVN_OFFSET: usize = 50;
pub const TARGET_MISC_SELECT_OFFSET: usize = 52;
pub const TARGET_CONFIG_ID_OFFSET: usize = 64;

// =============================================================================
// Enclave attribute flags
// =============================================================================

pub const FLAGS_INITTED: u64 = 0x0000_0000_0000_0001;
pub const FLAGS_DEBUG: u64 = 0x0000_0000_0000_0002;
pub const FLAGS_MODE64BIT: u64 = 0x0000_0000_0000_0004;
/// The enclave may request the provisioning key (the PCE).
pub const FLAGS_PROVISION_KEY: u64 = 0x0000_0000_0000_0010;

// =============================================================================
// Key derivation
// =============================================================================

pub const QE_ID_LABEL: &[u8; 9] = b"QE_ID_DER";
pub const QE_ATT_LABEL: &[u8; 10] = b"QE_ATT_DER";

/// Derivation output length in bits, big endian, as placed in the context block.
pub const QE_ID_DERIVATION_BITS: [u8; 2] = [0x00, 0x80];
pub const QE_ATT_DERIVATION_BITS: [u8; 2] = [0x01, 0x40];

pub const DERIVATION_CONTEXT_SIZE: usize = 16;
/// 320 bits of seed material for the extra-random-bits scalar derivation.
pub const ATT_KEY_SEED_SIZE: usize = 40;

/// n - 1 for the P-256 group order, as little-endian 64-bit limbs.
pub const P256_ORDER_MINUS_ONE: [u64; 4] = [
    0xF3B9_CAC2_FC63_2550,
    0xBCE6_FAAD_A717_9E84,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_0000_0000,
];

// =============================================================================
// Sealed blob
// =============================================================================

pub const SEAL_ECDSA_KEY_BLOB: u8 = 0;
pub const ECDSA_KEY_BLOB_VERSION_0: u8 = 2;

/// Size of the optional authentication data bound to the attestation key.
pub const AUTHENTICATION_DATA_SIZE: usize = 32;
/// RSA-3072 modulus and ciphertext size.
pub const RSA_3072_MOD_SIZE: usize = 384;
pub const RSA_3072_EXP_SIZE: usize = 4;
pub const PPID_SIZE: usize = 16;

// Plaintext region field offsets
pub const PT_BLOB_TYPE_OFFSET: usize = 0;
pub const PT_BLOB_VERSION_OFFSET: usize = 1;
pub const PT_ECDSA_ID_OFFSET: usize = 2;
pub const PT_QE_ID_OFFSET: usize = PT_ECDSA_ID_OFFSET + SHA256_SIZE;
pub const PT_AUTH_DATA_SIZE_OFFSET: usize = PT_QE_ID_OFFSET + QE_ID_SIZE;
pub const PT_AUTH_DATA_OFFSET: usize = PT_AUTH_DATA_SIZE_OFFSET + 2;
pub const PT_CERT_KEY_TYPE_OFFSET: usize = PT_AUTH_DATA_OFFSET + AUTHENTICATION_DATA_SIZE;
pub const PT_SIGNATURE_SCHEME_OFFSET: usize = PT_CERT_KEY_TYPE_OFFSET + 2;
pub const PT_QE_REPORT_OFFSET: usize = PT_SIGNATURE_SCHEME_OFFSET + 2;
pub const PT_QE_REPORT_SIG_OFFSET: usize = PT_QE_REPORT_OFFSET + REPORT_SIZE;
pub const PT_CERT_CPU_SVN_OFFSET: usize = PT_QE_REPORT_SIG_OFFSET + ECDSA_SIGNATURE_SIZE;
pub const PT_CERT_PCE_ISV_SVN_OFFSET: usize = PT_CERT_CPU_SVN_OFFSET + CPU_SVN_SIZE;
pub const PT_CERT_PCE_ID_OFFSET: usize = PT_CERT_PCE_ISV_SVN_OFFSET + 2;
pub const PT_CERT_QE_ISV_SVN_OFFSET: usize = PT_CERT_PCE_ID_OFFSET + 2;
pub const PT_RAW_CPU_SVN_OFFSET: usize = PT_CERT_QE_ISV_SVN_OFFSET + 2;
pub const PT_RAW_PCE_ISV_SVN_OFFSET: usize = PT_RAW_CPU_SVN_OFFSET + CPU_SVN_SIZE;
pub const PT_RAW_PCE_ID_OFFSET: usize = PT_RAW_PCE_ISV_SVN_OFFSET + 2;
pub const PT_SEAL_CPU_SVN_OFFSET: usize = PT_RAW_PCE_ID_OFFSET + 2;
pub const PT_SEAL_QE_ISV_SVN_OFFSET: usize = PT_SEAL_CPU_SVN_OFFSET + CPU_SVN_SIZE;
pub const PT_PCE_TARGET_INFO_OFFSET: usize = PT_SEAL_QE_ISV_SVN_OFFSET + 2;
pub const PLAINTEXT_DATA_SIZE: usize = PT_PCE_TARGET_INFO_OFFSET + TARGET_INFO_SIZE;

// Secret region field offsets
pub const SD_SUBJECT_KIND_OFFSET: usize = 0;
pub const SD_PRIVATE_KEY_OFFSET: usize = 1;
pub const SD_PUBLIC_KEY_OFFSET: usize = SD_PRIVATE_KEY_OFFSET + ECDSA_PRIVATE_KEY_SIZE;
pub const SD_SUBJECT_OFFSET: usize = SD_PUBLIC_KEY_OFFSET + ATTESTATION_KEY_SIZE;
pub const SD_CRYPTO_SUITE_OFFSET: usize = SD_SUBJECT_OFFSET;
pub const SD_ENCRYPTED_SIZE_OFFSET: usize = SD_CRYPTO_SUITE_OFFSET + 1;
pub const SD_ENCRYPTED_PPID_OFFSET: usize = SD_ENCRYPTED_SIZE_OFFSET + 4;
pub const SD_CLEAR_PPID_OFFSET: usize = SD_SUBJECT_OFFSET;
pub const SECRET_DATA_SIZE: usize = SD_ENCRYPTED_PPID_OFFSET + RSA_3072_MOD_SIZE;

pub const SUBJECT_KIND_ENCRYPTED: u8 = 0;
pub const SUBJECT_KIND_CLEARTEXT: u8 = 1;

// Sealed container layout
pub const BLOB_PLAINTEXT_LEN_OFFSET: usize = 0;
pub const BLOB_ENCRYPT_LEN_OFFSET: usize = 4;
pub const BLOB_HEADER_SIZE: usize = 8;
/// Start of the integrity protected plaintext region.
pub const BLOB_PLAINTEXT_OFFSET: usize = BLOB_HEADER_SIZE;
/// Start of the encrypted secret region.
pub const BLOB_CIPHERTEXT_OFFSET: usize = BLOB_PLAINTEXT_OFFSET + PLAINTEXT_DATA_SIZE;
pub const BLOB_KEY_REQUEST_OFFSET: usize = BLOB_CIPHERTEXT_OFFSET + SECRET_DATA_SIZE;
pub const BLOB_KEY_REQUEST_SIZE: usize = CPU_SVN_SIZE + 2 + KEY_ID_SIZE;
pub const BLOB_NONCE_OFFSET: usize = BLOB_KEY_REQUEST_OFFSET + BLOB_KEY_REQUEST_SIZE;
pub const BLOB_NONCE_SIZE: usize = 12;
pub const BLOB_TAG_OFFSET: usize = BLOB_NONCE_OFFSET + BLOB_NONCE_SIZE;
pub const BLOB_TAG_SIZE: usize = 16;
/// Total size of a sealed attestation key blob.
pub const SEALED_BLOB_SIZE: usize = BLOB_TAG_OFFSET + BLOB_TAG_SIZE;

// =============================================================================
// Certification data types
// =============================================================================

/// PPID in clear, with CPUSVN, PCE ISVSVN and PCE id.
pub const CERT_DATA_TYPE_PPID_CLEARTEXT: u16 = 1;
pub const CERT_DATA_TYPE_PPID_RSA2048_ENCRYPTED: u16 = 2;
/// RSA-3072 encrypted PPID, with CPUSVN, PCE ISVSVN and PCE id.
pub const CERT_DATA_TYPE_PPID_RSA3072_ENCRYPTED: u16 = 3;
/// PCK certificate chain in PEM.
pub const CERT_DATA_TYPE_PCK_CHAIN: u16 = 5;
pub const CERT_DATA_TYPE_MAX: u16 = 16;

pub const MAX_CERT_DATA_SIZE: usize = 4098 * 3;

/// Encrypted PPID | CPUSVN | PCE ISVSVN | PCE ID
pub const PPID_RSA3072_CERT_INFO_SIZE: usize = RSA_3072_MOD_SIZE + CPU_SVN_SIZE + 4;
/// PPID | CPUSVN | PCE ISVSVN | PCE ID
pub const PPID_CLEARTEXT_CERT_INFO_SIZE: usize = PPID_SIZE + CPU_SVN_SIZE + 4;

/// Crypto suite used by the PCE to encrypt the PPID.
pub const PCE_ALG_RSA_OAEP_3072: u8 = 1;

/// RSA-3072 public exponent of the PPID encryption key, big endian.
pub const PPID_ENCRYPTION_KEY_E: [u8; RSA_3072_EXP_SIZE] = [0x00, 0x01, 0x00, 0x01];

/// Modulus of the verifier owned PPID encryption key, big endian.
pub const PPID_ENCRYPTION_KEY_N: [u8; RSA_3072_MOD_SIZE] = hex_literal::hex!(
    "d396f9434311001c69449c3bfdee8f38cd95cdad74097c87f1a765024c87c157"
    "30a5c9a6a4ccf91d62181e00a674275859ca1b1df5310ef2d5e1793739943d3d"
    "e2509312d603e5193a48f0ae0c37eee05727bdec171b0f3986065420748434be"
    "34fa716fa1f54c9a520fc4bc2d7a2e17e35da20eca390798a9051a34fb8f609c"
    "3a1e26300bf3f34940d9f75dcbd1bf578de52dce985735f193c3192e805537ab"
    "8d6408dae6dd64b462838d43aad27bc263aa97deed0992d6885686cd08230327"
    "9a787cf43612f5b1e61d54ab8869ff184fdc87ee34a668b18167b6ce0a7014bc"
    "b3e18d761c73de00ab41ca4051536304c3630bca62daaa9ce501b7c00f7e0bb0"
    "bee9f80db3b664fdcd95179c578eecc4ac8b36015e4c6d1e2149a01dde04396b"
    "346844ea0676e08d1fa2c02605cc91bea317c8754685103916508e0243983170"
    "69d8347182e74826cdc182d3eb6fe958e70677101fdf497630a76842b016d7da"
    "9275d57f2e7543ac83b01fc39019ceaa94d02e5a6c1372e7a6b5c04581e35327"
);

// =============================================================================
// Intel vendor ID
// =============================================================================

pub const INTEL_VENDOR_ID: [u8; 16] = hex_literal::hex!("939A7233F79C4CA9940A0DB3957F0607");

// =============================================================================
// QuoteHeader field sizes
// =============================================================================

pub const HEADER_VERSION_SIZE: usize = 2;
pub const HEADER_ATTESTATION_KEY_TYPE_SIZE: usize = 2;
pub const HEADER_ATT_KEY_DATA_SIZE: usize = 4;
pub const HEADER_QE_SVN_SIZE: usize = 2;
pub const HEADER_PCE_SVN_SIZE: usize = 2;
pub const HEADER_QE_VENDOR_ID_SIZE: usize = 16;
pub const HEADER_USER_DATA_SIZE: usize = 20;

// QuoteHeader field offsets (derived from sizes)
pub const HEADER_VERSION_OFFSET: usize = 0;
pub const HEADER_ATTESTATION_KEY_TYPE_OFFSET: usize = HEADER_VERSION_OFFSET + HEADER_VERSION_SIZE;
pub const HEADER_ATT_KEY_DATA_OFFSET: usize =
    HEADER_ATTESTATION_KEY_TYPE_OFFSET + HEADER_ATTESTATION_KEY_TYPE_SIZE;
pub const HEADER_QE_SVN_OFFSET: usize = HEADER_ATT_KEY_DATA_OFFSET + HEADER_ATT_KEY_DATA_SIZE;
pub const HEADER_PCE_SVN_OFFSET: usize = HEADER_QE_SVN_OFFSET + HEADER_QE_SVN_SIZE;
pub const HEADER_QE_VENDOR_ID_OFFSET: usize = HEADER_PCE_SVN_OFFSET + HEADER_PCE_SVN_SIZE;
pub const HEADER_USER_DATA_OFFSET: usize = HEADER_QE_VENDOR_ID_OFFSET + HEADER_QE_VENDOR_ID_SIZE;

// =============================================================================
// QuoteV3 constants
// =============================================================================

pub const QE_QUOTE_VERSION: u16 = 3;

/// Everything before the signature data length is covered by the quote signature.
pub const QUOTE_SIGNED_SIZE: usize = QUOTE_HEADER_SIZE + QUOTE_BODY_SIZE;
pub const SIGNATURE_DATA_LEN_OFFSET: usize = QUOTE_SIGNED_SIZE;
pub const SIGNATURE_DATA_LEN_SIZE: usize = 4;
/// Header, body and signature data length field.
pub const QUOTE_FIXED_SIZE: usize = QUOTE_SIGNED_SIZE + SIGNATURE_DATA_LEN_SIZE;

// ECDSA signature data = sig | attestation key | QE report body | QE report signature
pub const SIG_DATA_SIGNATURE_OFFSET: usize = 0;
pub const SIG_DATA_ATTESTATION_KEY_OFFSET: usize = ECDSA_SIGNATURE_SIZE;
pub const SIG_DATA_QE_REPORT_OFFSET: usize = SIG_DATA_ATTESTATION_KEY_OFFSET + ATTESTATION_KEY_SIZE;
pub const SIG_DATA_QE_REPORT_SIG_OFFSET: usize = SIG_DATA_QE_REPORT_OFFSET + REPORT_BODY_SIZE;
pub const ECDSA_SIG_DATA_SIZE: usize = SIG_DATA_QE_REPORT_SIG_OFFSET + ECDSA_SIGNATURE_SIZE;

// =============================================================================
// QeAuthenticationData / QeCertificationData field sizes
// =============================================================================

pub const AUTH_DATA_SIZE_FIELD: usize = 2;
pub const CERT_DATA_TYPE_FIELD_SIZE: usize = 2;
pub const CERT_DATA_SIZE_FIELD: usize = 4;
/// Certification data type (u16) and size (u32) fields.
pub const CERT_DATA_HEADER_SIZE: usize = CERT_DATA_TYPE_FIELD_SIZE + CERT_DATA_SIZE_FIELD;

// =============================================================================
// Attestation key types
// =============================================================================

/// ECDSA-256-with-P-256 curve attestation key type
pub const ATTESTATION_KEY_TYPE_ECDSA_256_P256: u16 = 2;
