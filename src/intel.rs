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

pub mod blob;
pub mod certification;
pub mod constants;
pub mod keys;
pub mod lifecycle;
pub mod quote;
pub mod report;
#[cfg(feature = "cleartext-ppid")]
pub mod session;

pub use blob::{read_plaintext, EvidenceSubject, PlaintextData, SecretData, UnsealedBlob};
pub use certification::{ecdsa_id, PceEncryptionKey, PpidEvidence};
pub use keys::{AttestationKeyPair, PlatformId};
pub use lifecycle::VerifiedBlob;
pub use quote::{Quote, QuoteNonce, SignedQuote};
pub use report::{CpuSvn, KeyId, Measurement, Report, ReportBody, ReportData, TargetInfo, TrustState};
#[cfg(feature = "cleartext-ppid")]
pub use session::PpidDecryptionSession;
