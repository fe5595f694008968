// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The [BBS (Boneh-Boyen-Shacham) Signature Scheme](https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bbs-signatures-05)
//! over BLS12-381, extended for termwise selective disclosure.
//!
//! A single signature covers a list of messages, one per RDF term. Proofs of knowledge of a
//! signature disclose a subset of the messages and keep the rest hidden. On top of the draft's
//! proof this module supports:
//! - **Batches**: several proofs answering one Fiat-Shamir challenge, so that they can only be
//!   verified together.
//! - **Equivalences**: hidden messages, possibly of different proofs, proven equal without
//!   being disclosed.
//! - **Ranges**: hidden integer messages proven to lie in a closed interval.

/// Ciphersuites (SHA-256 and SHAKE-256 based)
pub mod ciphersuites;
/// Generators derivation
pub mod generators;
/// Key generation and encoding
pub mod keys;
/// Proofs of knowledge of a signature
pub mod proof;
/// Range proofs bound to hidden messages
pub mod range;
/// Signature generation and verification
pub mod signature;

#[cfg(test)]
mod tests;
