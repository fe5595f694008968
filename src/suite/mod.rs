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

//! Signing, selective disclosure and verification of linked data documents.
//!
//! A [`BbsSuite`] signs the canonical statements of a document together with the statements of
//! its proof metadata. A holder derives, from one or more signed documents, revealed documents
//! whose hidden identifiers are replaced by `urn:anon:` placeholders and whose range-constrained
//! integers are replaced by `urn:range:[min,max]` markers. All derived proofs of a batch share one
//! challenge, so they are verified together.

pub mod anonymizer;
pub mod document;
pub mod nonce;
pub mod range;
pub mod resolver;
pub mod reveal;
pub mod skolem;

mod derive;
mod signature;
mod verify;

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

pub use self::{
    document::{DerivedProof, DerivedRdfProof, InputDocument, OneOrMany, ProofOptions, RdfInputDocument, VerificationResult},
    resolver::{AssertionProofPurpose, KeyRegistry, ProofPurpose, VerificationMethod, VerificationMethodResolver},
};
use crate::{
    bbsplus::ciphersuites::BbsCiphersuite,
    errors::Error,
    rdf::{
        canonicalize::{Canonicalizer, JsonCanonicalizer},
        encoding::{Stringwise, TermEncoding, Termwise},
        frame::{Framer, SubtreeFramer},
        statement::Statement,
    },
};

pub const SIGNATURE_TYPE: &str = "BbsTermwiseSignature2021";
pub const SIGNATURE_TYPE_IRI: &str = "https://zkp-ld.org/security#BbsTermwiseSignature2021";
pub const PROOF_TYPE: &str = "BbsTermwiseSignatureProof2021";
pub const PROOF_TYPE_IRI: &str = "https://zkp-ld.org/security#BbsTermwiseSignatureProof2021";

const TYPE_PAIRS: [(&str, &str); 2] = [(SIGNATURE_TYPE, PROOF_TYPE), (SIGNATURE_TYPE_IRI, PROOF_TYPE_IRI)];

/// Derived proof type of a signature type.
pub fn derived_proof_type(signature_type: &str) -> Result<&'static str, Error> {
    TYPE_PAIRS
        .iter()
        .find(|(s, _)| *s == signature_type)
        .map(|(_, p)| *p)
        .ok_or_else(|| Error::IncompatibleProofType {
            expected: TYPE_PAIRS.iter().map(|(s, _)| s.to_string()).collect(),
            received: signature_type.to_owned(),
        })
}

/// Signature type a derived proof type was derived from.
pub fn signature_type(proof_type: &str) -> Result<&'static str, Error> {
    TYPE_PAIRS
        .iter()
        .find(|(_, p)| *p == proof_type)
        .map(|(s, _)| *s)
        .ok_or_else(|| Error::IncompatibleProofType {
            expected: TYPE_PAIRS.iter().map(|(_, p)| p.to_string()).collect(),
            received: proof_type.to_owned(),
        })
}

/// Proofs whose type `accept` maps into this suite, in document order. Proofs of other suites
/// are skipped; when none is left the first rejection is returned.
pub(crate) fn supported_proofs<'a>(
    proofs: &'a [ProofOptions],
    accept: fn(&str) -> Result<&'static str, Error>,
) -> Result<Vec<&'a ProofOptions>, Error> {
    let mut rejection = None;
    let mut supported = Vec::with_capacity(proofs.len());
    for proof in proofs {
        match accept(&proof.type_) {
            Ok(_) => supported.push(proof),
            Err(e) => {
                log::debug!("skipping proof by {}: {}", proof.verification_method, e);
                if rejection.is_none() {
                    rejection = Some(e);
                }
            }
        }
    }
    match rejection {
        Some(e) if supported.is_empty() => Err(e),
        _ if supported.is_empty() => Err(Error::MissingProof),
        _ => Ok(supported),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuiteOptions {
    /// Length in bytes of the nonce drawn when the holder supplies none.
    pub nonce_length: usize,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            nonce_length: nonce::DEFAULT_NONCE_LENGTH,
        }
    }
}

/// Signature and proof suite over the ciphersuite `CS`, breaking statements into messages
/// with `E`.
#[derive(Clone, Debug)]
pub struct BbsSuite<CS, E = Termwise, C = JsonCanonicalizer, F = SubtreeFramer>
where
    CS: BbsCiphersuite,
    E: TermEncoding,
    C: Canonicalizer,
    F: Framer,
{
    canonicalizer: C,
    framer: F,
    options: SuiteOptions,
    _marker: PhantomData<(CS, E)>,
}

pub type TermwiseSuite<CS> = BbsSuite<CS, Termwise>;
pub type StringwiseSuite<CS> = BbsSuite<CS, Stringwise>;

impl<CS, E, C, F> Default for BbsSuite<CS, E, C, F>
where
    CS: BbsCiphersuite,
    E: TermEncoding,
    C: Canonicalizer + Default,
    F: Framer + Default,
{
    fn default() -> Self {
        Self::new(C::default(), F::default(), SuiteOptions::default())
    }
}

impl<CS, E, C, F> BbsSuite<CS, E, C, F>
where
    CS: BbsCiphersuite,
    E: TermEncoding,
    C: Canonicalizer,
    F: Framer,
{
    pub fn new(canonicalizer: C, framer: F, options: SuiteOptions) -> Self {
        Self {
            canonicalizer,
            framer,
            options,
            _marker: PhantomData,
        }
    }

    pub fn options(&self) -> &SuiteOptions {
        &self.options
    }

    pub fn canonicalizer(&self) -> &C {
        &self.canonicalizer
    }

    fn proof_statements(&self, proof: &ProofOptions) -> Result<Vec<Statement>, Error> {
        self.canonicalizer.canonicalize_proof(&proof.to_value()?)
    }

    /// Messages of the proof statements followed by those of the document statements.
    fn messages<'a>(
        proof_statements: &'a [Statement],
        document_statements: &'a [Statement],
    ) -> Result<Vec<Vec<u8>>, Error> {
        E::encode_all(proof_statements.iter().chain(document_statements))
    }
}
