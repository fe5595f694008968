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

use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Error during keypair generation: {0}")]
    KeyGenError(String),
    #[error("Invalid key")]
    KeyDeserializationError,
    #[error("Error during computation of a Signature: {0}")]
    SignatureGenerationError(String),
    #[error("Not a valid Signature")]
    InvalidSignature,
    #[error("Error during hash to scalar computation")]
    HashToScalarError,
    #[error("Not enough Generators")]
    NotEnoughGenerators,
    /// [More Info](https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bbs-signatures-06#name-coresign) in the `Note` at the end
    #[error(" A == Identity_G1")]
    G1IdentityError,
    #[error("Error during deserialization: {0}")]
    DeserializationError(String),
    #[error("Signature is not valid")]
    SignatureVerificationError,
    #[error("Failed to create proof: {0}")]
    ProofGenError(String),
    #[error("Invalid Proof of Knowledge of a Signature")]
    InvalidProofOfKnowledgeSignature,
    #[error("Proof of Knowledge of a Signature verification failed: {0}")]
    PoKSVerificationError(String),

    #[error("integer out of range: {0}")]
    IntegerOutOfRange(String),
    #[error("invalid statement: {0}")]
    InvalidStatement(String),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("invalid reveal document: {0}")]
    InvalidRevealDocument(String),
    #[error("Some statements in the reveal document not found in original proof: {0}")]
    StatementNotFound(String),
    #[error("incompatible proof type: expected one of {expected:?} received {received}")]
    IncompatibleProofType {
        expected: Vec<String>,
        received: String,
    },
    #[error("invalid proofValue: {0}")]
    InvalidProofValue(String),
    #[error("documents to be verified must have at least one proof")]
    MissingProof,
    #[error("all of the nonces must have the same values")]
    NonceMismatch,
    #[error("verification method not found: {0}")]
    VerificationMethodNotFound(String),
    #[error("The verification method has been revoked: {0}")]
    VerificationMethodRevoked(String),
    #[error("invalid proof purpose: {0}")]
    InvalidProofPurpose(String),
    #[error("invalid range marker: {0}")]
    InvalidRangeMarker(String),
    #[error("unsupported by the term encoding: {0}")]
    UnsupportedEncoding(String),
}
