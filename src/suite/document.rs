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

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::Error,
    rdf::{statement::Statement, term::Term},
};

pub const PROOF_KEY: &str = "proof";

/// Proof metadata attached to a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOptions {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub verification_method: String,
    pub proof_purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,
}

impl ProofOptions {
    pub fn new(type_: impl Into<String>, verification_method: impl Into<String>, proof_purpose: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            created: None,
            verification_method: verification_method.into(),
            proof_purpose: proof_purpose.into(),
            nonce: None,
            proof_value: None,
        }
    }

    pub fn created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    pub(crate) fn to_value(&self) -> Result<Value, Error> {
        serde_json::to_value(self).map_err(|e| Error::DeserializationError(e.to_string()))
    }
}

/// A single value or an array of values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(item) => std::slice::from_ref(item),
            Self::Many(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(mut items: Vec<T>) -> Self {
        if items.len() == 1 {
            if let Some(item) = items.pop() {
                return Self::One(item);
            }
        }
        Self::Many(items)
    }
}

/// A signed document, its proofs and what to disclose of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDocument {
    pub document: Value,
    pub proof: OneOrMany<ProofOptions>,
    pub reveal_document: Value,
}

impl InputDocument {
    pub fn from_signed(signed: &Value, reveal_document: Value) -> Result<Self, Error> {
        let (document, proofs) = split_proofs(signed)?;
        Ok(Self {
            document,
            proof: proofs.into(),
            reveal_document,
        })
    }
}

/// A revealed document with its derived proofs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedProof {
    pub document: Value,
    pub proof: OneOrMany<ProofOptions>,
}

impl DerivedProof {
    /// The revealed document with the proofs embedded under `proof`.
    pub fn to_document(&self) -> Result<Value, Error> {
        embed_proofs(self.document.clone(), self.proof.as_slice().to_vec())
    }

    pub fn from_document(document: &Value) -> Result<Self, Error> {
        let (document, proofs) = split_proofs(document)?;
        Ok(Self {
            document,
            proof: proofs.into(),
        })
    }
}

/// Statements of a signed document, its proofs and the statements to disclose.
#[derive(Clone, Debug, PartialEq)]
pub struct RdfInputDocument {
    /// Canonical statements covered by the signatures, in signing order.
    pub document: Vec<Statement>,
    pub proof: OneOrMany<ProofOptions>,
    /// Statements to disclose, hidden terms replaced by placeholders.
    pub revealed_document: Vec<Statement>,
    /// Placeholder to the term it hides.
    pub anon_to_term: HashMap<String, Term>,
}

/// Revealed statements with their derived proofs.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedRdfProof {
    pub document: Vec<Statement>,
    pub proof: OneOrMany<ProofOptions>,
}

impl DerivedRdfProof {
    /// The revealed statements as N-Quads.
    pub fn to_nquads(&self) -> String {
        self.document.iter().map(ToString::to_string).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationResult {
    pub fn success() -> Self {
        Self {
            verified: true,
            error: None,
        }
    }

    pub fn failure(error: &Error) -> Self {
        Self {
            verified: false,
            error: Some(error.to_string()),
        }
    }
}

impl From<Result<(), Error>> for VerificationResult {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(e) => Self::failure(&e),
        }
    }
}

/// The document without its `proof` entry.
pub fn without_proof(document: &Value) -> Value {
    let mut document = document.clone();
    if let Value::Object(map) = &mut document {
        map.remove(PROOF_KEY);
    }
    document
}

/// Separates a document from the proofs embedded in it.
pub fn split_proofs(document: &Value) -> Result<(Value, Vec<ProofOptions>), Error> {
    let proofs = match document.get(PROOF_KEY) {
        None => Vec::new(),
        Some(proof) => serde_json::from_value::<OneOrMany<ProofOptions>>(proof.clone())
            .map_err(|e| Error::InvalidDocument(format!("invalid proof: {}", e)))?
            .into_vec(),
    };
    Ok((without_proof(document), proofs))
}

pub fn embed_proofs(document: Value, proofs: Vec<ProofOptions>) -> Result<Value, Error> {
    let Value::Object(mut map) = document else {
        return Err(Error::InvalidDocument("document must be an object".to_owned()));
    };
    let proof = serde_json::to_value(OneOrMany::from(proofs)).map_err(|e| Error::DeserializationError(e.to_string()))?;
    map.insert(PROOF_KEY.to_owned(), proof);
    Ok(Value::Object(map))
}

/// `base64(JSON(indexes)) + "." + base64(proof)`; an empty proof leaves the dotted head.
pub fn encode_proof_value(revealed_indexes: &[usize], proof: &[u8]) -> Result<String, Error> {
    let head = serde_json::to_vec(revealed_indexes).map_err(|e| Error::DeserializationError(e.to_string()))?;
    Ok(format!("{}.{}", STANDARD.encode(head), STANDARD.encode(proof)))
}

pub fn decode_proof_value(proof_value: &str) -> Result<(Vec<usize>, Vec<u8>), Error> {
    let invalid = |reason: &str| Error::InvalidProofValue(reason.to_owned());
    let (head, tail) = proof_value
        .split_once('.')
        .ok_or_else(|| invalid("missing separator"))?;
    if tail.contains('.') {
        return Err(invalid("too many separators"));
    }
    let head = STANDARD.decode(head).map_err(|_| invalid("revealed indexes are not base64"))?;
    let indexes: Vec<usize> = serde_json::from_slice(&head).map_err(|_| invalid("revealed indexes are not a JSON array"))?;
    let proof = STANDARD.decode(tail).map_err(|_| invalid("proof is not base64"))?;
    Ok((indexes, proof))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn proof_value_round_trip() {
        let value = encode_proof_value(&[0, 1, 4], &[1, 2, 3]).unwrap();
        assert_eq!(decode_proof_value(&value).unwrap(), (vec![0, 1, 4], vec![1, 2, 3]));
    }

    #[test]
    fn malformed_proof_values() {
        for value in ["abc", "a.b.c", "!!.AAAA", "e30=.AAAA"] {
            assert!(matches!(decode_proof_value(value), Err(Error::InvalidProofValue(_))), "{}", value);
        }
    }

    #[test]
    fn one_or_many_proofs() {
        let proof = ProofOptions::new("BbsTermwiseSignature2021", "did:example:issuer#key-1", "assertionMethod");
        let single = embed_proofs(json!({ "name": "Alice" }), vec![proof.clone()]).unwrap();
        assert!(single["proof"].is_object());
        assert_eq!(single["proof"]["verificationMethod"], "did:example:issuer#key-1");

        let double = embed_proofs(json!({ "name": "Alice" }), vec![proof.clone(), proof.clone()]).unwrap();
        let (document, proofs) = split_proofs(&double).unwrap();
        assert_eq!(document, json!({ "name": "Alice" }));
        assert_eq!(proofs, vec![proof.clone(), proof]);
    }
}
