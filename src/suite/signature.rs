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

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use super::{
    derived_proof_type,
    document::{embed_proofs, split_proofs, ProofOptions, VerificationResult},
    resolver::{ProofPurpose, VerificationMethodResolver},
    supported_proofs, BbsSuite,
};
use crate::{
    bbsplus::{ciphersuites::BbsCiphersuite, signature::BBSplusSignature},
    errors::Error,
    keys::pair::KeyPair,
    rdf::{canonicalize::Canonicalizer, encoding::TermEncoding, frame::Framer},
    schemes::algorithms::BBSplus,
};

pub(crate) fn decode_signature(proof: &ProofOptions) -> Result<BBSplusSignature, Error> {
    let value = proof
        .proof_value
        .as_deref()
        .ok_or_else(|| Error::InvalidProofValue("missing proofValue".to_owned()))?;
    let bytes = STANDARD
        .decode(value)
        .map_err(|_| Error::InvalidProofValue("signature is not base64".to_owned()))?;
    BBSplusSignature::from_bytes(&bytes)
}

impl<CS, E, C, F> BbsSuite<CS, E, C, F>
where
    CS: BbsCiphersuite,
    E: TermEncoding,
    C: Canonicalizer,
    F: Framer,
{
    /// Signs `document` and appends the proof to the proofs it already carries.
    pub fn sign(&self, document: &Value, options: &ProofOptions, keypair: &KeyPair<BBSplus<CS>>) -> Result<Value, Error> {
        derived_proof_type(&options.type_)?;
        let mut proof = ProofOptions {
            nonce: None,
            proof_value: None,
            ..options.clone()
        };

        let (body, mut proofs) = split_proofs(document)?;
        let proof_statements = self.proof_statements(&proof)?;
        let document_statements = self.canonicalizer.canonicalize(&body)?;
        let messages = Self::messages(&proof_statements, &document_statements)?;

        let signature = BBSplusSignature::sign::<CS>(&messages, keypair.private_key(), keypair.public_key(), None)?;
        log::info!(
            "signed {} {} messages with {}",
            messages.len(),
            E::NAME,
            proof.verification_method
        );

        proof.proof_value = Some(STANDARD.encode(signature.to_bytes()));
        proofs.push(proof);
        embed_proofs(body, proofs)
    }

    /// Checks every signature carried by `document`. Never fails: errors are reported in the
    /// result.
    pub fn verify_signature<R, P>(&self, document: &Value, resolver: &R, purpose: &P) -> VerificationResult
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        let result = self.try_verify_signature(document, resolver, purpose);
        if let Err(e) = &result {
            log::warn!("signature verification failed: {}", e);
        }
        result.into()
    }

    fn try_verify_signature<R, P>(&self, document: &Value, resolver: &R, purpose: &P) -> Result<(), Error>
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        let (body, proofs) = split_proofs(document)?;
        if proofs.is_empty() {
            return Err(Error::MissingProof);
        }
        let document_statements = self.canonicalizer.canonicalize(&body)?;

        let supported = supported_proofs(&proofs, derived_proof_type)?;
        for &proof in &supported {
            let method = resolver.resolve(&proof.verification_method)?;
            method.ensure_active()?;
            purpose.validate(proof, &method)?;

            let signature = decode_signature(proof)?;
            let proof_statements = self.proof_statements(proof)?;
            let messages = Self::messages(&proof_statements, &document_statements)?;
            signature.verify::<CS>(&method.public_key, &messages, None)?;
        }
        log::debug!("verified {} of {} signatures", supported.len(), proofs.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        bbsplus::ciphersuites::Bls12381Sha256,
        suite::{
            resolver::{AssertionProofPurpose, KeyRegistry},
            StringwiseSuite, TermwiseSuite, SIGNATURE_TYPE,
        },
    };

    const METHOD: &str = "did:example:issuer#bbs-key-1";

    fn setup() -> (KeyPair<BBSplus<Bls12381Sha256>>, KeyRegistry, ProofOptions) {
        let keypair = KeyPair::<BBSplus<Bls12381Sha256>>::random().unwrap();
        let mut registry = KeyRegistry::new();
        registry.register(METHOD, keypair.public_key().clone());
        let options = ProofOptions::new(SIGNATURE_TYPE, METHOD, "assertionMethod").created("2025-01-01T00:00:00Z");
        (keypair, registry, options)
    }

    fn person() -> Value {
        json!({ "id": "did:example:alice", "type": "Person", "name": "Alice", "age": 25 })
    }

    #[test]
    fn sign_and_verify() {
        let (keypair, registry, options) = setup();
        let suite = TermwiseSuite::<Bls12381Sha256>::default();

        let signed = suite.sign(&person(), &options, &keypair).unwrap();
        assert!(signed["proof"]["proofValue"].is_string());
        assert_eq!(suite.verify_signature(&signed, &registry, &AssertionProofPurpose), VerificationResult::success());

        let mut tampered = signed.clone();
        tampered["age"] = json!(26);
        assert!(!suite.verify_signature(&tampered, &registry, &AssertionProofPurpose).verified);
    }

    #[test]
    fn several_proofs_on_one_document() {
        let (keypair, registry, options) = setup();
        let suite = StringwiseSuite::<Bls12381Sha256>::default();

        let signed = suite.sign(&person(), &options, &keypair).unwrap();
        let signed = suite.sign(&signed, &options.clone().created("2025-02-01T00:00:00Z"), &keypair).unwrap();
        assert_eq!(signed["proof"].as_array().map(Vec::len), Some(2));
        assert!(suite.verify_signature(&signed, &registry, &AssertionProofPurpose).verified);
    }

    #[test]
    fn foreign_proofs_are_ignored() {
        let (keypair, registry, options) = setup();
        let suite = TermwiseSuite::<Bls12381Sha256>::default();

        let signed = suite.sign(&person(), &options, &keypair).unwrap();
        let (body, mut proofs) = split_proofs(&signed).unwrap();
        let mut foreign = ProofOptions::new("Ed25519Signature2020", "did:example:other#key-1", "assertionMethod");
        foreign.proof_value = Some("z58DAdFfa9SkqZMVPxAQpic7ndSayn1PzZs6ZjWp1CktyGesjuTSwRdo".to_owned());
        proofs.insert(0, foreign.clone());
        let mixed = embed_proofs(body, proofs).unwrap();
        assert!(suite.verify_signature(&mixed, &registry, &AssertionProofPurpose).verified);

        let only_foreign = embed_proofs(person(), vec![foreign]).unwrap();
        let result = suite.verify_signature(&only_foreign, &registry, &AssertionProofPurpose);
        assert!(result.error.unwrap().starts_with("incompatible proof type"));
    }

    #[test]
    fn rejections() {
        let (keypair, mut registry, options) = setup();
        let suite = TermwiseSuite::<Bls12381Sha256>::default();

        let wrong_type = ProofOptions::new("Ed25519Signature2020", METHOD, "assertionMethod");
        assert!(matches!(
            suite.sign(&person(), &wrong_type, &keypair),
            Err(Error::IncompatibleProofType { .. })
        ));

        let unsigned = suite.verify_signature(&person(), &registry, &AssertionProofPurpose);
        assert_eq!(unsigned.error, Some(Error::MissingProof.to_string()));

        let signed = suite.sign(&person(), &options, &keypair).unwrap();
        registry.revoke(METHOD);
        let revoked = suite.verify_signature(&signed, &registry, &AssertionProofPurpose);
        assert_eq!(revoked.error, Some(Error::VerificationMethodRevoked(METHOD.to_owned()).to_string()));
    }
}
