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

use super::{
    anonymizer::{Coordinate, EquivalenceClasses},
    document::{decode_proof_value, without_proof, DerivedProof, DerivedRdfProof, ProofOptions, VerificationResult},
    nonce::{decode_nonce, extend_nonce},
    resolver::{ProofPurpose, VerificationMethodResolver},
    signature_type,
    skolem::deskolemize_statements,
    supported_proofs, BbsSuite,
};
use crate::{
    bbsplus::{
        ciphersuites::BbsCiphersuite,
        keys::BBSplusPublicKey,
        proof::{BBSplusPoKSignature, VerifyRequest},
        range::RangeConstraint,
    },
    errors::Error,
    rdf::{
        canonicalize::Canonicalizer,
        encoding::TermEncoding,
        frame::Framer,
        statement::Statement,
        term::TermKind,
    },
};

struct ProofVerification {
    nonce: String,
    proof: BBSplusPoKSignature,
    public_key: BBSplusPublicKey,
    messages: Vec<Vec<u8>>,
    disclosed_indexes: Vec<usize>,
    occurrences: Vec<(String, Coordinate)>,
    ranges: Vec<RangeConstraint>,
}

struct DocumentVerification {
    revealed_statements: Vec<Statement>,
    proofs: Vec<ProofVerification>,
}

impl<CS, E, C, F> BbsSuite<CS, E, C, F>
where
    CS: BbsCiphersuite,
    E: TermEncoding,
    C: Canonicalizer,
    F: Framer,
{
    /// Verifies a batch of derived proofs produced together. Never fails: errors are reported
    /// in the result, and the batch is rejected as a whole.
    pub fn verify_proof_multi<R, P>(&self, documents: &[DerivedProof], resolver: &R, purpose: &P) -> VerificationResult
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        let result = self.try_verify_proof_multi(documents, resolver, purpose);
        match &result {
            Ok(()) => log::info!("verified {} derived documents", documents.len()),
            Err(e) => log::warn!("proof verification failed: {}", e),
        }
        result.into()
    }

    /// [`Self::verify_proof_multi`] over a single document.
    pub fn verify_proof<R, P>(&self, document: &DerivedProof, resolver: &R, purpose: &P) -> VerificationResult
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        self.verify_proof_multi(std::slice::from_ref(document), resolver, purpose)
    }

    /// Verifies a batch of proofs derived with [`Self::derive_proof_multi_rdf`].
    pub fn verify_proof_multi_rdf<R, P>(
        &self,
        documents: &[DerivedRdfProof],
        resolver: &R,
        purpose: &P,
    ) -> VerificationResult
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        let batch = documents
            .iter()
            .map(|document| (document.document.clone(), document.proof.as_slice()))
            .collect();
        let result = self.verify_batch(batch, resolver, purpose);
        match &result {
            Ok(()) => log::info!("verified {} derived statement lists", documents.len()),
            Err(e) => log::warn!("proof verification failed: {}", e),
        }
        result.into()
    }

    fn try_verify_proof_multi<R, P>(&self, documents: &[DerivedProof], resolver: &R, purpose: &P) -> Result<(), Error>
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        let batch = documents
            .iter()
            .map(|document| {
                let revealed_statements = self.canonicalizer.canonicalize(&without_proof(&document.document))?;
                Ok((revealed_statements, document.proof.as_slice()))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        self.verify_batch(batch, resolver, purpose)
    }

    /// Revealed statements and proofs of each document, in batch order.
    fn verify_batch<R, P>(
        &self,
        documents: Vec<(Vec<Statement>, &[ProofOptions])>,
        resolver: &R,
        purpose: &P,
    ) -> Result<(), Error>
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        if documents.is_empty() {
            return Err(Error::InvalidDocument("no document to verify".to_owned()));
        }

        let records = documents.into_iter().try_fold(
            Vec::<DocumentVerification>::new(),
            |mut records, (revealed_statements, proofs)| {
                let offset = records.iter().map(|r| r.proofs.len()).sum();
                records.push(self.verify_document(offset, revealed_statements, proofs, resolver, purpose)?);
                Ok::<_, Error>(records)
            },
        )?;
        let proofs: Vec<&ProofVerification> = records.iter().flat_map(|r| &r.proofs).collect();

        let nonce = proofs.first().map(|p| p.nonce.as_str()).ok_or(Error::MissingProof)?;
        if proofs.iter().any(|p| p.nonce != nonce) {
            return Err(Error::NonceMismatch);
        }
        let extended = extend_nonce(
            &decode_nonce(nonce)?,
            records.iter().map(|r| r.revealed_statements.as_slice()),
        );

        let classes: EquivalenceClasses<&str> = proofs
            .iter()
            .flat_map(|p| p.occurrences.iter().map(|(id, c)| (id.as_str(), *c)))
            .collect();
        log::debug!(
            "verifying {} proofs, equivalence classes of sizes {:?}",
            proofs.len(),
            classes.class_sizes()
        );

        let requests: Vec<VerifyRequest<'_>> = proofs
            .iter()
            .map(|p| VerifyRequest {
                proof: &p.proof,
                public_key: &p.public_key,
                disclosed_messages: &p.messages,
                disclosed_indexes: &p.disclosed_indexes,
                ranges: &p.ranges,
                header: None,
            })
            .collect();
        BBSplusPoKSignature::proof_verify_multi::<CS>(&requests, &classes.into_table(), Some(extended.as_slice()))
    }

    fn verify_document<R, P>(
        &self,
        proof_offset: usize,
        revealed_statements: Vec<Statement>,
        proofs: &[ProofOptions],
        resolver: &R,
        purpose: &P,
    ) -> Result<DocumentVerification, Error>
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        if proofs.is_empty() {
            return Err(Error::MissingProof);
        }
        let signed_statements = deskolemize_statements(&revealed_statements);

        let proofs = supported_proofs(proofs, signature_type)?
            .into_iter()
            .enumerate()
            .map(|(j, proof)| self.verify_proof_metadata(proof_offset + j, proof, &signed_statements, resolver, purpose))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(DocumentVerification {
            revealed_statements,
            proofs,
        })
    }

    fn verify_proof_metadata<R, P>(
        &self,
        proof_index: usize,
        proof: &ProofOptions,
        document_statements: &[Statement],
        resolver: &R,
        purpose: &P,
    ) -> Result<ProofVerification, Error>
    where
        R: VerificationMethodResolver,
        P: ProofPurpose,
    {
        let signed_type = signature_type(&proof.type_)?;
        let nonce = proof
            .nonce
            .clone()
            .ok_or_else(|| Error::InvalidProofValue("missing nonce".to_owned()))?;
        let proof_value = proof
            .proof_value
            .as_deref()
            .ok_or_else(|| Error::InvalidProofValue("missing proofValue".to_owned()))?;
        let (indexes, bytes) = decode_proof_value(proof_value)?;
        let zk = BBSplusPoKSignature::from_bytes(&bytes)?;

        let proof_statements = self.proof_statements(&ProofOptions {
            type_: signed_type.to_owned(),
            nonce: None,
            proof_value: None,
            ..proof.clone()
        })?;
        let statements: Vec<&Statement> = proof_statements.iter().chain(document_statements).collect();
        if indexes.len() != statements.len() {
            return Err(Error::InvalidProofValue(format!(
                "{} revealed indexes for {} statements",
                indexes.len(),
                statements.len()
            )));
        }

        // statements in signing order
        let mut ordered: Vec<(usize, &Statement)> = indexes.into_iter().zip(statements).collect();
        ordered.sort_by_key(|(i, _)| *i);
        if ordered.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(Error::InvalidProofValue("repeated revealed index".to_owned()));
        }
        let revealed: Vec<usize> = ordered.iter().map(|(i, _)| *i).collect();
        let messages = E::encode_all(ordered.iter().map(|(_, s)| *s))?;
        let disclosed_indexes = E::message_indexes(&revealed)?;

        let mut occurrences = Vec::new();
        let mut ranges = Vec::new();
        if E::binds_terms() {
            let terms = ordered.iter().flat_map(|&(_, s)| s.terms());
            for (term, &index) in terms.zip(&disclosed_indexes) {
                match term.kind()? {
                    TermKind::Anonymized(id) => occurrences.push((id, (proof_index, index))),
                    TermKind::RangeMarker { min, max } => ranges.push(RangeConstraint::new(index, min, max)),
                    TermKind::Plain | TermKind::SkolemizedBlank { .. } => {}
                }
            }
        }
        log::debug!(
            "proof {}: statements {:?}, {} hidden occurrences, {} ranges",
            proof_index,
            revealed,
            occurrences.len(),
            ranges.len()
        );

        let method = resolver.resolve(&proof.verification_method)?;
        method.ensure_active()?;
        purpose.validate(proof, &method)?;

        Ok(ProofVerification {
            nonce,
            proof: zk,
            public_key: method.public_key,
            messages,
            disclosed_indexes,
            occurrences,
            ranges,
        })
    }
}
