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

use std::collections::BTreeSet;

use serde_json::Value;

use super::{
    anonymizer::{deanonymize_statement, Anonymizer, Coordinate, EquivalenceClasses},
    derived_proof_type,
    document::{
        encode_proof_value, without_proof, DerivedProof, DerivedRdfProof, InputDocument, OneOrMany, ProofOptions,
        RdfInputDocument,
    },
    nonce::{encode_nonce, extend_nonce, generate_nonce},
    range::RangeSpec,
    resolver::VerificationMethodResolver,
    reveal::get_indices,
    signature::decode_signature,
    skolem::{skolem_names, skolemize_document, skolemize_statements},
    supported_proofs, BbsSuite,
};
use crate::{
    bbsplus::{
        ciphersuites::BbsCiphersuite,
        keys::BBSplusPublicKey,
        proof::{BBSplusPoKSignature, ProofRequest},
        range::RangeConstraint,
        signature::BBSplusSignature,
    },
    errors::Error,
    rdf::{
        canonicalize::Canonicalizer,
        encoding::TermEncoding,
        frame::Framer,
        statement::Statement,
        term::{range_marker, Term, TermKind},
    },
};

/// Position of the object among the messages of a statement.
const OBJECT_POSITION: usize = 2;

fn proof_gen_error(e: Error) -> Error {
    match e {
        Error::ProofGenError(_) => e,
        other => Error::ProofGenError(other.to_string()),
    }
}

/// Everything the batch needs from one proof of one document.
#[derive(Debug)]
struct ProofDerivation {
    skeleton: ProofOptions,
    revealed_statements: Vec<usize>,
    signature: BBSplusSignature,
    public_key: BBSplusPublicKey,
    messages: Vec<Vec<u8>>,
    disclosed_messages: Vec<usize>,
    first_document_message: usize,
    occurrences: Vec<(usize, Coordinate)>,
    ranges: Vec<RangeConstraint>,
}

impl ProofDerivation {
    fn revealed_messages(&self) -> BTreeSet<usize> {
        self.disclosed_messages.iter().copied().collect()
    }
}

#[derive(Debug)]
struct DocumentDerivation<D> {
    document: D,
    revealed_statements: Vec<Statement>,
    proofs: Vec<ProofDerivation>,
}

impl<CS, E, C, F> BbsSuite<CS, E, C, F>
where
    CS: BbsCiphersuite,
    E: TermEncoding,
    C: Canonicalizer,
    F: Framer,
{
    /// Derives one revealed document per input, with proofs bound together under one challenge.
    ///
    /// Every value equal to one of `hidden_uris` is replaced by a placeholder shared across the
    /// batch, and the proof shows that all of its occurrences hide the same value. Blank nodes
    /// are always replaced by placeholders. Without `nonce`, a fresh one is drawn.
    ///
    /// Proofs of other suites are left out of the derived documents. The batch fails as a whole:
    /// an error on any document yields no proof at all.
    pub fn derive_proof_multi<R>(
        &self,
        inputs: &[InputDocument],
        hidden_uris: &[&str],
        nonce: Option<&[u8]>,
        resolver: &R,
    ) -> Result<Vec<DerivedProof>, Error>
    where
        R: VerificationMethodResolver,
    {
        if inputs.is_empty() {
            return Err(Error::InvalidDocument("no document to derive a proof from".to_owned()));
        }
        let supported = inputs
            .iter()
            .map(|input| supported_proofs(input.proof.as_slice(), derived_proof_type))
            .collect::<Result<Vec<_>, Error>>()?;
        if !E::binds_terms() && !hidden_uris.is_empty() {
            return Err(Error::UnsupportedEncoding(format!(
                "{} encoding cannot hide single terms",
                E::NAME
            )));
        }
        log::info!(
            "deriving {} proofs over {} documents",
            supported.iter().map(Vec::len).sum::<usize>(),
            inputs.len()
        );

        let nonce = nonce
            .map(<[u8]>::to_vec)
            .unwrap_or_else(|| generate_nonce(self.options.nonce_length));

        let canonical = inputs
            .iter()
            .map(|input| self.canonicalizer.canonicalize(&without_proof(&input.document)))
            .collect::<Result<Vec<_>, Error>>()?;

        let skolemized: Vec<String> = if E::binds_terms() {
            canonical
                .iter()
                .enumerate()
                .flat_map(|(i, statements)| skolem_names(&skolemize_statements(statements, i)))
                .collect()
        } else {
            Vec::new()
        };
        let anonymizer = Anonymizer::new(hidden_uris.iter().map(|uri| uri.to_string()).chain(skolemized));

        let records = inputs.iter().zip(&supported).zip(&canonical).enumerate().try_fold(
            Vec::<DocumentDerivation<Value>>::with_capacity(inputs.len()),
            |mut records, (i, ((input, proofs), statements))| {
                let offset = records.iter().map(|r| r.proofs.len()).sum();
                records.push(self.derive_document(i, offset, input, proofs, statements, &anonymizer, &nonce, resolver)?);
                Ok::<_, Error>(records)
            },
        )?;

        Ok(Self::prove_batch(records, &nonce)?
            .into_iter()
            .map(|(document, proof)| DerivedProof { document, proof })
            .collect())
    }

    /// [`Self::derive_proof_multi`] over a single document.
    pub fn derive_proof<R>(
        &self,
        input: &InputDocument,
        hidden_uris: &[&str],
        nonce: Option<&[u8]>,
        resolver: &R,
    ) -> Result<DerivedProof, Error>
    where
        R: VerificationMethodResolver,
    {
        self.derive_proof_multi(std::slice::from_ref(input), hidden_uris, nonce, resolver)?
            .pop()
            .ok_or_else(|| Error::ProofGenError("no proof derived".to_owned()))
    }

    /// Derives proofs for statements the holder already selected and anonymized.
    ///
    /// Each revealed statement, once the terms of `anon_to_term` are restored, must be one of
    /// the document statements. Placeholders are `urn:anon:` or
    /// `https://zkp-ld.org/.well-known/genid/anonymous/` IRIs, or literals with such a value.
    /// The same placeholder in several documents proves that they hide the same term.
    pub fn derive_proof_multi_rdf<R>(
        &self,
        inputs: &[RdfInputDocument],
        nonce: Option<&[u8]>,
        resolver: &R,
    ) -> Result<Vec<DerivedRdfProof>, Error>
    where
        R: VerificationMethodResolver,
    {
        if inputs.is_empty() {
            return Err(Error::InvalidDocument("no document to derive a proof from".to_owned()));
        }
        let supported = inputs
            .iter()
            .map(|input| supported_proofs(input.proof.as_slice(), derived_proof_type))
            .collect::<Result<Vec<_>, Error>>()?;
        if !E::binds_terms() && inputs.iter().any(|input| !input.anon_to_term.is_empty()) {
            return Err(Error::UnsupportedEncoding(format!(
                "{} encoding cannot hide single terms",
                E::NAME
            )));
        }
        log::info!(
            "deriving {} proofs over {} statement lists",
            supported.iter().map(Vec::len).sum::<usize>(),
            inputs.len()
        );

        let nonce = nonce
            .map(<[u8]>::to_vec)
            .unwrap_or_else(|| generate_nonce(self.options.nonce_length));

        let mut placeholders = Vec::new();
        let records = inputs.iter().zip(&supported).try_fold(
            Vec::<DocumentDerivation<Vec<Statement>>>::with_capacity(inputs.len()),
            |mut records, (input, proofs)| {
                let offset = records.iter().map(|r| r.proofs.len()).sum();
                records.push(self.derive_statements(offset, input, proofs, &mut placeholders, &nonce, resolver)?);
                Ok::<_, Error>(records)
            },
        )?;

        Ok(Self::prove_batch(records, &nonce)?
            .into_iter()
            .map(|(document, proof)| DerivedRdfProof { document, proof })
            .collect())
    }

    /// Runs the batch proof and attaches each proof value to its skeleton.
    fn prove_batch<D>(
        records: Vec<DocumentDerivation<D>>,
        nonce: &[u8],
    ) -> Result<Vec<(D, OneOrMany<ProofOptions>)>, Error> {
        let extended = extend_nonce(nonce, records.iter().map(|r| r.revealed_statements.as_slice()));
        let proofs: Vec<&ProofDerivation> = records.iter().flat_map(|r| &r.proofs).collect();
        let classes: EquivalenceClasses<usize> = proofs
            .iter()
            .flat_map(|p| p.occurrences.iter().copied())
            .collect();
        log::debug!(
            "equivalence classes of sizes {:?}, {} range constraints",
            classes.class_sizes(),
            proofs.iter().map(|p| p.ranges.len()).sum::<usize>()
        );

        let requests: Vec<ProofRequest<'_>> = proofs
            .iter()
            .map(|p| ProofRequest {
                signature: &p.signature,
                public_key: &p.public_key,
                messages: &p.messages,
                disclosed_indexes: &p.disclosed_messages,
                ranges: &p.ranges,
                header: None,
            })
            .collect();
        let zk_proofs = BBSplusPoKSignature::proof_gen_multi::<CS>(&requests, &classes.into_table(), Some(extended.as_slice()))
            .map_err(proof_gen_error)?;

        let mut zk_proofs = zk_proofs.into_iter();
        records
            .into_iter()
            .map(|record| {
                let proofs = record
                    .proofs
                    .into_iter()
                    .map(|p| {
                        let zk = zk_proofs
                            .next()
                            .ok_or_else(|| Error::ProofGenError("missing proof in batch".to_owned()))?;
                        Ok(ProofOptions {
                            proof_value: Some(encode_proof_value(&p.revealed_statements, &zk.to_bytes())?),
                            ..p.skeleton
                        })
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok((record.document, proofs.into()))
            })
            .collect()
    }

    /// Signature, messages and disclosed messages of one input proof. `revealed` are matched
    /// against `matched`, which lists the document statements in signing order.
    fn prepare_proof<R>(
        &self,
        proof: &ProofOptions,
        statements: &[Statement],
        matched: &[Statement],
        revealed: &[Statement],
        nonce: &[u8],
        resolver: &R,
    ) -> Result<ProofDerivation, Error>
    where
        R: VerificationMethodResolver,
    {
        let method = resolver.resolve(&proof.verification_method)?;
        method.ensure_active()?;
        let signature = decode_signature(proof)?;

        let proof_statements = self.proof_statements(proof)?;
        let revealed_statements = get_indices(matched, revealed, proof_statements.len())?;
        let messages = Self::messages(&proof_statements, statements).map_err(proof_gen_error)?;
        let disclosed_messages = E::message_indexes(&revealed_statements)?;

        Ok(ProofDerivation {
            skeleton: ProofOptions {
                type_: derived_proof_type(&proof.type_)?.to_owned(),
                nonce: Some(encode_nonce(nonce)),
                proof_value: None,
                ..proof.clone()
            },
            revealed_statements,
            signature,
            public_key: method.public_key,
            messages,
            disclosed_messages,
            first_document_message: proof_statements.len() * E::messages_per_statement(),
            occurrences: Vec::new(),
            ranges: Vec::new(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn derive_document<R>(
        &self,
        doc_index: usize,
        proof_offset: usize,
        input: &InputDocument,
        proofs: &[&ProofOptions],
        statements: &[Statement],
        anonymizer: &Anonymizer,
        nonce: &[u8],
        resolver: &R,
    ) -> Result<DocumentDerivation<Value>, Error>
    where
        R: VerificationMethodResolver,
    {
        let ranges = RangeSpec::extract(&input.reveal_document)?;
        if !E::binds_terms() && !ranges.is_empty() {
            return Err(Error::UnsupportedEncoding(format!(
                "{} encoding cannot prove ranges",
                E::NAME
            )));
        }

        let skolemized = skolemize_statements(statements, doc_index);
        let body = without_proof(&input.document);
        let labeled = skolemize_document(&self.canonicalizer.label_blank_nodes(&body)?, doc_index);

        let mut framed = self.framer.frame(&labeled, ranges.frame())?;
        ranges.mark_document(&mut framed);
        let document = anonymizer.anonymize_document(&framed);

        let mut anonymized: Vec<Statement> = skolemized
            .iter()
            .map(|s| anonymizer.anonymize_statement(s))
            .collect();
        let range_hits = ranges.statement_indices(&labeled, &anonymized, &self.canonicalizer, anonymizer)?;
        for &(i, min, max) in &range_hits {
            anonymized[i] = anonymized[i].with_object(Term::named(range_marker(min, max)));
        }

        let revealed_statements = self.canonicalizer.canonicalize(&document)?;
        log::debug!(
            "document {}: {} of {} statements revealed",
            doc_index,
            revealed_statements.len(),
            statements.len()
        );

        let proofs = proofs
            .iter()
            .enumerate()
            .map(|(j, &proof)| {
                let mut derivation =
                    self.prepare_proof(proof, statements, &anonymized, &revealed_statements, nonce, resolver)?;
                let proof_index = proof_offset + j;
                let first = derivation.first_document_message;
                let revealed_messages = derivation.revealed_messages();
                if E::binds_terms() {
                    derivation.occurrences = anonymizer.occurrences(
                        proof_index,
                        first,
                        skolemized.iter().flat_map(Statement::terms),
                        &revealed_messages,
                    );
                }
                derivation.ranges = range_hits
                    .iter()
                    .map(|&(i, min, max)| {
                        RangeConstraint::new(first + i * E::messages_per_statement() + OBJECT_POSITION, min, max)
                    })
                    .filter(|r| revealed_messages.contains(&r.index))
                    .collect();
                log::debug!(
                    "proof {}: statements {:?}, {} hidden occurrences, {} ranges",
                    proof_index,
                    derivation.revealed_statements,
                    derivation.occurrences.len(),
                    derivation.ranges.len()
                );
                Ok(derivation)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(DocumentDerivation {
            document,
            revealed_statements,
            proofs,
        })
    }

    /// Statements counterpart of [`Self::derive_document`]. `placeholders` numbers the hidden
    /// terms across the batch.
    fn derive_statements<R>(
        &self,
        proof_offset: usize,
        input: &RdfInputDocument,
        proofs: &[&ProofOptions],
        placeholders: &mut Vec<String>,
        nonce: &[u8],
        resolver: &R,
    ) -> Result<DocumentDerivation<Vec<Statement>>, Error>
    where
        R: VerificationMethodResolver,
    {
        for placeholder in input.anon_to_term.keys() {
            if !matches!(Term::named(placeholder.as_str()).kind()?, TermKind::Anonymized(_)) {
                return Err(Error::InvalidStatement(format!("{} is not a placeholder", placeholder)));
            }
        }

        // (statement, position, class) of every hidden term
        let mut hidden = Vec::new();
        for (k, statement) in input.revealed_document.iter().enumerate() {
            for (position, term) in statement.terms().into_iter().enumerate() {
                match term.kind()? {
                    TermKind::Anonymized(id) if input.anon_to_term.contains_key(term.value()) => {
                        let class = match placeholders.iter().position(|p| *p == id) {
                            Some(class) => class,
                            None => {
                                placeholders.push(id);
                                placeholders.len() - 1
                            }
                        };
                        hidden.push((k, position, class));
                    }
                    TermKind::RangeMarker { .. } => {
                        return Err(Error::InvalidRangeMarker(format!(
                            "{} needs a reveal document",
                            term.value()
                        )))
                    }
                    _ => {}
                }
            }
        }
        let deanonymized = input
            .revealed_document
            .iter()
            .map(|s| deanonymize_statement(s, &input.anon_to_term))
            .collect::<Result<Vec<_>, Error>>()?;

        let proofs = proofs
            .iter()
            .enumerate()
            .map(|(j, &proof)| {
                let mut derivation =
                    self.prepare_proof(proof, &input.document, &input.document, &deanonymized, nonce, resolver)?;
                let proof_index = proof_offset + j;
                // signing positions of the revealed document statements
                let signed = &derivation.revealed_statements[derivation.revealed_statements.len() - deanonymized.len()..];
                let mut occurrences: Vec<(usize, Coordinate)> = hidden
                    .iter()
                    .map(|&(k, position, class)| {
                        (class, (proof_index, signed[k] * E::messages_per_statement() + position))
                    })
                    .collect();
                occurrences.sort_by_key(|&(_, (_, message))| message);
                derivation.occurrences = occurrences;
                log::debug!(
                    "proof {}: statements {:?}, {} hidden occurrences",
                    proof_index,
                    derivation.revealed_statements,
                    derivation.occurrences.len()
                );
                Ok(derivation)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(DocumentDerivation {
            document: input.revealed_document.clone(),
            revealed_statements: input.revealed_document.clone(),
            proofs,
        })
    }
}
