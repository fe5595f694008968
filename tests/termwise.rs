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
use serde_json::{json, Value};
use zkryptium_ld::{
    bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256},
    errors::Error,
    keys::pair::KeyPair,
    rdf::{
        canonicalize::Canonicalizer,
        statement::{parse_nquads, Statement},
        term::{Term, TermKind},
    },
    schemes::algorithms::BBSplus,
    suite::{
        document::{split_proofs, without_proof},
        AssertionProofPurpose, DerivedProof, InputDocument, KeyRegistry, OneOrMany, ProofOptions, RdfInputDocument,
        StringwiseSuite, TermwiseSuite, PROOF_TYPE, SIGNATURE_TYPE,
    },
};

type CS = Bls12381Sha256;

const ISSUER_A: &str = "did:example:issuer-a#bbs-key-1";
const ISSUER_B: &str = "did:example:issuer-b#bbs-key-1";
const CREATED: &str = "2025-03-01T09:00:00Z";

struct Issuers {
    a: KeyPair<BBSplus<CS>>,
    b: KeyPair<BBSplus<CS>>,
    registry: KeyRegistry,
}

fn init() {
    let _ = dotenvy::dotenv();
    let _ = env_logger::builder().is_test(true).try_init();
}

fn issuers() -> Issuers {
    init();
    let a = KeyPair::<BBSplus<CS>>::random().unwrap();
    let b = KeyPair::<BBSplus<CS>>::random().unwrap();
    let mut registry = KeyRegistry::new();
    registry
        .insert(a.verification_method(ISSUER_A))
        .insert(b.verification_method(ISSUER_B));
    Issuers { a, b, registry }
}

fn options(method: &str) -> ProofOptions {
    ProofOptions::new(SIGNATURE_TYPE, method, "assertionMethod").created(CREATED)
}

fn person() -> Value {
    json!({
        "@context": "https://schema.org/",
        "id": "did:example:alice",
        "type": "Person",
        "name": "Alice",
        "age": 25,
        "homeLocation": "did:example:cityA",
    })
}

fn license() -> Value {
    json!({
        "@context": "https://schema.org/",
        "id": "did:example:license-42",
        "type": "DriversLicense",
        "holder": "did:example:alice",
        "licenseClass": "B",
    })
}

fn suite() -> TermwiseSuite<CS> {
    TermwiseSuite::<CS>::default()
}

fn signed(document: &Value, keypair: &KeyPair<BBSplus<CS>>, method: &str) -> Value {
    suite().sign(document, &options(method), keypair).unwrap()
}

fn input(signed: &Value, reveal: Value) -> InputDocument {
    InputDocument::from_signed(signed, reveal).unwrap()
}

fn verified(documents: &[DerivedProof], registry: &KeyRegistry) -> bool {
    let result = suite().verify_proof_multi(documents, registry, &AssertionProofPurpose);
    if let Some(error) = &result.error {
        log::debug!("verification error: {}", error);
    }
    result.verified
}

fn proof_value(derived: &DerivedProof) -> String {
    derived.proof.as_slice()[0].proof_value.clone().unwrap()
}

fn set_proof_value(derived: &mut DerivedProof, value: String) {
    let mut proofs = derived.proof.as_slice().to_vec();
    proofs[0].proof_value = Some(value);
    derived.proof = proofs.into();
}

fn placeholder_id(value: &Value) -> String {
    match Term::named(value.as_str().unwrap()).kind().unwrap() {
        TermKind::Anonymized(id) => id,
        other => panic!("not a placeholder: {:?}", other),
    }
}

#[test]
fn full_reveal_round_trip() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let reveal = person();

    let derived = suite()
        .derive_proof(&input(&signed, reveal), &[], None, &issuers.registry)
        .unwrap();
    assert_eq!(derived.document, person());
    assert_eq!(derived.proof.as_slice()[0].type_, PROOF_TYPE);
    assert!(suite()
        .verify_proof(&derived, &issuers.registry, &AssertionProofPurpose)
        .verified);
}

#[test]
fn partial_reveal_hides_the_subject() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);

    let derived = suite()
        .derive_proof(
            &input(&signed, json!({ "type": "Person" })),
            &["did:example:alice"],
            None,
            &issuers.registry,
        )
        .unwrap();

    let document = derived.document.as_object().unwrap();
    assert_eq!(document["type"], "Person");
    assert!(!document.contains_key("name"));
    assert!(!document.contains_key("homeLocation"));
    placeholder_id(&document["id"]);
    assert!(!derived.document.to_string().contains("did:example:alice"));
    assert!(verified(&[derived.clone()], &issuers.registry));

    let mut tampered = derived;
    tampered.document["type"] = json!("Organization");
    assert!(!verified(&[tampered], &issuers.registry));
}

#[test]
fn derived_document_round_trips_through_json() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let derived = suite()
        .derive_proof(&input(&signed, json!({ "name": {} })), &[], None, &issuers.registry)
        .unwrap();

    let presented: Value = serde_json::from_str(&derived.to_document().unwrap().to_string()).unwrap();
    let parsed = DerivedProof::from_document(&presented).unwrap();
    assert_eq!(parsed, derived);
    assert!(verified(&[parsed], &issuers.registry));
}

#[test]
fn tampered_proof_bytes_fail() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let derived = suite()
        .derive_proof(&input(&signed, json!({ "name": {} })), &[], None, &issuers.registry)
        .unwrap();

    let value = proof_value(&derived);
    let (head, tail) = value.split_once('.').unwrap();
    let mut bytes = STANDARD.decode(tail).unwrap();
    for position in [0, 150, 200, bytes.len() - 1] {
        let mut flipped = bytes.clone();
        flipped[position] ^= 0x01;
        let mut tampered = derived.clone();
        set_proof_value(&mut tampered, format!("{}.{}", head, STANDARD.encode(&flipped)));
        assert!(!verified(&[tampered], &issuers.registry), "byte {}", position);
    }

    bytes.truncate(bytes.len() - 8);
    let mut truncated = derived.clone();
    set_proof_value(&mut truncated, format!("{}.{}", head, STANDARD.encode(&bytes)));
    assert!(!verified(&[truncated], &issuers.registry));

    let mut malformed = derived;
    set_proof_value(&mut malformed, "no separator".to_owned());
    let result = suite().verify_proof(&malformed, &issuers.registry, &AssertionProofPurpose);
    assert!(result.error.unwrap().starts_with("invalid proofValue"));
}

#[test]
fn oversized_revealed_index_fails() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let derived = suite()
        .derive_proof(&input(&signed, json!({ "name": {} })), &[], None, &issuers.registry)
        .unwrap();

    let value = proof_value(&derived);
    let (head, tail) = value.split_once('.').unwrap();
    let mut indexes: Vec<usize> = serde_json::from_slice(&STANDARD.decode(head).unwrap()).unwrap();
    *indexes.last_mut().unwrap() = usize::MAX / 2;
    let head = STANDARD.encode(serde_json::to_vec(&indexes).unwrap());

    let mut tampered = derived;
    set_proof_value(&mut tampered, format!("{}.{}", head, tail));
    let result = suite().verify_proof(&tampered, &issuers.registry, &AssertionProofPurpose);
    assert!(!result.verified);
    assert!(result.error.unwrap().starts_with("invalid proofValue"));
}

#[test]
fn unsupported_proof_types_are_rejected() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);

    let mut document = input(&signed, json!({ "name": {} }));
    let mut proofs = document.proof.as_slice().to_vec();
    proofs[0].type_ = "Ed25519Signature2020".to_owned();
    document.proof = proofs.into();
    assert!(matches!(
        suite().derive_proof(&document, &[], None, &issuers.registry),
        Err(Error::IncompatibleProofType { .. })
    ));

    let mut derived = suite()
        .derive_proof(&input(&signed, json!({ "name": {} })), &[], None, &issuers.registry)
        .unwrap();
    let mut proofs = derived.proof.as_slice().to_vec();
    proofs[0].type_ = "Ed25519Signature2020".to_owned();
    derived.proof = proofs.into();
    let result = suite().verify_proof(&derived, &issuers.registry, &AssertionProofPurpose);
    assert!(!result.verified);
    assert!(result.error.unwrap().starts_with("incompatible proof type"));
}

#[test]
fn proofs_of_other_suites_are_skipped() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let mut foreign = ProofOptions::new("Ed25519Signature2020", "did:example:other#key-1", "assertionMethod");
    foreign.proof_value = Some("z58DAdFfa9SkqZMVPxAQpic7ndSayn1PzZs6ZjWp1CktyGesjuTSwRdo".to_owned());

    let mut document = input(&signed, json!({ "type": "Person" }));
    let mut proofs = document.proof.as_slice().to_vec();
    proofs.insert(0, foreign.clone());
    document.proof = proofs.into();

    let mut derived = suite()
        .derive_proof(&document, &["did:example:alice"], None, &issuers.registry)
        .unwrap();
    assert_eq!(derived.proof.len(), 1);
    assert_eq!(derived.proof.as_slice()[0].type_, PROOF_TYPE);
    assert!(verified(&[derived.clone()], &issuers.registry));

    let mut proofs = derived.proof.as_slice().to_vec();
    proofs.push(foreign);
    derived.proof = proofs.into();
    assert!(verified(&[derived], &issuers.registry));
}

#[test]
fn hidden_value_is_linked_across_documents() {
    let issuers = issuers();
    let person = signed(&person(), &issuers.a, ISSUER_A);
    let license = signed(&license(), &issuers.b, ISSUER_B);

    let derived = suite()
        .derive_proof_multi(
            &[
                input(&person, json!({ "type": "Person", "age": {} })),
                input(&license, json!({ "holder": {}, "licenseClass": {} })),
            ],
            &["did:example:alice"],
            None,
            &issuers.registry,
        )
        .unwrap();
    assert_eq!(derived.len(), 2);
    assert_eq!(derived[0].document["id"], derived[1].document["holder"]);
    assert_eq!(derived[1].document["id"], "did:example:license-42");
    assert!(verified(&derived, &issuers.registry));

    let mut unlinked = derived.clone();
    unlinked[1].document["holder"] = json!(format!("urn:anon:{}", uuid::Uuid::new_v4()));
    assert!(!verified(&unlinked, &issuers.registry));

    let mut revealed = derived;
    revealed[1].document["holder"] = json!("did:example:alice");
    assert!(!verified(&revealed, &issuers.registry));
}

#[test]
fn range_boundaries() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let derive = |min: i64, max: i64| {
        suite().derive_proof(
            &input(&signed, json!({ "type": "Person", "age": { "range": [min, max] } })),
            &[],
            None,
            &issuers.registry,
        )
    };

    for (min, max) in [(26, 40), (10, 24)] {
        let error = derive(min, max).unwrap_err();
        assert!(matches!(error, Error::ProofGenError(_)));
        assert!(error.to_string().starts_with("Failed to create proof"));
    }

    for (min, max) in [(25, 40), (10, 25)] {
        let derived = derive(min, max).unwrap();
        assert_eq!(derived.document["age"], format!("urn:range:[{},{}]", min, max));
        assert!(verified(&[derived], &issuers.registry));
    }

    let mut widened = derive(18, 65).unwrap();
    widened.document["age"] = json!("urn:range:[0,100]");
    assert!(!verified(&[widened], &issuers.registry));

    assert!(matches!(
        suite().derive_proof(
            &input(&signed, json!({ "age": { "range": [65] } })),
            &[],
            None,
            &issuers.registry
        ),
        Err(Error::InvalidRangeMarker(_))
    ));
}

#[test]
fn range_over_a_hidden_subject() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let derived = suite()
        .derive_proof(
            &input(&signed, json!({ "age": { "range": [18, 65] } })),
            &["did:example:alice"],
            None,
            &issuers.registry,
        )
        .unwrap();
    placeholder_id(&derived.document["id"]);
    assert_eq!(derived.document["age"], "urn:range:[18,65]");
    assert!(verified(&[derived], &issuers.registry));
}

#[test]
fn batch_members_are_bound_together() {
    let issuers = issuers();
    let documents: Vec<InputDocument> = ["did:example:alice", "did:example:bob", "did:example:carol"]
        .iter()
        .map(|id| {
            let mut document = person();
            document["id"] = json!(id);
            input(&signed(&document, &issuers.a, ISSUER_A), json!({ "name": {} }))
        })
        .collect();

    let derived = suite()
        .derive_proof_multi(&documents, &[], None, &issuers.registry)
        .unwrap();
    assert_eq!(derived.len(), 3);
    assert!(verified(&derived, &issuers.registry));
    assert!(!verified(&derived[..2], &issuers.registry));
    assert!(!verified(&[derived[2].clone(), derived[1].clone(), derived[0].clone()], &issuers.registry));
}

#[test]
fn revealed_indexes_are_stable() {
    let issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let document = input(&signed, json!({ "type": "Person", "homeLocation": {} }));

    let heads: Vec<String> = (0..2)
        .map(|_| {
            let derived = suite()
                .derive_proof(&document, &["did:example:alice"], Some(b"nonce".as_slice()), &issuers.registry)
                .unwrap();
            assert_eq!(derived.proof.as_slice()[0].nonce.as_deref(), Some(STANDARD.encode(b"nonce").as_str()));
            proof_value(&derived).split_once('.').unwrap().0.to_owned()
        })
        .collect();
    // placeholder text decides the canonical order, so compare as sets
    let sets: Vec<Vec<usize>> = heads
        .iter()
        .map(|head| {
            let mut indexes: Vec<usize> = serde_json::from_slice(&STANDARD.decode(head).unwrap()).unwrap();
            indexes.sort_unstable();
            indexes
        })
        .collect();
    assert_eq!(sets[0], sets[1]);
    // type and homeLocation statements follow the proof statements
    assert_eq!(sets[0].len(), 4 + 2);
    assert_eq!(&sets[0][..4], &[0, 1, 2, 3]);
    assert!(sets[0][4..].iter().all(|&i| i >= 4));
}

#[test]
fn documents_without_proofs_fail() {
    let issuers = issuers();
    let bare = DerivedProof {
        document: person(),
        proof: OneOrMany::Many(Vec::new()),
    };
    let result = suite().verify_proof(&bare, &issuers.registry, &AssertionProofPurpose);
    assert!(!result.verified);
    assert_eq!(
        result.error.as_deref(),
        Some("documents to be verified must have at least one proof")
    );
}

#[test]
fn nonces_must_match_across_the_batch() {
    let issuers = issuers();
    let person = signed(&person(), &issuers.a, ISSUER_A);
    let license = signed(&license(), &issuers.b, ISSUER_B);

    let first = suite()
        .derive_proof(&input(&person, json!({ "name": {} })), &[], Some(b"first".as_slice()), &issuers.registry)
        .unwrap();
    let second = suite()
        .derive_proof(&input(&license, json!({ "licenseClass": {} })), &[], Some(b"second".as_slice()), &issuers.registry)
        .unwrap();

    let result = suite().verify_proof_multi(&[first, second], &issuers.registry, &AssertionProofPurpose);
    assert!(!result.verified);
    assert_eq!(result.error.as_deref(), Some("all of the nonces must have the same values"));
}

#[test]
fn revoked_methods_are_rejected() {
    let mut issuers = issuers();
    let signed = signed(&person(), &issuers.a, ISSUER_A);
    let derived = suite()
        .derive_proof(&input(&signed, json!({ "name": {} })), &[], None, &issuers.registry)
        .unwrap();

    issuers.registry.revoke(ISSUER_A);
    assert!(matches!(
        suite().derive_proof(&input(&signed, json!({ "name": {} })), &[], None, &issuers.registry),
        Err(Error::VerificationMethodRevoked(_))
    ));
    let result = suite().verify_proof(&derived, &issuers.registry, &AssertionProofPurpose);
    assert!(result.error.unwrap().starts_with("The verification method has been revoked"));
}

#[test]
fn blank_nodes_are_anonymized() {
    let issuers = issuers();
    let document = json!({
        "id": "did:example:alice",
        "name": "Alice",
        "address": { "addressLocality": "Turin", "postalCode": "10129" },
    });
    let signed = signed(&document, &issuers.a, ISSUER_A);

    let derived = suite()
        .derive_proof(
            &input(&signed, json!({ "address": { "addressLocality": {} } })),
            &[],
            None,
            &issuers.registry,
        )
        .unwrap();
    assert_eq!(derived.document["address"]["addressLocality"], "Turin");
    assert!(derived.document["address"].get("postalCode").is_none());
    placeholder_id(&derived.document["address"]["id"]);
    assert!(verified(&[derived], &issuers.registry));
}

#[test]
fn several_proofs_on_one_document() {
    let issuers = issuers();
    let once = signed(&person(), &issuers.a, ISSUER_A);
    let twice = signed(&once, &issuers.b, ISSUER_B);

    let derived = suite()
        .derive_proof(
            &input(&twice, json!({ "type": "Person" })),
            &["did:example:alice"],
            None,
            &issuers.registry,
        )
        .unwrap();
    assert_eq!(derived.proof.len(), 2);
    assert!(derived.to_document().unwrap()["proof"].is_array());
    assert!(verified(&[derived], &issuers.registry));
}

#[test]
fn stringwise_round_trip() {
    let issuers = issuers();
    let suite = StringwiseSuite::<CS>::default();
    let document = json!({
        "id": "did:example:alice",
        "name": "Alice",
        "address": { "addressLocality": "Turin", "postalCode": "10129" },
    });
    let signed = suite.sign(&document, &options(ISSUER_A), &issuers.a).unwrap();
    assert!(suite
        .verify_signature(&signed, &issuers.registry, &AssertionProofPurpose)
        .verified);

    let reveal = json!({ "address": { "addressLocality": {} } });
    let derived = suite
        .derive_proof(&input(&signed, reveal.clone()), &[], None, &issuers.registry)
        .unwrap();
    assert!(matches!(
        Term::named(derived.document["address"]["id"].as_str().unwrap()).kind().unwrap(),
        TermKind::SkolemizedBlank { doc_index: Some(0), .. }
    ));
    assert!(suite
        .verify_proof(&derived, &issuers.registry, &AssertionProofPurpose)
        .verified);

    assert!(matches!(
        suite.derive_proof(&input(&signed, reveal), &["did:example:alice"], None, &issuers.registry),
        Err(Error::UnsupportedEncoding(_))
    ));
    assert!(matches!(
        suite.derive_proof(
            &input(&signed, json!({ "age": { "range": [0, 1] } })),
            &[],
            None,
            &issuers.registry
        ),
        Err(Error::UnsupportedEncoding(_))
    ));
}

#[test]
fn shake256_ciphersuite() {
    init();
    let keypair = KeyPair::<BBSplus<Bls12381Shake256>>::random().unwrap();
    let mut registry = KeyRegistry::new();
    registry.register(ISSUER_A, keypair.public_key().clone());
    let suite = TermwiseSuite::<Bls12381Shake256>::default();

    let signed = suite.sign(&person(), &options(ISSUER_A), &keypair).unwrap();
    let derived = suite
        .derive_proof(
            &input(&signed, json!({ "age": { "range": [18, 30] } })),
            &["did:example:alice"],
            None,
            &registry,
        )
        .unwrap();
    assert!(suite
        .verify_proof(&derived, &registry, &AssertionProofPurpose)
        .verified);
}

const HIDDEN_ALICE: &str = "https://zkp-ld.org/.well-known/genid/anonymous/iri#alice";

fn rdf_input(signed: &Value, revealed: &[&str]) -> RdfInputDocument {
    let document = suite().canonicalizer().canonicalize(&without_proof(signed)).unwrap();
    let revealed_document = document
        .iter()
        .filter(|s| revealed.iter().any(|p| s.predicate().value().ends_with(p)))
        .map(|s| s.replace("did:example:alice", HIDDEN_ALICE))
        .collect();
    RdfInputDocument {
        document,
        proof: split_proofs(signed).unwrap().1.into(),
        revealed_document,
        anon_to_term: [(HIDDEN_ALICE.to_owned(), Term::named("did:example:alice"))].into(),
    }
}

fn replaced(statements: &[Statement], from: &str, to: &str) -> Vec<Statement> {
    statements.iter().map(|s| s.replace(from, to)).collect()
}

#[test]
fn selected_statements_round_trip() {
    let issuers = issuers();
    let person = signed(&person(), &issuers.a, ISSUER_A);
    let license = signed(&license(), &issuers.b, ISSUER_B);
    let inputs = [
        rdf_input(&person, &["#type", "/age"]),
        rdf_input(&license, &["/holder", "/licenseClass"]),
    ];
    assert_eq!(inputs[0].revealed_document.len(), 2);

    let derived = suite()
        .derive_proof_multi_rdf(&inputs, Some(b"nonce".as_slice()), &issuers.registry)
        .unwrap();
    assert_eq!(derived.len(), 2);
    assert_eq!(derived[0].document, inputs[0].revealed_document);
    assert_eq!(derived[1].proof.as_slice()[0].type_, PROOF_TYPE);
    assert!(!derived[1].to_nquads().contains("did:example:alice"));
    assert_eq!(parse_nquads(&derived[1].to_nquads()).unwrap(), derived[1].document);
    assert!(suite()
        .verify_proof_multi_rdf(&derived, &issuers.registry, &AssertionProofPurpose)
        .verified);

    let other = "https://zkp-ld.org/.well-known/genid/anonymous/iri#bob";
    let mut unlinked = derived.clone();
    unlinked[1].document = replaced(&unlinked[1].document, HIDDEN_ALICE, other);
    assert!(!suite()
        .verify_proof_multi_rdf(&unlinked, &issuers.registry, &AssertionProofPurpose)
        .verified);

    let mut revealed = derived;
    revealed[0].document = replaced(&revealed[0].document, HIDDEN_ALICE, "did:example:alice");
    assert!(!suite()
        .verify_proof_multi_rdf(&revealed, &issuers.registry, &AssertionProofPurpose)
        .verified);
}

#[test]
fn selected_statements_must_come_from_the_document() {
    let issuers = issuers();
    let person = signed(&person(), &issuers.a, ISSUER_A);

    let mut forged = rdf_input(&person, &["/name"]);
    forged.revealed_document = replaced(&forged.revealed_document, "Alice", "Mallory");
    assert!(matches!(
        suite().derive_proof_multi_rdf(&[forged], None, &issuers.registry),
        Err(Error::StatementNotFound(_))
    ));

    let mut unmapped = rdf_input(&person, &["/name"]);
    unmapped.anon_to_term = HashMap::from([("did:example:bob".to_owned(), Term::named("did:example:alice"))]);
    assert!(matches!(
        suite().derive_proof_multi_rdf(&[unmapped], None, &issuers.registry),
        Err(Error::InvalidStatement(_))
    ));

    let stringwise = StringwiseSuite::<CS>::default();
    assert!(matches!(
        stringwise.derive_proof_multi_rdf(&[rdf_input(&person, &["/name"])], None, &issuers.registry),
        Err(Error::UnsupportedEncoding(_))
    ));
}
