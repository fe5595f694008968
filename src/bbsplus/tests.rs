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

use crate::{
    bbsplus::{
        ciphersuites::{Bls12381Sha256, Bls12381Shake256},
        proof::{BBSplusPoKSignature, ProofRequest, VerifyRequest},
        range::RangeConstraint,
        signature::BBSplusSignature,
    },
    errors::Error,
    keys::pair::KeyPair,
    schemes::algorithms::{BBSplus, BbsBls12381Sha256},
    utils::message::{TAG_INTEGER, TAG_STRING},
};

fn text(value: &str) -> Vec<u8> {
    let mut bytes = vec![TAG_STRING];
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

fn integer(value: i32) -> Vec<u8> {
    let mut bytes = vec![TAG_INTEGER];
    bytes.extend_from_slice(&value.to_be_bytes());
    bytes
}

fn person(id: &str, age: i32) -> Vec<Vec<u8>> {
    vec![
        text(id),
        text("http://schema.org/age"),
        integer(age),
        text(""),
        text(id),
        text("http://schema.org/name"),
        text("Alice"),
        text(""),
    ]
}

struct Signed {
    keypair: KeyPair<BbsBls12381Sha256>,
    messages: Vec<Vec<u8>>,
    signature: BBSplusSignature,
}

fn signed(messages: Vec<Vec<u8>>) -> Signed {
    let keypair = KeyPair::<BbsBls12381Sha256>::random().unwrap();
    let signature = BBSplusSignature::sign::<Bls12381Sha256>(
        &messages,
        keypair.private_key(),
        keypair.public_key(),
        None,
    )
    .unwrap();
    Signed {
        keypair,
        messages,
        signature,
    }
}

fn request<'a>(s: &'a Signed, disclosed: &'a [usize], ranges: &'a [RangeConstraint]) -> ProofRequest<'a> {
    ProofRequest {
        signature: &s.signature,
        public_key: s.keypair.public_key(),
        messages: &s.messages,
        disclosed_indexes: disclosed,
        ranges,
        header: None,
    }
}

fn disclosed_messages(s: &Signed, disclosed: &[usize]) -> Vec<Vec<u8>> {
    disclosed.iter().map(|&i| s.messages[i].clone()).collect()
}

#[test]
fn keypair_from_key_material() {
    let ikm = hex::decode("746869732d49532d6a7573742d616e2d546573742d494b4d2d746f2d67656e65726174652d246528724074232d6b6579").unwrap();
    let first = KeyPair::<BBSplus<Bls12381Shake256>>::generate(&ikm, None, None).unwrap();
    let second = KeyPair::<BBSplus<Bls12381Shake256>>::generate(&ikm, None, None).unwrap();
    assert_eq!(first, second);

    let short = KeyPair::<BBSplus<Bls12381Shake256>>::generate(&ikm[..16], None, None);
    assert!(matches!(short, Err(Error::KeyGenError(_))));
}

#[test]
fn sign_and_verify() {
    let s = signed(person("did:example:alice", 25));
    s.signature
        .verify::<Bls12381Sha256>(s.keypair.public_key(), &s.messages, None)
        .unwrap();

    let bytes = s.signature.to_bytes();
    assert_eq!(BBSplusSignature::from_bytes(&bytes).unwrap(), s.signature);
}

#[test]
fn signature_over_other_messages_fails() {
    let s = signed(person("did:example:alice", 25));
    let other = person("did:example:bob", 25);
    let result = s
        .signature
        .verify::<Bls12381Sha256>(s.keypair.public_key(), &other, None);
    assert_eq!(result, Err(Error::SignatureVerificationError));
}

#[test]
fn selective_disclosure() {
    let s = signed(person("did:example:alice", 25));
    let disclosed = [1, 3, 5, 6, 7];
    let ph = b"nonce".as_slice();

    let proof = BBSplusPoKSignature::proof_gen::<Bls12381Sha256>(
        &s.signature,
        s.keypair.public_key(),
        &s.messages,
        &disclosed,
        None,
        Some(ph),
    )
    .unwrap();
    assert_eq!(proof.undisclosed_count(), 3);

    let revealed = disclosed_messages(&s, &disclosed);
    proof
        .proof_verify::<Bls12381Sha256>(s.keypair.public_key(), &revealed, &disclosed, None, Some(ph))
        .unwrap();

    let parsed = BBSplusPoKSignature::from_bytes(&proof.to_bytes()).unwrap();
    assert_eq!(parsed, proof);

    let wrong_ph = proof.proof_verify::<Bls12381Sha256>(
        s.keypair.public_key(),
        &revealed,
        &disclosed,
        None,
        Some(b"other".as_slice()),
    );
    assert!(wrong_ph.is_err());

    let mut tampered = revealed.clone();
    tampered[3] = text("Mallory");
    let result = proof.proof_verify::<Bls12381Sha256>(s.keypair.public_key(), &tampered, &disclosed, None, Some(ph));
    assert!(result.is_err());
}

#[test]
fn truncated_proof_is_rejected() {
    let s = signed(person("did:example:alice", 25));
    let proof =
        BBSplusPoKSignature::proof_gen::<Bls12381Sha256>(&s.signature, s.keypair.public_key(), &s.messages, &[0], None, None)
            .unwrap();
    let bytes = proof.to_bytes();
    assert_eq!(
        BBSplusPoKSignature::from_bytes(&bytes[..bytes.len() - 1]),
        Err(Error::InvalidProofOfKnowledgeSignature)
    );
}

#[test]
fn batch_with_equivalent_hidden_messages() {
    let a = signed(person("did:example:alice", 25));
    let b = signed(person("did:example:alice", 40));
    let disclosed = [1, 2, 3, 5, 6, 7];
    let classes = vec![vec![(0, 0), (0, 4), (1, 0), (1, 4)]];

    let proofs = BBSplusPoKSignature::proof_gen_multi::<Bls12381Sha256>(
        &[request(&a, &disclosed, &[]), request(&b, &disclosed, &[])],
        &classes,
        Some(b"nonce".as_slice()),
    )
    .unwrap();
    assert_eq!(proofs.len(), 2);
    assert_eq!(proofs[0].challenge(), proofs[1].challenge());

    let revealed_a = disclosed_messages(&a, &disclosed);
    let revealed_b = disclosed_messages(&b, &disclosed);
    let verify = |proofs: &[BBSplusPoKSignature]| {
        BBSplusPoKSignature::proof_verify_multi::<Bls12381Sha256>(
            &[
                VerifyRequest {
                    proof: &proofs[0],
                    public_key: a.keypair.public_key(),
                    disclosed_messages: &revealed_a,
                    disclosed_indexes: &disclosed,
                    ranges: &[],
                    header: None,
                },
                VerifyRequest {
                    proof: &proofs[1],
                    public_key: b.keypair.public_key(),
                    disclosed_messages: &revealed_b,
                    disclosed_indexes: &disclosed,
                    ranges: &[],
                    header: None,
                },
            ],
            &classes,
            Some(b"nonce".as_slice()),
        )
    };
    verify(&proofs).unwrap();

    // a member proven alone does not answer the joint challenge
    let alone = proofs[0].proof_verify::<Bls12381Sha256>(
        a.keypair.public_key(),
        &revealed_a,
        &disclosed,
        None,
        Some(b"nonce".as_slice()),
    );
    assert!(alone.is_err());

    let swapped = vec![proofs[1].clone(), proofs[0].clone()];
    assert!(verify(&swapped).is_err());
}

#[test]
fn equivalence_of_different_messages_cannot_be_proven() {
    let a = signed(person("did:example:alice", 25));
    let b = signed(person("did:example:bob", 25));
    let result = BBSplusPoKSignature::proof_gen_multi::<Bls12381Sha256>(
        &[request(&a, &[], &[]), request(&b, &[], &[])],
        &[vec![(0, 0), (1, 0)]],
        None,
    );
    assert!(matches!(result, Err(Error::ProofGenError(_))));
}

#[test]
fn overlapping_equivalence_classes_are_rejected() {
    let a = signed(person("did:example:alice", 25));
    let result = BBSplusPoKSignature::proof_gen_multi::<Bls12381Sha256>(
        &[request(&a, &[], &[])],
        &[vec![(0, 0), (0, 4)], vec![(0, 4), (0, 6)]],
        None,
    );
    assert!(matches!(result, Err(Error::ProofGenError(_))));
}

#[test]
fn range_boundaries() {
    for (age, ok) in [(17, false), (18, true), (65, true), (66, false)] {
        let s = signed(person("did:example:alice", age));
        let ranges = [RangeConstraint::new(2, 18, 65)];
        let disclosed = [0, 1, 3];
        let result = BBSplusPoKSignature::proof_gen_multi::<Bls12381Sha256>(
            &[request(&s, &disclosed, &ranges)],
            &[],
            None,
        );
        assert_eq!(result.is_ok(), ok, "age {}", age);

        if let Ok(proofs) = result {
            let revealed = disclosed_messages(&s, &disclosed);
            let verify = |ranges: &[RangeConstraint]| {
                BBSplusPoKSignature::proof_verify_multi::<Bls12381Sha256>(
                    &[VerifyRequest {
                        proof: &proofs[0],
                        public_key: s.keypair.public_key(),
                        disclosed_messages: &revealed,
                        disclosed_indexes: &disclosed,
                        ranges,
                        header: None,
                    }],
                    &[],
                    None,
                )
            };
            verify(&ranges).unwrap();
            assert!(verify(&[RangeConstraint::new(2, 30, 65)]).is_err());
            assert!(verify(&[]).is_err());
        }
    }
}

#[test]
fn range_over_disclosed_index_hides_it() {
    let s = signed(person("did:example:alice", 30));
    let ranges = [RangeConstraint::new(2, -10, 100)];
    let disclosed = [0, 1, 2, 3];
    let proofs =
        BBSplusPoKSignature::proof_gen_multi::<Bls12381Sha256>(&[request(&s, &disclosed, &ranges)], &[], None).unwrap();
    assert_eq!(proofs[0].undisclosed_count(), 5);

    let mut revealed = disclosed_messages(&s, &disclosed);
    // the placeholder at a range index is ignored
    revealed[2] = text("urn:anon:placeholder");
    BBSplusPoKSignature::proof_verify_multi::<Bls12381Sha256>(
        &[VerifyRequest {
            proof: &proofs[0],
            public_key: s.keypair.public_key(),
            disclosed_messages: &revealed,
            disclosed_indexes: &disclosed,
            ranges: &ranges,
            header: None,
        }],
        &[],
        None,
    )
    .unwrap();
}

#[test]
fn range_over_non_integer_fails() {
    let s = signed(person("did:example:alice", 30));
    let ranges = [RangeConstraint::new(6, 0, 10)];
    let result = BBSplusPoKSignature::proof_gen_multi::<Bls12381Sha256>(&[request(&s, &[], &ranges)], &[], None);
    assert!(matches!(result, Err(Error::ProofGenError(_))));
}

#[test]
fn range_width_is_bounded() {
    assert!(RangeConstraint::new(0, 0, (1i64 << 32) - 1).check_bounds().is_ok());
    assert!(RangeConstraint::new(0, 0, 1i64 << 32).check_bounds().is_err());
    assert!(RangeConstraint::new(0, 5, 4).check_bounds().is_err());
}
