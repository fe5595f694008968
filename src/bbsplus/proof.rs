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

use std::collections::{BTreeSet, HashMap};

use bls12_381_plus::{multi_miller_loop, G1Projective, G2Prepared, G2Projective, Scalar};
use elliptic_curve::group::{Curve, Group};

use super::{
    keys::BBSplusPublicKey,
    range::{RangeConstraint, RangeInitResult, RangeProof, RangeWitness},
    signature::{compute_b, BBSplusSignature},
};
use crate::{
    bbsplus::{ciphersuites::BbsCiphersuite, generators::Generators},
    errors::Error,
    utils::{
        message::BBSplusMessage,
        util::{
            bbsplus_utils::{calculate_domain, calculate_random_scalars, get_messages, hash_to_scalar, i2osp, ByteReader, ScalarExt},
            get_remaining_indexes,
        },
    },
};

/// Proof of knowledge of a BBS+ signature, with the range proofs bound to its hidden messages.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BBSplusPoKSignature {
    Abar: G1Projective,
    Bbar: G1Projective,
    D: G1Projective,
    e_cap: Scalar,
    r1_cap: Scalar,
    r3_cap: Scalar,
    challenge: Scalar,
    m_cap: Vec<Scalar>,
    range_proofs: Vec<RangeProof>,
}

/// Prover input for one signed message list of a batch.
#[derive(Clone, Copy, Debug)]
pub struct ProofRequest<'a> {
    pub signature: &'a BBSplusSignature,
    pub public_key: &'a BBSplusPublicKey,
    pub messages: &'a [Vec<u8>],
    pub disclosed_indexes: &'a [usize],
    pub ranges: &'a [RangeConstraint],
    pub header: Option<&'a [u8]>,
}

/// Verifier input for one proof of a batch. `disclosed_messages[i]` is the message at
/// `disclosed_indexes[i]`; entries at indexes bound by an equivalence or a range are ignored.
#[derive(Clone, Copy, Debug)]
pub struct VerifyRequest<'a> {
    pub proof: &'a BBSplusPoKSignature,
    pub public_key: &'a BBSplusPublicKey,
    pub disclosed_messages: &'a [Vec<u8>],
    pub disclosed_indexes: &'a [usize],
    pub ranges: &'a [RangeConstraint],
    pub header: Option<&'a [u8]>,
}

impl BBSplusPoKSignature {
    const FIXED_LENGTH: usize = 3 * 48 + 4 * 32;

    // Abar, Bbar, D: 48 bytes each
    // e_cap, r1_cap, r3_cap, challenge: 32 bytes each
    // U (8 bytes) followed by U * 32 bytes of m_cap
    // number of range proofs (8 bytes) followed by the range proofs
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::with_capacity(Self::FIXED_LENGTH + 8 + 32 * self.m_cap.len());

        bytes.extend_from_slice(&self.Abar.to_affine().to_compressed());
        bytes.extend_from_slice(&self.Bbar.to_affine().to_compressed());
        bytes.extend_from_slice(&self.D.to_affine().to_compressed());
        bytes.extend_from_slice(&self.e_cap.to_bytes_be());
        bytes.extend_from_slice(&self.r1_cap.to_bytes_be());
        bytes.extend_from_slice(&self.r3_cap.to_bytes_be());
        bytes.extend_from_slice(&self.challenge.to_bytes_be());
        bytes.extend_from_slice(&i2osp(self.m_cap.len(), 8));
        self.m_cap
            .iter()
            .for_each(|v| bytes.extend_from_slice(&v.to_bytes_be()));
        bytes.extend_from_slice(&i2osp(self.range_proofs.len(), 8));
        self.range_proofs
            .iter()
            .for_each(|r| bytes.extend_from_slice(&r.to_bytes()));
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < Self::FIXED_LENGTH + 16 {
            return Err(Error::InvalidProofOfKnowledgeSignature);
        }
        let mut reader = ByteReader::new(bytes);

        let Abar = reader.g1()?;
        let Bbar = reader.g1()?;
        let D = reader.g1()?;
        let e_cap = reader.scalar()?;
        let r1_cap = reader.scalar()?;
        let r3_cap = reader.scalar()?;
        let challenge = reader.scalar()?;

        let U = reader.length()?;
        let mut m_cap: Vec<Scalar> = Vec::new();
        for _ in 0..U {
            m_cap.push(reader.scalar()?);
        }

        let n_ranges = reader.length()?;
        let mut range_proofs = Vec::new();
        for _ in 0..n_ranges {
            range_proofs.push(RangeProof::read(&mut reader)?);
        }

        if !reader.is_empty() {
            return Err(Error::InvalidProofOfKnowledgeSignature);
        }

        Ok(Self {
            Abar,
            Bbar,
            D,
            e_cap,
            r1_cap,
            r3_cap,
            challenge,
            m_cap,
            range_proofs,
        })
    }

    pub fn challenge(&self) -> Scalar {
        self.challenge
    }

    pub fn undisclosed_count(&self) -> usize {
        self.m_cap.len()
    }

    /// Single-signature selective disclosure, without equivalences or ranges.
    pub fn proof_gen<CS>(
        signature: &BBSplusSignature,
        pk: &BBSplusPublicKey,
        messages: &[Vec<u8>],
        disclosed_indexes: &[usize],
        header: Option<&[u8]>,
        ph: Option<&[u8]>,
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
    {
        let request = ProofRequest {
            signature,
            public_key: pk,
            messages,
            disclosed_indexes,
            ranges: &[],
            header,
        };
        Self::proof_gen_multi::<CS>(&[request], &[], ph)?
            .pop()
            .ok_or_else(|| Error::ProofGenError("no proof generated".to_owned()))
    }

    pub fn proof_verify<CS>(
        &self,
        pk: &BBSplusPublicKey,
        disclosed_messages: &[Vec<u8>],
        disclosed_indexes: &[usize],
        header: Option<&[u8]>,
        ph: Option<&[u8]>,
    ) -> Result<(), Error>
    where
        CS: BbsCiphersuite,
    {
        let request = VerifyRequest {
            proof: self,
            public_key: pk,
            disclosed_messages,
            disclosed_indexes,
            ranges: &[],
            header,
        };
        Self::proof_verify_multi::<CS>(&[request], &[], ph)
    }

    /// Derives one proof per request under a single Fiat-Shamir challenge.
    ///
    /// Each equivalence class lists `(proof index, message index)` pairs whose messages must be
    /// equal. Class members and range-constrained messages are always hidden, whatever
    /// `disclosed_indexes` says. Fails if the members of a class carry different messages, or if
    /// a range-constrained message is not an integer inside its bounds.
    pub fn proof_gen_multi<CS>(
        requests: &[ProofRequest<'_>],
        equivalences: &[Vec<(usize, usize)>],
        ph: Option<&[u8]>,
    ) -> Result<Vec<Self>, Error>
    where
        CS: BbsCiphersuite,
    {
        let table = EquivalenceTable::new(equivalences, requests.len()).map_err(Error::ProofGenError)?;
        let class_tildes = calculate_random_scalars(table.len());
        let mut class_values: Vec<Option<Scalar>> = vec![None; table.len()];
        let bases = Generators::pedersen_bases::<CS>()?;

        let mut states: Vec<ProverState> = Vec::with_capacity(requests.len());
        let mut range_inits: Vec<Vec<RangeInitResult>> = Vec::with_capacity(requests.len());

        for (k, request) in requests.iter().enumerate() {
            let messages = BBSplusMessage::messages_to_scalar::<CS>(request.messages)?;
            let L = messages.len();
            let generators = Generators::create::<CS>(L)?;

            let forced = table.forced_indexes(k, request.ranges);
            if let Some(i) = forced.iter().find(|&&i| i >= L) {
                return Err(Error::ProofGenError(format!("Invalid hidden index {} in proof {}", i, k)));
            }
            let disclosed_indexes = effective_disclosed(request.disclosed_indexes, &forced);
            if let Some(i) = disclosed_indexes.iter().find(|&&i| i >= L) {
                return Err(Error::ProofGenError(format!("Invalid disclosed index: {}", i)));
            }
            let undisclosed_indexes = get_remaining_indexes(L, &disclosed_indexes);

            let mut m_tilde = calculate_random_scalars(undisclosed_indexes.len());
            for (slot, &i) in m_tilde.iter_mut().zip(&undisclosed_indexes) {
                if let Some(c) = table.class_of(k, i) {
                    *slot = class_tildes[c];
                    match class_values[c] {
                        Some(value) if value != messages[i].value => {
                            return Err(Error::ProofGenError(format!(
                                "message {} of proof {} differs from its equivalent messages",
                                i, k
                            )))
                        }
                        Some(_) => {}
                        None => class_values[c] = Some(messages[i].value),
                    }
                }
            }

            let random_scalars = calculate_random_scalars(5);
            let init = proof_init::<CS>(
                request.public_key,
                request.signature,
                &generators,
                &random_scalars,
                request.header,
                &messages,
                &disclosed_indexes,
                &undisclosed_indexes,
                &m_tilde,
            )?;

            let mut ranges = request.ranges.to_vec();
            ranges.sort();
            ranges.dedup();

            let mut inits = Vec::with_capacity(ranges.len());
            let mut witnesses = Vec::with_capacity(ranges.len());
            for range in &ranges {
                let value = BBSplusMessage::integer_value(&request.messages[range.index]).ok_or_else(|| {
                    Error::ProofGenError(format!("message {} of proof {} is not an integer", range.index, k))
                })?;
                let position = undisclosed_indexes
                    .binary_search(&range.index)
                    .map_err(|_| Error::ProofGenError(format!("range index {} is disclosed", range.index)))?;
                let (range_init, witness) = RangeProof::init(bases, i64::from(value), range, m_tilde[position])?;
                inits.push(range_init);
                witnesses.push(witness);
            }
            range_inits.push(inits);

            states.push(ProverState {
                init,
                e: request.signature.e,
                random_scalars,
                m_tilde,
                undisclosed_messages: get_messages(&messages, &undisclosed_indexes),
                range_witnesses: witnesses,
            });
        }

        let inits: Vec<&ProofInitResult> = states.iter().map(|s| &s.init).collect();
        let challenge = proof_challenge_calculate::<CS>(&inits, &range_inits, ph)?;

        states
            .into_iter()
            .map(|state| proof_finalize(state, challenge))
            .collect()
    }

    /// Verifies a batch produced by [`Self::proof_gen_multi`]. The equivalence classes and the
    /// ranges must be those used by the prover.
    pub fn proof_verify_multi<CS>(
        requests: &[VerifyRequest<'_>],
        equivalences: &[Vec<(usize, usize)>],
        ph: Option<&[u8]>,
    ) -> Result<(), Error>
    where
        CS: BbsCiphersuite,
    {
        let first = requests
            .first()
            .ok_or_else(|| Error::PoKSVerificationError("no proof to verify".to_owned()))?;
        let challenge = first.proof.challenge;
        if requests.iter().any(|r| r.proof.challenge != challenge) {
            return Err(Error::PoKSVerificationError("proofs do not share the challenge".to_owned()));
        }

        let table =
            EquivalenceTable::new(equivalences, requests.len()).map_err(Error::PoKSVerificationError)?;
        let bases = Generators::pedersen_bases::<CS>()?;

        let mut class_caps: Vec<Option<Scalar>> = vec![None; table.len()];
        let mut inits: Vec<ProofInitResult> = Vec::with_capacity(requests.len());
        let mut range_inits: Vec<Vec<RangeInitResult>> = Vec::with_capacity(requests.len());

        for (k, request) in requests.iter().enumerate() {
            let proof = request.proof;
            if request.disclosed_messages.len() != request.disclosed_indexes.len() {
                return Err(Error::PoKSVerificationError("len messages != len indexes".to_owned()));
            }

            let forced = table.forced_indexes(k, request.ranges);
            let mut disclosed: Vec<(usize, &Vec<u8>)> = request
                .disclosed_indexes
                .iter()
                .copied()
                .zip(request.disclosed_messages)
                .filter(|(i, _)| !forced.contains(i))
                .collect();
            disclosed.sort_by_key(|(i, _)| *i);
            disclosed.dedup_by_key(|(i, _)| *i);

            let U = proof.m_cap.len();
            let L = U + disclosed.len();
            if disclosed.iter().any(|(i, _)| *i >= L) || forced.iter().any(|&i| i >= L) {
                return Err(Error::PoKSVerificationError("Invalid disclosed indexes".to_owned()));
            }

            let disclosed_indexes: Vec<usize> = disclosed.iter().map(|(i, _)| *i).collect();
            let disclosed_bytes: Vec<Vec<u8>> = disclosed.iter().map(|(_, m)| m.to_vec()).collect();
            let disclosed_messages = BBSplusMessage::messages_to_scalar::<CS>(&disclosed_bytes)?;
            let undisclosed_indexes = get_remaining_indexes(L, &disclosed_indexes);

            for (&i, &m) in undisclosed_indexes.iter().zip(&proof.m_cap) {
                if let Some(c) = table.class_of(k, i) {
                    match class_caps[c] {
                        Some(value) if value != m => {
                            return Err(Error::PoKSVerificationError(format!(
                                "equivalence broken at message {} of proof {}",
                                i, k
                            )))
                        }
                        Some(_) => {}
                        None => class_caps[c] = Some(m),
                    }
                }
            }

            let generators = Generators::create::<CS>(L)?;
            inits.push(proof_verify_init::<CS>(
                request.public_key,
                proof,
                &generators,
                request.header,
                &disclosed_indexes,
                &disclosed_messages,
                &undisclosed_indexes,
            )?);

            let mut ranges = request.ranges.to_vec();
            ranges.sort();
            ranges.dedup();
            if ranges.len() != proof.range_proofs.len() {
                return Err(Error::PoKSVerificationError(format!(
                    "expected {} range proofs, found {}",
                    ranges.len(),
                    proof.range_proofs.len()
                )));
            }

            let mut proof_range_inits = Vec::with_capacity(ranges.len());
            for (range, range_proof) in ranges.iter().zip(&proof.range_proofs) {
                let position = undisclosed_indexes
                    .binary_search(&range.index)
                    .map_err(|_| Error::PoKSVerificationError(format!("range index {} is disclosed", range.index)))?;
                proof_range_inits.push(range_proof.verify_init(bases, range, proof.m_cap[position], challenge)?);
            }
            range_inits.push(proof_range_inits);
        }

        let init_refs: Vec<&ProofInitResult> = inits.iter().collect();
        let expected = proof_challenge_calculate::<CS>(&init_refs, &range_inits, ph)?;
        if expected != challenge {
            return Err(Error::PoKSVerificationError("invalid challenge".to_owned()));
        }

        let BP2 = G2Projective::GENERATOR;
        for request in requests {
            let proof = request.proof;
            let term1 = (&proof.Abar.to_affine(), &G2Prepared::from(request.public_key.0.to_affine()));
            let term2 = (&proof.Bbar.to_affine(), &G2Prepared::from(-BP2.to_affine()));

            let pairing = multi_miller_loop(&[term1, term2]).final_exponentiation();
            if !bool::from(pairing.is_identity()) {
                return Err(Error::PoKSVerificationError("Invalid Proof".to_owned()));
            }
        }

        Ok(())
    }
}

/// Equivalence classes of hidden messages across the proofs of a batch.
struct EquivalenceTable {
    lookup: HashMap<(usize, usize), usize>,
    classes: usize,
}

impl EquivalenceTable {
    fn new(classes: &[Vec<(usize, usize)>], proofs: usize) -> Result<Self, String> {
        let mut lookup = HashMap::new();
        let mut count = 0;
        for class in classes.iter().filter(|c| !c.is_empty()) {
            for &(k, i) in class {
                if k >= proofs {
                    return Err(format!("equivalence refers to proof {} of {}", k, proofs));
                }
                if let Some(previous) = lookup.insert((k, i), count) {
                    if previous != count {
                        return Err(format!("message {} of proof {} is in two equivalence classes", i, k));
                    }
                }
            }
            count += 1;
        }
        Ok(Self { lookup, classes: count })
    }

    fn len(&self) -> usize {
        self.classes
    }

    fn class_of(&self, proof: usize, index: usize) -> Option<usize> {
        self.lookup.get(&(proof, index)).copied()
    }

    /// Indexes of `proof` that cannot be disclosed.
    fn forced_indexes(&self, proof: usize, ranges: &[RangeConstraint]) -> BTreeSet<usize> {
        self.lookup
            .keys()
            .filter(|(k, _)| *k == proof)
            .map(|(_, i)| *i)
            .chain(ranges.iter().map(|r| r.index))
            .collect()
    }
}

fn effective_disclosed(disclosed_indexes: &[usize], forced: &BTreeSet<usize>) -> Vec<usize> {
    let mut disclosed: Vec<usize> = disclosed_indexes
        .iter()
        .copied()
        .filter(|i| !forced.contains(i))
        .collect();
    disclosed.sort_unstable();
    disclosed.dedup();
    disclosed
}

#[derive(Clone, Debug)]
struct ProofInitResult {
    Abar: G1Projective,
    Bbar: G1Projective,
    D: G1Projective,
    T1: G1Projective,
    T2: G1Projective,
    domain: Scalar,
    disclosed: Vec<(usize, Scalar)>,
}

struct ProverState {
    init: ProofInitResult,
    e: Scalar,
    random_scalars: Vec<Scalar>,
    m_tilde: Vec<Scalar>,
    undisclosed_messages: Vec<BBSplusMessage>,
    range_witnesses: Vec<RangeWitness>,
}

#[allow(clippy::too_many_arguments)]
fn proof_init<CS>(
    pk: &BBSplusPublicKey,
    signature: &BBSplusSignature,
    generators: &Generators,
    random_scalars: &[Scalar],
    header: Option<&[u8]>,
    messages: &[BBSplusMessage],
    disclosed_indexes: &[usize],
    undisclosed_indexes: &[usize],
    m_tilde: &[Scalar],
) -> Result<ProofInitResult, Error>
where
    CS: BbsCiphersuite,
{
    if random_scalars.len() != 5 || m_tilde.len() != undisclosed_indexes.len() {
        return Err(Error::ProofGenError("Random scalars not valid".to_owned()));
    }
    if generators.message_generators.len() != messages.len() {
        return Err(Error::NotEnoughGenerators);
    }

    let domain = calculate_domain::<CS>(pk, generators, header)?;
    let B = compute_b(generators, domain, messages);

    let r1 = random_scalars[0];
    let r2 = random_scalars[1];
    let e_tilde = random_scalars[2];
    let r1_tilde = random_scalars[3];
    let r3_tilde = random_scalars[4];

    let D = B * r2;
    let Abar = signature.a * (r1 * r2);
    let Bbar = D * r1 - Abar * signature.e;

    let T1 = Abar * e_tilde + D * r1_tilde;
    let T2 = undisclosed_indexes
        .iter()
        .zip(m_tilde)
        .fold(D * r3_tilde, |acc, (&j, m)| acc + generators.message_generators[j] * m);

    let disclosed = disclosed_indexes
        .iter()
        .map(|&i| (i, messages[i].value))
        .collect();

    Ok(ProofInitResult {
        Abar,
        Bbar,
        D,
        T1,
        T2,
        domain,
        disclosed,
    })
}

fn proof_challenge_calculate<CS>(
    inits: &[&ProofInitResult],
    ranges: &[Vec<RangeInitResult>],
    ph: Option<&[u8]>,
) -> Result<Scalar, Error>
where
    CS: BbsCiphersuite,
{
    let ph = ph.unwrap_or(b"");
    let mut c_arr: Vec<u8> = Vec::new();

    for init_res in inits {
        c_arr.extend_from_slice(&init_res.Abar.to_affine().to_compressed());
        c_arr.extend_from_slice(&init_res.Bbar.to_affine().to_compressed());
        c_arr.extend_from_slice(&init_res.D.to_affine().to_compressed());
        c_arr.extend_from_slice(&init_res.T1.to_affine().to_compressed());
        c_arr.extend_from_slice(&init_res.T2.to_affine().to_compressed());
        c_arr.extend_from_slice(&i2osp(init_res.disclosed.len(), 8));
        for (i, m) in &init_res.disclosed {
            c_arr.extend_from_slice(&i2osp(*i, 8));
            c_arr.extend_from_slice(&m.to_bytes_be());
        }
        c_arr.extend_from_slice(&init_res.domain.to_bytes_be());
    }

    ranges
        .iter()
        .flatten()
        .for_each(|r| c_arr.extend_from_slice(&r.transcript()));

    c_arr.extend_from_slice(&i2osp(ph.len(), 8));
    c_arr.extend_from_slice(ph);

    hash_to_scalar::<CS>(&c_arr, &CS::h2s_dst())
}

fn proof_finalize(state: ProverState, challenge: Scalar) -> Result<BBSplusPoKSignature, Error> {
    let r1 = state.random_scalars[0];
    let r2 = state.random_scalars[1];
    let e_tilde = state.random_scalars[2];
    let r1_tilde = state.random_scalars[3];
    let r3_tilde = state.random_scalars[4];

    let r3 = Option::<Scalar>::from(r2.invert())
        .ok_or_else(|| Error::ProofGenError("Invert scalar failed".to_owned()))?;

    let e_cap = e_tilde + state.e * challenge;
    let r1_cap = r1_tilde - r1 * challenge;
    let r3_cap = r3_tilde - r3 * challenge;
    let m_cap = state
        .m_tilde
        .iter()
        .zip(&state.undisclosed_messages)
        .map(|(t, m)| t + m.value * challenge)
        .collect();

    let range_proofs = state
        .range_witnesses
        .into_iter()
        .map(|w| RangeProof::finalize(w, challenge))
        .collect();

    Ok(BBSplusPoKSignature {
        Abar: state.init.Abar,
        Bbar: state.init.Bbar,
        D: state.init.D,
        e_cap,
        r1_cap,
        r3_cap,
        challenge,
        m_cap,
        range_proofs,
    })
}

fn proof_verify_init<CS>(
    pk: &BBSplusPublicKey,
    proof: &BBSplusPoKSignature,
    generators: &Generators,
    header: Option<&[u8]>,
    disclosed_indexes: &[usize],
    disclosed_messages: &[BBSplusMessage],
    undisclosed_indexes: &[usize],
) -> Result<ProofInitResult, Error>
where
    CS: BbsCiphersuite,
{
    if bool::from(proof.Abar.is_identity()) {
        return Err(Error::PoKSVerificationError("Abar is the identity".to_owned()));
    }

    let domain = calculate_domain::<CS>(pk, generators, header)?;

    let T1 = proof.Bbar * proof.challenge + proof.Abar * proof.e_cap + proof.D * proof.r1_cap;

    let Bv = disclosed_indexes
        .iter()
        .zip(disclosed_messages)
        .fold(generators.g1_base_point + generators.q1 * domain, |acc, (&i, m)| {
            acc + generators.message_generators[i] * m.value
        });

    let T2 = undisclosed_indexes
        .iter()
        .zip(&proof.m_cap)
        .fold(Bv * proof.challenge + proof.D * proof.r3_cap, |acc, (&j, m)| {
            acc + generators.message_generators[j] * m
        });

    Ok(ProofInitResult {
        Abar: proof.Abar,
        Bbar: proof.Bbar,
        D: proof.D,
        T1,
        T2,
        domain,
        disclosed: disclosed_indexes
            .iter()
            .copied()
            .zip(disclosed_messages.iter().map(|m| m.value))
            .collect(),
    })
}
