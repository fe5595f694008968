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

use bls12_381_plus::{multi_miller_loop, G1Affine, G1Projective, G2Prepared, G2Projective, Scalar};
use elliptic_curve::group::{Curve, Group};

use super::keys::{BBSplusPublicKey, BBSplusSecretKey};
use crate::{
    bbsplus::{ciphersuites::BbsCiphersuite, generators::Generators},
    errors::Error,
    utils::{
        message::BBSplusMessage,
        util::bbsplus_utils::{calculate_domain, hash_to_scalar, serialize_scalars, ScalarExt},
    },
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BBSplusSignature {
    pub a: G1Projective,
    pub e: Scalar,
}

impl BBSplusSignature {
    pub const SIGNATURE_LENGTH: usize = 80;

    pub fn to_bytes(&self) -> [u8; Self::SIGNATURE_LENGTH] {
        let mut bytes = [0u8; Self::SIGNATURE_LENGTH];
        bytes[0..48].copy_from_slice(&self.a.to_affine().to_compressed());
        bytes[48..80].copy_from_slice(&self.e.to_bytes_be());
        bytes
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != Self::SIGNATURE_LENGTH {
            return Err(Error::InvalidSignature);
        }
        let a_bytes: [u8; 48] = data[0..48].try_into().map_err(|_| Error::InvalidSignature)?;
        let e_bytes: [u8; 32] = data[48..80].try_into().map_err(|_| Error::InvalidSignature)?;

        let a = Option::<G1Affine>::from(G1Affine::from_compressed(&a_bytes))
            .map(G1Projective::from)
            .ok_or(Error::InvalidSignature)?;
        let e = Scalar::from_bytes_be_checked(&e_bytes).ok_or(Error::InvalidSignature)?;

        Ok(Self { a, e })
    }

    /// Signs every message of `messages` (encoded terms) under `sk`.
    pub fn sign<CS>(
        messages: &[Vec<u8>],
        sk: &BBSplusSecretKey,
        pk: &BBSplusPublicKey,
        header: Option<&[u8]>,
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
    {
        let message_scalars = BBSplusMessage::messages_to_scalar::<CS>(messages)?;
        let generators = Generators::create::<CS>(messages.len())?;
        core_sign::<CS>(sk, pk, &generators, header, &message_scalars)
    }

    pub fn verify<CS>(
        &self,
        pk: &BBSplusPublicKey,
        messages: &[Vec<u8>],
        header: Option<&[u8]>,
    ) -> Result<(), Error>
    where
        CS: BbsCiphersuite,
    {
        let message_scalars = BBSplusMessage::messages_to_scalar::<CS>(messages)?;
        let generators = Generators::create::<CS>(messages.len())?;
        core_verify::<CS>(pk, self, &message_scalars, &generators, header)
    }
}

/// B = P1 + Q_1 * domain + H_1 * msg_1 + ... + H_L * msg_L
pub(crate) fn compute_b(generators: &Generators, domain: Scalar, messages: &[BBSplusMessage]) -> G1Projective {
    generators
        .message_generators
        .iter()
        .zip(messages)
        .fold(generators.g1_base_point + generators.q1 * domain, |acc, (h, m)| acc + h * m.value)
}

fn core_sign<CS>(
    sk: &BBSplusSecretKey,
    pk: &BBSplusPublicKey,
    generators: &Generators,
    header: Option<&[u8]>,
    messages: &[BBSplusMessage],
) -> Result<BBSplusSignature, Error>
where
    CS: BbsCiphersuite,
{
    if generators.message_generators.len() != messages.len() {
        return Err(Error::NotEnoughGenerators);
    }

    let domain = calculate_domain::<CS>(pk, generators, header)?;

    let mut input: Vec<Scalar> = Vec::with_capacity(messages.len() + 2);
    input.push(sk.0);
    input.push(domain);
    input.extend(messages.iter().map(|m| m.value));

    let e = hash_to_scalar::<CS>(&serialize_scalars(&input), &CS::h2s_dst())?;

    let B = compute_b(generators, domain, messages);

    // A = B * (1 / (SK + e))
    let inverse = Option::<Scalar>::from((sk.0 + e).invert())
        .ok_or_else(|| Error::SignatureGenerationError("SK + e is not invertible".to_owned()))?;
    let A = B * inverse;

    if bool::from(A.is_identity()) {
        return Err(Error::G1IdentityError);
    }

    Ok(BBSplusSignature { a: A, e })
}

fn core_verify<CS>(
    pk: &BBSplusPublicKey,
    signature: &BBSplusSignature,
    messages: &[BBSplusMessage],
    generators: &Generators,
    header: Option<&[u8]>,
) -> Result<(), Error>
where
    CS: BbsCiphersuite,
{
    if generators.message_generators.len() != messages.len() {
        return Err(Error::NotEnoughGenerators);
    }

    let domain = calculate_domain::<CS>(pk, generators, header)?;
    let B = compute_b(generators, domain, messages);

    let BP2 = G2Projective::GENERATOR;
    let A2 = pk.0 + BP2 * signature.e;

    let term1 = (&signature.a.to_affine(), &G2Prepared::from(A2.to_affine()));
    let term2 = (&B.to_affine(), &G2Prepared::from(-BP2.to_affine()));

    let pairing = multi_miller_loop(&[term1, term2]).final_exponentiation();

    if pairing.is_identity().into() {
        Ok(())
    } else {
        Err(Error::SignatureVerificationError)
    }
}
