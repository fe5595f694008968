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

use rand::RngCore;

/// Returns the indexes in `0..length` that are not in `indexes`, in ascending order.
pub fn get_remaining_indexes(length: usize, indexes: &[usize]) -> Vec<usize> {
    (0..length).filter(|i| !indexes.contains(i)).collect()
}

pub fn generate_random_secret(n: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut secret = vec![0u8; n];
    rng.fill_bytes(&mut secret);
    secret
}

pub mod bbsplus_utils {
    use bls12_381_plus::{G1Affine, G1Projective, Scalar};
    use elliptic_curve::{
        group::Curve,
        hash2curve::{ExpandMsg, Expander},
    };
    use ff::Field;
    use rand::RngCore;

    use crate::{
        bbsplus::{ciphersuites::BbsCiphersuite, generators::Generators, keys::BBSplusPublicKey},
        errors::Error,
        utils::message::BBSplusMessage,
    };

    /// <https://datatracker.ietf.org/doc/html/rfc8017#section-4.1>
    pub fn i2osp(x: usize, x_len: usize) -> Vec<u8> {
        let bytes = (x as u64).to_be_bytes();
        if x_len >= 8 {
            let mut out = vec![0u8; x_len - 8];
            out.extend_from_slice(&bytes);
            out
        } else {
            bytes[8 - x_len..].to_vec()
        }
    }

    /// <https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bbs-signatures-05#name-hash-to-scalar>
    ///
    /// # Description
    /// Hashes an arbitrary octet string to a scalar value in the multiplicative group of integers mod r
    pub fn hash_to_scalar<CS>(msg_octets: &[u8], dst: &[u8]) -> Result<Scalar, Error>
    where
        CS: BbsCiphersuite,
    {
        if dst.len() > 255 {
            return Err(Error::HashToScalarError);
        }
        let mut uniform_bytes = vec![0u8; CS::EXPAND_LEN];
        CS::Expander::expand_message(&[msg_octets], &[dst], CS::EXPAND_LEN)
            .map_err(|_| Error::HashToScalarError)?
            .fill_bytes(&mut uniform_bytes);

        let okm: [u8; 48] = uniform_bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::HashToScalarError)?;
        Ok(Scalar::from_okm(&okm))
    }

    /// <https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bbs-signatures-05#name-domain-calculation>
    pub(crate) fn calculate_domain<CS>(
        pk: &BBSplusPublicKey,
        generators: &Generators,
        header: Option<&[u8]>,
    ) -> Result<Scalar, Error>
    where
        CS: BbsCiphersuite,
    {
        let header = header.unwrap_or(b"");
        let L = generators.message_generators.len();

        let mut dom_octs: Vec<u8> = Vec::new();
        dom_octs.extend_from_slice(&i2osp(L, 8));
        dom_octs.extend_from_slice(&generators.q1.to_affine().to_compressed());
        generators
            .message_generators
            .iter()
            .for_each(|p| dom_octs.extend_from_slice(&p.to_affine().to_compressed()));
        dom_octs.extend_from_slice(CS::API_ID);

        let mut dom_input: Vec<u8> = Vec::new();
        dom_input.extend_from_slice(&pk.to_bytes());
        dom_input.extend_from_slice(&dom_octs);
        dom_input.extend_from_slice(&i2osp(header.len(), 8));
        dom_input.extend_from_slice(header);

        hash_to_scalar::<CS>(&dom_input, &CS::h2s_dst())
    }

    /// Fresh uniformly random scalars (48 random bytes reduced mod r, as in the draft's `calculate_random_scalars`).
    pub fn calculate_random_scalars(count: usize) -> Vec<Scalar> {
        let mut rng = rand::thread_rng();
        (0..count)
            .map(|_| {
                let mut buf = [0u8; 48];
                rng.fill_bytes(&mut buf);
                Scalar::from_okm(&buf)
            })
            .collect()
    }

    pub fn get_messages(messages: &[BBSplusMessage], indexes: &[usize]) -> Vec<BBSplusMessage> {
        indexes.iter().filter_map(|&i| messages.get(i).copied()).collect()
    }

    /// Maps a signed 64-bit integer into the scalar field, negatives as `r - |v|`.
    pub fn scalar_from_i64(value: i64) -> Scalar {
        let magnitude = Scalar::from(value.unsigned_abs());
        if value < 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn serialize_scalars(scalars: &[Scalar]) -> Vec<u8> {
        scalars.iter().flat_map(|s| s.to_bytes_be()).collect()
    }

    /// Sequential reader over a serialized proof.
    pub(crate) struct ByteReader<'a> {
        bytes: &'a [u8],
        offset: usize,
    }

    impl<'a> ByteReader<'a> {
        pub(crate) fn new(bytes: &'a [u8]) -> Self {
            Self { bytes, offset: 0 }
        }

        pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
            let end = self
                .offset
                .checked_add(len)
                .filter(|&end| end <= self.bytes.len())
                .ok_or(Error::InvalidProofOfKnowledgeSignature)?;
            let slice = &self.bytes[self.offset..end];
            self.offset = end;
            Ok(slice)
        }

        pub(crate) fn g1(&mut self) -> Result<G1Projective, Error> {
            let bytes: [u8; 48] = self
                .take(48)?
                .try_into()
                .map_err(|_| Error::InvalidProofOfKnowledgeSignature)?;
            Option::<G1Affine>::from(G1Affine::from_compressed(&bytes))
                .map(G1Projective::from)
                .ok_or(Error::InvalidProofOfKnowledgeSignature)
        }

        pub(crate) fn scalar(&mut self) -> Result<Scalar, Error> {
            let bytes: [u8; 32] = self
                .take(32)?
                .try_into()
                .map_err(|_| Error::InvalidProofOfKnowledgeSignature)?;
            Scalar::from_bytes_be_checked(&bytes).ok_or(Error::InvalidProofOfKnowledgeSignature)
        }

        pub(crate) fn length(&mut self) -> Result<usize, Error> {
            let bytes: [u8; 8] = self
                .take(8)?
                .try_into()
                .map_err(|_| Error::InvalidProofOfKnowledgeSignature)?;
            usize::try_from(u64::from_be_bytes(bytes))
                .map_err(|_| Error::InvalidProofOfKnowledgeSignature)
        }

        pub(crate) fn is_empty(&self) -> bool {
            self.offset == self.bytes.len()
        }
    }

    pub trait ScalarExt: Sized {
        fn to_bytes_be(&self) -> [u8; 32];
        fn from_bytes_be_checked(bytes: &[u8; 32]) -> Option<Self>;
        fn is_zero_scalar(&self) -> bool;
    }

    impl ScalarExt for Scalar {
        fn to_bytes_be(&self) -> [u8; 32] {
            self.to_be_bytes()
        }

        fn from_bytes_be_checked(bytes: &[u8; 32]) -> Option<Self> {
            Option::<Scalar>::from(Scalar::from_be_bytes(bytes))
        }

        fn is_zero_scalar(&self) -> bool {
            self.is_zero().into()
        }
    }
}
