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

use bls12_381_plus::G1Projective;
use elliptic_curve::hash2curve::{ExpandMsg, Expander};

use super::ciphersuites::BbsCiphersuite;
use crate::errors::Error;
use crate::utils::util::bbsplus_utils::i2osp;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Generators {
    pub g1_base_point: G1Projective,
    pub q1: G1Projective,
    pub message_generators: Vec<G1Projective>,
}

impl Generators {
    /// Creates `Q1` followed by `len` message generators.
    ///
    /// <https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bbs-signatures-05#name-generators-calculation>
    pub fn create<CS>(len: usize) -> Result<Generators, Error>
    where
        CS: BbsCiphersuite,
    {
        let base_point = Self::create_g1_base_point::<CS>()?;
        let mut points = Self::create_generators::<CS>(CS::GENERATOR_SEED, len + 1)?;
        let q1 = points.remove(0);

        Ok(Generators {
            g1_base_point: base_point,
            q1,
            message_generators: points,
        })
    }

    fn create_generators<CS>(seed: &[u8], count: usize) -> Result<Vec<G1Projective>, Error>
    where
        CS: BbsCiphersuite,
    {
        let mut generators = Vec::with_capacity(count);
        let mut v = vec![0u8; CS::EXPAND_LEN];

        CS::Expander::expand_message(&[seed], &[CS::GENERATOR_SEED_DST], CS::EXPAND_LEN)
            .map_err(|_| Error::NotEnoughGenerators)?
            .fill_bytes(&mut v);

        for i in 1..=count {
            let input = [v.as_slice(), i2osp(i, 8).as_slice()].concat();
            CS::Expander::expand_message(&[input.as_slice()], &[CS::GENERATOR_SEED_DST], CS::EXPAND_LEN)
                .map_err(|_| Error::NotEnoughGenerators)?
                .fill_bytes(&mut v);
            generators.push(G1Projective::hash::<CS::Expander>(&v, CS::GENERATOR_DST));
        }

        Ok(generators)
    }

    fn create_g1_base_point<CS>() -> Result<G1Projective, Error>
    where
        CS: BbsCiphersuite,
    {
        let mut points = Self::create_generators::<CS>(CS::GENERATOR_SEED_BP, 1)?;
        points.pop().ok_or(Error::NotEnoughGenerators)
    }

    /// Independent Pedersen bases `(G, H)` for commitments to hidden messages.
    pub fn pedersen_bases<CS>() -> Result<(G1Projective, G1Projective), Error>
    where
        CS: BbsCiphersuite,
    {
        let dst = [CS::API_ID, CS::RANGE_GENERATOR_DST].concat();
        let seed = [CS::API_ID, b"RANGE_PROOF_GENERATOR_SEED".as_slice()].concat();
        let mut v = vec![0u8; CS::EXPAND_LEN];
        CS::Expander::expand_message(&[seed.as_slice()], &[dst.as_slice()], CS::EXPAND_LEN)
            .map_err(|_| Error::NotEnoughGenerators)?
            .fill_bytes(&mut v);

        let g = G1Projective::hash::<CS::Expander>(&[v.as_slice(), i2osp(1, 8).as_slice()].concat(), &dst);
        let h = G1Projective::hash::<CS::Expander>(&[v.as_slice(), i2osp(2, 8).as_slice()].concat(), &dst);
        Ok((g, h))
    }
}
