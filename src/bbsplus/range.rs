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

//! Zero-knowledge range proofs over hidden BBS+ messages.
//!
//! The hidden value `v` is committed as `C = G*v + H*r`. The commitment is linked to the BBS+ proof
//! of knowledge by reusing the blinding `m~` of the hidden message, so the response `m^` proves the
//! committed value is the signed one. `v - min` and `max - v` are then decomposed in
//! [`RANGE_BITS`] bits, each bit committed with a Pedersen commitment and proven to be 0 or 1 with
//! a disjunctive Schnorr proof (Cramer-Damgard-Schoenmakers). All sigma protocols answer the
//! single batch challenge.

use bls12_381_plus::{G1Projective, Scalar};
use elliptic_curve::group::Curve;
use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    utils::util::bbsplus_utils::{calculate_random_scalars, i2osp, scalar_from_i64, ByteReader, ScalarExt},
};

/// Bit width of `v - min` and `max - v`.
pub const RANGE_BITS: usize = 32;

/// The hidden message at `index` must encode an integer in `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RangeConstraint {
    pub index: usize,
    pub min: i64,
    pub max: i64,
}

impl RangeConstraint {
    pub fn new(index: usize, min: i64, max: i64) -> Self {
        Self { index, min, max }
    }

    /// Bounds must be ordered and at most `2^RANGE_BITS - 1` apart.
    pub fn check_bounds(&self) -> Result<(), String> {
        let width = self
            .max
            .checked_sub(self.min)
            .filter(|w| *w >= 0)
            .ok_or_else(|| format!("invalid range [{}, {}]", self.min, self.max))?;
        if (width as u64) >> RANGE_BITS != 0 {
            return Err(format!("range [{}, {}] is too wide", self.min, self.max));
        }
        Ok(())
    }

    pub(crate) fn transcript(&self) -> Vec<u8> {
        let mut bytes = i2osp(self.index, 8);
        bytes.extend_from_slice(&self.min.to_be_bytes());
        bytes.extend_from_slice(&self.max.to_be_bytes());
        bytes
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitProof {
    commitment: G1Projective,
    c0: Scalar,
    z0: Scalar,
    z1: Scalar,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeProof {
    commitment: G1Projective,
    r_cap: Scalar,
    lower: Vec<BitProof>,
    upper: Vec<BitProof>,
}

/// Commitments entering the Fiat-Shamir transcript.
#[derive(Clone, Debug)]
pub(crate) struct RangeInitResult {
    constraint: RangeConstraint,
    commitment: G1Projective,
    t_commitment: G1Projective,
    bits: Vec<(G1Projective, G1Projective, G1Projective)>,
}

impl RangeInitResult {
    pub(crate) fn transcript(&self) -> Vec<u8> {
        let mut bytes = self.constraint.transcript();
        bytes.extend_from_slice(&self.commitment.to_affine().to_compressed());
        bytes.extend_from_slice(&self.t_commitment.to_affine().to_compressed());
        for (a, t0, t1) in &self.bits {
            bytes.extend_from_slice(&a.to_affine().to_compressed());
            bytes.extend_from_slice(&t0.to_affine().to_compressed());
            bytes.extend_from_slice(&t1.to_affine().to_compressed());
        }
        bytes
    }
}

struct BitWitness {
    commitment: G1Projective,
    bit: bool,
    opening: Scalar,
    w: Scalar,
    c_fake: Scalar,
    z_fake: Scalar,
}

/// Prover state kept between the commitment and the response phases.
pub(crate) struct RangeWitness {
    commitment: G1Projective,
    r: Scalar,
    r_tilde: Scalar,
    bits: Vec<BitWitness>,
}

impl RangeProof {
    /// Commitment phase. `m_tilde` is the blinding of the hidden message in the BBS+ proof.
    pub(crate) fn init(
        bases: (G1Projective, G1Projective),
        value: i64,
        constraint: &RangeConstraint,
        m_tilde: Scalar,
    ) -> Result<(RangeInitResult, RangeWitness), Error> {
        let (G, H) = bases;
        constraint.check_bounds().map_err(Error::ProofGenError)?;
        if value < constraint.min || value > constraint.max {
            return Err(Error::ProofGenError(format!(
                "value at index {} is outside [{}, {}]",
                constraint.index, constraint.min, constraint.max
            )));
        }
        let lower = (value - constraint.min) as u64;
        let upper = (constraint.max - value) as u64;

        let random = calculate_random_scalars(2);
        let (r, r_tilde) = (random[0], random[1]);

        let commitment = G * scalar_from_i64(value) + H * r;
        let t_commitment = G * m_tilde + H * r_tilde;

        // openings of the lower bits sum (weighted) to r, those of the upper bits to -r
        let mut bits = Self::commit_bits(bases, lower, r);
        bits.extend(Self::commit_bits(bases, upper, -r));

        let init = RangeInitResult {
            constraint: *constraint,
            commitment,
            t_commitment,
            bits: bits.iter().map(|b| b.transcript_points(G, H)).collect(),
        };

        Ok((init, RangeWitness { commitment, r, r_tilde, bits }))
    }

    fn commit_bits(bases: (G1Projective, G1Projective), value: u64, total_opening: Scalar) -> Vec<BitWitness> {
        let (G, H) = bases;
        let mut openings = calculate_random_scalars(RANGE_BITS);
        let weighted_tail = openings
            .iter()
            .enumerate()
            .skip(1)
            .fold(Scalar::from(0u64), |acc, (i, s)| acc + power_of_two(i) * s);
        openings[0] = total_opening - weighted_tail;

        openings
            .into_iter()
            .enumerate()
            .map(|(i, opening)| {
                let bit = (value >> i) & 1 == 1;
                let random = calculate_random_scalars(3);
                let bit_scalar = if bit { Scalar::from(1u64) } else { Scalar::from(0u64) };
                BitWitness {
                    commitment: G * bit_scalar + H * opening,
                    bit,
                    opening,
                    w: random[0],
                    c_fake: random[1],
                    z_fake: random[2],
                }
            })
            .collect()
    }

    /// Response phase.
    pub(crate) fn finalize(witness: RangeWitness, challenge: Scalar) -> RangeProof {
        let r_cap = witness.r_tilde + witness.r * challenge;
        let mut bits: Vec<BitProof> = witness.bits.iter().map(|b| b.respond(challenge)).collect();
        let upper = bits.split_off(RANGE_BITS);

        RangeProof {
            commitment: witness.commitment,
            r_cap,
            lower: bits,
            upper,
        }
    }

    /// Recomputes the transcript commitments from the responses. `m_cap` is the response of the
    /// hidden message in the BBS+ proof.
    pub(crate) fn verify_init(
        &self,
        bases: (G1Projective, G1Projective),
        constraint: &RangeConstraint,
        m_cap: Scalar,
        challenge: Scalar,
    ) -> Result<RangeInitResult, Error> {
        let (G, H) = bases;
        constraint.check_bounds().map_err(Error::PoKSVerificationError)?;
        if self.lower.len() != RANGE_BITS || self.upper.len() != RANGE_BITS {
            return Err(Error::PoKSVerificationError("invalid range proof length".to_owned()));
        }

        // C - G*min = sum 2^i A_i and G*max - C = sum 2^i B_i
        let lower_sum = weighted_sum(&self.lower);
        let upper_sum = weighted_sum(&self.upper);
        if lower_sum != self.commitment - G * scalar_from_i64(constraint.min)
            || upper_sum != G * scalar_from_i64(constraint.max) - self.commitment
        {
            return Err(Error::PoKSVerificationError(format!(
                "range decomposition mismatch at index {}",
                constraint.index
            )));
        }

        let t_commitment = G * m_cap + H * self.r_cap - self.commitment * challenge;
        let bits = self
            .lower
            .iter()
            .chain(self.upper.iter())
            .map(|b| b.recompute(G, H, challenge))
            .collect();

        Ok(RangeInitResult {
            constraint: *constraint,
            commitment: self.commitment,
            t_commitment,
            bits,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.commitment.to_affine().to_compressed());
        bytes.extend_from_slice(&self.r_cap.to_bytes_be());
        for bit in self.lower.iter().chain(self.upper.iter()) {
            bytes.extend_from_slice(&bit.commitment.to_affine().to_compressed());
            bytes.extend_from_slice(&bit.c0.to_bytes_be());
            bytes.extend_from_slice(&bit.z0.to_bytes_be());
            bytes.extend_from_slice(&bit.z1.to_bytes_be());
        }
        bytes
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, Error> {
        let commitment = reader.g1()?;
        let r_cap = reader.scalar()?;
        let mut bits = Vec::with_capacity(2 * RANGE_BITS);
        for _ in 0..2 * RANGE_BITS {
            bits.push(BitProof {
                commitment: reader.g1()?,
                c0: reader.scalar()?,
                z0: reader.scalar()?,
                z1: reader.scalar()?,
            });
        }
        let upper = bits.split_off(RANGE_BITS);
        Ok(Self {
            commitment,
            r_cap,
            lower: bits,
            upper,
        })
    }
}

impl BitWitness {
    fn transcript_points(&self, G: G1Projective, H: G1Projective) -> (G1Projective, G1Projective, G1Projective) {
        let real = H * self.w;
        if self.bit {
            // simulated branch: A commits to 0
            let t0 = H * self.z_fake - self.commitment * self.c_fake;
            (self.commitment, t0, real)
        } else {
            // simulated branch: A commits to 1
            let t1 = H * self.z_fake - (self.commitment - G) * self.c_fake;
            (self.commitment, real, t1)
        }
    }

    fn respond(&self, challenge: Scalar) -> BitProof {
        let c_real = challenge - self.c_fake;
        let z_real = self.w + self.opening * c_real;
        if self.bit {
            BitProof {
                commitment: self.commitment,
                c0: self.c_fake,
                z0: self.z_fake,
                z1: z_real,
            }
        } else {
            BitProof {
                commitment: self.commitment,
                c0: c_real,
                z0: z_real,
                z1: self.z_fake,
            }
        }
    }
}

impl BitProof {
    fn recompute(&self, G: G1Projective, H: G1Projective, challenge: Scalar) -> (G1Projective, G1Projective, G1Projective) {
        let c1 = challenge - self.c0;
        let t0 = H * self.z0 - self.commitment * self.c0;
        let t1 = H * self.z1 - (self.commitment - G) * c1;
        (self.commitment, t0, t1)
    }
}

fn power_of_two(i: usize) -> Scalar {
    Scalar::from(1u64 << i)
}

fn weighted_sum(bits: &[BitProof]) -> G1Projective {
    bits.iter()
        .enumerate()
        .fold(G1Projective::IDENTITY, |acc, (i, b)| acc + b.commitment * power_of_two(i))
}
