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

use bls12_381_plus::Scalar;

use crate::{
    bbsplus::ciphersuites::BbsCiphersuite,
    errors::Error,
    utils::util::bbsplus_utils::{hash_to_scalar, scalar_from_i64},
};

/// Tag byte of a term encoded as an UTF-8 string.
pub const TAG_STRING: u8 = 0;
/// Tag byte of a term encoded as a 32-bit big-endian integer.
pub const TAG_INTEGER: u8 = 1;
pub const INTEGER_TERM_LENGTH: usize = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BBSplusMessage {
    pub value: Scalar,
}

impl BBSplusMessage {
    pub fn new(msg: Scalar) -> Self {
        Self { value: msg }
    }

    /// <https://datatracker.ietf.org/doc/html/draft-irtf-cfrg-bbs-signatures-05#name-mapmessagetoscalarashash>
    pub fn map_message_to_scalar_as_hash<CS>(data: &[u8], dst: &[u8]) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
    {
        let scalar = hash_to_scalar::<CS>(data, dst)?;
        Ok(Self { value: scalar })
    }

    /// Maps an encoded term to a scalar. Integer terms keep their numeric value so that range
    /// proofs can reason about them, every other term is hashed.
    pub fn map_term_to_scalar<CS>(term: &[u8]) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
    {
        match Self::integer_value(term) {
            Some(value) => Ok(Self::new(scalar_from_i64(i64::from(value)))),
            None => Self::map_message_to_scalar_as_hash::<CS>(term, &CS::map_msg_dst()),
        }
    }

    pub fn messages_to_scalar<CS>(messages: &[Vec<u8>]) -> Result<Vec<Self>, Error>
    where
        CS: BbsCiphersuite,
    {
        messages
            .iter()
            .map(|m| Self::map_term_to_scalar::<CS>(m))
            .collect()
    }

    /// Decodes the value of an integer-tagged term.
    pub fn integer_value(term: &[u8]) -> Option<i32> {
        match term {
            [TAG_INTEGER, b0, b1, b2, b3] => Some(i32::from_be_bytes([*b0, *b1, *b2, *b3])),
            _ => None,
        }
    }
}
