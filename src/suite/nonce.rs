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

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{errors::Error, rdf::statement::Statement, utils::util::generate_random_secret};

pub const DEFAULT_NONCE_LENGTH: usize = 50;

pub fn generate_nonce(length: usize) -> Vec<u8> {
    generate_random_secret(length)
}

/// The nonce followed by the N-Quads lines of every revealed document, in batch order.
pub fn extend_nonce<'a>(nonce: &[u8], revealed: impl IntoIterator<Item = &'a [Statement]>) -> Vec<u8> {
    let mut extended = nonce.to_vec();
    for statements in revealed {
        for statement in statements {
            extended.extend_from_slice(statement.to_string().as_bytes());
        }
    }
    extended
}

pub fn encode_nonce(nonce: &[u8]) -> String {
    STANDARD.encode(nonce)
}

pub fn decode_nonce(nonce: &str) -> Result<Vec<u8>, Error> {
    STANDARD
        .decode(nonce)
        .map_err(|_| Error::InvalidProofValue("nonce is not base64".to_owned()))
}
