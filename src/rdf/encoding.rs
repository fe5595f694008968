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

use std::fmt::Debug;

use super::statement::{Statement, TERMS_PER_STATEMENT};
use crate::{errors::Error, utils::message::TAG_STRING};

/// How statements are broken into signed messages.
pub trait TermEncoding: Clone + Debug + Eq + 'static {
    const NAME: &'static str;

    fn messages_per_statement() -> usize;

    fn encode(statement: &Statement) -> Result<Vec<Vec<u8>>, Error>;

    /// Whether single terms can be hidden, linked or range-proven.
    fn binds_terms() -> bool;

    fn encode_all<'a>(statements: impl IntoIterator<Item = &'a Statement>) -> Result<Vec<Vec<u8>>, Error> {
        let mut messages = Vec::new();
        for statement in statements {
            messages.extend(Self::encode(statement)?);
        }
        Ok(messages)
    }

    /// Expands statement indexes to message indexes. Fails with `InvalidProofValue` when an
    /// index has no message position.
    fn message_indexes(statement_indexes: &[usize]) -> Result<Vec<usize>, Error> {
        let n = Self::messages_per_statement();
        statement_indexes.iter().try_fold(Vec::new(), |mut indexes, &i| {
            let first = i
                .checked_mul(n)
                .filter(|first| first.checked_add(n).is_some())
                .ok_or_else(|| Error::InvalidProofValue(format!("statement index {} is out of range", i)))?;
            indexes.extend(first..first + n);
            Ok(indexes)
        })
    }
}

/// One message per term: subject, predicate, object and graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Termwise {}

/// One message per statement, its N-Quads line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stringwise {}

impl TermEncoding for Termwise {
    const NAME: &'static str = "termwise";

    fn messages_per_statement() -> usize {
        TERMS_PER_STATEMENT
    }

    fn encode(statement: &Statement) -> Result<Vec<Vec<u8>>, Error> {
        Ok(statement.serialize()?.to_vec())
    }

    fn binds_terms() -> bool {
        true
    }
}

impl TermEncoding for Stringwise {
    const NAME: &'static str = "stringwise";

    fn messages_per_statement() -> usize {
        1
    }

    fn encode(statement: &Statement) -> Result<Vec<Vec<u8>>, Error> {
        let mut bytes = vec![TAG_STRING];
        bytes.extend_from_slice(statement.to_string().as_bytes());
        Ok(vec![bytes])
    }

    fn binds_terms() -> bool {
        false
    }
}

/// `[0, 2]` becomes `[0, 1, 2, 3, 8, 9, 10, 11]`.
pub fn statement_indices_to_term_indices(statement_indexes: &[usize]) -> Result<Vec<usize>, Error> {
    Termwise::message_indexes(statement_indexes)
}
