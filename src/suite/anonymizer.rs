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

use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::Error,
    rdf::{
        statement::Statement,
        term::{Term, ANON_PREFIX},
    },
};

/// `(proof index in the batch, message index in that proof)`
pub type Coordinate = (usize, usize);

/// Hidden identifiers and the placeholders that stand for them in revealed documents.
///
/// Each identifier is one equivalence class, numbered in registration order.
#[derive(Clone, Debug, Default)]
pub struct Anonymizer {
    entries: Vec<(String, String)>,
    lookup: HashMap<String, usize>,
}

impl Anonymizer {
    /// Registers identifiers under fresh `urn:anon:<uuid>` placeholders. Repeated identifiers
    /// keep their first placeholder.
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut anonymizer = Self::default();
        for identifier in identifiers {
            let identifier = identifier.into();
            if anonymizer.lookup.contains_key(&identifier) {
                continue;
            }
            let placeholder = format!("{}{}", ANON_PREFIX, Uuid::new_v4());
            anonymizer.lookup.insert(identifier.clone(), anonymizer.entries.len());
            anonymizer.entries.push((identifier, placeholder));
        }
        anonymizer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn placeholder(&self, identifier: &str) -> Option<&str> {
        self.lookup
            .get(identifier)
            .map(|&i| self.entries[i].1.as_str())
    }

    /// Class of a named node or literal whose value is a registered identifier.
    pub fn class_of(&self, term: &Term) -> Option<usize> {
        match term {
            Term::NamedNode(value) | Term::Literal { value, .. } => self.lookup.get(value).copied(),
            _ => None,
        }
    }

    /// Replaces every string value equal to a registered identifier. Object keys are kept.
    pub fn anonymize_document(&self, document: &Value) -> Value {
        match document {
            Value::String(s) => match self.placeholder(s) {
                Some(placeholder) => Value::String(placeholder.to_owned()),
                None => document.clone(),
            },
            Value::Array(items) => Value::Array(items.iter().map(|v| self.anonymize_document(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.anonymize_document(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub fn anonymize_statement(&self, statement: &Statement) -> Statement {
        statement.terms().into_iter().fold(statement.clone(), |anonymized, term| {
            match self.class_of(term) {
                Some(class) => anonymized.replace(term.value(), &self.entries[class].1),
                None => anonymized,
            }
        })
    }

    /// Occurrences of hidden identifiers among the revealed messages of one proof. `terms`
    /// yields the terms in message order, starting at message `first`.
    pub fn occurrences<'a>(
        &self,
        proof_index: usize,
        first: usize,
        terms: impl IntoIterator<Item = &'a Term>,
        revealed: &BTreeSet<usize>,
    ) -> Vec<(usize, Coordinate)> {
        terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| (first + i, term))
            .filter(|(i, _)| revealed.contains(i))
            .filter_map(|(i, term)| self.class_of(term).map(|class| (class, (proof_index, i))))
            .collect()
    }
}

/// Restores the terms a holder hid in `statement`. Positions whose value is a key of
/// `anon_to_term` are replaced by the mapped term, which must fit the position.
pub fn deanonymize_statement(statement: &Statement, anon_to_term: &HashMap<String, Term>) -> Result<Statement, Error> {
    let restore = |term: &Term| match term {
        Term::DefaultGraph => term.clone(),
        _ => anon_to_term.get(term.value()).cloned().unwrap_or_else(|| term.clone()),
    };
    let [subject, predicate, object, graph] = statement.terms().map(restore);
    Statement::new(subject, predicate, object, graph)
        .map_err(|e| Error::InvalidStatement(format!("invalid anonymization map: {}", e)))
}

/// Occurrences grouped by the hidden value they share, classes kept in first-seen order and
/// members in encounter order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquivalenceClasses<K> {
    keys: Vec<K>,
    members: Vec<Vec<Coordinate>>,
}

impl<K> Default for EquivalenceClasses<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            members: Vec::new(),
        }
    }
}

impl<K: PartialEq> EquivalenceClasses<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: K, coordinate: Coordinate) {
        match self.keys.iter().position(|k| *k == key) {
            Some(i) => self.members[i].push(coordinate),
            None => {
                self.keys.push(key);
                self.members.push(vec![coordinate]);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn class_sizes(&self) -> Vec<usize> {
        self.members.iter().map(Vec::len).collect()
    }

    pub fn into_table(self) -> Vec<Vec<Coordinate>> {
        self.members
    }
}

impl<K: PartialEq> FromIterator<(K, Coordinate)> for EquivalenceClasses<K> {
    fn from_iter<T: IntoIterator<Item = (K, Coordinate)>>(iter: T) -> Self {
        let mut classes = Self::new();
        for (key, coordinate) in iter {
            classes.record(key, coordinate);
        }
        classes
    }
}
