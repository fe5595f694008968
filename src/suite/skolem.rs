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

//! Stable names for canonical blank nodes, scoped by the position of their document in a batch.

use serde_json::Value;

use crate::rdf::{
    statement::Statement,
    term::{c14n_label_regex, Term, TermKind, BNID_PREFIX},
};

pub fn skolemize_statements(statements: &[Statement], doc_index: usize) -> Vec<Statement> {
    statements.iter().map(|s| s.skolemize(Some(doc_index))).collect()
}

pub fn deskolemize_statements(statements: &[Statement]) -> Vec<Statement> {
    statements.iter().map(Statement::deskolemize).collect()
}

/// Rewrites every string of a labeled document that is a canonical blank node label.
pub fn skolemize_document(document: &Value, doc_index: usize) -> Value {
    match document {
        Value::String(s) if c14n_label_regex().is_match(s) => {
            Value::String(format!("{}{}:{}", BNID_PREFIX, doc_index, s))
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| skolemize_document(v, doc_index)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), skolemize_document(v, doc_index)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Skolem names occurring in the statements, in order of first occurrence.
pub fn skolem_names(statements: &[Statement]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for term in statements.iter().flat_map(Statement::terms) {
        if let Term::NamedNode(iri) = term {
            if matches!(term.kind(), Ok(TermKind::SkolemizedBlank { .. })) && !names.contains(iri) {
                names.push(iri.clone());
            }
        }
    }
    names
}
