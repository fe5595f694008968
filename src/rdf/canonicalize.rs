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

//! Deterministic mapping of JSON documents to ordered statement lists.

use std::{collections::HashMap, sync::OnceLock};

use regex::Regex;
use serde_json::{Map, Value};

use super::{
    statement::Statement,
    term::{Term, RDF_LANGSTRING, RDF_TYPE, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER},
};
use crate::errors::Error;

pub const SCHEMA_VOCAB: &str = "https://schema.org/";
pub const SECURITY_VOCAB: &str = "https://w3id.org/security#";
const XSD_PREFIX: &str = "xsd:";
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// Keys stripped from proof metadata before canonicalization.
pub const PROOF_VALUE_KEYS: [&str; 2] = ["proofValue", "nonce"];

pub trait Canonicalizer {
    /// Statements of a document, sorted by their N-Quads form and deduplicated.
    fn canonicalize(&self, document: &Value) -> Result<Vec<Statement>, Error>;

    /// Statements of proof metadata, without `proofValue` and `nonce`.
    fn canonicalize_proof(&self, proof: &Value) -> Result<Vec<Statement>, Error>;

    /// The document with every blank node carrying its canonical label as identifier.
    fn label_blank_nodes(&self, document: &Value) -> Result<Value, Error>;

    /// Predicate IRI of a document key.
    fn property_iri(&self, key: &str) -> String;
}

/// Canonicalizer for a compact JSON-LD subset, with relative keys and types expanded against a
/// vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonCanonicalizer {
    document_vocab: String,
    proof_vocab: String,
}

impl Default for JsonCanonicalizer {
    fn default() -> Self {
        Self::new(SCHEMA_VOCAB, SECURITY_VOCAB)
    }
}

impl JsonCanonicalizer {
    pub fn new(document_vocab: impl Into<String>, proof_vocab: impl Into<String>) -> Self {
        Self {
            document_vocab: document_vocab.into(),
            proof_vocab: proof_vocab.into(),
        }
    }

    fn statements(&self, document: &Value, vocab: &str) -> Result<Vec<Statement>, Error> {
        let mut visitor = Visitor::new(vocab);
        visitor.visit_root(document)?;
        let mut statements = visitor.statements;
        statements.sort_by_cached_key(|s| s.to_string());
        statements.dedup();
        Ok(statements)
    }
}

impl Canonicalizer for JsonCanonicalizer {
    fn canonicalize(&self, document: &Value) -> Result<Vec<Statement>, Error> {
        self.statements(document, &self.document_vocab)
    }

    fn canonicalize_proof(&self, proof: &Value) -> Result<Vec<Statement>, Error> {
        let mut proof = proof
            .as_object()
            .cloned()
            .ok_or_else(|| Error::InvalidDocument("proof must be an object".to_owned()))?;
        PROOF_VALUE_KEYS.iter().for_each(|k| {
            proof.remove(*k);
        });
        self.statements(&Value::Object(proof), &self.proof_vocab)
    }

    fn label_blank_nodes(&self, document: &Value) -> Result<Value, Error> {
        let mut visitor = Visitor::new(&self.document_vocab);
        let mut labeled = document.clone();
        visitor.label_root(&mut labeled)?;
        Ok(labeled)
    }

    fn property_iri(&self, key: &str) -> String {
        expand(key, &self.document_vocab)
    }
}

fn absolute_iri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s<>"{}|\\^`]*$"#).expect("valid regex"))
}

pub fn is_absolute_iri(s: &str) -> bool {
    !s.starts_with("_:") && absolute_iri_regex().is_match(s)
}

fn expand(key: &str, vocab: &str) -> String {
    if let Some(local) = key.strip_prefix(XSD_PREFIX) {
        format!("{}{}", XSD_NAMESPACE, local)
    } else if is_absolute_iri(key) {
        key.to_owned()
    } else {
        format!("{}{}", vocab, key)
    }
}

fn is_keyword(key: &str) -> bool {
    matches!(key, "id" | "@id" | "@context")
}

fn is_type_key(key: &str) -> bool {
    matches!(key, "type" | "@type")
}

fn node_id(node: &Map<String, Value>) -> Option<&Value> {
    node.get("id").or_else(|| node.get("@id"))
}

fn sorted_keys(node: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = node.keys().cloned().collect();
    keys.sort();
    keys
}

/// Walks nodes in sorted key order, assigning `_:c14nN` labels on first visit.
struct Visitor<'a> {
    vocab: &'a str,
    labels: HashMap<String, String>,
    next_label: usize,
    statements: Vec<Statement>,
}

impl<'a> Visitor<'a> {
    fn new(vocab: &'a str) -> Self {
        Self {
            vocab,
            labels: HashMap::new(),
            next_label: 0,
            statements: Vec::new(),
        }
    }

    fn fresh_label(&mut self) -> String {
        let label = format!("_:c14n{}", self.next_label);
        self.next_label += 1;
        label
    }

    fn blank(&mut self, id: &str) -> String {
        if let Some(label) = self.labels.get(id) {
            return label.clone();
        }
        let label = self.fresh_label();
        self.labels.insert(id.to_owned(), label.clone());
        label
    }

    fn subject(&mut self, node: &Map<String, Value>) -> Result<Term, Error> {
        match node_id(node) {
            None => Ok(Term::BlankNode(self.fresh_label())),
            Some(Value::String(id)) if id.starts_with("_:") => Ok(Term::BlankNode(self.blank(id))),
            Some(Value::String(id)) => Ok(Term::NamedNode(id.clone())),
            Some(other) => Err(Error::InvalidDocument(format!("invalid identifier {}", other))),
        }
    }

    fn nodes(root: &Value) -> Result<Vec<&Map<String, Value>>, Error> {
        match root {
            Value::Object(node) => match node.get("@graph") {
                Some(graph) => Self::nodes(graph),
                None => Ok(vec![node]),
            },
            Value::Array(items) => items
                .iter()
                .map(|v| {
                    v.as_object()
                        .ok_or_else(|| Error::InvalidDocument("top-level items must be objects".to_owned()))
                })
                .collect(),
            _ => Err(Error::InvalidDocument("document must be an object or an array".to_owned())),
        }
    }

    fn visit_root(&mut self, root: &Value) -> Result<(), Error> {
        for node in Self::nodes(root)? {
            self.visit_node(node)?;
        }
        Ok(())
    }

    fn visit_node(&mut self, node: &Map<String, Value>) -> Result<Term, Error> {
        let subject = self.subject(node)?;

        for key in sorted_keys(node) {
            if is_keyword(&key) || key == "@graph" {
                continue;
            }
            let value = &node[&key];
            if is_type_key(&key) {
                for t in values(value) {
                    let t = t
                        .as_str()
                        .ok_or_else(|| Error::InvalidDocument(format!("invalid type {}", t)))?;
                    self.push(&subject, RDF_TYPE.to_owned(), Term::NamedNode(expand(t, self.vocab)))?;
                }
                continue;
            }
            let predicate = expand(&key, self.vocab);
            for item in values(value) {
                if let Some(object) = self.object(item)? {
                    self.push(&subject, predicate.clone(), object)?;
                }
            }
        }
        Ok(subject)
    }

    fn push(&mut self, subject: &Term, predicate: String, object: Term) -> Result<(), Error> {
        self.statements.push(Statement::new(
            subject.clone(),
            Term::NamedNode(predicate),
            object,
            Term::DefaultGraph,
        )?);
        Ok(())
    }

    fn object(&mut self, value: &Value) -> Result<Option<Term>, Error> {
        let term = match value {
            Value::Null => return Ok(None),
            Value::String(s) if s.starts_with("_:") => Term::BlankNode(self.blank(s)),
            Value::String(s) if is_absolute_iri(s) => Term::NamedNode(s.clone()),
            Value::String(s) => Term::string(s.clone()),
            Value::Number(n) => number_literal(n),
            Value::Bool(b) => Term::literal(b.to_string(), XSD_BOOLEAN),
            Value::Object(o) if o.contains_key("@value") => value_object(o, self.vocab)?,
            Value::Object(o) => self.visit_node(o)?,
            Value::Array(_) => return Err(Error::InvalidDocument("nested arrays are not supported".to_owned())),
        };
        Ok(Some(term))
    }

    fn label_root(&mut self, root: &mut Value) -> Result<(), Error> {
        match root {
            Value::Object(node) if node.contains_key("@graph") => {
                if let Some(graph) = node.get_mut("@graph") {
                    self.label_root(graph)?;
                }
                Ok(())
            }
            Value::Object(node) => self.label_node(node),
            Value::Array(items) => items.iter_mut().try_for_each(|item| match item {
                Value::Object(node) => self.label_node(node),
                _ => Err(Error::InvalidDocument("top-level items must be objects".to_owned())),
            }),
            _ => Err(Error::InvalidDocument("document must be an object or an array".to_owned())),
        }
    }

    // mirrors visit_node so that labels agree with `canonicalize`
    fn label_node(&mut self, node: &mut Map<String, Value>) -> Result<(), Error> {
        if let Term::BlankNode(label) = self.subject(node)? {
            node.remove("@id");
            node.insert("id".to_owned(), Value::String(label));
        }

        for key in sorted_keys(node) {
            if is_keyword(&key) || key == "@graph" || is_type_key(&key) {
                continue;
            }
            if let Some(value) = node.get_mut(&key) {
                match value {
                    Value::Array(items) => {
                        for item in items.iter_mut() {
                            self.label_value(item)?;
                        }
                    }
                    item => self.label_value(item)?,
                }
            }
        }
        Ok(())
    }

    fn label_value(&mut self, value: &mut Value) -> Result<(), Error> {
        match value {
            Value::String(s) if s.starts_with("_:") => *s = self.blank(s),
            Value::Object(o) if !o.contains_key("@value") => self.label_node(o)?,
            _ => {}
        }
        Ok(())
    }
}

fn values(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        v => vec![v],
    }
}

fn number_literal(n: &serde_json::Number) -> Term {
    match n.as_i64() {
        Some(i) => Term::literal(i.to_string(), XSD_INTEGER),
        None => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => Term::literal(format!("{:.0}", f), XSD_INTEGER),
            Some(f) => Term::literal(format!("{:E}", f), XSD_DOUBLE),
            None => Term::literal(n.to_string(), XSD_INTEGER),
        },
    }
}

fn value_object(o: &Map<String, Value>, vocab: &str) -> Result<Term, Error> {
    let lexical = match &o["@value"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_literal(n).value().to_owned(),
        Value::Bool(b) => b.to_string(),
        other => return Err(Error::InvalidDocument(format!("invalid @value {}", other))),
    };
    if let Some(language) = o.get("@language").and_then(Value::as_str) {
        return Ok(Term::lang_string(lexical, language));
    }
    match o.get("@type").and_then(Value::as_str) {
        Some(datatype) if datatype == RDF_LANGSTRING => {
            Err(Error::InvalidDocument("language string without language".to_owned()))
        }
        Some(datatype) => Ok(Term::literal(lexical, expand(datatype, vocab))),
        None => match &o["@value"] {
            Value::Number(n) => Ok(number_literal(n)),
            Value::Bool(b) => Ok(Term::literal(b.to_string(), XSD_BOOLEAN)),
            _ => Ok(Term::string(lexical)),
        },
    }
}
