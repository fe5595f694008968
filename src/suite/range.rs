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

use serde_json::{Map, Value};

use super::anonymizer::Anonymizer;
use crate::{
    bbsplus::range::RangeConstraint,
    errors::Error,
    rdf::{canonicalize::Canonicalizer, statement::Statement, term::range_marker},
};

/// Key of a range marker in a reveal document: `"age": { "range": [18, 65] }`.
pub const RANGE_KEY: &str = "range";

const GRAPH_KEY: &str = "@graph";

#[derive(Clone, Debug, PartialEq, Eq)]
struct Step {
    key: String,
    // identifier the frame requires on the node holding `key`
    node_id: Option<String>,
}

impl Step {
    fn accepts(&self, node: &Map<String, Value>) -> bool {
        match &self.node_id {
            Some(wanted) => node_id(node) == Some(wanted.as_str()),
            None => true,
        }
    }
}

/// A field of the reveal document marked with a range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangePath {
    steps: Vec<Step>,
    pub min: i64,
    pub max: i64,
}

impl RangePath {
    pub fn keys(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.key.as_str()).collect()
    }

    pub fn marker(&self) -> String {
        range_marker(self.min, self.max)
    }
}

/// Range markers of a reveal document, and the frame left once they are removed.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeSpec {
    frame: Value,
    paths: Vec<RangePath>,
}

impl RangeSpec {
    /// Fails with [`Error::InvalidRangeMarker`] on markers that are not `[min, max]` integer pairs
    /// with `min <= max` and a width the range proof supports.
    pub fn extract(reveal_document: &Value) -> Result<Self, Error> {
        let frame = reveal_document
            .as_object()
            .ok_or_else(|| Error::InvalidRevealDocument("reveal document must be an object".to_owned()))?;
        let mut paths = Vec::new();
        let frame = clean_frame(frame, &[], &mut paths)?;
        Ok(Self {
            frame: Value::Object(frame),
            paths,
        })
    }

    pub fn frame(&self) -> &Value {
        &self.frame
    }

    pub fn paths(&self) -> &[RangePath] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Writes the range marker in place of every integer at a marked field.
    pub fn mark_document(&self, document: &mut Value) {
        for path in &self.paths {
            let marker = path.marker();
            match document {
                Value::Object(root) if root.contains_key(GRAPH_KEY) => {
                    if let Some(graph) = root.get_mut(GRAPH_KEY) {
                        mark(graph, &path.steps, &marker);
                    }
                }
                _ => mark(document, &path.steps, &marker),
            }
        }
    }

    /// Statements holding a marked integer: their index in `statements`, and the bounds.
    ///
    /// `document` is the labeled document before anonymization, `statements` its anonymized
    /// statements.
    pub fn statement_indices<C: Canonicalizer>(
        &self,
        document: &Value,
        statements: &[Statement],
        canonicalizer: &C,
        anonymizer: &Anonymizer,
    ) -> Result<Vec<(usize, i64, i64)>, Error> {
        let roots = match document {
            Value::Object(root) if root.contains_key(GRAPH_KEY) => &root[GRAPH_KEY],
            _ => document,
        };

        let mut found = Vec::new();
        for path in &self.paths {
            let Some((last, _)) = path.steps.split_last() else {
                continue;
            };
            let predicate = canonicalizer.property_iri(&last.key);

            let mut parents = Vec::new();
            collect_parents(roots, &path.steps, &mut parents);
            for parent in parents {
                let id = node_id(parent).ok_or_else(|| {
                    Error::InvalidDocument(format!("node holding {} has no identifier", last.key))
                })?;
                let subject = anonymizer.placeholder(id).unwrap_or(id);
                found.extend(
                    statements
                        .iter()
                        .enumerate()
                        .filter(|(_, s)| {
                            s.subject().value() == subject
                                && s.predicate().value() == predicate
                                && s.object().is_integer_literal()
                        })
                        .map(|(i, _)| (i, path.min, path.max)),
                );
            }
        }
        found.sort();
        found.dedup();
        Ok(found)
    }
}

fn node_id(node: &Map<String, Value>) -> Option<&str> {
    node.get("id")
        .or_else(|| node.get("@id"))
        .and_then(Value::as_str)
}

fn clean_frame(frame: &Map<String, Value>, steps: &[Step], paths: &mut Vec<RangePath>) -> Result<Map<String, Value>, Error> {
    let frame_id = node_id(frame).map(str::to_owned);
    let mut cleaned = Map::new();
    for (key, value) in frame {
        let mut here = steps.to_vec();
        here.push(Step {
            key: key.clone(),
            node_id: frame_id.clone(),
        });
        let value = match value {
            Value::Object(sub) if sub.contains_key(RANGE_KEY) => {
                let (min, max) = parse_bounds(key, sub)?;
                paths.push(RangePath { steps: here, min, max });
                Value::Object(Map::new())
            }
            Value::Object(sub) if !sub.is_empty() => Value::Object(clean_frame(sub, &here, paths)?),
            other => other.clone(),
        };
        cleaned.insert(key.clone(), value);
    }
    Ok(cleaned)
}

fn parse_bounds(key: &str, marker: &Map<String, Value>) -> Result<(i64, i64), Error> {
    let invalid = |reason: &str| Error::InvalidRangeMarker(format!("{}: {}", key, reason));
    if marker.len() != 1 {
        return Err(invalid("a range marker takes no other keys"));
    }
    let bounds = marker[RANGE_KEY]
        .as_array()
        .ok_or_else(|| invalid("expected [min, max]"))?;
    let [min, max] = bounds.as_slice() else {
        return Err(invalid("expected exactly two bounds"));
    };
    let (Some(min), Some(max)) = (min.as_i64(), max.as_i64()) else {
        return Err(invalid("bounds must be integers"));
    };
    RangeConstraint::new(0, min, max)
        .check_bounds()
        .map_err(|reason| invalid(&reason))?;
    Ok((min, max))
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::Object(o) => o.get("@value").map_or(false, is_integer),
        _ => false,
    }
}

fn mark(value: &mut Value, steps: &[Step], marker: &str) {
    let Some((step, rest)) = steps.split_first() else {
        return;
    };
    match value {
        Value::Array(items) => items.iter_mut().for_each(|item| mark(item, steps, marker)),
        Value::Object(node) if step.accepts(node) => {
            let Some(child) = node.get_mut(&step.key) else {
                return;
            };
            if !rest.is_empty() {
                mark(child, rest, marker);
                return;
            }
            if let Value::Array(items) = child {
                items
                    .iter_mut()
                    .filter(|item| is_integer(item))
                    .for_each(|item| *item = Value::String(marker.to_owned()));
            } else if is_integer(child) {
                *child = Value::String(marker.to_owned());
            }
        }
        _ => {}
    }
}

fn collect_parents<'a>(value: &'a Value, steps: &[Step], parents: &mut Vec<&'a Map<String, Value>>) {
    let Some((step, rest)) = steps.split_first() else {
        return;
    };
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_parents(item, steps, parents)),
        Value::Object(node) if step.accepts(node) => {
            if rest.is_empty() {
                if node.contains_key(&step.key) {
                    parents.push(node);
                }
            } else if let Some(child) = node.get(&step.key) {
                collect_parents(child, rest, parents);
            }
        }
        _ => {}
    }
}
