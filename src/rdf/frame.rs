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

use crate::errors::Error;

/// Selects the part of a document described by a frame.
pub trait Framer {
    fn frame(&self, document: &Value, frame: &Value) -> Result<Value, Error>;
}

/// Keeps the keys named by the frame. Identifiers of selected nodes are always kept, nested
/// object frames select inside nested nodes, any other frame value takes the whole value.
/// `id` and `type` in a frame filter the nodes they apply to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubtreeFramer;

impl Framer for SubtreeFramer {
    fn frame(&self, document: &Value, frame: &Value) -> Result<Value, Error> {
        let frame = frame
            .as_object()
            .ok_or_else(|| Error::InvalidRevealDocument("frame must be an object".to_owned()))?;

        let framed = match document {
            Value::Object(node) if node.contains_key("@graph") => {
                let mut out = Map::new();
                if let Some(context) = node.get("@context") {
                    out.insert("@context".to_owned(), context.clone());
                }
                out.insert("@graph".to_owned(), frame_nodes(&node["@graph"], frame));
                Some(Value::Object(out))
            }
            Value::Object(node) => frame_node(node, frame).map(|mut out| {
                if let Some(context) = node.get("@context") {
                    out.insert("@context".to_owned(), context.clone());
                }
                Value::Object(out)
            }),
            Value::Array(_) => Some(frame_nodes(document, frame)),
            _ => return Err(Error::InvalidDocument("document must be an object or an array".to_owned())),
        };

        framed.ok_or_else(|| Error::InvalidRevealDocument("the frame does not match the document".to_owned()))
    }
}

fn frame_nodes(nodes: &Value, frame: &Map<String, Value>) -> Value {
    match nodes {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter_map(|item| item.as_object().and_then(|n| frame_node(n, frame)))
                .map(Value::Object)
                .collect(),
        ),
        Value::Object(node) => frame_node(node, frame).map(Value::Object).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn id_of(node: &Map<String, Value>) -> Option<(&str, &Value)> {
    ["id", "@id"]
        .into_iter()
        .find_map(|k| node.get_key_value(k).map(|(k, v)| (k.as_str(), v)))
}

fn type_of(node: &Map<String, Value>) -> Option<(&str, &Value)> {
    ["type", "@type"]
        .into_iter()
        .find_map(|k| node.get_key_value(k).map(|(k, v)| (k.as_str(), v)))
}

fn as_strings(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn is_value_object(value: &Value) -> bool {
    value.as_object().map_or(false, |o| o.contains_key("@value"))
}

fn frame_node(node: &Map<String, Value>, frame: &Map<String, Value>) -> Option<Map<String, Value>> {
    if let Some((_, wanted)) = id_of(frame) {
        match id_of(node) {
            Some((_, id)) if id == wanted => {}
            _ => return None,
        }
    }
    if let Some((_, wanted)) = type_of(frame) {
        let wanted = as_strings(wanted);
        let present = type_of(node).map(|(_, t)| as_strings(t)).unwrap_or_default();
        if !wanted.iter().all(|t| present.contains(t)) {
            return None;
        }
    }

    let mut out = Map::new();
    if let Some((key, id)) = id_of(node) {
        out.insert(key.to_owned(), id.clone());
    }
    if let Some((key, t)) = type_of(node) {
        if type_of(frame).is_some() {
            out.insert(key.to_owned(), t.clone());
        }
    }

    for (key, sub_frame) in frame {
        if matches!(key.as_str(), "id" | "@id" | "type" | "@type" | "@context" | "@explicit") {
            continue;
        }
        let Some(value) = node.get(key) else {
            continue;
        };
        let selected = match sub_frame {
            Value::Object(f) if !f.is_empty() => select(value, f),
            _ => Some(value.clone()),
        };
        if let Some(selected) = selected {
            out.insert(key.clone(), selected);
        }
    }
    Some(out)
}

fn select(value: &Value, frame: &Map<String, Value>) -> Option<Value> {
    match value {
        Value::Object(node) if !is_value_object(value) => frame_node(node, frame).map(Value::Object),
        Value::Array(items) => {
            let selected: Vec<Value> = items.iter().filter_map(|item| select(item, frame)).collect();
            (!selected.is_empty()).then_some(Value::Array(selected))
        }
        other => Some(other.clone()),
    }
}
