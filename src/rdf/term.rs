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

use std::{fmt, sync::OnceLock};

use regex::Regex;

use crate::errors::Error;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_LANGSTRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Prefix of anonymized placeholders.
pub const ANON_PREFIX: &str = "urn:anon:";
/// Prefix of range markers, followed by `[min,max]`.
pub const RANGE_PREFIX: &str = "urn:range:";
/// Prefix of skolemized blank node identifiers.
pub const BNID_PREFIX: &str = "urn:bnid:";

fn anon_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:urn:anon:|https://zkp-ld\.org/\.well-known/genid/anonymous/)(.+)$").expect("valid regex")
    })
}

fn range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^urn:range:\s*([\[(])\s*(-?\d+)\s*,\s*(-?\d+)\s*([\])])\s*$").expect("valid regex")
    })
}

pub(crate) fn skolem_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^urn:bnid:(?:(\d+):)?(_:c14n\d+)$").expect("valid regex"))
}

pub(crate) fn c14n_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^_:c14n\d+$").expect("valid regex"))
}

/// One position of a [`Statement`](super::statement::Statement).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    NamedNode(String),
    BlankNode(String),
    Literal {
        value: String,
        datatype: String,
        language: Option<String>,
    },
    DefaultGraph,
}

/// What a term stands for in a derived document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermKind {
    Plain,
    Anonymized(String),
    RangeMarker { min: i64, max: i64 },
    SkolemizedBlank { doc_index: Option<usize>, label: String },
}

impl Term {
    pub fn named(iri: impl Into<String>) -> Self {
        Self::NamedNode(iri.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Self::BlankNode(label.into())
    }

    pub fn literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::literal(value, XSD_STRING)
    }

    pub fn lang_string(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: RDF_LANGSTRING.to_owned(),
            language: Some(language.into()),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::literal(value.to_string(), XSD_INTEGER)
    }

    /// Lexical value, empty for the default graph.
    pub fn value(&self) -> &str {
        match self {
            Self::NamedNode(v) | Self::BlankNode(v) => v,
            Self::Literal { value, .. } => value,
            Self::DefaultGraph => "",
        }
    }

    pub fn is_integer_literal(&self) -> bool {
        matches!(self, Self::Literal { datatype, .. } if datatype == XSD_INTEGER)
    }

    /// Classifies a term of a derived document.
    pub fn kind(&self) -> Result<TermKind, Error> {
        let value = match self {
            Self::NamedNode(v) => v,
            Self::Literal { value, .. } => {
                return Ok(anon_regex()
                    .captures(value)
                    .map(|c| TermKind::Anonymized(c[1].to_owned()))
                    .unwrap_or(TermKind::Plain))
            }
            _ => return Ok(TermKind::Plain),
        };

        if let Some(c) = anon_regex().captures(value) {
            return Ok(TermKind::Anonymized(c[1].to_owned()));
        }
        if value.starts_with(RANGE_PREFIX) {
            return parse_range_marker(value);
        }
        if let Some(c) = skolem_regex().captures(value) {
            let doc_index = c
                .get(1)
                .map(|m| m.as_str().parse::<usize>())
                .transpose()
                .map_err(|e| Error::InvalidStatement(format!("invalid skolem name {}: {}", value, e)))?;
            return Ok(TermKind::SkolemizedBlank {
                doc_index,
                label: c[2].to_owned(),
            });
        }
        Ok(TermKind::Plain)
    }
}

/// `urn:range:[min,max]`, an open bracket excludes its bound.
fn parse_range_marker(value: &str) -> Result<TermKind, Error> {
    let c = range_regex()
        .captures(value)
        .ok_or_else(|| Error::InvalidRangeMarker(value.to_owned()))?;
    let bound = |i: usize| {
        c[i].parse::<i64>()
            .map_err(|_| Error::InvalidRangeMarker(value.to_owned()))
    };
    let mut min = bound(2)?;
    let mut max = bound(3)?;
    if &c[1] == "(" {
        min = min
            .checked_add(1)
            .ok_or_else(|| Error::InvalidRangeMarker(value.to_owned()))?;
    }
    if &c[4] == ")" {
        max = max
            .checked_sub(1)
            .ok_or_else(|| Error::InvalidRangeMarker(value.to_owned()))?;
    }
    if min > max {
        return Err(Error::InvalidRangeMarker(value.to_owned()));
    }
    Ok(TermKind::RangeMarker { min, max })
}

pub fn range_marker(min: i64, max: i64) -> String {
    format!("{}[{},{}]", RANGE_PREFIX, min, max)
}

pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// N-Quads surface form of the term.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(iri) => write!(f, "<{}>", iri),
            Self::BlankNode(label) => write!(f, "{}", label),
            Self::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "\"{}\"", escape(value))?;
                if datatype == RDF_LANGSTRING {
                    if let Some(language) = language {
                        write!(f, "@{}", language)?;
                    }
                } else if datatype != XSD_STRING {
                    write!(f, "^^<{}>", datatype)?;
                }
                Ok(())
            }
            Self::DefaultGraph => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_forms() {
        assert_eq!(Term::named("http://example.org/a").to_string(), "<http://example.org/a>");
        assert_eq!(Term::blank("_:c14n0").to_string(), "_:c14n0");
        assert_eq!(Term::string("say \"hi\"\n").to_string(), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(Term::lang_string("ciao", "it").to_string(), "\"ciao\"@it");
        assert_eq!(
            Term::integer(-7).to_string(),
            "\"-7\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
        assert_eq!(Term::DefaultGraph.to_string(), "");
    }

    #[test]
    fn kinds() {
        assert_eq!(
            Term::named("urn:anon:1234").kind().unwrap(),
            TermKind::Anonymized("1234".to_owned())
        );
        assert_eq!(
            Term::string("urn:anon:abcd").kind().unwrap(),
            TermKind::Anonymized("abcd".to_owned())
        );
        assert_eq!(
            Term::named("urn:bnid:3:_:c14n12").kind().unwrap(),
            TermKind::SkolemizedBlank {
                doc_index: Some(3),
                label: "_:c14n12".to_owned()
            }
        );
        assert_eq!(
            Term::named("urn:bnid:_:c14n0").kind().unwrap(),
            TermKind::SkolemizedBlank {
                doc_index: None,
                label: "_:c14n0".to_owned()
            }
        );
        assert_eq!(Term::named("did:example:x").kind().unwrap(), TermKind::Plain);
        assert_eq!(Term::blank("_:c14n0").kind().unwrap(), TermKind::Plain);
    }

    #[test]
    fn range_markers() {
        assert_eq!(
            Term::named(range_marker(18, 65)).kind().unwrap(),
            TermKind::RangeMarker { min: 18, max: 65 }
        );
        assert_eq!(
            Term::named("urn:range:( 18 , 65 )").kind().unwrap(),
            TermKind::RangeMarker { min: 19, max: 64 }
        );
        assert_eq!(
            Term::named("urn:range:[-5,0)").kind().unwrap(),
            TermKind::RangeMarker { min: -5, max: -1 }
        );
        assert!(matches!(
            Term::named("urn:range:[a,b]").kind(),
            Err(Error::InvalidRangeMarker(_))
        ));
        assert!(matches!(
            Term::named("urn:range:(3,3)").kind(),
            Err(Error::InvalidRangeMarker(_))
        ));
    }
}
