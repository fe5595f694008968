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

use std::{fmt, str::FromStr};

use super::term::{c14n_label_regex, skolem_regex, Term, BNID_PREFIX, RDF_LANGSTRING, XSD_INTEGER, XSD_STRING};
use crate::{
    errors::Error,
    utils::message::{TAG_INTEGER, TAG_STRING},
};

pub const TERMS_PER_STATEMENT: usize = 4;

/// An RDF quad. Transformations return new statements.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Statement {
    subject: Term,
    predicate: Term,
    object: Term,
    graph: Term,
}

impl Statement {
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Term) -> Result<Self, Error> {
        if !matches!(subject, Term::NamedNode(_) | Term::BlankNode(_)) {
            return Err(Error::InvalidStatement(format!("invalid subject {}", subject)));
        }
        if !matches!(predicate, Term::NamedNode(_)) {
            return Err(Error::InvalidStatement(format!("invalid predicate {}", predicate)));
        }
        if matches!(object, Term::DefaultGraph) {
            return Err(Error::InvalidStatement("missing object".to_owned()));
        }
        if matches!(graph, Term::Literal { .. }) {
            return Err(Error::InvalidStatement(format!("invalid graph {}", graph)));
        }
        Ok(Self {
            subject,
            predicate,
            object,
            graph,
        })
    }

    pub fn subject(&self) -> &Term {
        &self.subject
    }

    pub fn predicate(&self) -> &Term {
        &self.predicate
    }

    pub fn object(&self) -> &Term {
        &self.object
    }

    pub fn graph(&self) -> &Term {
        &self.graph
    }

    pub fn terms(&self) -> [&Term; TERMS_PER_STATEMENT] {
        [&self.subject, &self.predicate, &self.object, &self.graph]
    }

    /// Surface form of each position.
    pub fn to_terms(&self) -> [String; TERMS_PER_STATEMENT] {
        self.terms().map(|t| t.to_string())
    }

    /// Tagged message of each position. Integer literals are encoded as 32-bit integers.
    pub fn serialize(&self) -> Result<[Vec<u8>; TERMS_PER_STATEMENT], Error> {
        Ok([
            serialize_term(&self.subject)?,
            serialize_term(&self.predicate)?,
            serialize_term(&self.object)?,
            serialize_term(&self.graph)?,
        ])
    }

    /// Renames `_:c14nN` blank nodes as `urn:bnid:<doc_index>:_:c14nN` (or `urn:bnid:_:c14nN`).
    pub fn skolemize(&self, doc_index: Option<usize>) -> Self {
        let skolemize = |t: &Term| match t {
            Term::BlankNode(label) if c14n_label_regex().is_match(label) => Term::NamedNode(match doc_index {
                Some(i) => format!("{}{}:{}", BNID_PREFIX, i, label),
                None => format!("{}{}", BNID_PREFIX, label),
            }),
            t => t.clone(),
        };
        self.map_nodes(skolemize)
    }

    pub fn deskolemize(&self) -> Self {
        let deskolemize = |t: &Term| match t {
            Term::NamedNode(iri) => match skolem_regex().captures(iri) {
                Some(c) => Term::BlankNode(c[2].to_owned()),
                None => t.clone(),
            },
            t => t.clone(),
        };
        self.map_nodes(deskolemize)
    }

    /// Replaces every position whose value is exactly `from`, keeping the kind of the term.
    pub fn replace(&self, from: &str, to: &str) -> Self {
        let replace = |t: &Term| match t {
            Term::NamedNode(v) if v == from => Term::NamedNode(to.to_owned()),
            Term::BlankNode(v) if v == from => Term::BlankNode(to.to_owned()),
            Term::Literal {
                value,
                datatype,
                language,
            } if value == from => Term::Literal {
                value: to.to_owned(),
                datatype: datatype.clone(),
                language: language.clone(),
            },
            t => t.clone(),
        };
        Self {
            subject: replace(&self.subject),
            predicate: replace(&self.predicate),
            object: replace(&self.object),
            graph: replace(&self.graph),
        }
    }

    pub fn with_object(&self, object: Term) -> Self {
        Self {
            object,
            ..self.clone()
        }
    }

    // predicates are never blank nodes
    fn map_nodes(&self, f: impl Fn(&Term) -> Term) -> Self {
        Self {
            subject: f(&self.subject),
            predicate: self.predicate.clone(),
            object: f(&self.object),
            graph: f(&self.graph),
        }
    }
}

fn serialize_term(term: &Term) -> Result<Vec<u8>, Error> {
    if let Term::Literal { value, datatype, .. } = term {
        if datatype == XSD_INTEGER && is_integer_lexical(value) {
            let n = value
                .parse::<i32>()
                .map_err(|_| Error::IntegerOutOfRange(value.clone()))?;
            // |n| < 2^31
            if n == i32::MIN {
                return Err(Error::IntegerOutOfRange(value.clone()));
            }
            let mut bytes = vec![TAG_INTEGER];
            bytes.extend_from_slice(&n.to_be_bytes());
            return Ok(bytes);
        }
    }
    let mut bytes = vec![TAG_STRING];
    bytes.extend_from_slice(term.to_string().as_bytes());
    Ok(bytes)
}

fn is_integer_lexical(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// N-Quads line, terminated by `" .\n"`.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ", self.subject, self.predicate, self.object)?;
        if self.graph != Term::DefaultGraph {
            write!(f, "{} ", self.graph)?;
        }
        writeln!(f, ".")
    }
}

impl FromStr for Statement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = LineParser { rest: s.trim() };
        let subject = parser.term()?;
        let predicate = parser.term()?;
        let object = parser.term()?;
        let graph = if parser.rest.starts_with('.') {
            Term::DefaultGraph
        } else {
            parser.term()?
        };
        if parser.rest != "." {
            return Err(Error::InvalidStatement(format!("expected end of statement in {}", s)));
        }
        Self::new(subject, predicate, object, graph)
    }
}

/// Parses an N-Quads document, one statement per non-empty line.
pub fn parse_nquads(nquads: &str) -> Result<Vec<Statement>, Error> {
    nquads
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(Statement::from_str)
        .collect()
}

struct LineParser<'a> {
    rest: &'a str,
}

impl<'a> LineParser<'a> {
    fn term(&mut self) -> Result<Term, Error> {
        let term = if let Some(rest) = self.rest.strip_prefix('<') {
            let end = rest
                .find('>')
                .ok_or_else(|| Error::InvalidStatement("unterminated IRI".to_owned()))?;
            self.rest = &rest[end + 1..];
            Term::NamedNode(rest[..end].to_owned())
        } else if self.rest.starts_with("_:") {
            let end = self.rest.find(char::is_whitespace).unwrap_or(self.rest.len());
            let label = &self.rest[..end];
            self.rest = &self.rest[end..];
            Term::BlankNode(label.to_owned())
        } else if let Some(rest) = self.rest.strip_prefix('"') {
            self.literal(rest)?
        } else {
            return Err(Error::InvalidStatement(format!("unexpected token at {}", self.rest)));
        };
        self.rest = self.rest.trim_start();
        Ok(term)
    }

    fn literal(&mut self, rest: &'a str) -> Result<Term, Error> {
        let mut value = String::new();
        let mut chars = rest.char_indices();
        let end = loop {
            match chars.next() {
                Some((i, '"')) => break i,
                Some((_, '\\')) => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, c @ ('"' | '\\'))) => value.push(c),
                    _ => return Err(Error::InvalidStatement("invalid escape in literal".to_owned())),
                },
                Some((_, c)) => value.push(c),
                None => return Err(Error::InvalidStatement("unterminated literal".to_owned())),
            }
        };
        self.rest = &rest[end + 1..];

        if let Some(tail) = self.rest.strip_prefix('@') {
            let len = tail.find(char::is_whitespace).unwrap_or(tail.len());
            self.rest = &tail[len..];
            return Ok(Term::lang_string(value, &tail[..len]));
        }
        if let Some(tail) = self.rest.strip_prefix("^^<") {
            let len = tail
                .find('>')
                .ok_or_else(|| Error::InvalidStatement("unterminated datatype".to_owned()))?;
            self.rest = &tail[len + 1..];
            let datatype = &tail[..len];
            if datatype == RDF_LANGSTRING {
                return Err(Error::InvalidStatement("language string without language".to_owned()));
            }
            return Ok(Term::literal(value, datatype));
        }
        Ok(Term::literal(value, XSD_STRING))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::message::BBSplusMessage;

    const LINE: &str = "_:c14n0 <http://schema.org/age> \"25\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n";

    #[test]
    fn nquads_round_trip() {
        let statement: Statement = LINE.parse().unwrap();
        assert_eq!(statement.to_string(), LINE);

        let quad = "<did:a> <http://schema.org/name> \"A \\\"B\\\"\"@en <did:g> .\n";
        assert_eq!(quad.parse::<Statement>().unwrap().to_string(), quad);
    }

    #[test]
    fn parses_documents() {
        let document = format!("{}\n<did:a> <http://schema.org/knows> _:c14n0 .\n", LINE);
        let statements = parse_nquads(&document).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].object(), &Term::blank("_:c14n0"));
        assert!(parse_nquads("<did:a> <http://p> .\n").is_err());
    }

    #[test]
    fn rejects_invalid_positions() {
        assert!("\"x\" <http://p> <did:a> .".parse::<Statement>().is_err());
        assert!("<did:a> _:b0 <did:b> .".parse::<Statement>().is_err());
        assert!("<did:a> <http://p> <did:b>".parse::<Statement>().is_err());
    }

    #[test]
    fn terms_and_messages() {
        let statement: Statement = LINE.parse().unwrap();
        let terms = statement.to_terms();
        assert_eq!(terms[0], "_:c14n0");
        assert_eq!(terms[1], "<http://schema.org/age>");
        assert_eq!(terms[3], "");

        let messages = statement.serialize().unwrap();
        assert_eq!(messages[2], vec![TAG_INTEGER, 0, 0, 0, 25]);
        assert_eq!(BBSplusMessage::integer_value(&messages[2]), Some(25));
        assert_eq!(messages[0][0], TAG_STRING);
        assert_eq!(&messages[0][1..], b"_:c14n0");
    }

    #[test]
    fn integer_bounds() {
        let age = |n: i64| Statement::new(Term::named("did:a"), Term::named("http://p"), Term::integer(n), Term::DefaultGraph).unwrap();
        assert!(age(i64::from(i32::MAX)).serialize().is_ok());
        assert!(age(-i64::from(i32::MAX)).serialize().is_ok());
        assert!(matches!(age(1 << 31).serialize(), Err(Error::IntegerOutOfRange(_))));
        assert!(matches!(age(-(1 << 31)).serialize(), Err(Error::IntegerOutOfRange(_))));

        let float = Statement::new(
            Term::named("did:a"),
            Term::named("http://p"),
            Term::literal("2.5", XSD_INTEGER),
            Term::DefaultGraph,
        )
        .unwrap();
        assert_eq!(float.serialize().unwrap()[2][0], TAG_STRING);
    }

    #[test]
    fn skolemization() {
        let statement: Statement = "_:c14n0 <http://p> _:c14n1 _:b9 .".parse().unwrap();
        let skolemized = statement.skolemize(Some(2));
        assert_eq!(
            skolemized.to_string(),
            "<urn:bnid:2:_:c14n0> <http://p> <urn:bnid:2:_:c14n1> _:b9 .\n"
        );
        assert_eq!(
            statement.skolemize(None).subject(),
            &Term::named("urn:bnid:_:c14n0")
        );
        assert_eq!(skolemized.deskolemize(), statement);
    }

    #[test]
    fn replace_is_whole_value() {
        let statement: Statement = "<did:ex:1> <http://p> <did:ex:10> .".parse().unwrap();
        let replaced = statement.replace("did:ex:1", "urn:anon:x");
        assert_eq!(replaced.to_string(), "<urn:anon:x> <http://p> <did:ex:10> .\n");
    }
}
