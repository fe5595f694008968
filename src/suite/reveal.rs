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

use crate::{errors::Error, rdf::statement::Statement};

/// Position in `full` of each revealed statement. Duplicates resolve to the first match.
pub fn match_statements(full: &[Statement], revealed: &[Statement]) -> Result<Vec<usize>, Error> {
    revealed
        .iter()
        .map(|statement| {
            full.iter()
                .position(|s| s == statement)
                .ok_or_else(|| Error::StatementNotFound(statement.to_string().trim_end().to_owned()))
        })
        .collect()
}

/// Indexes of the revealed statements in the signed list, which starts with the
/// `proof_statements` statements of the proof metadata, all of them revealed.
pub fn get_indices(full: &[Statement], revealed: &[Statement], proof_statements: usize) -> Result<Vec<usize>, Error> {
    let document = match_statements(full, revealed)?;
    Ok((0..proof_statements)
        .chain(document.into_iter().map(|i| i + proof_statements))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(lines: &[&str]) -> Vec<Statement> {
        lines.iter().map(|l| l.parse().unwrap()).collect()
    }

    #[test]
    fn indices_follow_the_proof_statements() {
        let full = statements(&[
            "<did:a> <http://p> \"1\" .",
            "<did:a> <http://q> \"2\" .",
            "<did:a> <http://r> \"3\" .",
        ]);
        let revealed = statements(&["<did:a> <http://r> \"3\" .", "<did:a> <http://p> \"1\" ."]);
        assert_eq!(get_indices(&full, &revealed, 4).unwrap(), vec![0, 1, 2, 3, 6, 4]);
        assert_eq!(get_indices(&full, &[], 2).unwrap(), vec![0, 1]);
    }

    #[test]
    fn missing_statement() {
        let full = statements(&["<did:a> <http://p> \"1\" ."]);
        let revealed = statements(&["<did:a> <http://p> \"2\" ."]);
        assert!(matches!(
            get_indices(&full, &revealed, 1),
            Err(Error::StatementNotFound(s)) if s == "<did:a> <http://p> \"2\" ."
        ));
    }

    #[test]
    fn duplicates_resolve_to_the_first_match() {
        let full = statements(&["<did:a> <http://p> \"1\" .", "<did:a> <http://p> \"1\" ."]);
        assert_eq!(match_statements(&full, &full).unwrap(), vec![0, 0]);
    }
}
