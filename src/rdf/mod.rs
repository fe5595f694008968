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

//! RDF statements and the collaborators turning JSON documents into them.

/// JSON documents to ordered statements
pub mod canonicalize;
/// Statements to signed messages
pub mod encoding;
/// Reveal documents by frame
pub mod frame;
/// Quads and their N-Quads form
pub mod statement;
/// Terms and their roles in derived documents
pub mod term;
