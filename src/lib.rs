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

//! Selective disclosure of linked data documents with BBS+ signatures.
//!
//! Documents are canonicalized into statements, each statement is signed term by term, and a
//! holder derives zero-knowledge proofs revealing part of one or more documents, linking hidden
//! values across them and proving ranges over hidden integers.

#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

pub mod bbsplus;
pub mod errors;
pub mod keys;
pub mod rdf;
pub mod schemes;
pub mod suite;
pub mod utils;
