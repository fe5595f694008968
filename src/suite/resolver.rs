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

use std::collections::HashMap;

use super::document::ProofOptions;
use crate::{bbsplus::keys::BBSplusPublicKey, errors::Error};

pub const ASSERTION_METHOD: &str = "assertionMethod";

/// A public key as published by its controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationMethod {
    pub id: String,
    pub public_key: BBSplusPublicKey,
    pub revoked: bool,
}

impl VerificationMethod {
    pub fn new(id: impl Into<String>, public_key: BBSplusPublicKey) -> Self {
        Self {
            id: id.into(),
            public_key,
            revoked: false,
        }
    }

    pub(crate) fn ensure_active(&self) -> Result<&Self, Error> {
        if self.revoked {
            return Err(Error::VerificationMethodRevoked(self.id.clone()));
        }
        Ok(self)
    }
}

/// Looks up the key referenced by a proof's `verificationMethod`.
pub trait VerificationMethodResolver {
    fn resolve(&self, id: &str) -> Result<VerificationMethod, Error>;
}

/// In-memory resolver.
#[derive(Clone, Debug, Default)]
pub struct KeyRegistry {
    methods: HashMap<String, VerificationMethod>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, public_key: BBSplusPublicKey) -> &mut Self {
        self.insert(VerificationMethod::new(id, public_key))
    }

    /// Adds or replaces the method under its own id.
    pub fn insert(&mut self, method: VerificationMethod) -> &mut Self {
        self.methods.insert(method.id.clone(), method);
        self
    }

    /// Marks a method as revoked. Returns `false` if the method is unknown.
    pub fn revoke(&mut self, id: &str) -> bool {
        match self.methods.get_mut(id) {
            Some(method) => {
                method.revoked = true;
                true
            }
            None => false,
        }
    }
}

impl VerificationMethodResolver for KeyRegistry {
    fn resolve(&self, id: &str) -> Result<VerificationMethod, Error> {
        self.methods
            .get(id)
            .cloned()
            .ok_or_else(|| Error::VerificationMethodNotFound(id.to_owned()))
    }
}

/// Decides whether a proof was made for the purpose the verifier expects.
pub trait ProofPurpose {
    fn validate(&self, proof: &ProofOptions, method: &VerificationMethod) -> Result<(), Error>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssertionProofPurpose;

impl ProofPurpose for AssertionProofPurpose {
    fn validate(&self, proof: &ProofOptions, method: &VerificationMethod) -> Result<(), Error> {
        if proof.proof_purpose != ASSERTION_METHOD {
            return Err(Error::InvalidProofPurpose(format!(
                "expected {} received {}",
                ASSERTION_METHOD, proof.proof_purpose
            )));
        }
        if proof.verification_method != method.id {
            return Err(Error::InvalidProofPurpose(format!(
                "proof is bound to {} not to {}",
                proof.verification_method, method.id
            )));
        }
        Ok(())
    }
}
