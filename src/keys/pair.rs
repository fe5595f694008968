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

//! Issuer key pairs. The secret key signs documents, the public key is published under the
//! verification method that proofs reference.

use crate::{
    bbsplus::{
        ciphersuites::BbsCiphersuite,
        keys::{key_gen, sk_to_pk, BBSplusPublicKey, BBSplusSecretKey},
    },
    errors::Error,
    schemes::algorithms::{BBSplus, Scheme},
    suite::VerificationMethod,
    utils::util::generate_random_secret,
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct KeyPair<S: Scheme> {
    pub(crate) public: S::PubKey,
    pub(crate) private: S::PrivKey,
}

impl<S> KeyPair<S>
where
    S: Scheme,
{
    pub fn public_key(&self) -> &S::PubKey {
        &self.public
    }

    pub fn private_key(&self) -> &S::PrivKey {
        &self.private
    }
}

impl<CS: BbsCiphersuite> KeyPair<BBSplus<CS>> {
    /// Derives the pair from `key_material`, at least `CS::IKM_LEN` secret bytes.
    pub fn generate(key_material: &[u8], key_info: Option<&[u8]>, key_dst: Option<&[u8]>) -> Result<Self, Error> {
        let sk = key_gen::<CS>(key_material, key_info, key_dst)?;
        Ok(Self::from_secret_key(BBSplusSecretKey(sk)))
    }

    /// Key pair from fresh key material.
    pub fn random() -> Result<Self, Error> {
        Self::generate(&generate_random_secret(CS::IKM_LEN), None, None)
    }

    pub fn from_secret_key(private: BBSplusSecretKey) -> Self {
        Self {
            public: BBSplusPublicKey(sk_to_pk(private.0)),
            private,
        }
    }

    /// Restores an issuer key stored with [`BBSplusSecretKey::encode`].
    pub fn from_encoded_secret_key(encoded: &str) -> Result<Self, Error> {
        let bytes = hex::decode(encoded.trim()).map_err(|_| Error::KeyDeserializationError)?;
        Ok(Self::from_secret_key(BBSplusSecretKey::from_bytes(&bytes)?))
    }

    /// The public half, published under `id`.
    pub fn verification_method(&self, id: impl Into<String>) -> VerificationMethod {
        VerificationMethod::new(id, self.public.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256};

    #[test]
    fn stored_secret_key_restores_the_pair() {
        let keypair = KeyPair::<BBSplus<Bls12381Sha256>>::random().unwrap();
        let encoded = keypair.private_key().encode();

        let restored = KeyPair::<BBSplus<Bls12381Sha256>>::from_encoded_secret_key(&format!("{}\n", encoded)).unwrap();
        assert_eq!(restored, keypair);

        assert_eq!(
            KeyPair::<BBSplus<Bls12381Sha256>>::from_encoded_secret_key("not hex"),
            Err(Error::KeyDeserializationError)
        );
        assert_eq!(
            KeyPair::<BBSplus<Bls12381Sha256>>::from_encoded_secret_key(&encoded[..10]),
            Err(Error::KeyDeserializationError)
        );
    }

    #[test]
    fn published_method_carries_the_public_key() {
        let keypair = KeyPair::<BBSplus<Bls12381Shake256>>::random().unwrap();
        let method = keypair.verification_method("did:example:issuer#bbs-key-1");
        assert_eq!(method.id, "did:example:issuer#bbs-key-1");
        assert_eq!(&method.public_key, keypair.public_key());
        assert!(!method.revoked);
    }
}
