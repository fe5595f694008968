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

mod termwise_example {
    use serde_json::json;
    use zkryptium_ld::{
        bbsplus::ciphersuites::BbsCiphersuite,
        errors::Error,
        keys::pair::KeyPair,
        schemes::algorithms::{BBSplus, Scheme},
        suite::{AssertionProofPurpose, InputDocument, KeyRegistry, ProofOptions, TermwiseSuite, SIGNATURE_TYPE},
        utils::util::generate_random_secret,
    };

    const ISSUER_METHOD: &str = "did:example:issuer#bbs-key-1";
    const LICENSING_METHOD: &str = "did:example:licensing#bbs-key-1";

    pub(crate) fn termwise_main<S: Scheme>() -> Result<(), Error>
    where
        S::Ciphersuite: BbsCiphersuite,
    {
        let suite = TermwiseSuite::<S::Ciphersuite>::default();

        log::info!("Keypair Generation");
        // ISSUER_SECRET_KEY (hex) pins the issuer key across runs
        let issuer = match std::env::var("ISSUER_SECRET_KEY") {
            Ok(encoded) => KeyPair::<BBSplus<S::Ciphersuite>>::from_encoded_secret_key(&encoded)?,
            Err(_) => KeyPair::<BBSplus<S::Ciphersuite>>::random()?,
        };
        let licensing = KeyPair::<BBSplus<S::Ciphersuite>>::random()?;
        log::info!("Issuer PK: {}", hex::encode(issuer.public_key().to_bytes()));
        log::info!("Licensing PK: {}", hex::encode(licensing.public_key().to_bytes()));

        let mut registry = KeyRegistry::new();
        registry
            .insert(issuer.verification_method(ISSUER_METHOD))
            .insert(licensing.verification_method(LICENSING_METHOD));

        let person = json!({
            "@context": "https://schema.org/",
            "id": "did:example:alice",
            "type": "Person",
            "name": "Alice",
            "age": 25,
            "address": { "addressLocality": "Turin", "postalCode": "10129" },
        });
        let license = json!({
            "@context": "https://schema.org/",
            "id": "did:example:license-42",
            "type": "DriversLicense",
            "holder": "did:example:alice",
            "licenseClass": "B",
        });

        log::info!("Signature Computation...");
        let signed_person = suite.sign(
            &person,
            &ProofOptions::new(SIGNATURE_TYPE, ISSUER_METHOD, "assertionMethod").created("2025-03-01T09:00:00Z"),
            &issuer,
        )?;
        let signed_license = suite.sign(
            &license,
            &ProofOptions::new(SIGNATURE_TYPE, LICENSING_METHOD, "assertionMethod").created("2025-03-02T10:30:00Z"),
            &licensing,
        )?;
        for signed in [&signed_person, &signed_license] {
            let result = suite.verify_signature(signed, &registry, &AssertionProofPurpose);
            assert!(result.verified, "Signature verification FAILED! {:?}", result.error);
        }
        log::info!("Signatures are VALID");

        //Holder receive nonce from Verifier
        let nonce = generate_random_secret(32);
        log::info!("Nonce: {}", hex::encode(&nonce));

        log::info!("Derived Proof Generation...");
        let inputs = [
            InputDocument::from_signed(
                &signed_person,
                json!({
                    "type": "Person",
                    "age": { "range": [18, 65] },
                    "address": { "addressLocality": {} },
                }),
            )?,
            InputDocument::from_signed(&signed_license, json!({ "holder": {}, "licenseClass": {} }))?,
        ];
        let derived = suite.derive_proof_multi(&inputs, &["did:example:alice"], Some(nonce.as_slice()), &registry)?;
        for document in &derived {
            let presented = document.to_document()?;
            log::info!(
                "Derived document: {}",
                serde_json::to_string_pretty(&presented).map_err(|e| Error::DeserializationError(e.to_string()))?
            );
        }

        //Verifier verifies the batch
        log::info!("Derived Proof verification...");
        let result = suite.verify_proof_multi(&derived, &registry, &AssertionProofPurpose);
        assert!(result.verified, "Derived Proof Verification Failed! {:?}", result.error);
        log::info!("Derived Proofs are VALID!");

        Ok(())
    }
}

fn main() {
    use crate::termwise_example::termwise_main;
    use std::env;
    use zkryptium_ld::schemes::algorithms::{BbsBls12381Sha256, BbsBls12381Shake256};

    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        println!(
            "Usage: {} <cipher_suite>
                Ciphersuites:
                    - BLS12-381-SHA-256
                    - BLS12-381-SHAKE-256",
            args[0]
        );
        return;
    }

    let result = match args[1].as_str() {
        "BLS12-381-SHA-256" => {
            log::info!("Ciphersuite: BLS12-381-SHA-256");
            termwise_main::<BbsBls12381Sha256>()
        }
        "BLS12-381-SHAKE-256" => {
            log::info!("Ciphersuite: BLS12-381-SHAKE-256");
            termwise_main::<BbsBls12381Shake256>()
        }
        _ => {
            println!("Unknown cipher suite");
            return;
        }
    };
    if let Err(e) = result {
        log::error!("{}", e);
    }
}
