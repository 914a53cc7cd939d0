//! Known-answer tests from RFC 8032 §7.1 (Ed25519).
//!
//! These pin the sealed-key, signing, and verification paths to the
//! published vectors so that a change in encoding or key handling is caught
//! even when sign-then-verify would still agree with itself.

/// A single Ed25519 test vector, hex encoded.
pub struct Ed25519Vector {
    pub name: &'static str,
    pub secret_hex: &'static str,
    pub public_hex: &'static str,
    pub message_hex: &'static str,
    pub signature_hex: &'static str,
}

/// ⚠️ WARNING: DO NOT USE IN PRODUCTION ⚠️
///
/// These secret keys are published in RFC 8032 and are publicly known.
pub const RFC8032_VECTORS: &[Ed25519Vector] = &[
    Ed25519Vector {
        name: "rfc8032_test_1",
        secret_hex: "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60",
        public_hex: "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a",
        message_hex: "",
        signature_hex: "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b",
    },
    Ed25519Vector {
        name: "rfc8032_test_2",
        secret_hex: "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb",
        public_hex: "3d4017c3e843895a92b70aa74d1b7ebc9c982ccf2ec4968cc0cd55f12af4660c",
        message_hex: "72",
        signature_hex: "92a009a9f0d4cab8720e820b5f642540a2b27b5416503f8fb3762223ebdb69da085ac1e43e15996e458f3613d0f11d8c387b2eaeb4302aeeb00d291612bb0c00",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KdfParams, PublicKey, SealedSecretKey};
    use crate::signing::{sign_detached, verify_detached, DetachedSignature};

    #[test]
    fn test_known_signatures_verify() {
        for vector in RFC8032_VECTORS {
            let public = PublicKey::from_bytes(&hex::decode(vector.public_hex).unwrap()).unwrap();
            let message = hex::decode(vector.message_hex).unwrap();
            let signature =
                DetachedSignature::from_bytes(&hex::decode(vector.signature_hex).unwrap()).unwrap();

            assert!(
                verify_detached(&public, &message, &signature),
                "{} should verify",
                vector.name
            );
        }
    }

    #[test]
    fn test_sealed_key_reproduces_known_signatures() {
        for vector in RFC8032_VECTORS {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&hex::decode(vector.secret_hex).unwrap());
            let sealed = SealedSecretKey::seal(&seed, "vector", KdfParams::insecure_fast()).unwrap();

            let message = hex::decode(vector.message_hex).unwrap();
            let signature = sign_detached(&sealed, "vector", &message).unwrap();

            assert_eq!(
                hex::encode(signature.as_bytes()),
                vector.signature_hex,
                "{} signature mismatch",
                vector.name
            );
        }
    }

    #[test]
    fn test_known_signature_rejects_other_message() {
        let vector = &RFC8032_VECTORS[1];
        let public = PublicKey::from_bytes(&hex::decode(vector.public_hex).unwrap()).unwrap();
        let signature =
            DetachedSignature::from_bytes(&hex::decode(vector.signature_hex).unwrap()).unwrap();

        assert!(!verify_detached(&public, b"s", &signature));
    }
}
