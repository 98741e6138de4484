use crate::error::GatewayError;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;

/// Signs gateway messages with the wallet identity's private key.
pub struct IdentitySigner {
    signing_key: SigningKey,
}

impl IdentitySigner {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, GatewayError> {
        let signing_key = SigningKey::from_pkcs8_pem(pem)
            .map_err(|e| GatewayError::Signing(format!("unreadable private key: {e}")))?;
        Ok(Self::new(signing_key))
    }

    /// ECDSA over SHA-256, low-S, DER encoded.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.signing_key.sign(message);
        let signature = signature.normalize_s().unwrap_or(signature);
        signature.to_der().as_bytes().to_vec()
    }
}
