use p256::ecdsa::{
    self as p256_ecdsa, signature::DigestVerifier as _, signature::RandomizedDigestSigner as _,
};
use p256::pkcs8::{DecodePrivateKey as _, DecodePublicKey as _, EncodePublicKey as _};
use p384::ecdsa as p384_ecdsa;
use p521::ecdsa::{self as p521_ecdsa, signature::Signer as _, signature::Verifier as _};
use std::convert::TryFrom;

use super::{AsymmetricAlgorithm, SignatureScheme};
use crate::error::*;

#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct P256PublicKey(p256_ecdsa::VerifyingKey);

impl AsRef<p256_ecdsa::VerifyingKey> for P256PublicKey {
    fn as_ref(&self) -> &p256_ecdsa::VerifyingKey {
        &self.0
    }
}

impl P256PublicKey {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        let p256_pk = p256_ecdsa::VerifyingKey::from_sec1_bytes(raw)
            .map_err(|_| JWTError::InvalidPublicKey)?;
        Ok(P256PublicKey(p256_pk))
    }

    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let p256_pk = p256_ecdsa::VerifyingKey::from_public_key_der(der)
            .map_err(|_| JWTError::InvalidPublicKey)?;
        Ok(P256PublicKey(p256_pk))
    }

    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let p256_pk = p256_ecdsa::VerifyingKey::from_public_key_pem(pem)
            .map_err(|_| JWTError::InvalidPublicKey)?;
        Ok(P256PublicKey(p256_pk))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }

    pub fn to_bytes_uncompressed(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        let p256_pk = p256::PublicKey::from(self.0);
        Ok(p256_pk
            .to_public_key_der()
            .map_err(|_| JWTError::InvalidPublicKey)?
            .as_ref()
            .to_vec())
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct P256KeyPair {
    p256_sk: p256_ecdsa::SigningKey,
}

impl AsRef<p256_ecdsa::SigningKey> for P256KeyPair {
    fn as_ref(&self) -> &p256_ecdsa::SigningKey {
        &self.p256_sk
    }
}

impl P256KeyPair {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        let p256_sk =
            p256_ecdsa::SigningKey::from_slice(raw).map_err(|_| JWTError::InvalidKeyPair)?;
        Ok(P256KeyPair { p256_sk })
    }

    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let p256_sk =
            p256_ecdsa::SigningKey::from_pkcs8_der(der).map_err(|_| JWTError::InvalidKeyPair)?;
        Ok(P256KeyPair { p256_sk })
    }

    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let p256_sk =
            p256_ecdsa::SigningKey::from_pkcs8_pem(pem).map_err(|_| JWTError::InvalidKeyPair)?;
        Ok(P256KeyPair { p256_sk })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.p256_sk.to_bytes().to_vec()
    }

    pub fn public_key(&self) -> P256PublicKey {
        let p256_pk = self.p256_sk.verifying_key();
        P256PublicKey(*p256_pk)
    }

    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let p256_sk = p256_ecdsa::SigningKey::random(&mut rng);
        P256KeyPair { p256_sk }
    }
}

#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct P384PublicKey(p384_ecdsa::VerifyingKey);

impl AsRef<p384_ecdsa::VerifyingKey> for P384PublicKey {
    fn as_ref(&self) -> &p384_ecdsa::VerifyingKey {
        &self.0
    }
}

impl P384PublicKey {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        let p384_pk = p384_ecdsa::VerifyingKey::from_sec1_bytes(raw)
            .map_err(|_| JWTError::InvalidPublicKey)?;
        Ok(P384PublicKey(p384_pk))
    }

    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let p384_pk = p384_ecdsa::VerifyingKey::from_public_key_der(der)
            .map_err(|_| JWTError::InvalidPublicKey)?;
        Ok(P384PublicKey(p384_pk))
    }

    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let p384_pk = p384_ecdsa::VerifyingKey::from_public_key_pem(pem)
            .map_err(|_| JWTError::InvalidPublicKey)?;
        Ok(P384PublicKey(p384_pk))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }

    pub fn to_bytes_uncompressed(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        let p384_pk = p384::PublicKey::from(self.0);
        Ok(p384_pk
            .to_public_key_der()
            .map_err(|_| JWTError::InvalidPublicKey)?
            .as_ref()
            .to_vec())
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct P384KeyPair {
    p384_sk: p384_ecdsa::SigningKey,
}

impl AsRef<p384_ecdsa::SigningKey> for P384KeyPair {
    fn as_ref(&self) -> &p384_ecdsa::SigningKey {
        &self.p384_sk
    }
}

impl P384KeyPair {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        let p384_sk =
            p384_ecdsa::SigningKey::from_slice(raw).map_err(|_| JWTError::InvalidKeyPair)?;
        Ok(P384KeyPair { p384_sk })
    }

    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let p384_sk =
            p384_ecdsa::SigningKey::from_pkcs8_der(der).map_err(|_| JWTError::InvalidKeyPair)?;
        Ok(P384KeyPair { p384_sk })
    }

    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let p384_sk =
            p384_ecdsa::SigningKey::from_pkcs8_pem(pem).map_err(|_| JWTError::InvalidKeyPair)?;
        Ok(P384KeyPair { p384_sk })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.p384_sk.to_bytes().to_vec()
    }

    pub fn public_key(&self) -> P384PublicKey {
        let p384_pk = self.p384_sk.verifying_key();
        P384PublicKey(*p384_pk)
    }

    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let p384_sk = p384_ecdsa::SigningKey::random(&mut rng);
        P384KeyPair { p384_sk }
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct P521PublicKey(p521_ecdsa::VerifyingKey);

impl P521PublicKey {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        let p521_pk = p521_ecdsa::VerifyingKey::from_sec1_bytes(raw)
            .map_err(|_| JWTError::InvalidPublicKey)?;
        Ok(P521PublicKey(p521_pk))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }

    pub fn to_bytes_uncompressed(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct P521KeyPair {
    p521_sk: p521_ecdsa::SigningKey,
}

impl P521KeyPair {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        let p521_sk =
            p521_ecdsa::SigningKey::from_slice(raw).map_err(|_| JWTError::InvalidKeyPair)?;
        Ok(P521KeyPair { p521_sk })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.p521_sk.to_bytes().to_vec()
    }

    pub fn public_key(&self) -> P521PublicKey {
        let p521_pk = p521_ecdsa::VerifyingKey::from(&self.p521_sk);
        P521PublicKey(p521_pk)
    }

    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let p521_sk = p521_ecdsa::SigningKey::random(&mut rng);
        P521KeyPair { p521_sk }
    }
}

/// Native ECDSA keys of one thread.
pub struct ECDSAProvider<SK, VK> {
    signing_key: Option<SK>,
    verifying_key: VK,
}

impl<SK, VK> ECDSAProvider<SK, VK> {
    fn signing_key(&self) -> Result<&SK, Error> {
        self.signing_key
            .as_ref()
            .ok_or_else(|| JWTError::MissingPrivateKey.into())
    }
}

/// ECDSA using P-256 and SHA-256
#[derive(Debug)]
pub enum ES256 {}

/// ECDSA using P-384 and SHA-384
#[derive(Debug)]
pub enum ES384 {}

/// ECDSA using P-521 and SHA-512
#[derive(Debug)]
pub enum ES512 {}

impl SignatureScheme for ES256 {
    type KeyPair = P256KeyPair;
    type PublicKey = P256PublicKey;
    type Provider = ECDSAProvider<p256_ecdsa::SigningKey, p256_ecdsa::VerifyingKey>;

    fn jwt_alg_name() -> &'static str {
        "ES256"
    }

    fn signature_size(_public_key: &P256PublicKey) -> usize {
        64
    }

    fn public_key_of(key_pair: &P256KeyPair) -> Result<P256PublicKey, Error> {
        Ok(key_pair.public_key())
    }

    fn provider(
        key_pair: Option<P256KeyPair>,
        public_key: P256PublicKey,
    ) -> Result<Self::Provider, Error> {
        Ok(ECDSAProvider {
            signing_key: key_pair.map(|key_pair| key_pair.p256_sk),
            verifying_key: public_key.0,
        })
    }

    fn sign(provider: &Self::Provider, message: &[u8], signature: &mut [u8]) -> Result<(), Error> {
        let mut digest = hmac_sha256::Hash::new();
        digest.update(message);
        let mut rng = rand::thread_rng();
        let p256_signature: p256_ecdsa::Signature = provider
            .signing_key()?
            .try_sign_digest_with_rng(&mut rng, digest)?;
        signature.copy_from_slice(&p256_signature.to_bytes());
        Ok(())
    }

    fn verify(provider: &Self::Provider, message: &[u8], signature: &[u8]) -> bool {
        let p256_signature = match p256_ecdsa::Signature::try_from(signature) {
            Ok(p256_signature) => p256_signature,
            Err(_) => return false,
        };
        let mut digest = hmac_sha256::Hash::new();
        digest.update(message);
        provider
            .verifying_key
            .verify_digest(digest, &p256_signature)
            .is_ok()
    }
}

impl SignatureScheme for ES384 {
    type KeyPair = P384KeyPair;
    type PublicKey = P384PublicKey;
    type Provider = ECDSAProvider<p384_ecdsa::SigningKey, p384_ecdsa::VerifyingKey>;

    fn jwt_alg_name() -> &'static str {
        "ES384"
    }

    fn signature_size(_public_key: &P384PublicKey) -> usize {
        96
    }

    fn public_key_of(key_pair: &P384KeyPair) -> Result<P384PublicKey, Error> {
        Ok(key_pair.public_key())
    }

    fn provider(
        key_pair: Option<P384KeyPair>,
        public_key: P384PublicKey,
    ) -> Result<Self::Provider, Error> {
        Ok(ECDSAProvider {
            signing_key: key_pair.map(|key_pair| key_pair.p384_sk),
            verifying_key: public_key.0,
        })
    }

    fn sign(provider: &Self::Provider, message: &[u8], signature: &mut [u8]) -> Result<(), Error> {
        let mut digest = hmac_sha512::sha384::Hash::new();
        digest.update(message);
        let mut rng = rand::thread_rng();
        let p384_signature: p384_ecdsa::Signature = provider
            .signing_key()?
            .try_sign_digest_with_rng(&mut rng, digest)?;
        signature.copy_from_slice(&p384_signature.to_bytes());
        Ok(())
    }

    fn verify(provider: &Self::Provider, message: &[u8], signature: &[u8]) -> bool {
        let p384_signature = match p384_ecdsa::Signature::try_from(signature) {
            Ok(p384_signature) => p384_signature,
            Err(_) => return false,
        };
        let mut digest = hmac_sha512::sha384::Hash::new();
        digest.update(message);
        provider
            .verifying_key
            .verify_digest(digest, &p384_signature)
            .is_ok()
    }
}

impl SignatureScheme for ES512 {
    type KeyPair = P521KeyPair;
    type PublicKey = P521PublicKey;
    type Provider = ECDSAProvider<p521_ecdsa::SigningKey, p521_ecdsa::VerifyingKey>;

    fn jwt_alg_name() -> &'static str {
        "ES512"
    }

    fn signature_size(_public_key: &P521PublicKey) -> usize {
        132
    }

    fn public_key_of(key_pair: &P521KeyPair) -> Result<P521PublicKey, Error> {
        Ok(key_pair.public_key())
    }

    fn provider(
        key_pair: Option<P521KeyPair>,
        public_key: P521PublicKey,
    ) -> Result<Self::Provider, Error> {
        Ok(ECDSAProvider {
            signing_key: key_pair.map(|key_pair| key_pair.p521_sk),
            verifying_key: public_key.0,
        })
    }

    // SHA-512 is applied by the signing key itself
    fn sign(provider: &Self::Provider, message: &[u8], signature: &mut [u8]) -> Result<(), Error> {
        let p521_signature: p521_ecdsa::Signature = provider.signing_key()?.try_sign(message)?;
        signature.copy_from_slice(&p521_signature.to_bytes());
        Ok(())
    }

    fn verify(provider: &Self::Provider, message: &[u8], signature: &[u8]) -> bool {
        match p521_ecdsa::Signature::from_slice(signature) {
            Ok(p521_signature) => provider
                .verifying_key
                .verify(message, &p521_signature)
                .is_ok(),
            Err(_) => false,
        }
    }
}

pub type ES256Algorithm = AsymmetricAlgorithm<ES256>;
pub type ES384Algorithm = AsymmetricAlgorithm<ES384>;
pub type ES512Algorithm = AsymmetricAlgorithm<ES512>;
