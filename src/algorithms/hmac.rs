use hmac_sha512::sha384 as hmac_sha384;
use rand::RngCore;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use zeroize::Zeroize;

use super::{disposed, ensure_signature_len, JwtAlgorithm};
use crate::error::*;
use crate::jwt_header::JWTHeader;

#[doc(hidden)]
#[derive(Clone)]
pub struct HMACKey {
    raw_key: Vec<u8>,
}

impl Drop for HMACKey {
    fn drop(&mut self) {
        self.raw_key.zeroize();
    }
}

impl fmt::Debug for HMACKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HMACKey")
            .field("len", &self.raw_key.len())
            .finish()
    }
}

impl HMACKey {
    /// Create a HMAC key from a byte slice.
    pub fn from_bytes(raw_key: &[u8]) -> Self {
        HMACKey {
            raw_key: raw_key.to_vec(),
        }
    }

    /// Generate a random HMAC key of `len` bytes.
    pub fn generate(len: usize) -> Self {
        let mut raw_key = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut raw_key);
        HMACKey { raw_key }
    }

    /// Convert the HMAC key to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.raw_key.clone()
    }
}

impl AsRef<[u8]> for HMACKey {
    /// Get the raw key, as a byte slice
    fn as_ref(&self) -> &[u8] {
        &self.raw_key
    }
}

/// The hash function behind a HMAC algorithm.
pub trait HMACHash: Send + Sync + 'static {
    fn jwt_alg_name() -> &'static str;
    fn tag_len() -> usize;
    /// Key length returned by `generate_random_recommended_key()`
    fn recommended_key_len() -> usize;
    fn authentication_tag(key: &[u8], authenticated: &[u8], tag: &mut [u8]);
}

#[derive(Debug)]
pub enum SHA256 {}

#[derive(Debug)]
pub enum SHA384 {}

#[derive(Debug)]
pub enum SHA512 {}

impl HMACHash for SHA256 {
    fn jwt_alg_name() -> &'static str {
        "HS256"
    }

    fn tag_len() -> usize {
        32
    }

    fn recommended_key_len() -> usize {
        64
    }

    fn authentication_tag(key: &[u8], authenticated: &[u8], tag: &mut [u8]) {
        tag.copy_from_slice(&hmac_sha256::HMAC::mac(authenticated, key));
    }
}

impl HMACHash for SHA384 {
    fn jwt_alg_name() -> &'static str {
        "HS384"
    }

    fn tag_len() -> usize {
        48
    }

    fn recommended_key_len() -> usize {
        128
    }

    fn authentication_tag(key: &[u8], authenticated: &[u8], tag: &mut [u8]) {
        tag.copy_from_slice(&hmac_sha384::HMAC::mac(authenticated, key));
    }
}

impl HMACHash for SHA512 {
    fn jwt_alg_name() -> &'static str {
        "HS512"
    }

    fn tag_len() -> usize {
        64
    }

    fn recommended_key_len() -> usize {
        128
    }

    fn authentication_tag(key: &[u8], authenticated: &[u8], tag: &mut [u8]) {
        tag.copy_from_slice(&hmac_sha512::HMAC::mac(authenticated, key));
    }
}

/// A HMAC-based signing algorithm. Keys of any length are accepted.
pub struct HMACAlgorithm<H: HMACHash> {
    key: HMACKey,
    header: Vec<u8>,
    disposed: AtomicBool,
    hash: PhantomData<H>,
}

pub type HS256Algorithm = HMACAlgorithm<SHA256>;
pub type HS384Algorithm = HMACAlgorithm<SHA384>;
pub type HS512Algorithm = HMACAlgorithm<SHA512>;

impl<H: HMACHash> fmt::Debug for HMACAlgorithm<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HMACAlgorithm")
            .field("alg", &H::jwt_alg_name())
            .field("key", &self.key)
            .finish()
    }
}

impl<H: HMACHash> HMACAlgorithm<H> {
    pub fn new(raw_key: impl AsRef<[u8]>) -> Result<Self, Error> {
        Self::with_key(HMACKey::from_bytes(raw_key.as_ref()))
    }

    pub fn with_key(key: HMACKey) -> Result<Self, Error> {
        Ok(HMACAlgorithm {
            key,
            header: JWTHeader::new(H::jwt_alg_name()).to_base64url()?,
            disposed: AtomicBool::new(false),
            hash: PhantomData,
        })
    }

    /// A random key of the size recommended for this hash function.
    pub fn generate_random_recommended_key() -> Vec<u8> {
        let mut raw_key = vec![0u8; H::recommended_key_len()];
        rand::thread_rng().fill_bytes(&mut raw_key);
        raw_key
    }

    pub fn key(&self) -> &HMACKey {
        &self.key
    }
}

impl<H: HMACHash> JwtAlgorithm for HMACAlgorithm<H> {
    fn alg_name(&self) -> &'static str {
        H::jwt_alg_name()
    }

    fn header_base64url(&self) -> &[u8] {
        &self.header
    }

    fn signature_size(&self) -> usize {
        H::tag_len()
    }

    fn sign(&self, message: &[u8], signature: &mut [u8]) -> Result<(), Error> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(disposed(H::jwt_alg_name()));
        }
        ensure_signature_len(self, signature)?;
        H::authentication_tag(self.key.as_ref(), message, signature);
        Ok(())
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        if self.disposed.load(Ordering::Acquire) {
            let _ = disposed(H::jwt_alg_name());
            return false;
        }
        if signature.len() != H::tag_len() {
            return false;
        }
        let mut expected = [0u8; 64];
        let expected = &mut expected[..H::tag_len()];
        H::authentication_tag(self.key.as_ref(), message, expected);
        ct_codecs::verify(expected, signature)
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_codecs::{Base64UrlSafeNoPadding, Decoder};

    #[test]
    fn hs256_matches_known_vector() {
        // jwt.io example signed with the key "a"
        let alg = HS256Algorithm::new(b"a").unwrap();
        let message = b"eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IkpvaG4gRG9lIiwiaWF0IjoxNTE2MjM5MDIyfQ";
        let expected = Base64UrlSafeNoPadding::decode_to_vec(
            "mvdjdBZKOtWyQl54xAd8C9kY0RUyq-z26qNTjFR1DKA",
            None,
        )
        .unwrap();
        let mut signature = [0u8; 32];
        alg.sign(message, &mut signature).unwrap();
        assert_eq!(signature.to_vec(), expected);
        assert!(alg.verify(message, &signature));
    }

    #[test]
    fn signature_sizes() {
        let key = b"your-256-bit-secret";
        assert_eq!(HS256Algorithm::new(key).unwrap().signature_size(), 32);
        assert_eq!(HS384Algorithm::new(key).unwrap().signature_size(), 48);
        assert_eq!(HS512Algorithm::new(key).unwrap().signature_size(), 64);
        for alg in &[
            Box::new(HS384Algorithm::new(key).unwrap()) as Box<dyn JwtAlgorithm>,
            Box::new(HS512Algorithm::new(key).unwrap()),
        ] {
            let mut signature = vec![0u8; alg.signature_size()];
            alg.sign(b"message", &mut signature).unwrap();
            assert!(alg.verify(b"message", &signature));
            assert!(!alg.verify(b"messagE", &signature));
            assert!(!alg.verify(b"message", &signature[1..]));
        }
    }

    #[test]
    fn wrong_destination_length() {
        let alg = HS256Algorithm::new(b"key").unwrap();
        let mut signature = [0u8; 31];
        assert!(alg.sign(b"message", &mut signature).is_err());
    }

    #[test]
    fn recommended_key_lengths() {
        assert_eq!(HS256Algorithm::generate_random_recommended_key().len(), 64);
        assert_eq!(HS384Algorithm::generate_random_recommended_key().len(), 128);
        assert_eq!(HS512Algorithm::generate_random_recommended_key().len(), 128);
        assert_ne!(
            HS256Algorithm::generate_random_recommended_key(),
            HS256Algorithm::generate_random_recommended_key()
        );
    }

    #[test]
    fn generated_key() {
        let key = HMACKey::generate(40);
        assert_eq!(key.as_ref().len(), 40);
        let alg = HS256Algorithm::with_key(key.clone()).unwrap();
        assert_eq!(alg.key().to_bytes(), key.to_bytes());
        assert!(!format!("{:?}", alg).contains(&format!("{:?}", key.to_bytes())));
    }

    #[test]
    fn empty_key() {
        let alg = HS256Algorithm::new(b"").unwrap();
        let mut signature = [0u8; 32];
        alg.sign(b"message", &mut signature).unwrap();
        assert!(alg.verify(b"message", &signature));
    }

    #[test]
    fn disposed_algorithm() {
        let alg = HS512Algorithm::new(b"key").unwrap();
        let mut signature = [0u8; 64];
        alg.sign(b"message", &mut signature).unwrap();
        alg.dispose();
        alg.dispose();
        assert!(!alg.verify(b"message", &signature));
        let err = alg.sign(b"message", &mut signature).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<JWTError>(),
            Some(JWTError::AlgorithmDisposed)
        ));
    }
}
