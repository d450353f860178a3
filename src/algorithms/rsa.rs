#[cfg(any(feature = "pure-rust", target_arch = "wasm32", target_arch = "wasm64"))]
use superboring as boring;

use boring::bn::BigNum;
use boring::hash::MessageDigest;
use boring::pkey::{PKey, Private, Public};
use boring::rsa::{Padding, Rsa};
use boring::sign::{Signer, Verifier};
use std::marker::PhantomData;

use super::{AsymmetricAlgorithm, SignatureScheme};
use crate::error::*;

#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct RSAPublicKey(Rsa<Public>);

impl AsRef<Rsa<Public>> for RSAPublicKey {
    fn as_ref(&self) -> &Rsa<Public> {
        &self.0
    }
}

pub struct RSAPublicKeyComponents {
    pub n: Vec<u8>,
    pub e: Vec<u8>,
}

impl RSAPublicKey {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let rsa_pk = Rsa::<Public>::public_key_from_der(der)
            .or_else(|_| Rsa::<Public>::public_key_from_der_pkcs1(der))?;
        Ok(RSAPublicKey(rsa_pk))
    }

    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let pem = pem.trim();
        let rsa_pk = Rsa::<Public>::public_key_from_pem(pem.as_bytes())
            .or_else(|_| Rsa::<Public>::public_key_from_pem_pkcs1(pem.as_bytes()))?;
        Ok(RSAPublicKey(rsa_pk))
    }

    pub fn from_components(n: &[u8], e: &[u8]) -> Result<Self, Error> {
        let n = BigNum::from_slice(n)?;
        let e = BigNum::from_slice(e)?;
        let rsa_pk = Rsa::<Public>::from_public_components(n, e)?;
        Ok(RSAPublicKey(rsa_pk))
    }

    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        self.0.public_key_to_der().map_err(Into::into)
    }

    pub fn to_pem(&self) -> Result<String, Error> {
        let bytes = self.0.public_key_to_pem()?;
        let pem = String::from_utf8(bytes)?;
        Ok(pem)
    }

    pub fn to_components(&self) -> RSAPublicKeyComponents {
        let n = self.0.n().to_vec();
        let e = self.0.e().to_vec();
        RSAPublicKeyComponents { n, e }
    }

    /// Size of the modulus in bytes, which is also the size of every signature.
    pub fn modulus_len(&self) -> usize {
        self.0.size() as usize
    }
}

#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct RSAKeyPair {
    rsa_sk: Rsa<Private>,
}

impl AsRef<Rsa<Private>> for RSAKeyPair {
    fn as_ref(&self) -> &Rsa<Private> {
        &self.rsa_sk
    }
}

impl RSAKeyPair {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let rsa_sk = Rsa::<Private>::private_key_from_der(der)?;
        if !(rsa_sk.check_key()?) {
            bail!(JWTError::InvalidKeyPair);
        }
        Ok(RSAKeyPair { rsa_sk })
    }

    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let pem = pem.trim();
        let rsa_sk = Rsa::<Private>::private_key_from_pem(pem.as_bytes())?;
        if !(rsa_sk.check_key()?) {
            bail!(JWTError::InvalidKeyPair);
        }
        Ok(RSAKeyPair { rsa_sk })
    }

    pub fn to_der(&self) -> Result<Vec<u8>, Error> {
        self.rsa_sk.private_key_to_der().map_err(Into::into)
    }

    pub fn to_pem(&self) -> Result<String, Error> {
        let bytes = self.rsa_sk.private_key_to_pem()?;
        let pem = String::from_utf8(bytes)?;
        Ok(pem)
    }

    pub fn public_key(&self) -> Result<RSAPublicKey, Error> {
        let rsa_pk = Rsa::<Public>::from_public_components(
            self.rsa_sk.n().to_owned()?,
            self.rsa_sk.e().to_owned()?,
        )?;
        Ok(RSAPublicKey(rsa_pk))
    }

    pub fn generate(modulus_bits: usize) -> Result<Self, Error> {
        match modulus_bits {
            2048 | 3072 | 4096 => {}
            _ => bail!(JWTError::UnsupportedRSAModulus),
        };
        let rsa_sk = Rsa::<Private>::generate(modulus_bits as _)?;
        Ok(RSAKeyPair { rsa_sk })
    }
}

/// Hash function and padding of one of the six RSA JWS algorithms.
pub trait RSAVariant: Send + Sync + 'static {
    fn jwt_alg_name() -> &'static str;
    fn hash() -> MessageDigest;
    fn padding_scheme() -> Padding;
}

/// RSASSA-PKCS1-v1_5 with SHA-256
#[derive(Debug)]
pub enum RS256 {}

/// RSASSA-PKCS1-v1_5 with SHA-384
#[derive(Debug)]
pub enum RS384 {}

/// RSASSA-PKCS1-v1_5 with SHA-512
#[derive(Debug)]
pub enum RS512 {}

/// RSASSA-PSS with SHA-256
#[derive(Debug)]
pub enum PS256 {}

/// RSASSA-PSS with SHA-384
#[derive(Debug)]
pub enum PS384 {}

/// RSASSA-PSS with SHA-512
#[derive(Debug)]
pub enum PS512 {}

impl RSAVariant for RS256 {
    fn jwt_alg_name() -> &'static str {
        "RS256"
    }

    fn hash() -> MessageDigest {
        MessageDigest::sha256()
    }

    fn padding_scheme() -> Padding {
        Padding::PKCS1
    }
}

impl RSAVariant for RS384 {
    fn jwt_alg_name() -> &'static str {
        "RS384"
    }

    fn hash() -> MessageDigest {
        MessageDigest::sha384()
    }

    fn padding_scheme() -> Padding {
        Padding::PKCS1
    }
}

impl RSAVariant for RS512 {
    fn jwt_alg_name() -> &'static str {
        "RS512"
    }

    fn hash() -> MessageDigest {
        MessageDigest::sha512()
    }

    fn padding_scheme() -> Padding {
        Padding::PKCS1
    }
}

impl RSAVariant for PS256 {
    fn jwt_alg_name() -> &'static str {
        "PS256"
    }

    fn hash() -> MessageDigest {
        MessageDigest::sha256()
    }

    fn padding_scheme() -> Padding {
        Padding::PKCS1_PSS
    }
}

impl RSAVariant for PS384 {
    fn jwt_alg_name() -> &'static str {
        "PS384"
    }

    fn hash() -> MessageDigest {
        MessageDigest::sha384()
    }

    fn padding_scheme() -> Padding {
        Padding::PKCS1_PSS
    }
}

impl RSAVariant for PS512 {
    fn jwt_alg_name() -> &'static str {
        "PS512"
    }

    fn hash() -> MessageDigest {
        MessageDigest::sha512()
    }

    fn padding_scheme() -> Padding {
        Padding::PKCS1_PSS
    }
}

/// Native RSA keys of one thread.
pub struct RSAProvider {
    signing_key: Option<PKey<Private>>,
    verifying_key: PKey<Public>,
}

#[derive(Debug)]
pub struct RSAScheme<V: RSAVariant>(PhantomData<V>);

impl<V: RSAVariant> SignatureScheme for RSAScheme<V> {
    type KeyPair = RSAKeyPair;
    type PublicKey = RSAPublicKey;
    type Provider = RSAProvider;

    fn jwt_alg_name() -> &'static str {
        V::jwt_alg_name()
    }

    fn signature_size(public_key: &RSAPublicKey) -> usize {
        public_key.modulus_len()
    }

    fn public_key_of(key_pair: &RSAKeyPair) -> Result<RSAPublicKey, Error> {
        key_pair.public_key()
    }

    fn provider(
        key_pair: Option<RSAKeyPair>,
        public_key: RSAPublicKey,
    ) -> Result<RSAProvider, Error> {
        let signing_key = match key_pair {
            Some(key_pair) => Some(PKey::from_rsa(key_pair.rsa_sk)?),
            None => None,
        };
        Ok(RSAProvider {
            signing_key,
            verifying_key: PKey::from_rsa(public_key.0)?,
        })
    }

    fn sign(provider: &RSAProvider, message: &[u8], signature: &mut [u8]) -> Result<(), Error> {
        let pkey = provider
            .signing_key
            .as_ref()
            .ok_or(JWTError::MissingPrivateKey)?;
        let mut signer = Signer::new(V::hash(), pkey)?;
        signer.set_rsa_padding(V::padding_scheme())?;
        signer.update(message)?;
        let raw_signature = signer.sign_to_vec()?;
        ensure!(
            raw_signature.len() == signature.len(),
            JWTError::SignatureLengthMismatch {
                expected: signature.len(),
                actual: raw_signature.len(),
            }
        );
        signature.copy_from_slice(&raw_signature);
        Ok(())
    }

    fn verify(provider: &RSAProvider, message: &[u8], signature: &[u8]) -> bool {
        let verify = || -> Result<bool, Error> {
            let mut verifier = Verifier::new(V::hash(), &provider.verifying_key)?;
            verifier.set_rsa_padding(V::padding_scheme())?;
            verifier.update(message)?;
            Ok(verifier.verify(signature)?)
        };
        verify().unwrap_or(false)
    }
}

pub type RS256Algorithm = AsymmetricAlgorithm<RSAScheme<RS256>>;
pub type RS384Algorithm = AsymmetricAlgorithm<RSAScheme<RS384>>;
pub type RS512Algorithm = AsymmetricAlgorithm<RSAScheme<RS512>>;
pub type PS256Algorithm = AsymmetricAlgorithm<RSAScheme<PS256>>;
pub type PS384Algorithm = AsymmetricAlgorithm<RSAScheme<PS384>>;
pub type PS512Algorithm = AsymmetricAlgorithm<RSAScheme<PS512>>;
