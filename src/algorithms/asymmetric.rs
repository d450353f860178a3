use std::fmt;
use std::sync::Arc;

use super::{ensure_signature_len, JwtAlgorithm, KeyFactories, ProviderCache};
use crate::error::*;
use crate::jwt_header::JWTHeader;

/// A public-key signature scheme: which key types it uses, which native
/// provider it builds from them, and how that provider signs and verifies.
pub trait SignatureScheme: Send + Sync + 'static {
    type KeyPair: Send + Sync + 'static;
    type PublicKey: Send + Sync + 'static;
    type Provider: Send + Sync + 'static;

    fn jwt_alg_name() -> &'static str;

    fn signature_size(public_key: &Self::PublicKey) -> usize;

    fn public_key_of(key_pair: &Self::KeyPair) -> Result<Self::PublicKey, Error>;

    fn provider(
        key_pair: Option<Self::KeyPair>,
        public_key: Self::PublicKey,
    ) -> Result<Self::Provider, Error>;

    fn sign(provider: &Self::Provider, message: &[u8], signature: &mut [u8])
        -> Result<(), Error>;

    fn verify(provider: &Self::Provider, message: &[u8], signature: &[u8]) -> bool;
}

/// A `JwtAlgorithm` backed by a public-key signature scheme.
///
/// Keys come from factories and the native providers built from them are
/// cached per thread.
pub struct AsymmetricAlgorithm<S: SignatureScheme> {
    factories: KeyFactories<S::KeyPair, S::PublicKey>,
    providers: ProviderCache<S::Provider>,
    header: Vec<u8>,
    signature_size: usize,
}

impl<S: SignatureScheme> fmt::Debug for AsymmetricAlgorithm<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsymmetricAlgorithm")
            .field("alg", &S::jwt_alg_name())
            .field("signature_size", &self.signature_size)
            .field("factories", &self.factories)
            .field("providers", &self.providers)
            .finish()
    }
}

impl<S: SignatureScheme> AsymmetricAlgorithm<S> {
    /// An algorithm that can sign and verify.
    pub fn new(key_pair: S::KeyPair) -> Result<Self, Error>
    where
        S::KeyPair: Clone,
    {
        let public_key = S::public_key_of(&key_pair)?;
        let private_key = key_pair.clone();
        let factories = KeyFactories::new(move || S::public_key_of(&key_pair))
            .with_private(move || Ok(private_key.clone()));
        Self::build(factories, public_key)
    }

    /// A verify-only algorithm.
    pub fn with_public_key(public_key: S::PublicKey) -> Result<Self, Error>
    where
        S::PublicKey: Clone,
    {
        let probe = public_key.clone();
        Self::build(KeyFactories::new(move || Ok(public_key.clone())), probe)
    }

    /// The public key factory is called once right away to validate it and to
    /// learn the signature size.
    pub fn with_key_factories(
        factories: KeyFactories<S::KeyPair, S::PublicKey>,
    ) -> Result<Self, Error> {
        let public_key = (factories.public)()?;
        Self::build(factories, public_key)
    }

    fn build(
        factories: KeyFactories<S::KeyPair, S::PublicKey>,
        public_key: S::PublicKey,
    ) -> Result<Self, Error> {
        Ok(AsymmetricAlgorithm {
            signature_size: S::signature_size(&public_key),
            header: JWTHeader::new(S::jwt_alg_name()).to_base64url()?,
            providers: ProviderCache::new(S::jwt_alg_name()),
            factories,
        })
    }

    pub fn can_sign(&self) -> bool {
        self.factories.has_private_key()
    }

    fn provider(&self) -> Result<Arc<S::Provider>, Error> {
        self.providers.get_or_try_init(|| {
            let key_pair = match &self.factories.private {
                Some(private) => Some(private()?),
                None => None,
            };
            S::provider(key_pair, (self.factories.public)()?)
        })
    }

    #[cfg(test)]
    pub(crate) fn cached_providers(&self) -> usize {
        self.providers.len()
    }
}

impl<S: SignatureScheme> JwtAlgorithm for AsymmetricAlgorithm<S> {
    fn alg_name(&self) -> &'static str {
        S::jwt_alg_name()
    }

    fn header_base64url(&self) -> &[u8] {
        &self.header
    }

    fn signature_size(&self) -> usize {
        self.signature_size
    }

    fn sign(&self, message: &[u8], signature: &mut [u8]) -> Result<(), Error> {
        ensure!(self.can_sign(), JWTError::MissingPrivateKey);
        ensure_signature_len(self, signature)?;
        let provider = self.provider()?;
        S::sign(&provider, message, signature)
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        if signature.len() != self.signature_size {
            return false;
        }
        match self.provider() {
            Ok(provider) => S::verify(&provider, message, signature),
            Err(err) => {
                tracing::debug!(alg = S::jwt_alg_name(), %err, "no key provider for verification");
                false
            }
        }
    }

    fn dispose(&self) {
        self.providers.dispose();
    }
}
