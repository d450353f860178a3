mod asymmetric;
mod ecdsa;
mod hmac;
mod providers;
mod rsa;

pub use self::asymmetric::*;
pub use self::ecdsa::*;
pub use self::hmac::*;
pub use self::providers::*;
pub use self::rsa::*;

use crate::error::*;

/// A JWS signing algorithm together with its key material.
///
/// Implementations are immutable once built and can be shared between
/// threads as `Arc<dyn JwtAlgorithm>`. The same instance serves encoders and
/// decoders.
pub trait JwtAlgorithm: Send + Sync {
    /// The `alg` header value, e.g. `"HS256"`.
    fn alg_name(&self) -> &'static str;

    /// Base64url of `{"alg":"<alg_name>","typ":"JWT"}`, computed once.
    fn header_base64url(&self) -> &[u8];

    /// Exact length in bytes of every signature produced by `sign`.
    fn signature_size(&self) -> usize;

    /// Signs `message` into `signature`, which must be exactly
    /// `signature_size()` bytes long.
    fn sign(&self, message: &[u8], signature: &mut [u8]) -> Result<(), Error>;

    /// Returns `true` only if `signature` is valid for `message`.
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool;

    /// Releases cached native key providers. Idempotent. The algorithm
    /// cannot sign or verify anymore afterwards.
    fn dispose(&self) {}
}

fn ensure_signature_len(algorithm: &dyn JwtAlgorithm, signature: &[u8]) -> Result<(), Error> {
    ensure!(
        signature.len() == algorithm.signature_size(),
        JWTError::SignatureLengthMismatch {
            expected: algorithm.signature_size(),
            actual: signature.len(),
        }
    );
    Ok(())
}

fn disposed(alg_name: &'static str) -> Error {
    tracing::warn!(alg = alg_name, "algorithm used after dispose()");
    JWTError::AlgorithmDisposed.into()
}
