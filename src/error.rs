#[allow(unused)]
pub use anyhow::{anyhow, bail, ensure, Error};

#[derive(Debug, thiserror::Error)]
pub enum JWTError {
    #[error("Internal error: [{0}]")]
    InternalError(String),
    #[error("Algorithm registered twice: [{0}]")]
    DuplicateAlgorithm(String),
    #[error("Algorithm has been disposed")]
    AlgorithmDisposed,
    #[error("No private key available for signing")]
    MissingPrivateKey,
    #[error("Signature length mismatch: expected {expected} bytes, got {actual}")]
    SignatureLengthMismatch { expected: usize, actual: usize },
    #[error("Payload is not a JSON object")]
    InvalidPayloadJson,
    #[error("Output buffer too small")]
    BufferTooSmall,
    #[error("Unsupported RSA modulus")]
    UnsupportedRSAModulus,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid key pair")]
    InvalidKeyPair,
    #[error("Invalid base64 encoding")]
    Base64(#[from] Base64Error),
    #[error("Payload already has an `exp` claim")]
    DuplicateExpiry,
}

/// Failures of the low-level base64 codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Base64Error {
    #[error("invalid base64 encoding")]
    InvalidEncoding,
    #[error("output buffer too small")]
    BufferTooSmall,
}

/// Every way a token can be rejected by the decoder.
///
/// Decoding routinely processes untrusted input, so all of these are
/// returned by value and never allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DecodeError {
    #[error("header is not valid base64url")]
    InvalidBase64UrlHeader,
    #[error("payload is not valid base64url")]
    InvalidBase64UrlPayload,
    #[error("signature is not valid base64url")]
    InvalidBase64UrlSignature,
    #[error("signing algorithm is not registered")]
    AlgorithmNotExists,
    #[error("signature didn't verify")]
    FailedVerifySignature,
    #[error("token has expired")]
    FailedVerifyExpire,
    #[error("token not valid yet")]
    FailedVerifyNotBefore,
    #[error("header is not a valid JSON object")]
    InvalidHeaderFormat,
    #[error("payload is not a valid JSON object")]
    InvalidPayloadFormat,
}

/// Outcome of a decode call: the typed payload, or why the token was rejected.
pub type DecodeResult<T> = Result<T, DecodeError>;
