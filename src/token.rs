use crate::base64::Base64Url;
use crate::error::*;
use crate::jwt_header::ScannedHeader;

/// Utilities to get information about a JWT token
pub struct Token;

/// The three segments of a compact token, still base64url-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub header: &'a [u8],
    pub payload: &'a [u8],
    /// `header.payload`, the signed message
    pub signed: &'a [u8],
    pub signature: &'a [u8],
}

impl<'a> TokenParts<'a> {
    /// Splits on the first two dots. Any further dot ends up in the
    /// signature segment and makes it invalid base64url.
    pub fn split(token: &'a [u8]) -> Option<Self> {
        let first = token.iter().position(|&b| b == b'.')?;
        let second = first + 1 + token[first + 1..].iter().position(|&b| b == b'.')?;
        Some(TokenParts {
            header: &token[..first],
            payload: &token[first + 1..second],
            signed: &token[..second],
            signature: &token[second + 1..],
        })
    }
}

/// JWT token information useful before signature verification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    algorithm: String,
    signature_type: Option<String>,
}

impl TokenMetadata {
    /// The JWT algorithm for this token ("alg")
    /// This information should not be trusted: it is unprotected and can be
    /// freely modified by a third party. Decoders only use it to pick among
    /// the algorithms they were configured with.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The signature type for this token ("typ")
    pub fn signature_type(&self) -> Option<&str> {
        self.signature_type.as_deref()
    }
}

impl Token {
    /// Decodes the header of a token without verifying anything.
    pub fn decode_metadata(token: impl AsRef<[u8]>) -> DecodeResult<TokenMetadata> {
        let parts = TokenParts::split(token.as_ref()).ok_or(DecodeError::InvalidHeaderFormat)?;
        let header_json = Base64Url::decode_to_vec(parts.header)
            .map_err(|_| DecodeError::InvalidBase64UrlHeader)?;
        let header =
            ScannedHeader::scan(&header_json).map_err(|_| DecodeError::InvalidHeaderFormat)?;
        let algorithm = header.alg.ok_or(DecodeError::InvalidHeaderFormat)?;
        Ok(TokenMetadata {
            algorithm: algorithm.into_owned(),
            signature_type: header.typ.map(|typ| typ.into_owned()),
        })
    }

    /// Returns the payload JSON of a token without verifying its signature
    /// or lifetime. Never trust the result for authorization decisions.
    pub fn payload_json(token: impl AsRef<[u8]>) -> DecodeResult<Vec<u8>> {
        let parts = TokenParts::split(token.as_ref()).ok_or(DecodeError::InvalidHeaderFormat)?;
        Base64Url::decode_to_vec(parts.payload).map_err(|_| DecodeError::InvalidBase64UrlPayload)
    }
}

#[test]
fn split_token() {
    let parts = TokenParts::split(b"aa.bbb.cccc").unwrap();
    assert_eq!(parts.header, b"aa");
    assert_eq!(parts.payload, b"bbb");
    assert_eq!(parts.signed, b"aa.bbb");
    assert_eq!(parts.signature, b"cccc");

    let parts = TokenParts::split(b"..").unwrap();
    assert!(parts.header.is_empty() && parts.payload.is_empty() && parts.signature.is_empty());
    assert_eq!(parts.signed, b".");

    assert_eq!(TokenParts::split(b"a.b.c.d").unwrap().signature, b"c.d");
    assert!(TokenParts::split(b"abc").is_none());
    assert!(TokenParts::split(b"a.b").is_none());
    assert!(TokenParts::split(b"").is_none());
}

#[test]
fn unverified_inspection() {
    let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IkpvaG4gRG9lIiwiaWF0IjoxNTE2MjM5MDIyfQ.garbage";
    let metadata = Token::decode_metadata(token).unwrap();
    assert_eq!(metadata.algorithm(), "HS256");
    assert_eq!(metadata.signature_type(), Some("JWT"));
    assert_eq!(
        Token::payload_json(token).unwrap(),
        br#"{"sub":"1234567890","name":"John Doe","iat":1516239022}"#.to_vec()
    );

    assert_eq!(
        Token::decode_metadata("no-dots"),
        Err(DecodeError::InvalidHeaderFormat)
    );
    assert_eq!(
        Token::decode_metadata("e!.e30.x"),
        Err(DecodeError::InvalidBase64UrlHeader)
    );
    // `{}` has no alg
    assert_eq!(
        Token::decode_metadata("e30.e30.x"),
        Err(DecodeError::InvalidHeaderFormat)
    );
    assert_eq!(
        Token::payload_json("e30.%%.x"),
        Err(DecodeError::InvalidBase64UrlPayload)
    );
}
