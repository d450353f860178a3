//! Assembly of `header.payload.signature` directly into an output sink.

use crate::algorithms::JwtAlgorithm;
use crate::base64::Base64Url;
use crate::claims;
use crate::error::*;
use crate::numeric;
use crate::scratch::with_scratch;

const EXP_MEMBER: &[u8] = b"\"exp\":";

/// Destination of encoded tokens.
pub trait TokenSink {
    /// Appends exactly `len` bytes produced by `fill`. If `fill` fails,
    /// the sink is left as it was before the call.
    fn write_exact(
        &mut self,
        len: usize,
        fill: &mut dyn FnMut(&mut [u8]) -> Result<(), Error>,
    ) -> Result<(), Error>;
}

impl TokenSink for Vec<u8> {
    fn write_exact(
        &mut self,
        len: usize,
        fill: &mut dyn FnMut(&mut [u8]) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let start = self.len();
        self.resize(start + len, 0);
        if let Err(err) = fill(&mut self[start..]) {
            self.truncate(start);
            return Err(err);
        }
        Ok(())
    }
}

impl<S: TokenSink + ?Sized> TokenSink for &mut S {
    fn write_exact(
        &mut self,
        len: usize,
        fill: &mut dyn FnMut(&mut [u8]) -> Result<(), Error>,
    ) -> Result<(), Error> {
        (**self).write_exact(len, fill)
    }
}

/// A sink writing into a caller-owned buffer.
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        SliceSink { buf, written: 0 }
    }

    /// Number of bytes committed so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// The committed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.written]
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.written
    }
}

impl TokenSink for SliceSink<'_> {
    fn write_exact(
        &mut self,
        len: usize,
        fill: &mut dyn FnMut(&mut [u8]) -> Result<(), Error>,
    ) -> Result<(), Error> {
        ensure!(len <= self.remaining(), JWTError::BufferTooSmall);
        let end = self.written + len;
        fill(&mut self.buf[self.written..end])?;
        self.written = end;
        Ok(())
    }
}

/// Handed to encoding callbacks, which pass it the serialized payload.
pub struct JwtWriter<'a> {
    algorithm: &'a dyn JwtAlgorithm,
    expires_at: Option<i64>,
    sink: &'a mut dyn TokenSink,
    written: bool,
}

impl<'a> JwtWriter<'a> {
    pub(crate) fn new(
        algorithm: &'a dyn JwtAlgorithm,
        expires_at: Option<i64>,
        sink: &'a mut dyn TokenSink,
    ) -> Self {
        JwtWriter {
            algorithm,
            expires_at,
            sink,
            written: false,
        }
    }

    /// Signs `payload_json` and writes the complete token to the sink.
    ///
    /// With an expiry, `payload_json` must be a JSON object without an `exp`
    /// member of its own (an empty payload counts as `{}`).
    pub fn write(&mut self, payload_json: impl AsRef<[u8]>) -> Result<(), Error> {
        ensure!(!self.written, JWTError::InternalError("token already written".into()));
        let payload_json = payload_json.as_ref();
        match self.expires_at {
            None => self.write_token(payload_json)?,
            Some(expires_at) => {
                let splice = ExpirySplice::new(payload_json, expires_at)?;
                with_scratch(splice.len(), |buf| {
                    splice.write_into(buf);
                    self.write_token(buf)
                })?
            }
        }
        self.written = true;
        Ok(())
    }

    pub(crate) fn is_written(&self) -> bool {
        self.written
    }

    fn write_token(&mut self, payload_json: &[u8]) -> Result<(), Error> {
        let algorithm = self.algorithm;
        let header = algorithm.header_base64url();
        let signature_size = algorithm.signature_size();
        let signed_len = header.len() + 1 + Base64Url::encoded_len(payload_json.len());
        let token_len = signed_len + 1 + Base64Url::encoded_len(signature_size);

        self.sink.write_exact(token_len, &mut |token: &mut [u8]| -> Result<(), Error> {
            token[..header.len()].copy_from_slice(header);
            token[header.len()] = b'.';
            Base64Url::encode_into(payload_json, &mut token[header.len() + 1..signed_len])
                .map_err(JWTError::from)?;
            token[signed_len] = b'.';
            let (signed, tail) = token.split_at_mut(signed_len);
            with_scratch(signature_size, |signature: &mut [u8]| -> Result<(), Error> {
                algorithm.sign(signed, signature)?;
                Base64Url::encode_into(signature, &mut tail[1..]).map_err(JWTError::from)?;
                Ok(())
            })
        })
    }
}

/// A payload object with `"exp":<secs>` inserted before its closing brace.
struct ExpirySplice<'a> {
    body: &'a [u8],
    comma: bool,
    expires_at: i64,
}

impl<'a> ExpirySplice<'a> {
    fn new(payload_json: &'a [u8], expires_at: i64) -> Result<Self, Error> {
        let trimmed = trim_end(payload_json);
        if trimmed.is_empty() {
            return Ok(ExpirySplice {
                body: b"{",
                comma: false,
                expires_at,
            });
        }
        ensure!(
            trimmed.ends_with(b"}") && trim_start(trimmed).starts_with(b"{"),
            JWTError::InvalidPayloadJson
        );
        let has_expiry =
            claims::has_expiry_member(trimmed).map_err(|_| JWTError::InvalidPayloadJson)?;
        ensure!(!has_expiry, JWTError::DuplicateExpiry);
        let body = &trimmed[..trimmed.len() - 1];
        let comma = !trim_end(body).ends_with(b"{");
        Ok(ExpirySplice {
            body,
            comma,
            expires_at,
        })
    }

    fn len(&self) -> usize {
        self.body.len()
            + usize::from(self.comma)
            + EXP_MEMBER.len()
            + numeric::formatted_len(self.expires_at)
            + 1
    }

    fn write_into(&self, out: &mut [u8]) {
        let mut pos = self.body.len();
        out[..pos].copy_from_slice(self.body);
        if self.comma {
            out[pos] = b',';
            pos += 1;
        }
        out[pos..pos + EXP_MEMBER.len()].copy_from_slice(EXP_MEMBER);
        pos += EXP_MEMBER.len();
        pos += numeric::write_i64(&mut out[pos..], self.expires_at);
        out[pos] = b'}';
    }
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn trim_end(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &bytes[..end]
}
