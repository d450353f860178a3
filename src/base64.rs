//! Base64 (standard alphabet, padded) and base64url (URL-safe alphabet, unpadded)
//! codecs operating directly on byte spans.
//!
//! Decoding is strict: symbols outside the alphabet, misplaced padding,
//! truncated groups and non-zero trailing bits are all rejected, so every
//! byte string has exactly one accepted encoding.

use crate::error::Base64Error;

const INVALID: u8 = 0xff;
const PADDING: u8 = 0xfe;
const SENTINEL_BIT: u8 = 0x80;

const STANDARD_SYMBOLS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const URL_SAFE_SYMBOLS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

struct Alphabet {
    encode: [u8; 64],
    decode: [u8; 256],
}

const fn build_decode_table(symbols: &[u8; 64]) -> [u8; 256] {
    let mut table = [INVALID; 256];
    table[b'=' as usize] = PADDING;
    let mut i = 0;
    while i < symbols.len() {
        table[symbols[i] as usize] = i as u8;
        i += 1;
    }
    table
}

static STANDARD: Alphabet = Alphabet {
    encode: *STANDARD_SYMBOLS,
    decode: build_decode_table(STANDARD_SYMBOLS),
};

static URL_SAFE: Alphabet = Alphabet {
    encode: *URL_SAFE_SYMBOLS,
    decode: build_decode_table(URL_SAFE_SYMBOLS),
};

/// Standard base64 with `=` padding.
pub struct Base64;

/// URL-safe base64 without padding, as used by JWS compact serialization.
pub struct Base64Url;

impl Base64 {
    /// Exact length of the encoding of `bin_len` bytes.
    pub const fn encoded_len(bin_len: usize) -> usize {
        (bin_len + 2) / 3 * 4
    }

    /// Number of bytes a decode buffer must hold for an input of `encoded_len` symbols.
    pub const fn max_decoded_len(encoded_len: usize) -> usize {
        encoded_len / 4 * 3
    }

    pub fn encode_into(bin: &[u8], encoded: &mut [u8]) -> Result<usize, Base64Error> {
        let len = Self::encoded_len(bin.len());
        if encoded.len() < len {
            return Err(Base64Error::BufferTooSmall);
        }
        Ok(encode_core(bin, encoded, &STANDARD.encode, true))
    }

    pub fn decode_into(encoded: impl AsRef<[u8]>, bin: &mut [u8]) -> Result<usize, Base64Error> {
        let encoded = encoded.as_ref();
        if bin.len() < Self::max_decoded_len(encoded.len()) {
            return Err(Base64Error::BufferTooSmall);
        }
        decode_core(encoded, bin, &STANDARD.decode, true)
    }

    pub fn encode_to_string(bin: impl AsRef<[u8]>) -> Result<String, Base64Error> {
        let bin = bin.as_ref();
        let mut encoded = vec![0u8; Self::encoded_len(bin.len())];
        Self::encode_into(bin, &mut encoded)?;
        String::from_utf8(encoded).map_err(|_| Base64Error::InvalidEncoding)
    }

    pub fn decode_to_vec(encoded: impl AsRef<[u8]>) -> Result<Vec<u8>, Base64Error> {
        let encoded = encoded.as_ref();
        let mut bin = vec![0u8; Self::max_decoded_len(encoded.len())];
        let len = Self::decode_into(encoded, &mut bin)?;
        bin.truncate(len);
        Ok(bin)
    }
}

impl Base64Url {
    /// Exact length of the encoding of `bin_len` bytes.
    pub const fn encoded_len(bin_len: usize) -> usize {
        let extra = match bin_len % 3 {
            0 => 0,
            1 => 2,
            _ => 3,
        };
        bin_len / 3 * 4 + extra
    }

    /// Number of bytes a decode buffer must hold for an input of `encoded_len` symbols.
    pub const fn max_decoded_len(encoded_len: usize) -> usize {
        encoded_len / 4 * 3 + encoded_len % 4
    }

    pub fn encode_into(bin: &[u8], encoded: &mut [u8]) -> Result<usize, Base64Error> {
        let len = Self::encoded_len(bin.len());
        if encoded.len() < len {
            return Err(Base64Error::BufferTooSmall);
        }
        Ok(encode_core(bin, encoded, &URL_SAFE.encode, false))
    }

    pub fn decode_into(encoded: impl AsRef<[u8]>, bin: &mut [u8]) -> Result<usize, Base64Error> {
        let encoded = encoded.as_ref();
        if bin.len() < Self::max_decoded_len(encoded.len()) {
            return Err(Base64Error::BufferTooSmall);
        }
        decode_core(encoded, bin, &URL_SAFE.decode, false)
    }

    pub fn encode_to_string(bin: impl AsRef<[u8]>) -> Result<String, Base64Error> {
        let bin = bin.as_ref();
        let mut encoded = vec![0u8; Self::encoded_len(bin.len())];
        Self::encode_into(bin, &mut encoded)?;
        String::from_utf8(encoded).map_err(|_| Base64Error::InvalidEncoding)
    }

    pub fn decode_to_vec(encoded: impl AsRef<[u8]>) -> Result<Vec<u8>, Base64Error> {
        let encoded = encoded.as_ref();
        let mut bin = vec![0u8; Self::max_decoded_len(encoded.len())];
        let len = Self::decode_into(encoded, &mut bin)?;
        bin.truncate(len);
        Ok(bin)
    }
}

fn encode_core(bin: &[u8], encoded: &mut [u8], table: &[u8; 64], padding: bool) -> usize {
    let mut j = 0;
    let mut chunks = bin.chunks_exact(3);
    for chunk in &mut chunks {
        let (b0, b1, b2) = (chunk[0], chunk[1], chunk[2]);
        encoded[j] = table[(b0 >> 2) as usize];
        encoded[j + 1] = table[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize];
        encoded[j + 2] = table[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize];
        encoded[j + 3] = table[(b2 & 0x3f) as usize];
        j += 4;
    }
    match *chunks.remainder() {
        [b0, b1] => {
            encoded[j] = table[(b0 >> 2) as usize];
            encoded[j + 1] = table[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize];
            encoded[j + 2] = table[((b1 & 0x0f) << 2) as usize];
            if padding {
                encoded[j + 3] = b'=';
                j += 4;
            } else {
                j += 3;
            }
        }
        [b0] => {
            encoded[j] = table[(b0 >> 2) as usize];
            encoded[j + 1] = table[((b0 & 0x03) << 4) as usize];
            if padding {
                encoded[j + 2] = b'=';
                encoded[j + 3] = b'=';
                j += 4;
            } else {
                j += 2;
            }
        }
        _ => {}
    }
    j
}

#[inline]
fn lookup(table: &[u8; 256], symbol: u8) -> u8 {
    table[symbol as usize]
}

fn decode_core(
    encoded: &[u8],
    bin: &mut [u8],
    table: &[u8; 256],
    padded: bool,
) -> Result<usize, Base64Error> {
    if encoded.is_empty() {
        return Ok(0);
    }
    let mut i = 0;
    let mut j = 0;
    // Every group but the last one is a plain 4-symbol group.
    while i + 4 < encoded.len() {
        let a = lookup(table, encoded[i]);
        let b = lookup(table, encoded[i + 1]);
        let c = lookup(table, encoded[i + 2]);
        let d = lookup(table, encoded[i + 3]);
        if (a | b | c | d) & SENTINEL_BIT != 0 {
            return Err(Base64Error::InvalidEncoding);
        }
        bin[j] = (a << 2) | (b >> 4);
        bin[j + 1] = (b << 4) | (c >> 2);
        bin[j + 2] = (c << 6) | d;
        i += 4;
        j += 3;
    }
    let rest = &encoded[i..];
    let written = if padded {
        decode_padded_tail(rest, &mut bin[j..], table)?
    } else {
        decode_unpadded_tail(rest, &mut bin[j..], table)?
    };
    Ok(j + written)
}

fn decode_padded_tail(
    rest: &[u8],
    bin: &mut [u8],
    table: &[u8; 256],
) -> Result<usize, Base64Error> {
    if rest.len() != 4 {
        return Err(Base64Error::InvalidEncoding);
    }
    let a = lookup(table, rest[0]);
    let b = lookup(table, rest[1]);
    let c = lookup(table, rest[2]);
    let d = lookup(table, rest[3]);
    if d != PADDING {
        return decode_tail(&[a, b, c, d], bin);
    }
    if c != PADDING {
        // ***=
        return decode_tail(&[a, b, c], bin);
    }
    // **== ; *=== and ==== are caught by the sentinel check
    decode_tail(&[a, b], bin)
}

fn decode_unpadded_tail(
    rest: &[u8],
    bin: &mut [u8],
    table: &[u8; 256],
) -> Result<usize, Base64Error> {
    match *rest {
        [a, b, c, d] => decode_tail(
            &[
                lookup(table, a),
                lookup(table, b),
                lookup(table, c),
                lookup(table, d),
            ],
            bin,
        ),
        [a, b, c] => decode_tail(
            &[lookup(table, a), lookup(table, b), lookup(table, c)],
            bin,
        ),
        [a, b] => decode_tail(&[lookup(table, a), lookup(table, b)], bin),
        // a lone symbol carries only 6 bits, not enough for a byte
        _ => Err(Base64Error::InvalidEncoding),
    }
}

/// Decodes a final group of 2, 3 or 4 already looked-up symbols.
fn decode_tail(values: &[u8], bin: &mut [u8]) -> Result<usize, Base64Error> {
    if values.iter().fold(0, |acc, v| acc | v) & SENTINEL_BIT != 0 {
        return Err(Base64Error::InvalidEncoding);
    }
    match *values {
        [a, b, c, d] => {
            bin[0] = (a << 2) | (b >> 4);
            bin[1] = (b << 4) | (c >> 2);
            bin[2] = (c << 6) | d;
            Ok(3)
        }
        [a, b, c] => {
            if c & 0x03 != 0 {
                return Err(Base64Error::InvalidEncoding);
            }
            bin[0] = (a << 2) | (b >> 4);
            bin[1] = (b << 4) | (c >> 2);
            Ok(2)
        }
        [a, b] => {
            if b & 0x0f != 0 {
                return Err(Base64Error::InvalidEncoding);
            }
            bin[0] = (a << 2) | (b >> 4);
            Ok(1)
        }
        _ => Err(Base64Error::InvalidEncoding),
    }
}
