//! Allocation-free conversion between `i64` and ASCII decimal digits.

/// Longest decimal rendering of an `i64` (`-9223372036854775808`).
pub const MAX_I64_DIGITS: usize = 20;

/// Number of bytes `write_i64` produces for `value`.
pub fn formatted_len(value: i64) -> usize {
    let mut n = value.unsigned_abs();
    let mut len = if value < 0 { 2 } else { 1 };
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}

/// Writes the decimal form of `value` at the start of `buf` and returns the
/// number of bytes written.
///
/// # Panics
///
/// Panics if `buf` is shorter than `formatted_len(value)`.
pub fn write_i64(buf: &mut [u8], value: i64) -> usize {
    let mut digits = [0u8; MAX_I64_DIGITS];
    let mut pos = digits.len();
    let mut n = value.unsigned_abs();
    loop {
        pos -= 1;
        digits[pos] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    if value < 0 {
        pos -= 1;
        digits[pos] = b'-';
    }
    let len = digits.len() - pos;
    buf[..len].copy_from_slice(&digits[pos..]);
    len
}

/// Reads an optionally negative decimal integer from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` if there is
/// no digit or the value does not fit an `i64`.
pub fn read_i64(bytes: &[u8]) -> Option<(i64, usize)> {
    let (negative, start) = match bytes.first() {
        Some(b'-') => (true, 1),
        _ => (false, 0),
    };
    let mut value: i64 = 0;
    let mut i = start;
    while let Some(&c) = bytes.get(i) {
        if !c.is_ascii_digit() {
            break;
        }
        let digit = i64::from(c - b'0');
        value = value.checked_mul(10)?;
        // accumulating towards the sign keeps i64::MIN representable
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
        i += 1;
    }
    if i == start {
        return None;
    }
    Some((value, i))
}

/// Parses `bytes` as a whole as a decimal integer.
pub fn parse_i64(bytes: &[u8]) -> Option<i64> {
    match read_i64(bytes)? {
        (value, consumed) if consumed == bytes.len() => Some(value),
        _ => None,
    }
}
