use coarsetime::{Clock, Duration, UnixTimeStamp};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::convert::TryFrom;
use std::fmt;

use crate::error::DecodeError;
use crate::numeric;

/// Expiration to splice into a payload as its `exp` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Expire at a fixed point in time
    At(UnixTimeStamp),
    /// Expire once this much time has elapsed from the moment of encoding
    After(Duration),
}

impl Expiry {
    /// The `exp` value in seconds since the Unix epoch.
    pub fn as_secs(&self) -> i64 {
        let at = match *self {
            Expiry::At(at) => at,
            Expiry::After(valid_for) => Clock::now_since_epoch() + valid_for,
        };
        i64::try_from(at.as_secs()).unwrap_or(i64::MAX)
    }
}

impl From<UnixTimeStamp> for Expiry {
    fn from(at: UnixTimeStamp) -> Self {
        Expiry::At(at)
    }
}

/// The registered time claims of a payload, in seconds since the Unix epoch.
///
/// Only top-level `exp` and `nbf` members holding a JSON integer are
/// recognized; `null` counts as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifetimeClaims {
    /// Time the claims will be invalid until
    pub not_before: Option<i64>,

    /// Time the claims expire at
    pub expires_at: Option<i64>,
}

impl LifetimeClaims {
    pub(crate) fn scan(json: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }

    /// Checks `now + skew >= nbf` and `now - skew <= exp`, in that order.
    pub fn check(&self, now: i64, skew: i64) -> Result<(), DecodeError> {
        if let Some(not_before) = self.not_before {
            if now.saturating_add(skew) < not_before {
                return Err(DecodeError::FailedVerifyNotBefore);
            }
        }
        if let Some(expires_at) = self.expires_at {
            if now.saturating_sub(skew) > expires_at {
                return Err(DecodeError::FailedVerifyExpire);
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for LifetimeClaims {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LifetimeVisitor)
    }
}

enum ClaimKey {
    Exp,
    Nbf,
    Other,
}

impl<'de> Deserialize<'de> for ClaimKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = ClaimKey;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a claim name")
            }

            fn visit_str<E: de::Error>(self, key: &str) -> Result<ClaimKey, E> {
                Ok(match key {
                    "exp" => ClaimKey::Exp,
                    "nbf" => ClaimKey::Nbf,
                    _ => ClaimKey::Other,
                })
            }
        }

        deserializer.deserialize_identifier(KeyVisitor)
    }
}

struct LifetimeVisitor;

impl<'de> Visitor<'de> for LifetimeVisitor {
    type Value = LifetimeClaims;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JWT claims object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut claims = LifetimeClaims::default();
        while let Some(key) = map.next_key::<ClaimKey>()? {
            match key {
                ClaimKey::Exp => {
                    if claims.expires_at.is_some() {
                        return Err(de::Error::duplicate_field("exp"));
                    }
                    claims.expires_at = integer_claim(map.next_value::<&RawValue>()?, "exp")?;
                }
                ClaimKey::Nbf => {
                    if claims.not_before.is_some() {
                        return Err(de::Error::duplicate_field("nbf"));
                    }
                    claims.not_before = integer_claim(map.next_value::<&RawValue>()?, "nbf")?;
                }
                ClaimKey::Other => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(claims)
    }
}

/// Whether the top-level object has an `exp` member, whatever its value.
pub(crate) fn has_expiry_member(json: &[u8]) -> Result<bool, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_slice(json);
    let found = (&mut deserializer).deserialize_map(ExpiryMemberVisitor)?;
    deserializer.end()?;
    Ok(found)
}

struct ExpiryMemberVisitor;

impl<'de> Visitor<'de> for ExpiryMemberVisitor {
    type Value = bool;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<bool, A::Error> {
        let mut found = false;
        while let Some(key) = map.next_key::<ClaimKey>()? {
            if let ClaimKey::Exp = key {
                found = true;
            }
            map.next_value::<IgnoredAny>()?;
        }
        Ok(found)
    }
}

/// Reads the raw JSON number text directly instead of going through `f64`/`u64`.
fn integer_claim<E: de::Error>(raw: &RawValue, name: &'static str) -> Result<Option<i64>, E> {
    let text = raw.get();
    if text == "null" {
        return Ok(None);
    }
    numeric::parse_i64(text.as_bytes())
        .map(Some)
        .ok_or_else(|| E::custom(format_args!("`{}` is not an integer", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_member_detection() {
        assert!(has_expiry_member(br#"{"sub":"x","exp":1}"#).unwrap());
        assert!(has_expiry_member(br#"{"exp":null}"#).unwrap());
        assert!(!has_expiry_member(br#"{"nested":{"exp":1},"expires":2}"#).unwrap());
        assert!(!has_expiry_member(b"{}").unwrap());
        assert!(has_expiry_member(b"[1]").is_err());
        assert!(has_expiry_member(br#"{"a":1} {"b":2}"#).is_err());
    }

    #[test]
    fn scan_time_claims() {
        let claims =
            LifetimeClaims::scan(br#"{"sub":"x","exp":1700000000,"nested":{"nbf":1},"nbf":-5}"#)
                .unwrap();
        assert_eq!(claims.expires_at, Some(1700000000));
        assert_eq!(claims.not_before, Some(-5));
    }

    #[test]
    fn absent_and_null_claims() {
        assert_eq!(
            LifetimeClaims::scan(br#"{"a":[1,2,{"exp":3}]}"#).unwrap(),
            LifetimeClaims::default()
        );
        assert_eq!(
            LifetimeClaims::scan(br#"{"exp":null}"#).unwrap(),
            LifetimeClaims::default()
        );
        assert_eq!(
            LifetimeClaims::scan(b"{}").unwrap(),
            LifetimeClaims::default()
        );
    }

    #[test]
    fn non_integer_claims_are_rejected() {
        let inputs: &[&[u8]] = &[
            br#"{"exp":"1700000000"}"#,
            br#"{"exp":1.5}"#,
            br#"{"nbf":1e9}"#,
            br#"{"exp":true}"#,
            br#"{"exp":99999999999999999999}"#,
            br#"{"exp":1,"exp":2}"#,
            br#"[1,2]"#,
            br#"{"exp":1"#,
        ];
        for json in inputs {
            assert!(LifetimeClaims::scan(json).is_err());
        }
    }

    #[test]
    fn check_with_skew() {
        let claims = LifetimeClaims {
            not_before: Some(1000),
            expires_at: Some(2000),
        };
        assert_eq!(claims.check(1500, 0), Ok(()));
        assert_eq!(claims.check(999, 0), Err(DecodeError::FailedVerifyNotBefore));
        assert_eq!(claims.check(999, 1), Ok(()));
        assert_eq!(claims.check(2000, 0), Ok(()));
        assert_eq!(claims.check(2001, 0), Err(DecodeError::FailedVerifyExpire));
        assert_eq!(claims.check(2001, 1), Ok(()));
        assert_eq!(claims.check(i64::MIN, 0), Err(DecodeError::FailedVerifyNotBefore));
    }

    #[test]
    fn fixed_expiry() {
        let expiry = Expiry::from(UnixTimeStamp::from_secs(1_700_000_000));
        assert_eq!(expiry.as_secs(), 1_700_000_000);
        let relative = Expiry::After(Duration::from_secs(60)).as_secs();
        let now = Clock::now_since_epoch().as_secs() as i64;
        assert!(relative >= now + 59 && relative <= now + 61);
    }
}
