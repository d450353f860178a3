use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use crate::base64::Base64Url;
use crate::error::*;

/// The only header this crate ever emits.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct JWTHeader<'a> {
    #[serde(rename = "alg")]
    pub(crate) algorithm: &'a str,

    #[serde(rename = "typ")]
    pub(crate) signature_type: &'a str,
}

impl<'a> JWTHeader<'a> {
    pub(crate) fn new(algorithm: &'a str) -> Self {
        JWTHeader {
            algorithm,
            signature_type: "JWT",
        }
    }

    /// Base64url form of `{"alg":"<algorithm>","typ":"JWT"}`.
    pub(crate) fn to_base64url(&self) -> Result<Vec<u8>, Error> {
        let json = serde_json::to_vec(self)?;
        let mut encoded = vec![0u8; Base64Url::encoded_len(json.len())];
        let len = Base64Url::encode_into(&json, &mut encoded).map_err(JWTError::from)?;
        encoded.truncate(len);
        Ok(encoded)
    }
}

/// The header members the decoder looks at. Everything else is skipped
/// without being materialized.
#[derive(Debug, Default)]
pub(crate) struct ScannedHeader<'a> {
    pub(crate) alg: Option<Cow<'a, str>>,
    pub(crate) typ: Option<Cow<'a, str>>,
}

impl<'a> ScannedHeader<'a> {
    /// Fails if `json` is not a single well-formed object or if `alg`/`typ`
    /// are present with a non-string value.
    pub(crate) fn scan(json: &'a [u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(json)
    }
}

impl<'de: 'a, 'a> Deserialize<'de> for ScannedHeader<'a> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HeaderVisitor(PhantomData))
    }
}

enum HeaderKey {
    Alg,
    Typ,
    Other,
}

impl<'de> Deserialize<'de> for HeaderKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = HeaderKey;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a header member name")
            }

            fn visit_str<E: de::Error>(self, key: &str) -> Result<HeaderKey, E> {
                Ok(match key {
                    "alg" => HeaderKey::Alg,
                    "typ" => HeaderKey::Typ,
                    _ => HeaderKey::Other,
                })
            }
        }

        deserializer.deserialize_identifier(KeyVisitor)
    }
}

struct HeaderVisitor<'a>(PhantomData<&'a ()>);

impl<'de: 'a, 'a> Visitor<'de> for HeaderVisitor<'a> {
    type Value = ScannedHeader<'a>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JWT header object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut header = ScannedHeader::default();
        while let Some(key) = map.next_key::<HeaderKey>()? {
            match key {
                HeaderKey::Alg => {
                    if header.alg.is_some() {
                        return Err(de::Error::duplicate_field("alg"));
                    }
                    header.alg = Some(map.next_value::<JsonStr<'a>>()?.0);
                }
                HeaderKey::Typ => {
                    if header.typ.is_some() {
                        return Err(de::Error::duplicate_field("typ"));
                    }
                    header.typ = Some(map.next_value::<JsonStr<'a>>()?.0);
                }
                HeaderKey::Other => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(header)
    }
}

/// A JSON string borrowed from the input unless it contained escapes.
struct JsonStr<'a>(Cow<'a, str>);

impl<'de: 'a, 'a> Deserialize<'de> for JsonStr<'a> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StrVisitor<'a>(PhantomData<&'a ()>);

        impl<'de: 'a, 'a> Visitor<'de> for StrVisitor<'a> {
            type Value = JsonStr<'a>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string")
            }

            fn visit_borrowed_str<E: de::Error>(self, v: &'de str) -> Result<Self::Value, E> {
                Ok(JsonStr(Cow::Borrowed(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(JsonStr(Cow::Owned(v.to_owned())))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(JsonStr(Cow::Owned(v)))
            }
        }

        deserializer.deserialize_str(StrVisitor(PhantomData))
    }
}
