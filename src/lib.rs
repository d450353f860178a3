#![forbid(unsafe_code)]

pub mod algorithms;
pub mod base64;
pub mod claims;
pub mod common;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod numeric;
pub mod resolver;
pub mod token;
pub mod writer;

mod jwt_header;
mod scratch;

pub use coarsetime;
pub use serde;

pub mod prelude {
    pub use crate::algorithms::*;
    pub use crate::base64::{Base64, Base64Url};
    pub use crate::claims::*;
    pub use crate::common::*;
    pub use crate::decoder::*;
    pub use crate::encoder::*;
    pub use crate::error::{DecodeError, DecodeResult, Error, JWTError};
    pub use crate::resolver::*;
    pub use crate::token::*;
    pub use crate::writer::*;
    pub use coarsetime::{self, Clock, Duration, UnixTimeStamp};
    pub use serde::{Deserialize, Serialize};
}
