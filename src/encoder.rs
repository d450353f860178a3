use serde::Serialize;
use std::sync::Arc;

use crate::algorithms::JwtAlgorithm;
use crate::claims::Expiry;
use crate::error::*;
use crate::writer::{JwtWriter, TokenSink};

/// Produces signed tokens with a single algorithm.
///
/// The payload is serialized by a caller-supplied closure that hands the
/// resulting JSON to a [`JwtWriter`]. The `encode_json*` variants use
/// `serde_json`.
#[derive(Clone)]
pub struct JwtEncoder {
    algorithm: Arc<dyn JwtAlgorithm>,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("algorithm", &self.algorithm.alg_name())
            .finish()
    }
}

impl JwtEncoder {
    pub fn new(algorithm: Arc<dyn JwtAlgorithm>) -> Self {
        JwtEncoder { algorithm }
    }

    /// The algorithm tokens are signed with. Handy to build a decoder
    /// sharing the same instance.
    pub fn sign_algorithm(&self) -> &Arc<dyn JwtAlgorithm> {
        &self.algorithm
    }

    pub fn encode<T, F>(&self, payload: &T, expiry: Option<Expiry>, serializer: F) -> Result<String, Error>
    where
        T: ?Sized,
        F: FnOnce(&T, &mut JwtWriter<'_>) -> Result<(), Error>,
    {
        let token = self.encode_as_utf8_bytes(payload, expiry, serializer)?;
        Ok(String::from_utf8(token)?)
    }

    pub fn encode_as_utf8_bytes<T, F>(
        &self,
        payload: &T,
        expiry: Option<Expiry>,
        serializer: F,
    ) -> Result<Vec<u8>, Error>
    where
        T: ?Sized,
        F: FnOnce(&T, &mut JwtWriter<'_>) -> Result<(), Error>,
    {
        let mut token = Vec::new();
        self.encode_into(payload, expiry, serializer, &mut token)?;
        Ok(token)
    }

    /// Appends the token to `sink`. On error, nothing is committed.
    pub fn encode_into<T, F>(
        &self,
        payload: &T,
        expiry: Option<Expiry>,
        serializer: F,
        sink: &mut dyn TokenSink,
    ) -> Result<(), Error>
    where
        T: ?Sized,
        F: FnOnce(&T, &mut JwtWriter<'_>) -> Result<(), Error>,
    {
        let expires_at = expiry.map(|expiry| expiry.as_secs());
        let mut writer = JwtWriter::new(self.algorithm.as_ref(), expires_at, sink);
        serializer(payload, &mut writer)?;
        ensure!(
            writer.is_written(),
            JWTError::InternalError("serializer did not write a payload".into())
        );
        Ok(())
    }

    pub fn encode_json<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        expiry: Option<Expiry>,
    ) -> Result<String, Error> {
        self.encode(payload, expiry, write_json)
    }

    pub fn encode_json_as_utf8_bytes<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        expiry: Option<Expiry>,
    ) -> Result<Vec<u8>, Error> {
        self.encode_as_utf8_bytes(payload, expiry, write_json)
    }

    pub fn encode_json_into<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        expiry: Option<Expiry>,
        sink: &mut dyn TokenSink,
    ) -> Result<(), Error> {
        self.encode_into(payload, expiry, write_json, sink)
    }
}

fn write_json<T: Serialize + ?Sized>(payload: &T, writer: &mut JwtWriter<'_>) -> Result<(), Error> {
    writer.write(serde_json::to_vec(payload)?)
}
