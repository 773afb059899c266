use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::Envelope;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// MessagePack with field names, so tagged enums survive the trip.
pub fn serialize_envelope(envelope: &Envelope) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec_named(envelope)?)
}

pub fn deserialize_envelope(bytes: &[u8]) -> Result<Envelope, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_envelopes(envelopes: &[Envelope]) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec_named(envelopes)?)
}

pub fn deserialize_envelopes(bytes: &[u8]) -> Result<Vec<Envelope>, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_envelope_json(envelope: &Envelope) -> Result<String, WireError> {
    Ok(serde_json::to_string(envelope)?)
}

pub fn deserialize_envelope_json(json: &str) -> Result<Envelope, WireError> {
    Ok(serde_json::from_str(json)?)
}
