//! Best-score persistence format
//!
//! Features:
//! - Versioned JSON envelope
//! - Legacy plain-integer values are still accepted
//! - Envelopes from newer builds are rejected, not misread

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Envelope version written by this build
pub const CURRENT_VERSION: u32 = 1;

/// Stored form of a best score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEnvelope {
    pub version: u32,
    pub key: String,
    pub best: u32,
}

impl ScoreEnvelope {
    pub fn new(key: &str, best: u32) -> Self {
        Self {
            version: CURRENT_VERSION,
            key: key.to_string(),
            best,
        }
    }
}

/// Serialize a best score for storage
pub fn encode(key: &str, best: u32) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&ScoreEnvelope::new(key, best))?)
}

/// Read a stored best score (envelope or bare integer)
pub fn decode(text: &str) -> Result<u32, StoreError> {
    let text = text.trim();
    match serde_json::from_str::<ScoreEnvelope>(text) {
        Ok(envelope) if envelope.version > CURRENT_VERSION => Err(StoreError::UnsupportedVersion {
            found: envelope.version,
            supported: CURRENT_VERSION,
        }),
        Ok(envelope) => Ok(envelope.best),
        Err(envelope_err) => match text.parse::<u32>() {
            Ok(best) => {
                log::info!("Read legacy best score {}", best);
                Ok(best)
            }
            Err(_) => Err(envelope_err.into()),
        },
    }
}
