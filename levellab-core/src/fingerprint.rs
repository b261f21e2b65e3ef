//! Run fingerprinting: deterministic identification of datasets and search
//! configurations.
//!
//! - `DatasetHash`: BLAKE3 over every bar's timestamp and OHLC values.
//! - `ConfigHash`: BLAKE3 over the canonical JSON of a serializable config.
//!
//! Both are hex strings; `short()` gives the 12-char prefix used in
//! artifact directory names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

const SHORT_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn of(bars: &[PriceBar]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for bar in bars {
            hasher.update(bar.timestamp.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn short(&self) -> &str {
        short_prefix(&self.0)
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// Hash of `value`'s canonical JSON. Field order follows the struct
    /// declaration, so equal configs always hash equal.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(value)?;
        Ok(Self::from_bytes(json.as_bytes()))
    }

    pub fn short(&self) -> &str {
        short_prefix(&self.0)
    }
}

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn short_prefix(hex: &str) -> &str {
    hex.get(..SHORT_LEN).unwrap_or(hex)
}
