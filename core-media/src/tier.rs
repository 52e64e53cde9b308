//! Quality tiers a media item can be served at.

use crate::error::MediaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KB: u64 = 1024;

/// One of four increasing fidelity levels.
///
/// The derived `Ord` follows declaration order, which is also the order the
/// progressive loader walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Grid cell (~10KB)
    Thumbnail,
    /// List/card view (~30KB)
    Preview,
    /// Full-screen on small displays (~200KB)
    Medium,
    /// Original upload (~2000KB)
    Full,
}

impl QualityTier {
    /// All tiers in ascending order.
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Thumbnail,
        QualityTier::Preview,
        QualityTier::Medium,
        QualityTier::Full,
    ];

    /// Fixed size estimate used for cache budget accounting.
    ///
    /// These are accounting constants, not measurements of the real payload.
    pub fn nominal_size_bytes(&self) -> u64 {
        match self {
            QualityTier::Thumbnail => 10 * KB,
            QualityTier::Preview => 30 * KB,
            QualityTier::Medium => 200 * KB,
            QualityTier::Full => 2000 * KB,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Thumbnail => "thumbnail",
            QualityTier::Preview => "preview",
            QualityTier::Medium => "medium",
            QualityTier::Full => "full",
        }
    }

    /// The next higher tier, if any.
    pub fn next(&self) -> Option<QualityTier> {
        match self {
            QualityTier::Thumbnail => Some(QualityTier::Preview),
            QualityTier::Preview => Some(QualityTier::Medium),
            QualityTier::Medium => Some(QualityTier::Full),
            QualityTier::Full => None,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thumbnail" => Ok(QualityTier::Thumbnail),
            "preview" => Ok(QualityTier::Preview),
            "medium" => Ok(QualityTier::Medium),
            "full" => Ok(QualityTier::Full),
            other => Err(MediaError::InvalidTier(other.to_string())),
        }
    }
}
