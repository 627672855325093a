use std::fmt;

use serde::{Deserialize, Serialize};

use capturedog_sys as sys;

use crate::CaptureError;

/// A RenderDoc in-app API version known to this crate.
///
/// Two integer encodings are derived from the `(major, minor, patch)` triple:
/// - [`stripped`](Self::stripped): the digits concatenated, e.g. `160` for 1.6.0. This is what
///   [`from_encoded`](Self::from_encoded) accepts.
/// - [`wire`](Self::wire): the zero-padded form `RENDERDOC_GetAPI` expects, e.g. `10600`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum ApiVersion {
    #[serde(rename = "1.0.0")]
    V1_0_0,
    #[serde(rename = "1.0.1")]
    V1_0_1,
    #[serde(rename = "1.0.2")]
    V1_0_2,
    #[serde(rename = "1.1.0")]
    V1_1_0,
    #[serde(rename = "1.1.1")]
    V1_1_1,
    #[serde(rename = "1.1.2")]
    V1_1_2,
    #[serde(rename = "1.2.0")]
    V1_2_0,
    #[serde(rename = "1.3.0")]
    V1_3_0,
    #[serde(rename = "1.4.0")]
    V1_4_0,
    #[serde(rename = "1.4.1")]
    V1_4_1,
    #[serde(rename = "1.4.2")]
    V1_4_2,
    #[serde(rename = "1.5.0")]
    V1_5_0,
    #[serde(rename = "1.6.0")]
    V1_6_0,
}

impl ApiVersion {
    /// Every known version, oldest first.
    pub const ALL: [ApiVersion; 13] = [
        ApiVersion::V1_0_0,
        ApiVersion::V1_0_1,
        ApiVersion::V1_0_2,
        ApiVersion::V1_1_0,
        ApiVersion::V1_1_1,
        ApiVersion::V1_1_2,
        ApiVersion::V1_2_0,
        ApiVersion::V1_3_0,
        ApiVersion::V1_4_0,
        ApiVersion::V1_4_1,
        ApiVersion::V1_4_2,
        ApiVersion::V1_5_0,
        ApiVersion::V1_6_0,
    ];

    /// The newest known version; the default request when a caller does not pick one.
    pub const fn latest() -> Self {
        ApiVersion::V1_6_0
    }

    pub const fn triple(self) -> (u32, u32, u32) {
        match self {
            ApiVersion::V1_0_0 => (1, 0, 0),
            ApiVersion::V1_0_1 => (1, 0, 1),
            ApiVersion::V1_0_2 => (1, 0, 2),
            ApiVersion::V1_1_0 => (1, 1, 0),
            ApiVersion::V1_1_1 => (1, 1, 1),
            ApiVersion::V1_1_2 => (1, 1, 2),
            ApiVersion::V1_2_0 => (1, 2, 0),
            ApiVersion::V1_3_0 => (1, 3, 0),
            ApiVersion::V1_4_0 => (1, 4, 0),
            ApiVersion::V1_4_1 => (1, 4, 1),
            ApiVersion::V1_4_2 => (1, 4, 2),
            ApiVersion::V1_5_0 => (1, 5, 0),
            ApiVersion::V1_6_0 => (1, 6, 0),
        }
    }

    pub const fn major(self) -> u32 {
        self.triple().0
    }

    pub const fn minor(self) -> u32 {
        self.triple().1
    }

    pub const fn patch(self) -> u32 {
        self.triple().2
    }

    /// Ordering key with the digits concatenated (`1.4.2` -> `142`).
    pub const fn stripped(self) -> u32 {
        let (major, minor, patch) = self.triple();
        major * 100 + minor * 10 + patch
    }

    /// Zero-padded encoding used on the wire (`1.4.2` -> `10402`).
    pub const fn wire(self) -> u32 {
        let (major, minor, patch) = self.triple();
        major * 10000 + minor * 100 + patch
    }

    pub fn to_sys(self) -> sys::RENDERDOC_Version {
        sys::RENDERDOC_Version(self.wire())
    }

    /// Resolves a stripped encoding (`160`) to a known version.
    pub fn from_encoded(encoded: i64) -> Result<Self, CaptureError> {
        Self::ALL
            .into_iter()
            .find(|v| i64::from(v.stripped()) == encoded)
            .ok_or_else(|| CaptureError::UnsupportedVersion(encoded.to_string()))
    }

    /// Resolves a zero-padded wire encoding (`10600`) to a known version.
    pub fn from_wire(wire: u32) -> Result<Self, CaptureError> {
        Self::ALL
            .into_iter()
            .find(|v| v.wire() == wire)
            .ok_or_else(|| CaptureError::UnsupportedVersion(wire.to_string()))
    }

    /// Resolves the triple reported by `GetAPIVersion`.
    ///
    /// Matching is exact. Components with more than one digit never match, even when their
    /// concatenation would collide with a known stripped encoding (`1.1.10` is not `1.1.1` + `0`).
    pub fn from_triple(major: i32, minor: i32, patch: i32) -> Result<Self, CaptureError> {
        Self::ALL
            .into_iter()
            .find(|v| {
                let (ma, mi, pa) = v.triple();
                i64::from(ma) == i64::from(major)
                    && i64::from(mi) == i64::from(minor)
                    && i64::from(pa) == i64::from(patch)
            })
            .ok_or_else(|| CaptureError::UnsupportedVersion(format!("{major}.{minor}.{patch}")))
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor, patch) = self.triple();
        write!(f, "{major}.{minor}.{patch}")
    }
}
