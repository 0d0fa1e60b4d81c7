//! Wire codec configuration.
//!
//! Provides [`ProtocolConfig`], shared by the encoder and decoder. The frame
//! size limit bounds both what the encoder will emit and what the decoder
//! will accept from a server, so memory use stays bounded even against a
//! hostile peer.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::frame::DEFAULT_MAX_FRAME_SIZE;

/// Codec configuration.
///
/// All fields have sensible defaults. Configuration can be loaded from
/// environment variables via [`ProtocolConfig::from_env`].
///
/// # Examples
///
/// ```
/// use duodb_proto::config::ProtocolConfig;
///
/// let config = ProtocolConfig::default();
/// assert_eq!(config.max_frame_size, 16 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolConfig {
    /// Upper bound on a frame's declared length (type tag plus payload, in
    /// bytes). The encoder refuses to emit a larger frame; the decoder
    /// rejects a larger declared length before buffering any payload.
    #[builder(default = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DUODB_MAX_FRAME_SIZE` | `16777216` |
    ///
    /// # Examples
    ///
    /// ```
    /// use duodb_proto::config::ProtocolConfig;
    ///
    /// let config = ProtocolConfig::from_env();
    /// assert!(config.max_frame_size >= 1);
    /// ```
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("DUODB_MAX_FRAME_SIZE") {
            if let Ok(n) = v.parse::<u32>() {
                config.max_frame_size = n;
            }
        }

        config
    }
}
