//! Host configuration.

use serde::Deserialize;

use crate::sync::room::ROOM_CODE_LEN;

/// Settings for a hosting peer. Every field has a default, so an empty
/// JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Fixed die seed for reproducible games. Random when unset.
    pub dice_seed: Option<u64>,

    /// Length of issued room codes
    pub room_code_len: usize,

    /// Re-broadcast each guest frame to the other guests
    pub relay_guest_frames: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            dice_seed: None,
            room_code_len: ROOM_CODE_LEN,
            relay_guest_frames: true,
        }
    }
}

impl HostConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.dice_seed = Some(seed);
        self
    }
}
