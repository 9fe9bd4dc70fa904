use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::GrabResult;

/// Tunable constants for [`crate::GrabTool`].
///
/// Every field has a sensible default, so a configuration file only needs to mention the values it
/// wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Entities that look smaller than this (in degrees) can't be picked
    pub min_angular_size: f32,
    /// Entities that look larger than this (in degrees) can't be picked
    pub max_angular_size: f32,
    /// Ignore `max_angular_size`
    pub allow_large: bool,
    /// Ignore `min_angular_size`
    pub allow_small: bool,
    /// Trigger pressure that starts a grab
    pub grab_threshold: f32,
    /// Trigger pressure below which a held entity is let go
    pub release_threshold: f32,
    /// Two-handed rotations smaller than this (in degrees) are ignored
    pub rotation_epsilon_degrees: f32,
    /// Joints further than this from a released entity are never considered for attachment
    pub attach_search_distance: f32,
    /// Length of the laser drawn from each hand
    pub laser_length: f32,
    /// Width of the laser, in pixels
    pub laser_width: f32,
    /// Size of the guide drawn at the end of the laser
    pub guide_scale: f32,
    /// Make the entity under the laser glow
    pub highlight_hovered: bool,
    /// How much it glows
    pub highlight_glow_level: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            min_angular_size: 2.,
            max_angular_size: 45.,
            allow_large: false,
            allow_small: false,
            grab_threshold: 0.9,
            release_threshold: 0.9,
            rotation_epsilon_degrees: 0.1,
            attach_search_distance: 10.,
            laser_length: 500.,
            laser_width: 4.,
            guide_scale: 0.02,
            highlight_hovered: false,
            highlight_glow_level: 0.25,
        }
    }
}

impl GrabConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> GrabResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> GrabResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
