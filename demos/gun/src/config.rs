use std::path::Path;

use grabkit::{glam::Vec3, GrabResult};
use serde::{Deserialize, Serialize};

const PUBLIC_BUCKET: &str = "http://s3.amazonaws.com/hifi-public/";

/// Everything about the gun that can be tuned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GunConfig {
    pub bullet_speed: f32,
    pub bullet_size: f32,
    /// Seconds before the host cleans up a bullet
    pub bullet_lifetime: f32,
    pub bullet_gravity: f32,
    /// Trigger pressure that fires
    pub fire_threshold: f32,
    /// Trigger pressure the trigger has to drop below before it can fire again
    pub rearm_threshold: f32,
    /// Every this many shots, play the reload sound too
    pub reload_interval: u32,

    /// Degrees of roll added to the forearm by each shot
    pub kickback_angle: f32,
    /// Fraction of the remaining kickback removed each tick
    pub kickback_decay: f32,
    /// Below this many degrees the arm snaps back
    pub kickback_settle: f32,

    pub target_size: f32,
    pub target_gravity: f32,
    pub target_lifetime: f32,
    pub target_up_velocity: f32,
    pub target_forward_velocity: f32,
    pub target_damping: f32,
    /// How far in front of the camera targets are launched from
    pub launch_distance: f32,
    /// Targets are launched up to this many degrees either side of straight ahead
    pub launch_cone_degrees: f32,
    pub min_thrower_delay_ms: f32,
    pub max_thrower_delay_ms: f32,

    /// How long hit bullets and targets hang around before being deleted
    pub hit_delete_delay_ms: u64,
    /// How far in front of the camera mouse shots start
    pub mouse_fire_distance: f32,
    pub load_sound_delay_ms: u64,
    pub volume: f32,

    pub fire_sound: String,
    pub load_sound: String,
    pub hit_sound: String,
    pub launch_sound: String,

    pub gun_model_url: String,
    pub gun_joint: String,
    pub gun_translation: Vec3,
    /// Pitch, yaw and roll in degrees
    pub gun_pitch_yaw_roll: Vec3,
    pub gun_scale: f32,

    pub reticle_url: String,
    pub off_button_url: String,
    pub show_score: bool,
}

impl Default for GunConfig {
    fn default() -> Self {
        Self {
            bullet_speed: 20.,
            bullet_size: 0.07,
            bullet_lifetime: 10.,
            bullet_gravity: -0.02,
            fire_threshold: 0.5,
            rearm_threshold: 0.1,
            reload_interval: 5,
            kickback_angle: 15.,
            kickback_decay: 0.125,
            kickback_settle: 0.5,
            target_size: 0.5,
            target_gravity: -0.25,
            target_lifetime: 300.,
            target_up_velocity: 0.5,
            target_forward_velocity: 1.,
            target_damping: 0.0001,
            launch_distance: 3.,
            launch_cone_degrees: 20.,
            min_thrower_delay_ms: 1000.,
            max_thrower_delay_ms: 1000.,
            hit_delete_delay_ms: 500,
            mouse_fire_distance: 2.,
            load_sound_delay_ms: 2000,
            volume: 0.9,
            fire_sound: format!("{PUBLIC_BUCKET}sounds/Guns/GUN-SHOT2.raw"),
            load_sound: format!("{PUBLIC_BUCKET}sounds/Guns/Gun_Reload_Weapon22.raw"),
            hit_sound: format!("{PUBLIC_BUCKET}sounds/Space%20Invaders/hit.raw"),
            launch_sound: format!("{PUBLIC_BUCKET}sounds/Space%20Invaders/shoot.raw"),
            gun_model_url: "http://public.highfidelity.io/models/attachments/HaloGun.fst".into(),
            gun_joint: "LeftHand".into(),
            gun_translation: Vec3::new(-0.02, -0.14, 0.07),
            gun_pitch_yaw_roll: Vec3::new(-70., -151., 72.),
            gun_scale: 0.2,
            reticle_url: format!("{PUBLIC_BUCKET}images/reticle.png"),
            off_button_url: format!("{PUBLIC_BUCKET}images/close.png"),
            show_score: false,
        }
    }
}

impl GunConfig {
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

#[cfg(test)]
mod tests {
    use super::*;
    use grabkit::GrabError;

    #[test]
    fn test_partial_config() {
        let config = GunConfig::from_json(r#"{ "bullet_speed": 40.0, "show_score": true }"#).unwrap();
        assert_eq!(config.bullet_speed, 40.);
        assert!(config.show_score);
        assert_eq!(config.reload_interval, 5);
        assert_eq!(config.gun_joint, "LeftHand");
    }

    #[test]
    fn test_bad_config() {
        assert!(matches!(
            GunConfig::from_json("{ \"bullet_speed\": \"fast\" }"),
            Err(GrabError::InvalidConfig(_))
        ));
        assert!(matches!(
            GunConfig::from_path("/definitely/not/here.json"),
            Err(GrabError::IO(_))
        ));
    }
}
