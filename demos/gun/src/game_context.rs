use std::{
    collections::HashSet,
    fmt::Debug,
    time::{Duration, Instant},
};

use grabkit::{
    contexts::{
        host::{AttachmentData, Color, EntityId, OverlayId, OverlayProperties, OverlayShape},
        Host, InputContext,
    },
    glam::{Quat, Vec2, Vec3},
    GrabResult,
};
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::GunConfig,
    systems::kickback::{clear_pose, Kickback},
    timers::{TimerAction, Timers},
};

const RETICLE_SIZE: f32 = 32.;

pub struct GunContext {
    pub config: GunConfig,
    pub score: u32,
    /// Bullets in flight that haven't hit anything yet
    pub bullets: HashSet<EntityId>,
    /// Targets in the air that haven't been hit yet
    pub targets: HashSet<EntityId>,
    /// Per trigger: pulled past the fire threshold and not yet released
    pub triggers: [bool; 2],
    pub shots_fired: u32,
    pub kickback: Kickback,
    /// Have spatial controllers been seen yet?
    pub seen_controllers: bool,
    pub timers: Timers,
    pub input_context: InputContext,
    pub rng: StdRng,
    pub reticle: OverlayId,
    pub off_button: OverlayId,
    pub score_text: Option<OverlayId>,
}

impl Debug for GunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GunContext")
            .field("score", &self.score)
            .field("bullets", &self.bullets.len())
            .field("targets", &self.targets.len())
            .field("shots_fired", &self.shots_fired)
            .finish()
    }
}

impl GunContext {
    pub fn new<H: Host + ?Sized>(host: &mut H, config: GunConfig, now: Instant) -> GrabResult<Self> {
        Self::with_rng(host, config, now, StdRng::from_entropy())
    }

    /// Set up the gun: attach it to the avatar's hand, draw the reticle and schedule the first
    /// load sound.
    pub fn with_rng<H: Host + ?Sized>(
        host: &mut H,
        config: GunConfig,
        now: Instant,
        rng: StdRng,
    ) -> GrabResult<Self> {
        host.attach(
            AttachmentData {
                model_url: config.gun_model_url.clone(),
                joint_name: config.gun_joint.clone(),
                translation: config.gun_translation,
                rotation: from_pitch_yaw_roll_degrees(config.gun_pitch_yaw_roll),
                scale: config.gun_scale,
                is_soft: false,
            },
            false,
        )?;
        info!("Attached {} to {}", config.gun_model_url, config.gun_joint);

        let screen = host.viewport_dimensions();
        let half_reticle = Vec2::splat(RETICLE_SIZE / 2.);
        let reticle = host.add_overlay(image(
            screen / 2. - half_reticle,
            config.reticle_url.clone(),
        ));
        let off_button = host.add_overlay(image(
            off_button_position(screen),
            config.off_button_url.clone(),
        ));
        let score_text = config.show_score.then(|| {
            host.add_overlay(OverlayProperties {
                shape: OverlayShape::Text {
                    position: screen / 2. - Vec2::new(100., 50.),
                    size: Vec2::new(150., 50.),
                    text: score_label(0),
                },
                color: Color::RED,
                alpha: 1.,
                visible: true,
                anchored_to_avatar: false,
            })
        });

        let mut timers = Timers::default();
        timers.schedule(
            now,
            Duration::from_millis(config.load_sound_delay_ms),
            TimerAction::PlayLoadSound,
        );

        Ok(Self {
            config,
            score: 0,
            bullets: HashSet::new(),
            targets: HashSet::new(),
            triggers: [false; 2],
            shots_fired: 0,
            kickback: Default::default(),
            seen_controllers: false,
            timers,
            input_context: Default::default(),
            rng,
            reticle,
            off_button,
            score_text,
        })
    }

    /// Is `point` (in screen coordinates) on the off button?
    pub fn is_on_off_button<H: Host + ?Sized>(&self, host: &H, point: Vec2) -> bool {
        let corner = off_button_position(host.viewport_dimensions());
        let size = Vec2::splat(RETICLE_SIZE);
        point.cmpge(corner).all() && point.cmplt(corner + size).all()
    }

    /// Take the gun off and put the arm back
    pub fn shutdown<H: Host + ?Sized>(self, host: &mut H) {
        host.delete_overlay(self.reticle);
        host.delete_overlay(self.off_button);
        if let Some(score_text) = self.score_text {
            host.delete_overlay(score_text);
        }
        host.detach_one(&self.config.gun_model_url, &self.config.gun_joint);
        clear_pose(host);
        info!("Gun put away with a score of {}", self.score);
        debug!("{self:?}");
    }
}

fn image(position: Vec2, image_url: String) -> OverlayProperties {
    OverlayProperties {
        shape: OverlayShape::Image {
            position,
            size: Vec2::splat(RETICLE_SIZE),
            image_url,
        },
        color: Color::WHITE,
        alpha: 1.,
        visible: true,
        anchored_to_avatar: false,
    }
}

fn off_button_position(screen: Vec2) -> Vec2 {
    Vec2::new(screen.x - 48., 96.)
}

pub fn score_label(score: u32) -> String {
    format!("Score: {score}")
}

/// Build a rotation from Euler angles in degrees: pitch about X, then yaw about Y, then roll about Z
pub fn from_pitch_yaw_roll_degrees(pitch_yaw_roll: Vec3) -> Quat {
    let Vec3 {
        x: pitch,
        y: yaw,
        z: roll,
    } = pitch_yaw_roll;
    Quat::from_rotation_z(roll.to_radians())
        * Quat::from_rotation_y(yaw.to_radians())
        * Quat::from_rotation_x(pitch.to_radians())
}

/// The direction the camera is looking
pub fn camera_front<H: Host + ?Sized>(host: &H) -> Vec3 {
    host.camera_orientation() * Vec3::NEG_Z
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use grabkit::contexts::{host::Avatar, HeadlessHost};

    pub(crate) fn host_with_skeleton() -> HeadlessHost {
        let mut host = HeadlessHost::new();
        host.camera_position = [0., 1.7, 0.].into();
        host.add_joint("LeftArm", [-0.2, 1.4, 0.].into(), Quat::IDENTITY);
        host.add_joint("LeftForeArm", [-0.3, 1.2, 0.].into(), Quat::IDENTITY);
        host.add_joint("LeftHand", [-0.3, 1., 0.].into(), Quat::IDENTITY);
        host
    }

    pub(crate) fn gun_context(host: &mut HeadlessHost, now: Instant) -> GunContext {
        GunContext::with_rng(host, Default::default(), now, StdRng::seed_from_u64(42)).unwrap()
    }

    #[test]
    fn test_setup_and_shutdown() {
        let mut host = host_with_skeleton();
        let now = Instant::now();
        let context = gun_context(&mut host, now);

        let attachments = host.attachments();
        let gun = &attachments[0];
        assert_eq!(gun.joint_name, "LeftHand");
        assert_relative_eq!(gun.scale, 0.2);
        assert_eq!(host.overlays.len(), 2);
        assert_eq!(
            context.timers.next_due(),
            Some(now + Duration::from_millis(2000))
        );

        // The off button is in the top right corner
        assert!(context.is_on_off_button(&host, Vec2::new(1920. - 40., 100.)));
        assert!(!context.is_on_off_button(&host, Vec2::new(960., 540.)));

        host.set_joint_rotation("LeftArm", Quat::from_rotation_x(1.)).unwrap();
        context.shutdown(&mut host);
        assert!(host.attachments().is_empty());
        assert_eq!(host.overlays.len(), 0);
        assert_eq!(host.joint_rotation("LeftArm"), Some(Quat::IDENTITY));
    }

    #[test]
    fn test_gun_needs_a_hand() {
        let mut host = HeadlessHost::new();
        assert!(GunContext::new(&mut host, Default::default(), Instant::now()).is_err());
    }

    #[test]
    fn test_score_text() {
        let mut host = host_with_skeleton();
        let config = GunConfig {
            show_score: true,
            ..Default::default()
        };
        let context = GunContext::new(&mut host, config, Instant::now()).unwrap();
        assert!(context.score_text.is_some());
        assert_eq!(host.overlays.len(), 3);
    }

    #[test]
    fn test_pitch_yaw_roll() {
        assert_relative_eq!(
            from_pitch_yaw_roll_degrees(Vec3::new(0., 0., 15.)),
            Quat::from_rotation_z(15f32.to_radians())
        );
        assert_relative_eq!(
            from_pitch_yaw_roll_degrees(Vec3::new(0., 90., 0.)) * Vec3::NEG_Z,
            Vec3::NEG_X,
            epsilon = 1e-6
        );
    }
}
