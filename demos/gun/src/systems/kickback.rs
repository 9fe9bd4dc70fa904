use grabkit::{
    contexts::Host,
    glam::{Quat, Vec3},
};
use log::{debug, info};

use crate::{
    config::GunConfig,
    game_context::{camera_front, GunContext},
};

pub const LEFT_ARM: &str = "LeftArm";
pub const LEFT_FORE_ARM: &str = "LeftForeArm";
pub const LEFT_HAND: &str = "LeftHand";

/// Arm pose for holding the gun up without controllers, as (x, y, z, w) local rotations
const FIRING_POSE: [(&str, [f32; 4]); 3] = [
    (LEFT_FORE_ARM, [-0.251919, -0.0415449, 0.499487, 0.827843]),
    (LEFT_ARM, [0.470196, -0.132559, 0.494033, 0.719219]),
    (LEFT_HAND, [-0.0104815, -0.110551, -0.352111, 0.929333]),
];

/// How far the forearm is still kicked up after a shot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kickback {
    /// Degrees of roll left to recover
    pub angle: f32,
    /// The forearm's rotation before the shot
    pub rotation_before: Option<Quat>,
}

fn roll(degrees: f32) -> Quat {
    Quat::from_rotation_z(degrees.to_radians())
}

/// Kick the forearm up after a shot
pub fn start_kickback<H: Host + ?Sized>(context: &mut GunContext, host: &mut H) {
    let before = match host.joint_rotation(LEFT_FORE_ARM) {
        Some(rotation) => rotation,
        None => {
            debug!("No {LEFT_FORE_ARM} to kick back");
            return;
        }
    };

    let angle = context.config.kickback_angle;
    if let Err(e) = host.set_joint_rotation(LEFT_FORE_ARM, before * roll(angle)) {
        debug!("Unable to kick back: {e}");
        return;
    }
    context.kickback = Kickback {
        angle,
        rotation_before: Some(before),
    };
}

/// Kickback system
/// Eases the forearm back down after a shot. Once it's close enough it snaps back to where it was.
pub fn kickback_system<H: Host + ?Sized>(context: &mut GunContext, host: &mut H) {
    // The first time controllers show up, let them drive the arm
    if !context.seen_controllers && host.controllers_connected() {
        context.seen_controllers = true;
        clear_pose(host);
    }

    let kickback = &mut context.kickback;
    if kickback.angle <= 0. {
        return;
    }

    if kickback.angle > context.config.kickback_settle {
        let step = kickback.angle * context.config.kickback_decay;
        kickback.angle -= step;
        if let Some(rotation) = host.joint_rotation(LEFT_FORE_ARM) {
            if let Err(e) = host.set_joint_rotation(LEFT_FORE_ARM, rotation * roll(-step)) {
                debug!("Unable to ease kickback: {e}");
            }
        }
        return;
    }

    if let Some(before) = kickback.rotation_before.take() {
        if let Err(e) = host.set_joint_rotation(LEFT_FORE_ARM, before) {
            debug!("Unable to restore {LEFT_FORE_ARM}: {e}");
        }
    }
    if host.controllers_connected() {
        clear_pose(host);
    }
    kickback.angle = 0.;
}

/// Remove every joint override this demo sets
pub fn clear_pose<H: Host + ?Sized>(host: &mut H) {
    for joint in [LEFT_FORE_ARM, LEFT_ARM, LEFT_HAND] {
        host.clear_joint_rotation(joint);
    }
}

/// Raise the arm into the firing pose. Controllers drive the arm when they're present, so this
/// only poses it without them.
pub fn take_firing_pose<H: Host + ?Sized>(host: &mut H) {
    clear_pose(host);
    if host.controllers_connected() {
        return;
    }

    for (joint, [x, y, z, w]) in FIRING_POSE {
        if let Err(e) = host.set_joint_rotation(joint, Quat::from_xyzw(x, y, z, w).normalize()) {
            debug!("Unable to pose {joint}: {e}");
        }
    }
}

/// Play the load sound just in front of the camera and raise the arm
pub fn play_load_sound<H: Host + ?Sized>(config: &GunConfig, host: &mut H) {
    let position: Vec3 = host.camera_position() + camera_front(&*host);
    host.play_sound(&config.load_sound, position, config.volume);
    info!("Locked and loaded");
    take_firing_pose(host);
}

/// Log the arm's current pose
pub fn log_pose<H: Host + ?Sized>(host: &H) {
    for joint in [LEFT_ARM, LEFT_FORE_ARM, LEFT_HAND] {
        info!("{joint} = {:?}", host.joint_rotation(joint));
    }
}
