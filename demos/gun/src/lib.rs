//! A toy gun for the left hand. Squeeze a trigger to fire, press the launch button (or `t`) to
//! throw a target, and score a point for every target you hit.

pub mod config;
pub mod game_context;
pub mod systems;
pub mod timers;

use std::time::Instant;

use grabkit::{
    contexts::{host::EntityId, Host},
    glam::Vec2,
};
use log::{debug, info};

pub use config::GunConfig;
pub use game_context::GunContext;
use systems::{
    collisions_system, delete_hit, fire_from_camera, kickback::log_pose, kickback_system,
    launch_button_system, launch_target, play_load_sound, schedule_target, triggers_system,
};
use timers::TimerAction;

/// Run one tick of the game. `contacts` are the pairs of entities that started touching since the
/// last tick.
pub fn tick<H: Host + ?Sized>(
    context: &mut GunContext,
    host: &mut H,
    contacts: &[(EntityId, EntityId)],
    now: Instant,
) {
    context.input_context.update(&*host);
    kickback_system(context, host);

    if context.input_context.connected() {
        launch_button_system(context, now);
        triggers_system(context, host);
    }

    collisions_system(context, host, contacts, now);

    for action in context.timers.take_due(now) {
        match action {
            TimerAction::LaunchTarget => {
                launch_target(context, host);
            }
            TimerAction::PlayLoadSound => play_load_sound(&context.config, host),
            TimerAction::DeleteHit { bullet, target } => delete_hit(host, bullet, target),
        }
    }
}

/// Handle a key press
pub fn on_key_press<H: Host + ?Sized>(
    context: &mut GunContext,
    host: &mut H,
    key: char,
    now: Instant,
) {
    match key {
        't' => {
            schedule_target(context, now);
        }
        '.' => {
            fire_from_camera(context, host);
        }
        'r' => play_load_sound(&context.config, host),
        's' => log_pose(&*host),
        _ => debug!("Ignoring key {key:?}"),
    }
}

/// Handle a mouse press at `point`, in screen coordinates.
///
/// Returns `false` if the press was on the off button, in which case the game should be shut down.
pub fn on_mouse_press<H: Host + ?Sized>(
    context: &mut GunContext,
    host: &mut H,
    point: Vec2,
) -> bool {
    if context.is_on_off_button(&*host, point) {
        info!("Off button pressed");
        return false;
    }

    fire_from_camera(context, host);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_context::tests::{gun_context, host_with_skeleton};
    use grabkit::{
        contexts::host::{Avatar, EntityEdit, Scene},
        glam::{Quat, Vec3},
    };
    use std::time::Duration;

    #[test]
    fn test_keyboard_session() {
        let mut host = host_with_skeleton();
        host.controllers_connected = false;
        let start = Instant::now();
        let mut context = gun_context(&mut host, start);

        // The load sound plays by itself after a couple of seconds
        tick(&mut context, &mut host, &[], start);
        assert!(host.sounds.is_empty());
        let later = start + Duration::from_millis(2000);
        tick(&mut context, &mut host, &[], later);
        assert_eq!(host.sound_names(), vec![context.config.load_sound.as_str()]);
        assert_ne!(host.joint_rotation("LeftArm"), Some(Quat::IDENTITY));

        on_key_press(&mut context, &mut host, 't', later);
        tick(&mut context, &mut host, &[], later + Duration::from_millis(999));
        assert!(context.targets.is_empty());
        tick(&mut context, &mut host, &[], later + Duration::from_millis(2000));
        let target = *context.targets.iter().next().unwrap();

        // Bring the target right in front of the camera, then shoot it
        let in_front = EntityEdit {
            position: Some(host.camera_position + Vec3::new(0., 0., -2.5)),
            ..Default::default()
        };
        host.edit_entity(target, &in_front).unwrap();

        on_key_press(&mut context, &mut host, '.', later);
        let bullet = *context.bullets.iter().next().unwrap();
        let now = later + Duration::from_millis(2100);
        for _ in 0..10 {
            let contacts = host.step(1. / 60.);
            tick(&mut context, &mut host, &contacts, now);
            if context.score > 0 {
                break;
            }
        }
        assert_eq!(context.score, 1);
        assert!(context.bullets.is_empty());

        tick(&mut context, &mut host, &[], now + Duration::from_millis(500));
        assert!(host.entity_properties(bullet).is_none());
        assert!(host.entity_properties(target).is_none());
    }

    #[test]
    fn test_off_button() {
        let mut host = host_with_skeleton();
        let mut context = gun_context(&mut host, Instant::now());

        assert!(on_mouse_press(&mut context, &mut host, Vec2::new(960., 540.)));
        assert_eq!(context.bullets.len(), 1);
        assert!(!on_mouse_press(&mut context, &mut host, Vec2::new(1880., 100.)));
        assert_eq!(context.shots_fired, 1);
    }
}
