use std::time::{Duration, Instant};

use grabkit::{
    contexts::host::{Color, EntityId, EntityKind, EntityProperties},
    contexts::Host,
    glam::{Quat, Vec3},
};
use log::{debug, info};
use rand::Rng;

use crate::{game_context::GunContext, timers::TimerAction};

const TARGET_COLOR: Color = Color::new(0, 200, 200);

/// Queue a target launch after a random delay
pub fn schedule_target(context: &mut GunContext, now: Instant) -> Duration {
    let config = &context.config;
    let millis =
        config.min_thrower_delay_ms + context.rng.gen::<f32>() * config.max_thrower_delay_ms;
    let delay = Duration::from_secs_f32(millis.max(0.) / 1000.);
    context.timers.schedule(now, delay, TimerAction::LaunchTarget);
    debug!("Target launching in {delay:?}");
    delay
}

/// Launch button system
/// Pressing the left hand's primary button queues a target launch.
pub fn launch_button_system(context: &mut GunContext, now: Instant) {
    if context.input_context.left.primary_button_just_pressed() {
        schedule_target(context, now);
    }
}

/// Throw a target up and away from the camera, somewhere within the launch cone
pub fn launch_target<H: Host + ?Sized>(context: &mut GunContext, host: &mut H) -> EntityId {
    let config = &context.config;
    let cone = config.launch_cone_degrees.abs();
    let angle = context.rng.gen_range(-cone..=cone);
    let direction =
        host.camera_orientation() * Quat::from_rotation_y(angle.to_radians()) * Vec3::NEG_Z;
    let position = host.camera_position() + direction * config.launch_distance;
    let velocity = direction * config.target_forward_velocity + Vec3::Y * config.target_up_velocity;

    let target = host.add_entity(EntityProperties {
        kind: EntityKind::Box,
        position,
        dimensions: Vec3::splat(config.target_size),
        velocity,
        gravity: Vec3::new(0., config.target_gravity, 0.),
        damping: config.target_damping,
        color: TARGET_COLOR,
        lifetime: Some(config.target_lifetime),
        collisions_will_move: true,
        ..Default::default()
    });
    host.play_sound(&config.launch_sound, position, config.volume);
    info!("Launched target {target:?} at {angle:.1} degrees");

    context.targets.insert(target);
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_context::tests::{gun_context, host_with_skeleton};
    use approx::assert_relative_eq;
    use grabkit::{components::Handedness, contexts::host::Scene};

    #[test]
    fn test_targets_launch_within_the_cone() {
        let mut host = host_with_skeleton();
        let mut context = gun_context(&mut host, Instant::now());
        let camera = host.camera_position;

        for _ in 0..20 {
            let target = launch_target(&mut context, &mut host);
            assert!(context.targets.contains(&target));

            let properties = host.entity_properties(target).unwrap();
            let offset = properties.position - camera;
            assert_relative_eq!(offset.length(), 3., epsilon = 1e-4);
            assert_relative_eq!(offset.y, 0., epsilon = 1e-5);
            let angle = offset.angle_between(Vec3::NEG_Z).to_degrees();
            assert!(angle <= 20. + 1e-3, "{angle} is outside the cone");

            assert_relative_eq!(properties.velocity.y, 0.5, epsilon = 1e-5);
            assert_eq!(properties.color, TARGET_COLOR);
            assert_eq!(properties.kind, EntityKind::Box);
        }
        assert_eq!(host.sounds.len(), 20);
        assert_eq!(context.targets.len(), 20);
    }

    #[test]
    fn test_target_delay() {
        let mut host = host_with_skeleton();
        let now = Instant::now();
        let mut context = gun_context(&mut host, now);
        let before = context.timers.len();

        let delay = schedule_target(&mut context, now);
        assert!(delay >= Duration::from_millis(1000));
        assert!(delay <= Duration::from_millis(2000));
        assert_eq!(context.timers.len(), before + 1);
    }

    #[test]
    fn test_launch_button_edge() {
        let mut host = host_with_skeleton();
        let now = Instant::now();
        let mut context = gun_context(&mut host, now);
        let before = context.timers.len();

        host.hand_mut(Handedness::Left).primary_button = true;
        for _ in 0..3 {
            context.input_context.update(&host);
            launch_button_system(&mut context, now);
        }
        assert_eq!(context.timers.len(), before + 1);

        host.hand_mut(Handedness::Left).primary_button = false;
        context.input_context.update(&host);
        launch_button_system(&mut context, now);
        host.hand_mut(Handedness::Left).primary_button = true;
        context.input_context.update(&host);
        launch_button_system(&mut context, now);
        assert_eq!(context.timers.len(), before + 2);
    }
}
