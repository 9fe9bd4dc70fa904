use grabkit::{
    components::Handedness,
    contexts::host::{Color, EntityId, EntityKind, EntityProperties},
    contexts::Host,
    glam::Vec3,
    util::normalize_or,
};
use log::{debug, info};

use crate::{
    config::GunConfig,
    game_context::{camera_front, GunContext},
    systems::kickback::start_kickback,
};

/// Move one trigger's latch forward. Returns the new latch state and whether the gun fires.
///
/// A pulled trigger has to drop below the re-arm threshold before it can fire again.
pub fn next_latch(pulled: bool, value: f32, config: &GunConfig) -> (bool, bool) {
    if pulled {
        (value >= config.rearm_threshold, false)
    } else if value > config.fire_threshold {
        (true, true)
    } else {
        (false, false)
    }
}

/// Triggers system
/// Fires a bullet from a hand each time its trigger is squeezed past the fire threshold.
pub fn triggers_system<H: Host + ?Sized>(context: &mut GunContext, host: &mut H) {
    for (i, handedness) in [Handedness::Left, Handedness::Right].into_iter().enumerate() {
        let input = context.input_context.hand(handedness);
        let (palm, tip) = (input.palm_position(), input.tip_position());
        let (pulled, fire) = next_latch(context.triggers[i], input.trigger_analog(), &context.config);
        context.triggers[i] = pulled;
        if !fire {
            continue;
        }

        debug!("{handedness:?} trigger pulled");
        let position = tip + (tip - palm) / 2.;
        let velocity = normalize_or(tip - palm, Vec3::NEG_Z) * context.config.bullet_speed;
        shoot_bullet(context, host, position, velocity);
    }
}

/// Fire a bullet from just in front of the camera, straight ahead
pub fn fire_from_camera<H: Host + ?Sized>(context: &mut GunContext, host: &mut H) -> EntityId {
    let front = camera_front(&*host);
    let position = host.camera_position() + front * context.config.mouse_fire_distance;
    let velocity = front * context.config.bullet_speed;
    shoot_bullet(context, host, position, velocity)
}

/// Spawn a bullet and make some noise about it
pub fn shoot_bullet<H: Host + ?Sized>(
    context: &mut GunContext,
    host: &mut H,
    position: Vec3,
    velocity: Vec3,
) -> EntityId {
    let config = &context.config;
    let bullet = host.add_entity(EntityProperties {
        kind: EntityKind::Sphere,
        position,
        dimensions: Vec3::splat(config.bullet_size),
        velocity,
        gravity: Vec3::new(0., config.bullet_gravity, 0.),
        color: Color::RED,
        lifetime: Some(config.bullet_lifetime),
        collisions_will_move: true,
        ..Default::default()
    });
    host.play_sound(&config.fire_sound, position, config.volume);

    context.bullets.insert(bullet);
    context.shots_fired += 1;
    if config.reload_interval > 0 && context.shots_fired % config.reload_interval == 0 {
        host.play_sound(&config.load_sound, position, config.volume);
        info!("Reloading after {} shots", context.shots_fired);
    }

    start_kickback(context, host);
    bullet
}
