use std::time::{Duration, Instant};

use grabkit::{
    components::Handedness,
    contexts::{
        host::{HandInput, Scene},
        HeadlessHost,
    },
    glam::{Quat, Vec3},
};
use grabkit_gun::{on_key_press, tick, GunConfig, GunContext};
use log::info;

const FRAME_TIME: f32 = 1. / 60.;
const MAX_FRAMES: u32 = 60 * 20;

/// Plays a scripted round against a headless host: throw a target, aim the left hand at it and
/// keep squeezing until it's hit.
fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => GunConfig::from_path(path)?,
        None => GunConfig::default(),
    };

    let mut host = HeadlessHost::new();
    host.camera_position = [0., 1.7, 0.].into();
    host.add_joint("LeftArm", [-0.2, 1.4, 0.].into(), Quat::IDENTITY);
    host.add_joint("LeftForeArm", [-0.3, 1.2, 0.].into(), Quat::IDENTITY);
    host.add_joint("LeftHand", [-0.3, 1., 0.].into(), Quat::IDENTITY);

    let start = Instant::now();
    let mut context = GunContext::new(&mut host, config, start)?;
    on_key_press(&mut context, &mut host, 't', start);

    let palm = Vec3::new(-0.3, 1.2, -0.3);
    let mut contacts = Vec::new();
    for frame in 0..MAX_FRAMES {
        let now = start + Duration::from_secs_f32(frame as f32 * FRAME_TIME);

        // Squeeze for half a second, then let go for half a second
        let squeezing = (frame / 30) % 2 == 0;
        let target = context
            .targets
            .iter()
            .find_map(|target| host.entity_properties(*target));
        let aim = target
            .as_ref()
            .map(|target| (target.position - palm).normalize_or_zero())
            .unwrap_or(Vec3::NEG_Z);
        host.set_hand(
            Handedness::Left,
            HandInput {
                palm_position: palm,
                tip_position: palm + aim * 0.1,
                trigger_value: if squeezing && target.is_some() { 1. } else { 0. },
                ..Default::default()
            },
        );

        tick(&mut context, &mut host, &contacts, now);
        if context.score > 0 {
            info!("Hit after {:.2}s", frame as f32 * FRAME_TIME);
            break;
        }
        contacts = host.step(FRAME_TIME);
    }

    info!("Final score: {} from {} shots", context.score, context.shots_fired);
    context.shutdown(&mut host);

    Ok(())
}
