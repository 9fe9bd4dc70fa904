use std::time::{Duration, Instant};

use grabkit::contexts::{
    host::{Color, EntityEdit, EntityId, OverlayEdit},
    Host,
};
use log::{debug, info};

use crate::{
    game_context::{camera_front, score_label, GunContext},
    timers::TimerAction,
};

/// Collisions system
/// Scores a hit whenever a live bullet touches a live target. Both turn white and are deleted a
/// little later, so there's time to see them bounce. Bullets and targets that have expired or been
/// deleted since the last tick are forgotten first.
pub fn collisions_system<H: Host + ?Sized>(
    context: &mut GunContext,
    host: &mut H,
    contacts: &[(EntityId, EntityId)],
    now: Instant,
) {
    context
        .bullets
        .retain(|bullet| host.entity_properties(*bullet).is_some());
    context
        .targets
        .retain(|target| host.entity_properties(*target).is_some());

    for &(a, b) in contacts {
        let hit = if context.bullets.contains(&a) && context.targets.contains(&b) {
            (a, b)
        } else if context.bullets.contains(&b) && context.targets.contains(&a) {
            (b, a)
        } else {
            continue;
        };
        score_hit(context, host, hit.0, hit.1, now);
    }
}

fn score_hit<H: Host + ?Sized>(
    context: &mut GunContext,
    host: &mut H,
    bullet: EntityId,
    target: EntityId,
    now: Instant,
) {
    context.score += 1;
    context.bullets.remove(&bullet);
    context.targets.remove(&target);
    info!("Hit! Score is now {}", context.score);

    if let Some(score_text) = context.score_text {
        let edit = OverlayEdit {
            text: Some(score_label(context.score)),
            ..Default::default()
        };
        if let Err(e) = host.edit_overlay(score_text, &edit) {
            debug!("Unable to update score: {e}");
        }
    }

    let white = EntityEdit {
        color: Some(Color::WHITE),
        ..Default::default()
    };
    for entity in [bullet, target] {
        if let Err(e) = host.edit_entity(entity, &white) {
            debug!("Unable to recolour {entity:?}: {e}");
        }
    }

    let position = host.camera_position() + camera_front(&*host);
    host.play_sound(&context.config.hit_sound, position, context.config.volume);

    context.timers.schedule(
        now,
        Duration::from_millis(context.config.hit_delete_delay_ms),
        TimerAction::DeleteHit { bullet, target },
    );
}

/// Delete a bullet and target that were hit earlier, if they're still around
pub fn delete_hit<H: Host + ?Sized>(host: &mut H, bullet: EntityId, target: EntityId) {
    for entity in [bullet, target] {
        let entity = match host.resolve(entity) {
            Some(entity) => entity,
            None => {
                debug!("{entity:?} is already gone");
                continue;
            }
        };
        if let Err(e) = host.delete_entity(entity) {
            debug!("Unable to delete {entity:?}: {e}");
        }
    }
}
