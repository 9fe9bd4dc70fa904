use glam::{Quat, Vec3};
use log::{debug, trace};

use crate::{
    components::{GrabMode, Hand},
    config::GrabConfig,
    contexts::{
        host::{EntityEdit, EntityId},
        Host,
    },
};

/// Two hands closer together than this don't define a direction or a scale
const MIN_HAND_SEPARATION: f32 = 1e-6;

/// Two hand system
/// When both hands are holding the same entity, they work together instead of fighting over it:
/// in [`GrabMode::Direct`] pulling the hands apart scales the entity, and in
/// [`GrabMode::Projected`] turning the pair rotates it.
///
/// Returns `true` if both hands are holding the same entity, in which case the one-handed moves
/// must be skipped this tick.
pub fn two_hand_system<H: Host + ?Sized>(
    hands: &mut [Hand; 2],
    mode: GrabMode,
    config: &GrabConfig,
    host: &mut H,
) -> bool {
    let entity = match (hands[0].grabbed_entity(), hands[1].grabbed_entity()) {
        (Some(left), Some(right)) if left == right => left,
        _ => return false,
    };

    let entity = match host.resolve(entity) {
        Some(entity) => entity,
        None => {
            debug!("Entity {entity:?} held in both hands is not known yet");
            return true;
        }
    };

    match mode {
        GrabMode::Direct => scale(hands, host, entity),
        GrabMode::Projected => rotate(hands, config, host, entity),
    }

    true
}

fn scale<H: Host + ?Sized>(hands: &mut [Hand; 2], host: &mut H, entity: EntityId) {
    let [left, right] = hands;
    let (left_session, right_session) = match (left.session(), right.session()) {
        (Some(l), Some(r)) => (l, r),
        _ => return,
    };

    let left_then = left.previous_pose.aim_point(left_session.aim_offset.forward);
    let right_then = right.previous_pose.aim_point(right_session.aim_offset.forward);
    let left_now = left.pose.aim_point(left_session.aim_offset.forward);
    let right_now = right.pose.aim_point(right_session.aim_offset.forward);

    let distance_then = left_then.distance(right_then);
    let ratio = if distance_then < MIN_HAND_SEPARATION {
        1.
    } else {
        left_now.distance(right_now) / distance_then
    };

    let middle_then = left_then.lerp(right_then, 0.5);
    let middle_now = left_now.lerp(right_now, 0.5);
    let position = middle_now + (left_session.position - middle_then) * ratio;
    let dimensions = left_session.dimensions * ratio;
    let half_diagonal = left_session.half_diagonal * ratio;

    let edit = EntityEdit {
        position: Some(position),
        dimensions: Some(dimensions),
        ..Default::default()
    };
    if let Err(e) = host.edit_entity(entity, &edit) {
        debug!("Unable to scale {entity:?}: {e}");
        return;
    }
    trace!("Scaled {entity:?} by {ratio}");

    for hand in [left, right] {
        if let Some(session) = hand.session_mut() {
            session.position = position;
            session.dimensions = dimensions;
            session.half_diagonal = half_diagonal;
        }
    }
}

fn rotate<H: Host + ?Sized>(
    hands: &mut [Hand; 2],
    config: &GrabConfig,
    host: &mut H,
    entity: EntityId,
) {
    let [left, right] = hands;
    let (mut position, mut rotation) = match left.session() {
        Some(session) => (session.position, session.rotation),
        None => return,
    };

    if let Some(delta) = palm_turn(left, right, config) {
        let middle_then = left.previous_pose.palm.lerp(right.previous_pose.palm, 0.5);
        let middle_now = left.pose.palm.lerp(right.pose.palm, 0.5);
        let turned_position: Vec3 = middle_now + delta * (position - middle_then);
        let turned_rotation = (delta * rotation).normalize();

        let edit = EntityEdit {
            position: Some(turned_position),
            rotation: Some(turned_rotation),
            ..Default::default()
        };
        match host.edit_entity(entity, &edit) {
            Ok(()) => {
                trace!(
                    "Rotated {entity:?} by {} degrees",
                    delta.angle_between(Quat::IDENTITY).to_degrees()
                );
                position = turned_position;
                rotation = turned_rotation;
            }
            Err(e) => debug!("Unable to rotate {entity:?}: {e}"),
        }
    }

    // Every tick, turned or not, so letting go with one hand continues from here
    for hand in [left, right] {
        let (palm, hand_rotation) = (hand.pose.palm, hand.pose.rotation);
        if let Some(session) = hand.session_mut() {
            session.position = position;
            session.rotation = rotation;
            session.hand_position_at_grab = palm;
            session.hand_rotation_at_grab = hand_rotation;
            session.model_position_at_grab = position;
            session.model_rotation_at_grab = rotation;
        }
    }
}

/// How far the line between the palms turned since last tick, or `None` if it didn't turn enough
/// to count
fn palm_turn(left: &Hand, right: &Hand, config: &GrabConfig) -> Option<Quat> {
    let then = right.previous_pose.palm - left.previous_pose.palm;
    let now = right.pose.palm - left.pose.palm;
    if then.length() < MIN_HAND_SEPARATION || now.length() < MIN_HAND_SEPARATION {
        return None;
    }
    let (then, now) = (then.normalize(), now.normalize());

    let angle = then.dot(now).clamp(-1., 1.).acos();
    if angle.to_degrees() < config.rotation_epsilon_degrees {
        return None;
    }

    // Hands swapped sides through each other: there's no well defined axis
    let axis = then.cross(now);
    if axis.length() < MIN_HAND_SEPARATION {
        return None;
    }

    Some(Quat::from_axis_angle(axis.normalize(), angle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::{hand::AimOffset, GrabSession, GrabState, HandPose},
        contexts::{
            host::{EntityProperties, Scene},
            HeadlessHost,
        },
    };
    use approx::assert_relative_eq;

    fn hold(hand: &mut Hand, entity: EntityId, properties: &EntityProperties, forward: f32) {
        hand.state = GrabState::Grabbing(GrabSession {
            entity,
            model_url: None,
            position: properties.position,
            rotation: properties.rotation,
            dimensions: properties.dimensions,
            half_diagonal: properties.half_diagonal(),
            hand_position_at_grab: hand.pose.palm,
            hand_rotation_at_grab: hand.pose.rotation,
            model_position_at_grab: properties.position,
            model_rotation_at_grab: properties.rotation,
            aim_offset: AimOffset {
                forward,
                ..Default::default()
            },
            joints_intersecting_from_start: vec![],
        });
    }

    fn hands_at(left: Vec3, right: Vec3) -> [Hand; 2] {
        let mut hands = [Hand::left(), Hand::right()];
        for (hand, palm) in hands.iter_mut().zip([left, right]) {
            hand.pose = HandPose {
                palm,
                tip: palm + Vec3::NEG_Z,
                ..Default::default()
            };
            hand.previous_pose = hand.pose;
        }
        hands
    }

    fn move_palms(hands: &mut [Hand; 2], left: Vec3, right: Vec3) {
        for (hand, palm) in hands.iter_mut().zip([left, right]) {
            hand.previous_pose = hand.pose;
            hand.pose.palm = palm;
            hand.pose.tip = palm + Vec3::NEG_Z;
        }
    }

    #[test]
    fn test_different_entities_are_left_alone() {
        let mut host = HeadlessHost::new();
        let properties = EntityProperties::default();
        let a = host.add_entity(properties.clone());
        let b = host.add_entity(properties.clone());
        let mut hands = hands_at([-0.5, 0., 0.].into(), [0.5, 0., 0.].into());

        assert!(!two_hand_system(&mut hands, GrabMode::Direct, &GrabConfig::default(), &mut host));
        hold(&mut hands[0], a, &properties, 2.);
        hold(&mut hands[1], b, &properties, 2.);
        assert!(!two_hand_system(&mut hands, GrabMode::Direct, &GrabConfig::default(), &mut host));
    }

    #[test]
    fn test_pulling_apart_scales() {
        let mut host = HeadlessHost::new();
        let properties = EntityProperties {
            position: [0., 0.2, -2.].into(),
            dimensions: Vec3::splat(0.3),
            ..Default::default()
        };
        let entity = host.add_entity(properties.clone());
        let mut hands = hands_at([-0.5, 0., 0.].into(), [0.5, 0., 0.].into());
        hold(&mut hands[0], entity, &properties, 2.);
        hold(&mut hands[1], entity, &properties, 2.);

        // Twice as far apart
        move_palms(&mut hands, [-1., 0., 0.].into(), [1., 0., 0.].into());
        assert!(two_hand_system(&mut hands, GrabMode::Direct, &GrabConfig::default(), &mut host));

        let scaled = host.entity_properties(entity).unwrap();
        assert_relative_eq!(scaled.dimensions, Vec3::splat(0.6), epsilon = 1e-5);
        assert_relative_eq!(scaled.position, Vec3::new(0., 0.4, -2.), epsilon = 1e-5);
        for hand in &hands {
            let session = hand.session().unwrap();
            assert_relative_eq!(session.dimensions, scaled.dimensions);
            assert_relative_eq!(session.half_diagonal, properties.half_diagonal() * 2., epsilon = 1e-5);
        }
    }

    #[test]
    fn test_turning_rotates_about_the_middle() {
        let mut host = HeadlessHost::new();
        let properties = EntityProperties {
            position: [0., 0., -2.].into(),
            ..Default::default()
        };
        let entity = host.add_entity(properties.clone());
        let mut hands = hands_at([-0.5, 0., -1.].into(), [0.5, 0., -1.].into());
        hold(&mut hands[0], entity, &properties, 1.);
        hold(&mut hands[1], entity, &properties, 1.);

        let turn = Quat::from_rotation_y(30f32.to_radians());
        let middle = Vec3::new(0., 0., -1.);
        move_palms(
            &mut hands,
            middle + turn * Vec3::new(-0.5, 0., 0.),
            middle + turn * Vec3::new(0.5, 0., 0.),
        );
        assert!(two_hand_system(&mut hands, GrabMode::Projected, &GrabConfig::default(), &mut host));

        let rotated = host.entity_properties(entity).unwrap();
        assert_relative_eq!(rotated.rotation, turn, epsilon = 1e-5);
        assert_relative_eq!(
            rotated.position,
            Vec3::new(-0.5, 0., -1. - 30f32.to_radians().cos()),
            epsilon = 1e-5
        );

        // Grab references follow along, so the next tick starts from here
        let session = hands[1].session().unwrap();
        assert_relative_eq!(session.model_rotation_at_grab, turn, epsilon = 1e-5);
        assert_relative_eq!(session.hand_position_at_grab, hands[1].pose.palm);
    }

    #[test]
    fn test_tiny_turns_are_ignored() {
        let mut host = HeadlessHost::new();
        let properties = EntityProperties {
            position: [0., 0., -2.].into(),
            ..Default::default()
        };
        let entity = host.add_entity(properties.clone());
        let mut hands = hands_at([-0.5, 0., -1.].into(), [0.5, 0., -1.].into());
        hold(&mut hands[0], entity, &properties, 1.);
        hold(&mut hands[1], entity, &properties, 1.);

        let turn = Quat::from_rotation_y(0.05f32.to_radians());
        move_palms(
            &mut hands,
            turn * Vec3::new(-0.5, 0., 0.) + Vec3::new(0., 0., -1.),
            turn * Vec3::new(0.5, 0., 0.) + Vec3::new(0., 0., -1.),
        );

        // Still counts as a two handed hold
        assert!(two_hand_system(&mut hands, GrabMode::Projected, &GrabConfig::default(), &mut host));
        assert_eq!(host.entity_properties(entity).unwrap(), properties);
        assert_eq!(hands[0].session().unwrap().rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_sliding_both_hands_refreshes_the_grab_references() {
        let mut host = HeadlessHost::new();
        let properties = EntityProperties {
            position: [0., 0., -2.].into(),
            ..Default::default()
        };
        let entity = host.add_entity(properties.clone());
        let mut hands = hands_at([-0.1, 0., -1.].into(), [0.1, 0., -1.].into());
        hold(&mut hands[0], entity, &properties, 1.);
        hold(&mut hands[1], entity, &properties, 1.);

        // The line between the palms doesn't turn, so nothing rotates
        move_palms(&mut hands, [0.4, 0., -1.].into(), [0.6, 0., -1.].into());
        assert!(two_hand_system(&mut hands, GrabMode::Projected, &GrabConfig::default(), &mut host));
        assert_eq!(host.entity_properties(entity).unwrap(), properties);

        for hand in &hands {
            let session = hand.session().unwrap();
            assert_eq!(session.hand_position_at_grab, hand.pose.palm);
            assert_eq!(session.model_position_at_grab, properties.position);
            assert_eq!(session.model_rotation_at_grab, properties.rotation);
        }
    }
}
