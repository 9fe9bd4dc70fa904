use glam::{Quat, Vec3};
use log::{debug, info, trace};

use crate::{
    components::{GrabMode, GrabSession, GrabState, Hand, HandPose},
    config::GrabConfig,
    contexts::{
        host::{AttachmentData, EntityEdit, EntityId, EntityKind, EntityProperties, Joint},
        Host,
    },
    systems::pick::{pick, pick_attachment},
};

/// What happened when a hand let go
#[derive(Debug, Clone, PartialEq)]
pub enum Release {
    /// The entity stays where it was left
    Dropped,
    /// The entity was turned into an attachment on this joint
    Attached { joint: String },
    /// A joint was close enough to attach to, but attaching wasn't allowed
    Suppressed,
}

/// Grabbing system
/// Walks each hand through its grab cycle: lets go of held entities when the trigger is released,
/// and tries to pick up a new one when the trigger goes down.
pub fn grabbing_system<H: Host + ?Sized>(hands: &mut [Hand; 2], config: &GrabConfig, host: &mut H) {
    for i in 0..hands.len() {
        let other_entity = hands[1 - i].grabbed_entity();
        let hand = &mut hands[i];

        if !hand.trigger.pressed && hand.is_grabbing() {
            release(hand, other_entity, config, host);
        }

        if hand.trigger.pressing && !hand.is_grabbing() {
            hand.state = GrabState::Pressing;
            try_grab(hand, config, host);
        }
    }
}

/// Try to pick something up with `hand`.
///
/// Attachments the hand is pointing at win over entities in the scene. If nothing valid is found the
/// hand goes back to idle and nothing else happens.
pub fn try_grab<H: Host + ?Sized>(hand: &mut Hand, config: &GrabConfig, host: &mut H) {
    let pose = hand.pose;
    let found = match detach_pointed_at_attachment(&pose, host) {
        Some(found) => Some(found),
        None => find_entity_under_ray(&pose, host),
    };

    let (entity, properties) = match found {
        Some(found) => found,
        None => {
            hand.state = GrabState::Idle;
            return;
        }
    };

    let candidate = pick(&pose, entity, &properties, host.camera_position(), config);
    if !candidate.eligible {
        trace!(
            "{:?} hand can't grab {entity:?}: along ray {}, angular size {}",
            hand.handedness,
            candidate.along_ray(),
            candidate.angular_size
        );
        hand.state = GrabState::Idle;
        return;
    }

    info!("{:?} hand grabbing {entity:?}", hand.handedness);
    let half_diagonal = properties.half_diagonal();
    let joints_intersecting_from_start = host
        .joints()
        .into_iter()
        .filter(|j| j.position.distance(properties.position) < half_diagonal)
        .map(|j| j.name)
        .collect();

    hand.state = GrabState::Grabbing(GrabSession {
        entity,
        model_url: properties.model_url,
        position: properties.position,
        rotation: properties.rotation,
        dimensions: properties.dimensions,
        half_diagonal,
        hand_position_at_grab: pose.palm,
        hand_rotation_at_grab: pose.rotation,
        model_position_at_grab: properties.position,
        model_rotation_at_grab: properties.rotation,
        aim_offset: candidate.offset,
        joints_intersecting_from_start,
    });
}

fn find_entity_under_ray<H: Host + ?Sized>(
    pose: &HandPose,
    host: &mut H,
) -> Option<(EntityId, EntityProperties)> {
    let intersection = host.find_ray_intersection(&pose.pick_ray())?;
    if !intersection.accurate {
        trace!("No accurate intersection");
        return None;
    }

    let entity = match host.resolve(intersection.entity) {
        Some(entity) => entity,
        None => {
            debug!("Unknown entity {:?} under ray", intersection.entity);
            return None;
        }
    };
    let properties = host.entity_properties(entity)?;
    Some((entity, properties))
}

/// If the hand is pointing at one of the avatar's attachments, turn it back into a free entity.
fn detach_pointed_at_attachment<H: Host + ?Sized>(
    pose: &HandPose,
    host: &mut H,
) -> Option<(EntityId, EntityProperties)> {
    let attachments = host
        .attachments()
        .into_iter()
        .filter_map(|a| {
            let joint = host.joint(&a.joint_name)?;
            Some((a, joint))
        })
        .collect::<Vec<_>>();
    let (attachment, joint) = &attachments[pick_attachment(pose, &attachments)?];

    info!("Detaching {} from {}", attachment.model_url, attachment.joint_name);
    host.detach_one(&attachment.model_url, &attachment.joint_name);

    // A cube whose half diagonal matches the attachment's scale
    let side = attachment.scale / 3f32.sqrt();
    let properties = EntityProperties {
        kind: EntityKind::Model,
        position: attachment.world_position(joint),
        rotation: attachment.world_rotation(joint),
        dimensions: Vec3::splat(side),
        model_url: Some(attachment.model_url.clone()),
        ..Default::default()
    };
    let entity = host.add_entity(properties.clone());
    Some((entity, properties))
}

/// Let go of whatever `hand` is holding.
///
/// If the nearest joint is inside the entity it becomes an attachment on that joint, unless the
/// joint was already inside the entity when it was grabbed, or the other hand is holding the same
/// entity.
pub fn release<H: Host + ?Sized>(
    hand: &mut Hand,
    other_hand_entity: Option<EntityId>,
    config: &GrabConfig,
    host: &mut H,
) -> Release {
    let session = match std::mem::take(&mut hand.state) {
        GrabState::Grabbing(session) => session,
        other => {
            hand.state = other;
            return Release::Dropped;
        }
    };
    info!("{:?} hand releasing {:?}", hand.handedness, session.entity);

    let joint = match closest_joint(host.joints(), session.position, config.attach_search_distance) {
        Some((joint, distance)) if distance < session.half_diagonal => joint,
        _ => return Release::Dropped,
    };
    debug!(
        "Closest joint is {} (attach max distance {})",
        joint.name, session.half_diagonal
    );

    // Do nothing: the hand started inside this joint, or both hands have hold of the entity.
    if session.joints_intersecting_from_start.contains(&joint.name)
        || other_hand_entity == Some(session.entity)
    {
        return Release::Suppressed;
    }

    let model_url = match &session.model_url {
        Some(model_url) => model_url.clone(),
        None => {
            debug!("{:?} has no model to attach", session.entity);
            return Release::Dropped;
        }
    };

    let joint_from_world = joint.rotation.inverse();
    let attachment = AttachmentData {
        model_url,
        joint_name: joint.name.clone(),
        translation: joint_from_world * (session.position - joint.position),
        rotation: joint_from_world * session.rotation,
        scale: 2. * session.half_diagonal,
        is_soft: true,
    };

    if let Err(e) = host.attach(attachment, false) {
        debug!("Unable to attach {:?}: {e}", session.entity);
        return Release::Dropped;
    }
    info!("Attached {:?} to {}", session.entity, joint.name);
    if let Some(entity) = host.resolve(session.entity) {
        if let Err(e) = host.delete_entity(entity) {
            debug!("Unable to delete attached entity {entity:?}: {e}");
        }
    }

    Release::Attached { joint: joint.name }
}

/// The joint closest to `position`, if any is nearer than `max_distance`
pub fn closest_joint(joints: Vec<Joint>, position: Vec3, max_distance: f32) -> Option<(Joint, f32)> {
    joints
        .into_iter()
        .map(|j| {
            let distance = j.position.distance(position);
            (j, distance)
        })
        .filter(|(_, distance)| *distance < max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Work out where a single hand wants its held entity to be.
pub fn one_handed_pose(
    session: &GrabSession,
    pose: &HandPose,
    mode: GrabMode,
    avatar_position: Vec3,
    avatar_orientation: Quat,
) -> (Vec3, Quat) {
    let rotation =
        (pose.rotation * session.hand_rotation_at_grab.inverse() * session.model_rotation_at_grab)
            .normalize();

    let position = match mode {
        GrabMode::Direct => pose.point_from_offset(&session.aim_offset),
        GrabMode::Projected => {
            // Distances are measured from the plane the avatar is facing out of
            let forward = avatar_orientation * Vec3::NEG_Z;
            let plane = forward.dot(avatar_position);
            let mut hand_distance = forward.dot(session.hand_position_at_grab) - plane;
            let mut model_distance = (forward.dot(session.model_position_at_grab) - plane).max(0.);
            if hand_distance <= 0. {
                hand_distance = 1.;
                model_distance = 1.;
            }

            let hand_moved = pose.palm - session.hand_position_at_grab;
            session.model_position_at_grab + hand_moved * (model_distance / hand_distance)
        }
    };

    (position, rotation)
}

/// Move the entity held by `hand` to follow it. Does nothing if the hand isn't holding anything,
/// or if the entity can't be resolved this tick.
pub fn move_held_entity<H: Host + ?Sized>(hand: &mut Hand, mode: GrabMode, host: &mut H) {
    let pose = hand.pose;
    let avatar_position = host.avatar_position();
    let avatar_orientation = host.avatar_orientation();
    let session = match hand.session_mut() {
        Some(session) => session,
        None => return,
    };

    let entity = match host.resolve(session.entity) {
        Some(entity) => entity,
        None => {
            debug!("Held entity {:?} is not known yet", session.entity);
            return;
        }
    };

    let (position, rotation) =
        one_handed_pose(session, &pose, mode, avatar_position, avatar_orientation);
    let edit = EntityEdit {
        position: Some(position),
        rotation: Some(rotation),
        ..Default::default()
    };
    if let Err(e) = host.edit_entity(entity, &edit) {
        debug!("Unable to move {entity:?}: {e}");
        return;
    }

    session.entity = entity;
    session.position = position;
    session.rotation = rotation;
}
