//! Pick geometry: how far things are from a hand's aim ray and how big they look.
//!
//! ```text
//!                P         P - candidate
//!               /|         A - palm
//!              / | d       B - unit aim direction
//!             /  |         X - foot of the perpendicular
//!            A---X----->B  d - perpendicular distance
//!              x           x - along-ray distance
//! ```
//!
//! Everything in here is a pure function of its arguments.

use glam::Vec3;

use crate::{
    components::{hand::AimOffset, HandPose},
    config::GrabConfig,
    contexts::host::{AttachmentData, EntityId, EntityProperties, Joint},
};

/// The result of evaluating one entity against a hand's aim ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub entity: EntityId,
    /// The entity's position in the hand's aim frame
    pub offset: AimOffset,
    /// Distance from the entity's position to the aim ray
    pub perpendicular_distance: f32,
    /// How big the entity looks from the viewpoint, in degrees
    pub angular_size: f32,
    pub eligible: bool,
}

impl Candidate {
    /// Signed distance along the aim ray. Negative is behind the hand.
    pub fn along_ray(&self) -> f32 {
        self.offset.forward
    }
}

/// Split `point`'s offset from the palm into the hand's aim frame, and measure how far it is from
/// the aim ray.
pub fn decompose(pose: &HandPose, point: Vec3) -> (AimOffset, f32) {
    let to_point = point - pose.palm;
    let offset = AimOffset {
        forward: to_point.dot(pose.front),
        up: to_point.dot(pose.up),
        right: to_point.dot(pose.right),
    };
    let foot = pose.aim_point(offset.forward);
    (offset, (point - foot).length())
}

/// Apparent size, in degrees, of something with the given half diagonal at `position` when seen
/// from `viewpoint`.
pub fn angular_size(half_diagonal: f32, viewpoint: Vec3, position: Vec3) -> f32 {
    let distance = viewpoint.distance(position);
    (2. * (half_diagonal / distance).atan()).to_degrees()
}

/// Is `angular_size` inside the configured window? Either bound can be switched off.
pub fn angular_size_ok(angular_size: f32, config: &GrabConfig) -> bool {
    (config.allow_large || angular_size < config.max_angular_size)
        && (config.allow_small || angular_size > config.min_angular_size)
}

/// Evaluate an entity against a hand's aim ray.
///
/// The candidate is eligible when it is in front of the hand and its angular size, as seen from
/// `viewpoint`, is inside the configured window.
pub fn pick(
    pose: &HandPose,
    entity: EntityId,
    properties: &EntityProperties,
    viewpoint: Vec3,
    config: &GrabConfig,
) -> Candidate {
    let (offset, perpendicular_distance) = decompose(pose, properties.position);
    let angular_size = angular_size(properties.half_diagonal(), viewpoint, properties.position);
    let eligible = offset.forward > 0. && angular_size_ok(angular_size, config);

    Candidate {
        entity,
        offset,
        perpendicular_distance,
        angular_size,
        eligible,
    }
}

/// The eligible candidate closest to the aim ray, if there is one
pub fn nearest_eligible(candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    candidates
        .into_iter()
        .filter(|c| c.eligible)
        .min_by(|a, b| a.perpendicular_distance.total_cmp(&b.perpendicular_distance))
}

/// Find the attachment the hand is pointing at.
///
/// An attachment qualifies when it is in front of the hand and the aim ray passes within half its
/// scale of it. The one closest to the ray wins. Returns an index into `attachments`.
pub fn pick_attachment(pose: &HandPose, attachments: &[(AttachmentData, Joint)]) -> Option<usize> {
    attachments
        .iter()
        .enumerate()
        .filter_map(|(i, (attachment, joint))| {
            let (offset, d) = decompose(pose, attachment.world_position(joint));
            (offset.forward > 0. && d < attachment.scale / 2.).then_some((i, d))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Quat;

    fn cube(position: Vec3, side: f32) -> EntityProperties {
        EntityProperties {
            position,
            dimensions: Vec3::splat(side),
            ..Default::default()
        }
    }

    #[test]
    fn test_decompose() {
        let pose = HandPose::default();
        let (offset, d) = decompose(&pose, Vec3::new(3., 4., -10.));
        assert_relative_eq!(offset.forward, 10.);
        assert_relative_eq!(offset.up, 4.);
        assert_relative_eq!(offset.right, 3.);
        assert_relative_eq!(d, 5.);

        // Behind the hand
        let (offset, d) = decompose(&pose, Vec3::new(0., 0., 2.));
        assert_relative_eq!(offset.forward, -2.);
        assert_relative_eq!(d, 0.);
    }

    #[test]
    fn test_angular_size() {
        // Half diagonal equal to distance is a 90 degree spread
        assert_relative_eq!(angular_size(1., Vec3::ZERO, Vec3::NEG_Z), 90., epsilon = 1e-4);
        assert!(angular_size(0.01, Vec3::ZERO, Vec3::new(0., 0., -100.)) < 0.1);
    }

    #[test]
    fn test_pick_window() {
        let pose = HandPose::default();
        let viewpoint = Vec3::ZERO;
        let mut config = GrabConfig::default();

        // ~16 degrees: comfortably inside the window
        let ok = pick(&pose, EntityId(1), &cube([0., 0., -2.].into(), 0.3), viewpoint, &config);
        assert!(ok.eligible);
        assert_relative_eq!(ok.along_ray(), 2.);

        // Behind the hand is never eligible, no matter the size
        let behind = pick(&pose, EntityId(2), &cube([0., 0., 2.].into(), 0.3), viewpoint, &config);
        assert!(!behind.eligible);

        // Too big, then allowed
        let huge = cube([0., 0., -2.].into(), 5.);
        assert!(!pick(&pose, EntityId(3), &huge, viewpoint, &config).eligible);
        config.allow_large = true;
        assert!(pick(&pose, EntityId(3), &huge, viewpoint, &config).eligible);

        // Too small, then allowed
        let tiny = cube([0., 0., -20.].into(), 0.01);
        assert!(!pick(&pose, EntityId(4), &tiny, viewpoint, &config).eligible);
        config.allow_small = true;
        assert!(pick(&pose, EntityId(4), &tiny, viewpoint, &config).eligible);

        // Even with both bounds off, behind is behind
        assert!(!pick(&pose, EntityId(2), &cube([0., 0., 2.].into(), 0.3), viewpoint, &config).eligible);
    }

    #[test]
    fn test_window_bounds_are_exclusive() {
        let config = GrabConfig {
            min_angular_size: 10.,
            max_angular_size: 90.,
            ..Default::default()
        };
        assert!(!angular_size_ok(90., &config));
        assert!(!angular_size_ok(10., &config));
        assert!(angular_size_ok(45., &config));
        assert!(angular_size_ok(
            90.,
            &GrabConfig {
                allow_large: true,
                ..config.clone()
            }
        ));
        assert!(angular_size_ok(
            10.,
            &GrabConfig {
                allow_small: true,
                ..config
            }
        ));
    }

    #[test]
    fn test_nearest_eligible() {
        let make = |id, d, eligible| Candidate {
            entity: EntityId(id),
            offset: AimOffset::default(),
            perpendicular_distance: d,
            angular_size: 10.,
            eligible,
        };
        let winner = nearest_eligible([make(1, 0.5, true), make(2, 0.1, false), make(3, 0.2, true)]);
        assert_eq!(winner.unwrap().entity, EntityId(3));
        assert!(nearest_eligible(Vec::new()).is_none());
    }

    #[test]
    fn test_pick_attachment() {
        let pose = HandPose::default();
        let joint = Joint {
            name: "Head".into(),
            position: Vec3::new(0., 0., -1.),
            rotation: Quat::IDENTITY,
        };
        let attachment = |translation: Vec3, scale| AttachmentData {
            model_url: "hat.fst".into(),
            joint_name: "Head".into(),
            translation,
            rotation: Quat::IDENTITY,
            scale,
            is_soft: true,
        };

        let attachments = vec![
            // Off to the side, further than half its scale from the ray
            (attachment([0.5, 0., 0.].into(), 0.4), joint.clone()),
            // On the ray, but behind the hand
            (attachment([0., 0., 2.].into(), 1.), joint.clone()),
            (attachment([0.1, 0., 0.].into(), 0.4), joint.clone()),
            (attachment([0.05, 0., 0.].into(), 0.4), joint.clone()),
        ];
        assert_eq!(pick_attachment(&pose, &attachments), Some(3));
        assert_eq!(pick_attachment(&pose, &attachments[..2]), None);
    }
}
