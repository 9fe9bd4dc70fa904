use glam::{Quat, Vec3};

use crate::contexts::host::{EntityId, PickRay};

/// A component that represents the "side" or "handedness" that an entity is on
/// Used by components such as `Hand` to identify which controller they should map to
#[derive(Debug, PartialEq, Clone, Copy, Eq, PartialOrd, Ord, Hash)]
pub enum Handedness {
    /// Left hand side
    Left,
    /// Right hand side
    Right,
}

/// How held entities follow the hand. Shared by both hands and toggled with either bumper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrabMode {
    /// One hand: replay the aim-ray offset captured at grab time. Two hands: scale.
    #[default]
    Direct,
    /// One hand: push and pull, scaled by distance from the avatar. Two hands: rotate.
    Projected,
}

impl GrabMode {
    /// The other mode
    pub fn toggled(self) -> GrabMode {
        match self {
            GrabMode::Direct => GrabMode::Projected,
            GrabMode::Projected => GrabMode::Direct,
        }
    }
}

/// Where a hand is and which way it points, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandPose {
    /// Palm position
    pub palm: Vec3,
    /// Fingertip position
    pub tip: Vec3,
    /// Unit palm normal
    pub up: Vec3,
    /// Unit vector from palm to fingertip
    pub front: Vec3,
    /// `front × up`, normalized
    pub right: Vec3,
    /// Palm rotation, including the avatar's orientation
    pub rotation: Quat,
}

impl Default for HandPose {
    fn default() -> Self {
        Self {
            palm: Vec3::ZERO,
            tip: Vec3::NEG_Z,
            up: Vec3::Y,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            rotation: Quat::IDENTITY,
        }
    }
}

impl HandPose {
    /// The ray this hand aims along
    pub fn pick_ray(&self) -> PickRay {
        PickRay {
            origin: self.palm,
            direction: self.front,
        }
    }

    /// The point `distance` along the aim ray
    pub fn aim_point(&self, distance: f32) -> Vec3 {
        self.palm + self.front * distance
    }

    /// A point expressed in this hand's aim frame
    pub fn point_from_offset(&self, offset: &AimOffset) -> Vec3 {
        self.palm + self.front * offset.forward + self.up * offset.up + self.right * offset.right
    }
}

/// Trigger pressure and the edges derived from it
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TriggerState {
    /// How far the trigger is pulled, 0 to 1
    pub value: f32,
    /// Is the trigger held past its threshold?
    pub pressed: bool,
    /// Did it go past the threshold this tick?
    pub pressing: bool,
}

/// A position expressed along a hand's aim frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AimOffset {
    /// Distance along the aim ray
    pub forward: f32,
    /// Distance along the palm normal
    pub up: f32,
    /// Distance along the hand's right axis
    pub right: f32,
}

/// The per-hand record of an active hold on an entity, from pick to release.
#[derive(Debug, Clone, PartialEq)]
pub struct GrabSession {
    /// The held entity
    pub entity: EntityId,
    /// Model the entity displays, carried over if it gets attached
    pub model_url: Option<String>,
    /// Last position written to the entity
    pub position: Vec3,
    /// Last rotation written to the entity
    pub rotation: Quat,
    /// Last dimensions written to the entity
    pub dimensions: Vec3,
    /// Half the entity's bounding box diagonal
    pub half_diagonal: f32,
    /// Palm position when the grab reference was taken
    pub hand_position_at_grab: Vec3,
    /// Palm rotation when the grab reference was taken
    pub hand_rotation_at_grab: Quat,
    /// Entity position when the grab reference was taken
    pub model_position_at_grab: Vec3,
    /// Entity rotation when the grab reference was taken
    pub model_rotation_at_grab: Quat,
    /// Where the entity was in the hand's aim frame at grab time
    pub aim_offset: AimOffset,
    /// Joints that were already inside the entity at grab time. These never cause an attachment.
    pub joints_intersecting_from_start: Vec<String>,
}

/// Where a hand is in its grab cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GrabState {
    /// Nothing held
    #[default]
    Idle,
    /// The trigger just went down and a pick is in progress
    Pressing,
    /// Holding an entity
    Grabbing(GrabSession),
}

/// A component that represents a tracked hand.
/// Used to give the player a feeling of immersion by allowing them to grab objects in the world
#[derive(Debug, Clone)]
pub struct Hand {
    /// Which side is this hand on?
    pub handedness: Handedness,
    /// This tick's pose
    pub pose: HandPose,
    /// Last tick's pose
    pub previous_pose: HandPose,
    /// Trigger pressure and edges
    pub trigger: TriggerState,
    /// Grab cycle
    pub state: GrabState,
    /// The entity under the laser, if any
    pub hovered: Option<EntityId>,
    pub(crate) has_been_sampled: bool,
}

impl Hand {
    /// Shortcut helper to create a Left hand
    pub fn left() -> Hand {
        Hand::new(Handedness::Left)
    }

    /// Shortcut helper to create a right hand
    pub fn right() -> Hand {
        Hand::new(Handedness::Right)
    }

    fn new(handedness: Handedness) -> Hand {
        Hand {
            handedness,
            pose: Default::default(),
            previous_pose: Default::default(),
            trigger: Default::default(),
            state: GrabState::Idle,
            hovered: None,
            has_been_sampled: false,
        }
    }

    /// The active grab session, if any
    pub fn session(&self) -> Option<&GrabSession> {
        match &self.state {
            GrabState::Grabbing(session) => Some(session),
            _ => None,
        }
    }

    /// The active grab session, if any
    pub fn session_mut(&mut self) -> Option<&mut GrabSession> {
        match &mut self.state {
            GrabState::Grabbing(session) => Some(session),
            _ => None,
        }
    }

    /// Is this hand holding something?
    pub fn is_grabbing(&self) -> bool {
        matches!(self.state, GrabState::Grabbing(_))
    }

    /// The entity this hand is holding, if any
    pub fn grabbed_entity(&self) -> Option<EntityId> {
        self.session().map(|s| s.entity)
    }
}
