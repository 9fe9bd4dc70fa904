//! The capability surface grabkit needs from whatever engine is hosting it.
//!
//! grabkit never owns an entity, a joint or an overlay. It asks the host about them and asks the
//! host to change them, through the traits in this module. Implement them all and you get [`Host`]
//! for free.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{components::hand::Handedness, GrabResult};

/// An opaque handle to an entity owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// An opaque handle to an overlay owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId {
    /// Slot of the overlay
    pub index: usize,
    /// Generation of the slot, so stale handles can be told apart
    pub generation: u64,
}

/// An 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub red: u8,
    /// Green
    pub green: u8,
    /// Blue
    pub blue: u8,
}

impl Color {
    /// Pure red
    pub const RED: Color = Color::new(255, 0, 0);
    /// Pure green
    pub const GREEN: Color = Color::new(0, 255, 0);
    /// Pure blue
    pub const BLUE: Color = Color::new(0, 0, 255);
    /// White
    pub const WHITE: Color = Color::new(255, 255, 255);

    /// Create a colour from its components
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// What kind of thing an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntityKind {
    /// An axis aligned box
    Box,
    /// A sphere
    Sphere,
    /// A model loaded from a URL
    #[default]
    Model,
}

/// The full set of properties of a host entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProperties {
    /// The kind of entity
    pub kind: EntityKind,
    /// World space position
    pub position: Vec3,
    /// World space rotation
    pub rotation: Quat,
    /// Size along each local axis
    pub dimensions: Vec3,
    /// Linear velocity, in metres per second
    pub velocity: Vec3,
    /// Constant acceleration applied by the host's physics
    pub gravity: Vec3,
    /// Linear damping
    pub damping: f32,
    /// Colour of box and sphere entities
    pub color: Color,
    /// Seconds until the host deletes the entity on its own
    pub lifetime: Option<f32>,
    /// Where the model for `EntityKind::Model` entities comes from
    pub model_url: Option<String>,
    /// Highlight amount, 0 is no highlight
    pub glow_level: f32,
    /// Whether the entity takes part in collisions at all
    pub ignore_collisions: bool,
    /// Whether collisions move the entity
    pub collisions_will_move: bool,
}

impl Default for EntityProperties {
    fn default() -> Self {
        Self {
            kind: EntityKind::default(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            dimensions: Vec3::ONE,
            velocity: Vec3::ZERO,
            gravity: Vec3::ZERO,
            damping: 0.,
            color: Color::default(),
            lifetime: None,
            model_url: None,
            glow_level: 0.,
            ignore_collisions: false,
            collisions_will_move: false,
        }
    }
}

impl EntityProperties {
    /// Half the length of the entity's bounding box diagonal
    pub fn half_diagonal(&self) -> f32 {
        self.dimensions.length() / 2.
    }
}

/// A partial update to an entity. Only the fields that are `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityEdit {
    /// New position
    pub position: Option<Vec3>,
    /// New rotation
    pub rotation: Option<Quat>,
    /// New dimensions
    pub dimensions: Option<Vec3>,
    /// New colour
    pub color: Option<Color>,
    /// New glow level
    pub glow_level: Option<f32>,
}

/// A ray used to pick entities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    /// Where the ray starts
    pub origin: Vec3,
    /// Which way it goes. Expected to be normalized.
    pub direction: Vec3,
}

/// The result of a successful ray intersection query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayIntersection {
    /// The entity that was hit
    pub entity: EntityId,
    /// Whether the host is confident in the hit (eg. the full scene was available)
    pub accurate: bool,
    /// Distance along the ray to the hit
    pub distance: f32,
}

/// A joint in the avatar's skeleton, in world space
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// The joint's name
    pub name: String,
    /// World space position
    pub position: Vec3,
    /// Combined (world space) rotation
    pub rotation: Quat,
}

/// A model rigidly attached to one of the avatar's joints
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentData {
    /// The attached model
    pub model_url: String,
    /// The joint it hangs off
    pub joint_name: String,
    /// Offset from the joint, in joint space
    pub translation: Vec3,
    /// Rotation relative to the joint
    pub rotation: Quat,
    /// Uniform size of the model
    pub scale: f32,
    /// Soft attachments follow the joint without being part of the skeleton
    pub is_soft: bool,
}

impl AttachmentData {
    /// Where the attachment currently sits in world space, given its joint
    pub fn world_position(&self, joint: &Joint) -> Vec3 {
        joint.position + joint.rotation * self.translation
    }

    /// The attachment's current world space rotation, given its joint
    pub fn world_rotation(&self, joint: &Joint) -> Quat {
        joint.rotation * self.rotation
    }
}

/// The shape of an overlay
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
    /// A 3D line segment
    Line3d {
        /// Start of the line
        start: Vec3,
        /// End of the line
        end: Vec3,
        /// Width in pixels
        width: f32,
    },
    /// A 3D sphere
    Sphere {
        /// Centre
        position: Vec3,
        /// Diameter
        size: f32,
        /// Filled or wireframe
        solid: bool,
    },
    /// A 2D image, in screen coordinates
    Image {
        /// Top left corner
        position: Vec2,
        /// Width and height
        size: Vec2,
        /// Where the image comes from
        image_url: String,
    },
    /// A 2D text box, in screen coordinates
    Text {
        /// Top left corner
        position: Vec2,
        /// Width and height
        size: Vec2,
        /// What it says
        text: String,
    },
}

/// Everything needed to create an overlay
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayProperties {
    /// The overlay's shape
    pub shape: OverlayShape,
    /// Colour
    pub color: Color,
    /// Opacity, 0 to 1
    pub alpha: f32,
    /// Whether it is drawn
    pub visible: bool,
    /// 3D overlays anchored to the avatar are specified in the avatar's local frame
    pub anchored_to_avatar: bool,
}

/// A partial update to an overlay. Only the fields that are `Some` are changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayEdit {
    /// New line start
    pub start: Option<Vec3>,
    /// New line end
    pub end: Option<Vec3>,
    /// New sphere position
    pub position: Option<Vec3>,
    /// New colour
    pub color: Option<Color>,
    /// New visibility
    pub visible: Option<bool>,
    /// New text
    pub text: Option<String>,
}

/// One controller's raw state, as sampled from the host this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandInput {
    /// Position of the palm
    pub palm_position: Vec3,
    /// Position of the fingertip
    pub tip_position: Vec3,
    /// The palm's normal
    pub palm_normal: Vec3,
    /// Rotation of the palm, relative to the avatar
    pub raw_rotation: Quat,
    /// How far the trigger is pulled, 0 to 1
    pub trigger_value: f32,
    /// Is the bumper held?
    pub bumper: bool,
    /// Is the primary face button held?
    pub primary_button: bool,
}

impl Default for HandInput {
    fn default() -> Self {
        Self {
            palm_position: Vec3::ZERO,
            tip_position: Vec3::NEG_Z,
            palm_normal: Vec3::Y,
            raw_rotation: Quat::IDENTITY,
            trigger_value: 0.,
            bumper: false,
            primary_button: false,
        }
    }
}

/// The host's entity store and spatial queries
pub trait Scene {
    /// Confirm that `id` refers to an entity the host knows about.
    /// Returns `None` if the entity is not (or no longer) known.
    fn resolve(&mut self, id: EntityId) -> Option<EntityId>;
    /// Get the current properties of an entity
    fn entity_properties(&self, id: EntityId) -> Option<EntityProperties>;
    /// Create an entity
    fn add_entity(&mut self, properties: EntityProperties) -> EntityId;
    /// Change some properties of an entity
    fn edit_entity(&mut self, id: EntityId, edit: &EntityEdit) -> GrabResult<()>;
    /// Delete an entity
    fn delete_entity(&mut self, id: EntityId) -> GrabResult<()>;
    /// Find the nearest entity hit by `ray`
    fn find_ray_intersection(&self, ray: &PickRay) -> Option<RayIntersection>;
}

/// The user's avatar and its skeleton
pub trait Avatar {
    /// World space position of the avatar
    fn avatar_position(&self) -> Vec3;
    /// World space orientation of the avatar
    fn avatar_orientation(&self) -> Quat;
    /// Every joint in the skeleton
    fn joints(&self) -> Vec<Joint>;
    /// Look up a single joint by name
    fn joint(&self, name: &str) -> Option<Joint>;
    /// The joint's local rotation, including any override
    fn joint_rotation(&self, name: &str) -> Option<Quat>;
    /// Override a joint's local rotation
    fn set_joint_rotation(&mut self, name: &str, rotation: Quat) -> GrabResult<()>;
    /// Remove any override on a joint
    fn clear_joint_rotation(&mut self, name: &str);
    /// Everything currently attached to the avatar
    fn attachments(&self) -> Vec<AttachmentData>;
    /// Attach a model to a joint
    fn attach(&mut self, attachment: AttachmentData, allow_duplicates: bool) -> GrabResult<()>;
    /// Detach a model from a joint
    fn detach_one(&mut self, model_url: &str, joint_name: &str);
}

/// Cosmetic debug visuals
pub trait Overlays {
    /// Create an overlay
    fn add_overlay(&mut self, properties: OverlayProperties) -> OverlayId;
    /// Change some properties of an overlay
    fn edit_overlay(&mut self, id: OverlayId, edit: &OverlayEdit) -> GrabResult<()>;
    /// Delete an overlay
    fn delete_overlay(&mut self, id: OverlayId);
}

/// The viewpoint the user is seeing the world from
pub trait Viewpoint {
    /// World space position of the camera
    fn camera_position(&self) -> Vec3;
    /// World space orientation of the camera
    fn camera_orientation(&self) -> Quat;
    /// Size of the 2D viewport, in pixels
    fn viewport_dimensions(&self) -> Vec2;
}

/// Sound playback
pub trait Audio {
    /// Play a named sound at a world space position
    fn play_sound(&mut self, sound: &str, position: Vec3, volume: f32);
}

/// Tracked motion controllers
pub trait Controllers {
    /// Are tracked controllers present?
    fn controllers_connected(&self) -> bool;
    /// The current state of one hand's controller
    fn hand_input(&self, handedness: Handedness) -> HandInput;
}

/// Everything grabkit needs from a host
pub trait Host: Scene + Avatar + Overlays + Viewpoint + Audio + Controllers {}

impl<T> Host for T where T: Scene + Avatar + Overlays + Viewpoint + Audio + Controllers {}
