use generational_arena::{Arena, Index};
use glam::{Quat, Vec2, Vec3};
use hecs::{Entity, World};
use log::{debug, trace};
use rapier3d::na as nalgebra;
use rapier3d::{
    crossbeam::channel::{unbounded, Receiver},
    parry::query::{Ray, RayCast},
    prelude::{
        vector, ActiveCollisionTypes, ActiveEvents, BroadPhase, CCDSolver, ChannelEventCollector,
        ColliderBuilder, ColliderHandle, ColliderSet, CollisionEvent, ContactForceEvent,
        ImpulseJointSet, IntegrationParameters, InteractionGroups, IslandManager,
        MultibodyJointSet, NarrowPhase, PhysicsPipeline, Real, RigidBodyBuilder, RigidBodyHandle,
        RigidBodySet, SharedShape, Vector,
    },
};

use crate::{
    components::hand::Handedness,
    contexts::host::{
        AttachmentData, Audio, Avatar, Controllers, EntityEdit, EntityId, EntityKind,
        EntityProperties, HandInput, Joint, OverlayEdit, OverlayId, OverlayProperties,
        OverlayShape, Overlays, PickRay, RayIntersection, Scene, Viewpoint,
    },
    util::{
        decompose_isometry, glam_vec_from_na, isometry_from_rotation_translation,
        na_point_from_glam, na_vector_from_glam,
    },
    GrabError, GrabResult,
};

/// Ray casts stop looking past this distance
pub const MAX_RAY_DISTANCE: f32 = 1000.;

/// Marker for entities the host has created but not yet identified
#[derive(Debug, Clone, Copy)]
struct Pending;

/// Seconds an entity has existed for
#[derive(Debug, Clone, Copy, Default)]
struct Age(f32);

/// Where an entity lives in the physics world
#[derive(Debug, Clone, Copy)]
struct PhysicsHandles {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// A rapier world with every entity as a dynamic body carrying a single sensor collider.
///
/// Each body has a mass of one and its entity's gravity as a constant force, so entities can fall
/// at different rates. Sensors report overlaps without pushing each other around.
struct HeadlessPhysics {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collision_recv: Receiver<CollisionEvent>,
    _contact_force_recv: Receiver<ContactForceEvent>,
    event_handler: ChannelEventCollector,
}

impl Default for HeadlessPhysics {
    fn default() -> Self {
        let (collision_send, collision_recv) = unbounded();
        let (contact_force_send, contact_force_recv) = unbounded();
        let event_handler = ChannelEventCollector::new(collision_send, contact_force_send);

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0., 0., 0.],
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collision_recv,
            _contact_force_recv: contact_force_recv,
            event_handler,
        }
    }
}

impl HeadlessPhysics {
    fn insert(&mut self, id: EntityId, properties: &EntityProperties) -> PhysicsHandles {
        let mut rigid_body = RigidBodyBuilder::dynamic()
            .position(isometry_from_rotation_translation(
                properties.rotation,
                properties.position,
            ))
            .linvel(na_vector_from_glam(properties.velocity))
            .linear_damping(damping_coefficient(properties.damping))
            .additional_mass(1.)
            .can_sleep(false)
            .build();
        rigid_body.add_force(na_vector_from_glam(properties.gravity), false);
        let body = self.rigid_bodies.insert(rigid_body);

        let mut collider = ColliderBuilder::new(shape_for(properties))
            .density(0.)
            .sensor(true)
            .user_data(id.0 as _);
        collider = if properties.ignore_collisions {
            collider.collision_groups(InteractionGroups::none())
        } else {
            collider
                .active_collision_types(ActiveCollisionTypes::all())
                .active_events(ActiveEvents::COLLISION_EVENTS)
        };
        let collider = self.colliders.insert_with_parent(collider, body, &mut self.rigid_bodies);

        PhysicsHandles { body, collider }
    }

    /// Teleport a body to match an edit of its entity
    fn sync(&mut self, handles: PhysicsHandles, properties: &EntityProperties) {
        if let Some(body) = self.rigid_bodies.get_mut(handles.body) {
            body.set_position(
                isometry_from_rotation_translation(properties.rotation, properties.position),
                true,
            );
        }
        if let Some(collider) = self.colliders.get_mut(handles.collider) {
            collider.set_shape(shape_for(properties));
        }
    }

    fn remove(&mut self, handles: PhysicsHandles) {
        self.rigid_bodies.remove(
            handles.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.event_handler,
        );
    }

    /// Pairs of entities whose colliders started overlapping, smallest id first
    fn new_contacts(&self) -> Vec<(EntityId, EntityId)> {
        let mut contacts = self
            .collision_recv
            .try_iter()
            .filter_map(|event| match event {
                CollisionEvent::Started(a, b, _) => Some((self.entity_id(a)?, self.entity_id(b)?)),
                CollisionEvent::Stopped(..) => None,
            })
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect::<Vec<_>>();
        contacts.sort();
        contacts.dedup();
        contacts
    }

    fn entity_id(&self, collider: ColliderHandle) -> Option<EntityId> {
        self.colliders.get(collider).map(|c| EntityId(c.user_data as _))
    }
}

/// A joint in the headless avatar's skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessJoint {
    /// The joint's name
    pub name: String,
    /// World space position
    pub position: Vec3,
    /// Combined (world space) rotation
    pub rotation: Quat,
    /// Rotation relative to the parent joint
    pub local_rotation: Quat,
    /// Set by `set_joint_rotation`, cleared by `clear_joint_rotation`
    pub override_rotation: Option<Quat>,
}

/// A sound that was played through the headless host
#[derive(Debug, Clone, PartialEq)]
pub struct PlayedSound {
    /// Which sound
    pub name: String,
    /// Where it was played
    pub position: Vec3,
    /// How loud
    pub volume: f32,
}

/// A host that lives entirely in memory.
///
/// Entities are stored in a [`hecs::World`] and mirrored into a rapier world, which moves them and
/// reports when they touch. Picking is answered with parry shapes and overlays live in a
/// [`generational_arena::Arena`]. There is no rendering. Useful for tests,
/// for scripted demos and as a reference for writing an adapter to a real engine.
pub struct HeadlessHost {
    /// Entities in the scene
    pub world: World,
    /// When set, new entities stay unidentified until [`HeadlessHost::identify_pending`] is called
    pub defer_identification: bool,
    /// Avatar position
    pub avatar_position: Vec3,
    /// Avatar orientation
    pub avatar_orientation: Quat,
    /// The avatar's skeleton
    pub joints: Vec<HeadlessJoint>,
    /// Things attached to the avatar
    pub attachments: Vec<AttachmentData>,
    /// Debug overlays
    pub overlays: Arena<OverlayProperties>,
    /// Every sound played so far, oldest first
    pub sounds: Vec<PlayedSound>,
    /// Camera position
    pub camera_position: Vec3,
    /// Camera orientation
    pub camera_orientation: Quat,
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// Are controllers plugged in?
    pub controllers_connected: bool,
    /// Left, then right controller state
    pub hands: [HandInput; 2],
    physics: HeadlessPhysics,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self {
            world: World::new(),
            defer_identification: false,
            avatar_position: Vec3::ZERO,
            avatar_orientation: Quat::IDENTITY,
            joints: Vec::new(),
            attachments: Vec::new(),
            overlays: Arena::new(),
            sounds: Vec::new(),
            camera_position: Vec3::ZERO,
            camera_orientation: Quat::IDENTITY,
            viewport: Vec2::new(1920., 1080.),
            controllers_connected: true,
            hands: [HandInput::default(); 2],
            physics: HeadlessPhysics::default(),
        }
    }
}

impl HeadlessHost {
    /// Create an empty host with connected controllers
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a joint to the avatar's skeleton
    pub fn add_joint(&mut self, name: &str, position: Vec3, rotation: Quat) {
        self.joints.push(HeadlessJoint {
            name: name.to_string(),
            position,
            rotation,
            local_rotation: rotation,
            override_rotation: None,
        });
    }

    /// Set the state of one controller
    pub fn set_hand(&mut self, handedness: Handedness, input: HandInput) {
        self.hands[hand_index(handedness)] = input;
    }

    /// Get the state of one controller
    pub fn hand_mut(&mut self, handedness: Handedness) -> &mut HandInput {
        &mut self.hands[hand_index(handedness)]
    }

    /// Identify every entity that is waiting to be identified
    pub fn identify_pending(&mut self) {
        let pending = self
            .world
            .query::<&Pending>()
            .iter()
            .map(|(e, _)| e)
            .collect::<Vec<_>>();
        for entity in pending {
            let _ = self.world.remove_one::<Pending>(entity);
        }
    }

    /// Ids of every entity in the scene
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids = self
            .world
            .query::<&EntityProperties>()
            .iter()
            .map(|(e, _)| entity_id(e))
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    /// The names of every sound played so far
    pub fn sound_names(&self) -> Vec<&str> {
        self.sounds.iter().map(|s| s.name.as_str()).collect()
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Steps the physics world, copies the result back onto each entity, expires entities that
    /// have outlived their lifetime and returns every pair of entities that started touching.
    /// Overlaps are found before bodies move, so a pair shows up on the step after it forms.
    pub fn step(&mut self, dt: f32) -> Vec<(EntityId, EntityId)> {
        if dt > 0. {
            self.physics.step(dt);
        }

        let mut expired = Vec::new();
        for (entity, (properties, age, handles)) in self
            .world
            .query_mut::<(&mut EntityProperties, &mut Age, &PhysicsHandles)>()
        {
            if let Some(body) = self.physics.rigid_bodies.get(handles.body) {
                let (rotation, position) = decompose_isometry(body.position());
                properties.rotation = rotation;
                properties.position = position;
                properties.velocity = glam_vec_from_na(body.linvel());
            }

            age.0 += dt;
            if properties.lifetime.map_or(false, |l| age.0 >= l) {
                expired.push(entity);
            }
        }

        for entity in expired {
            trace!("Entity {:?} reached the end of its lifetime", entity_id(entity));
            let _ = self.despawn(entity);
        }

        self.physics.new_contacts()
    }

    fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        if let Ok(handles) = self.world.get::<&PhysicsHandles>(entity).map(|h| *h) {
            self.physics.remove(handles);
        }
        self.world.despawn(entity)
    }

    fn find_entity(&self, id: EntityId) -> Option<Entity> {
        Entity::from_bits(id.0).filter(|e| self.world.contains(*e))
    }

    fn find_joint(&self, name: &str) -> Option<&HeadlessJoint> {
        self.joints.iter().find(|j| j.name == name)
    }
}

fn hand_index(handedness: Handedness) -> usize {
    match handedness {
        Handedness::Left => 0,
        Handedness::Right => 1,
    }
}

fn entity_id(entity: Entity) -> EntityId {
    EntityId(entity.to_bits().get())
}

/// Rapier scales velocity by `1 / (1 + dt * c)` each step. Pick `c` so an entity loses roughly
/// `damping` of its speed every second.
fn damping_coefficient(damping: f32) -> f32 {
    -(1. - damping.clamp(0., 0.999)).ln()
}

fn shape_for(properties: &EntityProperties) -> SharedShape {
    let half_extents = properties.dimensions.abs() * 0.5;
    match properties.kind {
        EntityKind::Sphere => SharedShape::ball(half_extents.max_element()),
        EntityKind::Box | EntityKind::Model => {
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
    }
}

fn overlay_index(id: OverlayId) -> Index {
    Index::from_raw_parts(id.index, id.generation)
}

impl Scene for HeadlessHost {
    fn resolve(&mut self, id: EntityId) -> Option<EntityId> {
        let entity = self.find_entity(id)?;
        if self.world.get::<&Pending>(entity).is_ok() {
            return None;
        }
        Some(id)
    }

    fn entity_properties(&self, id: EntityId) -> Option<EntityProperties> {
        let entity = self.find_entity(id)?;
        let properties = self.world.get::<&EntityProperties>(entity).ok()?;
        Some((*properties).clone())
    }

    fn add_entity(&mut self, properties: EntityProperties) -> EntityId {
        let entity = self.world.reserve_entity();
        let id = entity_id(entity);
        let handles = self.physics.insert(id, &properties);
        let _ = self.world.insert(entity, (properties, Age::default(), handles));
        if self.defer_identification {
            let _ = self.world.insert_one(entity, Pending);
        }
        debug!("Added entity {id:?}");
        id
    }

    fn edit_entity(&mut self, id: EntityId, edit: &EntityEdit) -> GrabResult<()> {
        let entity = self.find_entity(id).ok_or(GrabError::UnknownEntity(id))?;
        let mut properties = self
            .world
            .get::<&mut EntityProperties>(entity)
            .map_err(|_| GrabError::UnknownEntity(id))?;

        if let Some(position) = edit.position {
            properties.position = position;
        }
        if let Some(rotation) = edit.rotation {
            properties.rotation = rotation;
        }
        if let Some(dimensions) = edit.dimensions {
            properties.dimensions = dimensions;
        }
        if let Some(color) = edit.color {
            properties.color = color;
        }
        if let Some(glow_level) = edit.glow_level {
            properties.glow_level = glow_level;
        }

        let moved = edit.position.is_some() || edit.rotation.is_some() || edit.dimensions.is_some();
        if moved {
            if let Ok(handles) = self.world.get::<&PhysicsHandles>(entity) {
                self.physics.sync(*handles, &properties);
            }
        }

        Ok(())
    }

    fn delete_entity(&mut self, id: EntityId) -> GrabResult<()> {
        let entity = self.find_entity(id).ok_or(GrabError::UnknownEntity(id))?;
        self.despawn(entity).map_err(|_| GrabError::UnknownEntity(id))?;
        debug!("Deleted entity {id:?}");
        Ok(())
    }

    fn find_ray_intersection(&self, pick_ray: &PickRay) -> Option<RayIntersection> {
        let ray = Ray::new(
            na_point_from_glam(pick_ray.origin),
            na_vector_from_glam(pick_ray.direction),
        );

        self.world
            .query::<&EntityProperties>()
            .iter()
            .filter_map(|(entity, properties)| {
                let isometry =
                    isometry_from_rotation_translation(properties.rotation, properties.position);
                shape_for(properties)
                    .cast_ray(&isometry, &ray, MAX_RAY_DISTANCE, true)
                    .map(|distance| RayIntersection {
                        entity: entity_id(entity),
                        accurate: true,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl Avatar for HeadlessHost {
    fn avatar_position(&self) -> Vec3 {
        self.avatar_position
    }

    fn avatar_orientation(&self) -> Quat {
        self.avatar_orientation
    }

    fn joints(&self) -> Vec<Joint> {
        self.joints
            .iter()
            .map(|j| Joint {
                name: j.name.clone(),
                position: j.position,
                rotation: j.rotation,
            })
            .collect()
    }

    fn joint(&self, name: &str) -> Option<Joint> {
        self.find_joint(name).map(|j| Joint {
            name: j.name.clone(),
            position: j.position,
            rotation: j.rotation,
        })
    }

    fn joint_rotation(&self, name: &str) -> Option<Quat> {
        self.find_joint(name)
            .map(|j| j.override_rotation.unwrap_or(j.local_rotation))
    }

    fn set_joint_rotation(&mut self, name: &str, rotation: Quat) -> GrabResult<()> {
        let joint = self
            .joints
            .iter_mut()
            .find(|j| j.name == name)
            .ok_or_else(|| GrabError::UnknownJoint(name.to_string()))?;
        joint.override_rotation = Some(rotation);
        Ok(())
    }

    fn clear_joint_rotation(&mut self, name: &str) {
        if let Some(joint) = self.joints.iter_mut().find(|j| j.name == name) {
            joint.override_rotation = None;
        }
    }

    fn attachments(&self) -> Vec<AttachmentData> {
        self.attachments.clone()
    }

    fn attach(&mut self, attachment: AttachmentData, allow_duplicates: bool) -> GrabResult<()> {
        if self.find_joint(&attachment.joint_name).is_none() {
            return Err(GrabError::UnknownJoint(attachment.joint_name));
        }

        if !allow_duplicates {
            self.attachments.retain(|a| {
                a.model_url != attachment.model_url || a.joint_name != attachment.joint_name
            });
        }
        debug!(
            "Attached {} to {}",
            attachment.model_url, attachment.joint_name
        );
        self.attachments.push(attachment);
        Ok(())
    }

    fn detach_one(&mut self, model_url: &str, joint_name: &str) {
        if let Some(index) = self
            .attachments
            .iter()
            .position(|a| a.model_url == model_url && a.joint_name == joint_name)
        {
            self.attachments.remove(index);
        }
    }
}

impl Overlays for HeadlessHost {
    fn add_overlay(&mut self, properties: OverlayProperties) -> OverlayId {
        let (index, generation) = self.overlays.insert(properties).into_raw_parts();
        OverlayId { index, generation }
    }

    fn edit_overlay(&mut self, id: OverlayId, edit: &OverlayEdit) -> GrabResult<()> {
        let overlay = self
            .overlays
            .get_mut(overlay_index(id))
            .ok_or(GrabError::UnknownOverlay)?;

        if let Some(color) = edit.color {
            overlay.color = color;
        }
        if let Some(visible) = edit.visible {
            overlay.visible = visible;
        }
        match &mut overlay.shape {
            OverlayShape::Line3d { start, end, .. } => {
                if let Some(s) = edit.start {
                    *start = s;
                }
                if let Some(e) = edit.end {
                    *end = e;
                }
            }
            OverlayShape::Sphere { position, .. } => {
                if let Some(p) = edit.position {
                    *position = p;
                }
            }
            OverlayShape::Text { text, .. } => {
                if let Some(t) = &edit.text {
                    *text = t.clone();
                }
            }
            OverlayShape::Image { .. } => {}
        }

        Ok(())
    }

    fn delete_overlay(&mut self, id: OverlayId) {
        self.overlays.remove(overlay_index(id));
    }
}

impl Viewpoint for HeadlessHost {
    fn camera_position(&self) -> Vec3 {
        self.camera_position
    }

    fn camera_orientation(&self) -> Quat {
        self.camera_orientation
    }

    fn viewport_dimensions(&self) -> Vec2 {
        self.viewport
    }
}

impl Audio for HeadlessHost {
    fn play_sound(&mut self, sound: &str, position: Vec3, volume: f32) {
        self.sounds.push(PlayedSound {
            name: sound.to_string(),
            position,
            volume,
        });
    }
}

impl Controllers for HeadlessHost {
    fn controllers_connected(&self) -> bool {
        self.controllers_connected
    }

    fn hand_input(&self, handedness: Handedness) -> HandInput {
        self.hands[hand_index(handedness)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube_at(position: Vec3) -> EntityProperties {
        EntityProperties {
            kind: EntityKind::Box,
            position,
            dimensions: Vec3::splat(0.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_ray_intersection_finds_nearest() {
        let mut host = HeadlessHost::new();
        let far = host.add_entity(cube_at([0., 0., -5.].into()));
        let near = host.add_entity(cube_at([0., 0., -2.].into()));

        let ray = PickRay {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        };
        let hit = host.find_ray_intersection(&ray).unwrap();
        assert_eq!(hit.entity, near);
        assert!(hit.accurate);
        assert_relative_eq!(hit.distance, 1.75, epsilon = 1e-4);

        host.delete_entity(near).unwrap();
        assert_eq!(host.find_ray_intersection(&ray).unwrap().entity, far);

        let miss = PickRay {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        };
        assert!(host.find_ray_intersection(&miss).is_none());
    }

    #[test]
    fn test_deferred_identification() {
        let mut host = HeadlessHost::new();
        host.defer_identification = true;
        let id = host.add_entity(cube_at(Vec3::ZERO));
        assert!(host.resolve(id).is_none());
        assert!(host.entity_properties(id).is_some());

        host.identify_pending();
        assert_eq!(host.resolve(id), Some(id));

        host.delete_entity(id).unwrap();
        assert!(host.resolve(id).is_none());
        assert!(matches!(
            host.delete_entity(id),
            Err(GrabError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_step_integrates_and_expires() {
        let mut host = HeadlessHost::new();
        let id = host.add_entity(EntityProperties {
            velocity: [1., 0., 0.].into(),
            gravity: [0., -1., 0.].into(),
            lifetime: Some(1.5),
            ignore_collisions: true,
            ..Default::default()
        });

        host.step(1.0);
        let properties = host.entity_properties(id).unwrap();
        assert_relative_eq!(properties.position, Vec3::new(1., -1., 0.), epsilon = 1e-3);
        assert_relative_eq!(properties.velocity, Vec3::new(1., -1., 0.), epsilon = 1e-3);

        host.step(1.0);
        assert!(host.entity_properties(id).is_none());
        assert!(host.step(1.0).is_empty());
    }

    #[test]
    fn test_step_applies_damping() {
        let mut host = HeadlessHost::new();
        let id = host.add_entity(EntityProperties {
            velocity: [0., 0., -2.].into(),
            damping: 0.5,
            ignore_collisions: true,
            ..Default::default()
        });

        for _ in 0..60 {
            host.step(1. / 60.);
        }
        let properties = host.entity_properties(id).unwrap();
        assert_relative_eq!(properties.velocity.z, -1., epsilon = 0.05);
        assert!(properties.position.z < -1.);
    }

    #[test]
    fn test_step_reports_new_contacts_once() {
        let mut host = HeadlessHost::new();
        let a = host.add_entity(cube_at(Vec3::ZERO));
        let b = host.add_entity(EntityProperties {
            kind: EntityKind::Sphere,
            position: [0.3, 0., 0.].into(),
            dimensions: Vec3::splat(0.2),
            ..Default::default()
        });
        let _far = host.add_entity(cube_at([10., 0., 0.].into()));

        let contacts = host.step(1. / 60.);
        assert_eq!(contacts, vec![(a.min(b), a.max(b))]);

        // Still touching, so nothing new
        assert!(host.step(1. / 60.).is_empty());
    }

    #[test]
    fn test_edits_move_colliders() {
        let mut host = HeadlessHost::new();
        let a = host.add_entity(cube_at(Vec3::ZERO));
        let b = host.add_entity(cube_at([5., 0., 0.].into()));
        assert!(host.step(1. / 60.).is_empty());

        let edit = EntityEdit {
            position: Some([0.4, 0., 0.].into()),
            ..Default::default()
        };
        host.edit_entity(b, &edit).unwrap();
        assert_eq!(host.step(1. / 60.), vec![(a.min(b), a.max(b))]);
        assert_relative_eq!(host.entity_properties(b).unwrap().position, Vec3::new(0.4, 0., 0.));

        // Shrinking one of them pulls them apart, growing it back is a new contact
        let shrink = EntityEdit {
            dimensions: Some(Vec3::splat(0.1)),
            ..Default::default()
        };
        host.edit_entity(b, &shrink).unwrap();
        assert!(host.step(1. / 60.).is_empty());
        let grow = EntityEdit {
            dimensions: Some(Vec3::splat(0.5)),
            ..Default::default()
        };
        host.edit_entity(b, &grow).unwrap();
        assert_eq!(host.step(1. / 60.), vec![(a.min(b), a.max(b))]);
    }

    #[test]
    fn test_deleted_and_ignored_entities_never_touch() {
        let mut host = HeadlessHost::new();
        let _ghost = host.add_entity(EntityProperties {
            ignore_collisions: true,
            ..cube_at(Vec3::ZERO)
        });
        let doomed = host.add_entity(cube_at([0.2, 0., 0.].into()));
        host.delete_entity(doomed).unwrap();

        assert!(host.step(1. / 60.).is_empty());
        assert_eq!(host.entity_ids().len(), 1);
    }

    #[test]
    fn test_joint_overrides_and_attachments() {
        let mut host = HeadlessHost::new();
        let rest = Quat::from_rotation_x(0.3);
        host.add_joint("LeftForeArm", Vec3::ZERO, rest);

        let bent = Quat::from_rotation_z(0.5);
        host.set_joint_rotation("LeftForeArm", bent).unwrap();
        assert_eq!(host.joint_rotation("LeftForeArm"), Some(bent));
        host.clear_joint_rotation("LeftForeArm");
        assert_eq!(host.joint_rotation("LeftForeArm"), Some(rest));
        assert!(host.set_joint_rotation("Tail", bent).is_err());

        let attachment = AttachmentData {
            model_url: "gun.fst".into(),
            joint_name: "LeftForeArm".into(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 0.2,
            is_soft: false,
        };
        host.attach(attachment.clone(), false).unwrap();
        host.attach(attachment.clone(), false).unwrap();
        assert_eq!(host.attachments().len(), 1);
        host.attach(attachment, true).unwrap();
        assert_eq!(host.attachments().len(), 2);

        host.detach_one("gun.fst", "LeftForeArm");
        assert_eq!(host.attachments().len(), 1);
    }

    #[test]
    fn test_overlays() {
        let mut host = HeadlessHost::new();
        let id = host.add_overlay(OverlayProperties {
            shape: OverlayShape::Line3d {
                start: Vec3::ZERO,
                end: Vec3::ZERO,
                width: 4.,
            },
            color: crate::contexts::host::Color::RED,
            alpha: 1.,
            visible: false,
            anchored_to_avatar: true,
        });

        host.edit_overlay(
            id,
            &OverlayEdit {
                end: Some(Vec3::X),
                visible: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        let overlay = host.overlays.get(overlay_index(id)).unwrap();
        assert!(overlay.visible);
        assert_eq!(
            overlay.shape,
            OverlayShape::Line3d {
                start: Vec3::ZERO,
                end: Vec3::X,
                width: 4.
            }
        );

        host.delete_overlay(id);
        assert!(host.edit_overlay(id, &OverlayEdit::default()).is_err());
    }
}
