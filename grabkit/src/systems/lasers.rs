use glam::{Quat, Vec3};
use log::debug;

use crate::{
    components::{GrabMode, Hand, Handedness},
    config::GrabConfig,
    contexts::{
        host::{
            Color, EntityEdit, EntityId, OverlayEdit, OverlayId, OverlayProperties, OverlayShape,
            Overlays,
        },
        Host,
    },
    systems::pick::{angular_size, angular_size_ok},
    util::normalize_or,
};

/// The overlays drawn for one hand: a beam along the aim ray, with a ball and a small cross at
/// the far end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Laser {
    pub handedness: Handedness,
    pub beam: OverlayId,
    pub ball: OverlayId,
    pub left_right: OverlayId,
    pub top_down: OverlayId,
}

impl Laser {
    /// Create the (hidden) overlays for one hand
    pub fn new<O: Overlays + ?Sized>(
        handedness: Handedness,
        overlays: &mut O,
        config: &GrabConfig,
    ) -> Self {
        let line = |color| OverlayProperties {
            shape: OverlayShape::Line3d {
                start: Vec3::ZERO,
                end: Vec3::ZERO,
                width: config.laser_width,
            },
            color,
            alpha: 1.,
            visible: false,
            anchored_to_avatar: true,
        };

        let beam = overlays.add_overlay(line(beam_color(GrabMode::Direct)));
        let ball = overlays.add_overlay(OverlayProperties {
            shape: OverlayShape::Sphere {
                position: Vec3::ZERO,
                size: config.guide_scale,
                solid: true,
            },
            color: Color::GREEN,
            alpha: 1.,
            visible: false,
            anchored_to_avatar: true,
        });
        let left_right = overlays.add_overlay(line(Color::BLUE));
        let top_down = overlays.add_overlay(line(Color::BLUE));

        Self {
            handedness,
            beam,
            ball,
            left_right,
            top_down,
        }
    }

    fn overlays(&self) -> [OverlayId; 4] {
        [self.beam, self.ball, self.left_right, self.top_down]
    }

    /// Show or hide every part of the laser
    pub fn show<O: Overlays + ?Sized>(&self, overlays: &mut O, visible: bool) {
        let edit = OverlayEdit {
            visible: Some(visible),
            ..Default::default()
        };
        for id in self.overlays() {
            if let Err(e) = overlays.edit_overlay(id, &edit) {
                debug!("Unable to show {:?} laser: {e}", self.handedness);
            }
        }
    }

    /// Remove the laser's overlays from the host
    pub fn delete<O: Overlays + ?Sized>(self, overlays: &mut O) {
        for id in self.overlays() {
            overlays.delete_overlay(id);
        }
    }
}

fn beam_color(mode: GrabMode) -> Color {
    match mode {
        GrabMode::Direct => Color::RED,
        GrabMode::Projected => Color::BLUE,
    }
}

/// Lasers system
/// Points each hand's laser along its aim ray. Overlays are anchored to the avatar, so everything
/// is expressed in the avatar's local frame.
pub fn lasers_system<H: Host + ?Sized>(
    lasers: &[Laser; 2],
    hands: &[Hand; 2],
    mode: GrabMode,
    config: &GrabConfig,
    host: &mut H,
) {
    let avatar_position = host.avatar_position();
    let avatar_from_world = host.avatar_orientation().inverse();

    for (laser, hand) in lasers.iter().zip(hands) {
        let edits = laser_edits(hand, mode, avatar_position, avatar_from_world, config);
        for (id, edit) in laser.overlays().into_iter().zip(edits) {
            if let Err(e) = host.edit_overlay(id, &edit) {
                debug!("Unable to move {:?} laser: {e}", hand.handedness);
            }
        }
    }
}

fn laser_edits(
    hand: &Hand,
    mode: GrabMode,
    avatar_position: Vec3,
    avatar_from_world: Quat,
    config: &GrabConfig,
) -> [OverlayEdit; 4] {
    let pose = &hand.pose;
    let start = avatar_from_world * (pose.palm - avatar_position);
    let direction = normalize_or(
        avatar_from_world * (pose.tip - pose.palm),
        avatar_from_world * pose.front,
    );
    let end = start + direction * config.laser_length;
    let right = avatar_from_world * pose.right * 2. * config.guide_scale;
    let up = avatar_from_world * pose.up * 2. * config.guide_scale;
    let visible = Some(!hand.is_grabbing() || mode == GrabMode::Direct);

    [
        OverlayEdit {
            start: Some(start),
            end: Some(end),
            color: Some(beam_color(mode)),
            visible,
            ..Default::default()
        },
        OverlayEdit {
            position: Some(end),
            visible,
            ..Default::default()
        },
        OverlayEdit {
            start: Some(end + right),
            end: Some(end - right),
            visible,
            ..Default::default()
        },
        OverlayEdit {
            start: Some(end + up),
            end: Some(end - up),
            visible,
            ..Default::default()
        },
    ]
}

/// Hover system
/// Remembers which entity each idle hand is pointing at, and makes it glow if
/// `highlight_hovered` is on. The previous highlight is always cleared first.
pub fn hover_system<H: Host + ?Sized>(hands: &mut [Hand; 2], config: &GrabConfig, host: &mut H) {
    for hand in hands.iter_mut() {
        if let Some(previous) = hand.hovered.take() {
            if config.highlight_hovered {
                set_glow(host, previous, 0.);
            }
        }

        if hand.is_grabbing() {
            continue;
        }

        let intersection = match host.find_ray_intersection(&hand.pose.pick_ray()) {
            Some(intersection) if intersection.accurate => intersection,
            _ => continue,
        };
        let entity = match host.resolve(intersection.entity) {
            Some(entity) => entity,
            None => continue,
        };
        let properties = match host.entity_properties(entity) {
            Some(properties) => properties,
            None => continue,
        };

        let size = angular_size(
            properties.half_diagonal(),
            host.camera_position(),
            properties.position,
        );
        if !angular_size_ok(size, config) {
            continue;
        }

        hand.hovered = Some(entity);
        if config.highlight_hovered {
            set_glow(host, entity, config.highlight_glow_level);
        }
    }
}

fn set_glow<H: Host + ?Sized>(host: &mut H, entity: EntityId, level: f32) {
    let entity = match host.resolve(entity) {
        Some(entity) => entity,
        None => return,
    };
    let edit = EntityEdit {
        glow_level: Some(level),
        ..Default::default()
    };
    if let Err(e) = host.edit_entity(entity, &edit) {
        debug!("Unable to highlight {entity:?}: {e}");
    }
}
