use glam::{Quat, Vec3};

use crate::{
    components::hand::Handedness,
    contexts::host::{Controllers, HandInput},
};

#[derive(Debug, Default, Clone)]
/// One controller's input, with last tick's values kept around for edge detection.
pub struct HandInputContext {
    // boolean input
    bumper: bool,
    bumper_prev: bool,
    primary_button: bool,
    primary_button_prev: bool,
    // float input
    trigger_analog: f32,
    trigger_analog_prev: f32,
    // pose input
    palm_position: Vec3,
    tip_position: Vec3,
    palm_normal: Vec3,
    raw_rotation: Quat,
}

impl HandInputContext {
    pub fn bumper(&self) -> bool {
        self.bumper
    }
    pub fn bumper_just_pressed(&self) -> bool {
        self.bumper && !self.bumper_prev
    }
    pub fn bumper_just_released(&self) -> bool {
        !self.bumper && self.bumper_prev
    }
    pub fn primary_button(&self) -> bool {
        self.primary_button
    }
    pub fn primary_button_just_pressed(&self) -> bool {
        self.primary_button && !self.primary_button_prev
    }
    pub fn trigger_analog(&self) -> f32 {
        self.trigger_analog
    }
    pub fn trigger_analog_prev(&self) -> f32 {
        self.trigger_analog_prev
    }
    pub fn palm_position(&self) -> Vec3 {
        self.palm_position
    }
    pub fn tip_position(&self) -> Vec3 {
        self.tip_position
    }
    pub fn palm_normal(&self) -> Vec3 {
        self.palm_normal
    }
    pub fn raw_rotation(&self) -> Quat {
        self.raw_rotation
    }

    fn update(&mut self, input: HandInput) {
        self.bumper_prev = self.bumper;
        self.primary_button_prev = self.primary_button;
        self.trigger_analog_prev = self.trigger_analog;

        self.bumper = input.bumper;
        self.primary_button = input.primary_button;
        self.trigger_analog = input.trigger_value;
        self.palm_position = input.palm_position;
        self.tip_position = input.tip_position;
        self.palm_normal = input.palm_normal;
        self.raw_rotation = input.raw_rotation;
    }
}

#[derive(Debug, Default, Clone)]
/// Context that holds input state. Allows systems to query for input events without having to
/// worry about how the host delivers them.
pub struct InputContext {
    connected: bool,
    pub left: HandInputContext,
    pub right: HandInputContext,
}

impl InputContext {
    /// Synchronize the context state with the host. Call once at the start of each tick.
    pub fn update<C: Controllers + ?Sized>(&mut self, controllers: &C) {
        self.connected = controllers.controllers_connected();
        if !self.connected {
            return;
        }

        self.left.update(controllers.hand_input(Handedness::Left));
        self.right.update(controllers.hand_input(Handedness::Right));
    }

    /// Were tracked controllers present at the last update?
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn hand(&self, handedness: Handedness) -> &HandInputContext {
        match handedness {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }
}
