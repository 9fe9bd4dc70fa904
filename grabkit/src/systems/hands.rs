use glam::Quat;
use log::debug;

use crate::{
    components::{hand::TriggerState, GrabMode, Hand, HandPose},
    config::GrabConfig,
    contexts::{input_context::HandInputContext, InputContext},
    util::normalize_or,
};

/// Hands system
/// Samples each hand's pose and trigger from the input context, and toggles the shared grab mode
/// whenever a bumper goes down.
pub fn hands_system(
    hands: &mut [Hand; 2],
    input_context: &InputContext,
    avatar_orientation: Quat,
    mode: &mut GrabMode,
    config: &GrabConfig,
) {
    for hand in hands.iter_mut() {
        let input = input_context.hand(hand.handedness);
        sample_hand(hand, input, avatar_orientation, config);

        if input.bumper_just_pressed() {
            *mode = mode.toggled();
            debug!("{:?} bumper pressed, grab mode is now {:?}", hand.handedness, mode);
        }
    }
}

/// Update a single hand from its controller input
pub fn sample_hand(
    hand: &mut Hand,
    input: &HandInputContext,
    avatar_orientation: Quat,
    config: &GrabConfig,
) {
    let previous = hand.pose;
    let palm = input.palm_position();
    let tip = input.tip_position();
    let up = normalize_or(input.palm_normal(), previous.up);
    let front = normalize_or(tip - palm, previous.front);
    let right = normalize_or(front.cross(up), previous.right);

    hand.pose = HandPose {
        palm,
        tip,
        up,
        front,
        right,
        rotation: avatar_orientation * input.raw_rotation(),
    };
    hand.previous_pose = if hand.has_been_sampled {
        previous
    } else {
        hand.pose
    };
    hand.has_been_sampled = true;

    hand.trigger = next_trigger_state(hand.trigger, input.trigger_analog(), config);
}

/// Work out whether the trigger is held, and whether it was pressed this tick.
///
/// A trigger that isn't pressed needs to pass `grab_threshold` to become pressed; one that is
/// pressed stays pressed until it drops to `release_threshold`.
pub fn next_trigger_state(previous: TriggerState, value: f32, config: &GrabConfig) -> TriggerState {
    let pressed = if previous.pressed {
        value > config.release_threshold
    } else {
        value > config.grab_threshold
    };

    TriggerState {
        value,
        pressed,
        pressing: pressed && !previous.pressed,
    }
}
