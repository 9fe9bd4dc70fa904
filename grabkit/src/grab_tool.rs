use log::{debug, info};

use crate::{
    components::{GrabMode, Hand, Handedness},
    config::GrabConfig,
    contexts::{host::EntityId, Host, InputContext},
    systems::{
        grabbing_system, hands_system, hover_system, lasers_system, move_held_entity,
        two_hand_system, Laser,
    },
};

/// The grab tool
/// Owns both hands, the shared grab mode and the lasers, and moves them all forward once per tick.
/// **IMPORTANT**: make sure you call `update` each tick, and `shutdown` when you're done.
pub struct GrabTool {
    hands: [Hand; 2],
    mode: GrabMode,
    config: GrabConfig,
    input_context: InputContext,
    lasers: [Laser; 2],
}

impl GrabTool {
    /// Create the tool, adding its laser overlays to the host
    pub fn new<H: Host + ?Sized>(host: &mut H, config: GrabConfig) -> Self {
        let lasers = [
            Laser::new(Handedness::Left, host, &config),
            Laser::new(Handedness::Right, host, &config),
        ];
        info!("Grab tool ready");

        Self {
            hands: [Hand::left(), Hand::right()],
            mode: Default::default(),
            config,
            input_context: Default::default(),
            lasers,
        }
    }

    /// Run one tick: sample the controllers, then pick up, move and let go of entities.
    ///
    /// Nothing happens while the controllers are disconnected, apart from the lasers being hidden.
    pub fn update<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.input_context.update(&*host);
        if !self.input_context.connected() {
            for laser in &self.lasers {
                laser.show(host, false);
            }
            return;
        }

        let avatar_orientation = host.avatar_orientation();
        hands_system(
            &mut self.hands,
            &self.input_context,
            avatar_orientation,
            &mut self.mode,
            &self.config,
        );
        lasers_system(&self.lasers, &self.hands, self.mode, &self.config, host);
        hover_system(&mut self.hands, &self.config, host);
        grabbing_system(&mut self.hands, &self.config, host);

        if !two_hand_system(&mut self.hands, self.mode, &self.config, host) {
            for hand in &mut self.hands {
                move_held_entity(hand, self.mode, host);
            }
        }
    }

    /// Delete whatever the left hand is holding, or failing that the right hand.
    /// Returns the deleted entity, if there was one.
    pub fn delete_held_entity<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<EntityId> {
        let entity = self
            .hands
            .iter()
            .find_map(|hand| hand.grabbed_entity())?;

        // Both hands may have hold of it
        for hand in &mut self.hands {
            if hand.grabbed_entity() == Some(entity) {
                hand.state = Default::default();
            }
        }

        if let Some(entity) = host.resolve(entity) {
            if let Err(e) = host.delete_entity(entity) {
                debug!("Unable to delete {entity:?}: {e}");
            }
        }
        info!("Deleted held entity {entity:?}");
        Some(entity)
    }

    /// Allow (or stop allowing) entities that look too big to be picked
    pub fn set_allow_large(&mut self, allow: bool) {
        self.config.allow_large = allow;
    }

    /// Allow (or stop allowing) entities that look too small to be picked
    pub fn set_allow_small(&mut self, allow: bool) {
        self.config.allow_small = allow;
    }

    /// Remove the tool's overlays from the host
    pub fn shutdown<H: Host + ?Sized>(self, host: &mut H) {
        for laser in self.lasers {
            laser.delete(host);
        }
        info!("Grab tool shut down");
    }

    /// Get one of the hands
    pub fn hand(&self, handedness: Handedness) -> &Hand {
        match handedness {
            Handedness::Left => &self.hands[0],
            Handedness::Right => &self.hands[1],
        }
    }

    /// The grab mode both hands are in
    pub fn mode(&self) -> GrabMode {
        self.mode
    }

    /// The tool's current configuration
    pub fn config(&self) -> &GrabConfig {
        &self.config
    }
}
