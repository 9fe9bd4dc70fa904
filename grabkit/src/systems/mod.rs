#![allow(missing_docs)]
pub mod grabbing;
pub mod hands;
pub mod lasers;
pub mod pick;
pub mod two_hand;

pub use grabbing::{grabbing_system, move_held_entity, release, try_grab, Release};
pub use hands::hands_system;
pub use lasers::{hover_system, lasers_system, Laser};
pub use two_hand::two_hand_system;
