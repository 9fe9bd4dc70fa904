/// Hands, their poses and their grab sessions
pub mod hand;

pub use hand::{GrabMode, GrabSession, GrabState, Hand, HandPose, Handedness};
