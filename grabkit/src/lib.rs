#![deny(missing_docs)]

//! Grab things with your hands! 👐
//!
//! `grabkit` is a small interaction layer for avatars driven by tracked motion controllers. Point a
//! hand at an entity, squeeze the trigger and it's yours: move it around with one hand, or grab it
//! with both hands to scale and rotate it. Let go of it close enough to one of your avatar's joints
//! and it becomes an attachment.
//!
//! `grabkit` doesn't own a scene, a physics engine or a skeleton. Everything it touches belongs to a
//! host, which it talks to through the traits in [`contexts::host`]. A [`contexts::HeadlessHost`] is
//! included so the whole thing can be driven (and tested) without an engine attached.
//!
//! # Getting started
//! Create a [`GrabTool`], then call [`GrabTool::update`] once per frame with your host. That's it.

pub use glam;
pub use hecs;
pub use rapier3d;

pub use grab_tool::GrabTool;
pub use grabkit_error::GrabError;

/// Components are the per-hand state the tool keeps between ticks
pub mod components;
/// Tunable constants for the grab tool
pub mod config;
/// Contexts wrap the host: its input, its scene and its avatar
pub mod contexts;
mod grab_tool;
mod grabkit_error;
/// Systems are functions called each tick to move state forward
pub mod systems;
/// Kitchen sink utility functions
pub mod util;

/// grabkit result type
pub type GrabResult<T> = std::result::Result<T, GrabError>;
