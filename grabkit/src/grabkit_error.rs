use thiserror::Error;

use crate::contexts::host::EntityId;

/// Everything that can go wrong when talking to the host.
///
/// None of these are fatal to a tick: the systems log them and carry on.
#[derive(Error, Debug)]
pub enum GrabError {
    /// The host has no entity with this id (it may have been deleted elsewhere)
    #[error("The entity {0:?} is not known to the host")]
    UnknownEntity(EntityId),
    /// The avatar has no joint with this name
    #[error("The avatar has no joint named {0}")]
    UnknownJoint(String),
    /// The overlay has already been deleted
    #[error("The overlay is not known to the host")]
    UnknownOverlay,
    /// A configuration file could not be parsed
    #[error("There was a problem parsing the configuration")]
    InvalidConfig(#[from] serde_json::Error),
    /// Reading a configuration file failed
    #[error(transparent)]
    IO(#[from] std::io::Error),
    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
