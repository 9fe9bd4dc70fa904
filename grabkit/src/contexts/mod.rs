#![allow(missing_docs)]
pub mod headless_host;
pub mod host;
pub mod input_context;

pub use headless_host::HeadlessHost;
pub use host::Host;
pub use input_context::InputContext;
