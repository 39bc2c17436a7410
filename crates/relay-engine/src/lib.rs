//! Relay engine crate.
//!
//! Renders continuously on a dedicated thread while the window's event loop
//! keeps ownership of the surface. See [`coordinator`] for the threading model.

pub mod coordinator;
pub mod coords;
pub mod device;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
