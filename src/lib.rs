//! Real-time telemetry panels for a simulation backend.
//!
//! Each panel samples a shared state snapshot on its own interval into a
//! fixed-size [`ring::RingBuffer`] and redraws every display frame through
//! a [`render_loop::RenderLoop`].

pub mod app;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod render;
pub mod render_loop;
pub mod ring;
pub mod sample;
pub mod sampler;
pub mod snapshot;
pub mod surface;
pub mod ui;
pub mod util;

pub use error::ScopeError;
