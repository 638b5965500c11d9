//! Board-agnostic core logic for the Opsis printer display
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or network implementations:
//!
//! - Fixed streaming buffer for the in-flight camera image
//! - HTTP fetch reader over a byte-stream abstraction
//! - Incremental JPEG decode/render pipeline
//! - Telemetry state model and topic dispatch
//! - Side-panel renderer and display surface partitioning
//! - Outer liveness loop over collaborator traits
//!
//! Everything renders against `embedded_graphics::DrawTarget<Color = Rgb565>`,
//! so the whole crate is testable on the host with an in-memory framebuffer.

#![deny(unsafe_code)]

pub mod app;
pub mod buffer;
pub mod config;
pub mod fetch;
pub mod panel;
pub mod pipeline;
pub mod surface;
pub mod telemetry;
pub mod traits;

#[cfg(test)]
mod testutil;
