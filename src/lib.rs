//! Postergrid - tilted poster-grid wallpaper generator
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod compose;
pub mod config;
pub mod devices;
pub mod encode;
pub mod generator;
pub mod publish;
pub mod report;
