//! Domain services used by HTTP routes and the CLI.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the generation pipeline and the preview lifecycle so
//! route handlers can stay focused on protocol translation.

pub mod attachment;
pub mod creation;
pub mod generation;
pub mod loading;
pub mod preview;
pub mod prompt;
pub mod recording;
pub mod studio;
