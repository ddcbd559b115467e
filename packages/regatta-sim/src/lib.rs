//! # regatta-sim
//!
//! Core of a small-boat sailing race: wind field, sailing physics shared by
//! every boat, autopilot skippers, procedural courses, race progress and
//! series scoring. Rendering and input devices live outside; they read
//! `TickSnapshot`s and feed `ControlCommand`s.
//!
//! ```text
//!   host ──ControlCommand──▶ Simulation::apply
//!   host ──dt──────────────▶ Simulation::tick ──▶ RaceEvents
//!   host ◀─TickSnapshot──── Simulation::snapshot
//! ```

pub mod boat;
pub mod collision;
pub mod config;
pub mod course;
pub mod geometry;
pub mod navigation;
pub mod progress;
pub mod propulsion;
pub mod scoring;
pub mod simulation;
pub mod wind;

pub use boat::{Boat, Helm, TrimIntent};
pub use config::{ConfigError, SimConfig};
pub use course::Course;
pub use simulation::{RaceEvent, Simulation};
