//! Engine ownership, endpoint selection, and the driver loop for the
//! Trailwear simulation.
//!
//! This crate wires the terrain search into a self-pacing simulation:
//! pick two settlements, find the cheapest route between them, reinforce
//! it, report it, and wait for the consumer before doing it again.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `trailwear-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`Engine`], the single owner of terrain and settlement
//!   state.
//! - [`selection`] -- Population-weighted start and distance-damped end
//!   selection.
//! - [`channel`] -- [`EventSink`] and progress batch sizing.
//! - [`control`] -- [`ControlState`] for start, advance, and stop signals.
//! - [`runner`] -- [`run_simulation`], the driver state machine.
//!
//! [`Engine`]: engine::Engine
//! [`EventSink`]: channel::EventSink
//! [`ControlState`]: control::ControlState
//! [`run_simulation`]: runner::run_simulation

pub mod channel;
pub mod config;
pub mod control;
pub mod engine;
pub mod runner;
pub mod selection;
