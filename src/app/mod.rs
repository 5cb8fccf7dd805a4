//! Application core — observation control logic, no direct I/O.
//!
//! This module wires the sidereal clock, the timer multiplexer, the
//! declination curve and the observation protocol into the acquisition
//! loop.  All interaction with readers, storage and the operator happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without a rig.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
