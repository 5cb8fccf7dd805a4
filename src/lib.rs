//! Radio-telescope acquisition core.
//!
//! Exposes the control modules for the `radiodaq` runner and for
//! integration testing.  Readers, storage and the operator interface are
//! reached only through the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod observation;
pub mod timers;

pub use error::{Error, Result};
