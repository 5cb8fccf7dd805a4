//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  Time is hand-cranked and readers are scripted,
//! so every run is deterministic and needs no rig.

mod acquisition_tests;
mod calibration_flow_tests;
mod mock_rig;
