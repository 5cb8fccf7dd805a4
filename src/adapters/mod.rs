//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter            | Implements        | Connects to                   |
//! |--------------------|-------------------|-------------------------------|
//! | `calibration_file` | CalibrationStore  | `dec-cal.txt` + backup / RAM  |
//! | `log_sink`         | NoticeSink        | `log` facade                  |
//! | `slot`             | SamplePort        | Reader thread latest value    |
//! | `sim`              | (publishes slots) | Simulated DAQ + declinometer  |
//! | `time`             | TimeSource        | `Instant` / manual clock      |

pub mod calibration_file;
pub mod log_sink;
pub mod sim;
pub mod slot;
pub mod time;
