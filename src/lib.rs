//! # Ground Station Link Controller
//!
//! Control loop of a ground station that keeps a half-duplex LoRa link with a
//! single orbiting satellite, decodes its telemetry frames, and adapts the
//! receiver bandwidth to reacquire the signal after it is lost.
//!
//! ## Features
//!
//! - **Frame parsing**: positional signature / function id / payload split, total on any input
//! - **Telemetry dispatch**: exhaustive function-id routing to a [`TelemetryHandler`]
//! - **Link acquisition**: wide-bandwidth search and narrow-bandwidth tracking modes
//! - **Uplink intents**: one-shot ping / stop / start requests drained in fixed order
//! - **Simulation**: scripted transceiver for running the loop without hardware
//!
//! ## Quick Start
//!
//! ```rust
//! use groundlink::{GroundStation, MissionRecorder, ScriptedReceive, SimulatedTransceiver, StationConfig};
//!
//! let radio = SimulatedTransceiver::new(vec![ScriptedReceive::frame("FOSSASAT-13")]);
//! let mut station = GroundStation::new(StationConfig::default(), radio, MissionRecorder::new()).unwrap();
//!
//! station.begin().unwrap();
//! let report = station.step().unwrap();
//! assert!(report.event.is_some());
//! assert!(station.handler().get_state().satellite_online);
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - Frame layout, function ids, uplink encoding
//! - [`dispatch`] - Function id to telemetry event routing
//! - [`link`] - Bandwidth-mode state machine
//! - [`intents`] - Transmit request queue
//! - [`transceiver`] - Radio boundary and the simulated radio
//! - [`handlers`] - Default mission recorder
//! - [`station`] - The control loop
//! - [`config`] - Station and radio configuration

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod intents;
pub mod link;
pub mod protocol;
pub mod station;
pub mod transceiver;

// Re-export main public types for convenience
pub use config::{RadioConfig, StationConfig};
pub use dispatch::{dispatch, TelemetryEvent, TelemetryHandler};
pub use handlers::{MissionRecorder, MissionState};
pub use intents::{TransmitIntent, TransmitQueue};
pub use link::{BandwidthMode, LinkPlan, LinkState, LinkTransition};
pub use protocol::{parse, FunctionId, ParsedFrame};
pub use station::{GroundStation, IterationReport, StationContext, StationError};
pub use transceiver::{RadioError, ReceiveOutcome, ScriptedReceive, SimulatedTransceiver, Transceiver};
