pub mod simulated;

pub use simulated::{ScriptError, ScriptedReceive, SimulatedTransceiver};

use crate::config::RadioConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status code reported by the radio driver for a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("transceiver error code {code}")]
pub struct RadioError {
    pub code: i16,
}

impl RadioError {
    pub fn new(code: i16) -> Self {
        Self { code }
    }
}

/// Result of one blocking receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Frame(String),
    Timeout,
    CrcMismatch,
    /// Any other driver status.
    Unknown(i16),
}

impl ReceiveOutcome {
    pub fn is_frame(&self) -> bool {
        matches!(self, ReceiveOutcome::Frame(_))
    }
}

/// The half-duplex radio the station drives. Implementations own the physical
/// device; the station issues one command at a time.
pub trait Transceiver {
    /// Brings the radio online with the configured modem parameters.
    fn begin(&mut self, config: &RadioConfig) -> Result<(), RadioError>;

    /// Blocks until a frame arrives or the driver's receive timeout expires.
    fn receive(&mut self) -> ReceiveOutcome;

    /// Carrier offset of the last received frame in Hz. Only meaningful
    /// straight after a successful receive.
    fn frequency_error_hz(&mut self) -> f32;

    fn set_frequency(&mut self, mhz: f32) -> Result<(), RadioError>;

    fn set_bandwidth(&mut self, khz: f32) -> Result<(), RadioError>;

    fn send(&mut self, frame: &str) -> Result<(), RadioError>;
}
