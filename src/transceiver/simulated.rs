use super::{RadioError, ReceiveOutcome, Transceiver};
use crate::config::RadioConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read receive script: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid receive script: {0}")]
    Json(#[from] serde_json::Error),
}

/// One scripted receive result.
///
/// JSON form: `{"outcome":"frame","text":"FOSSASAT-13","frequency_error_hz":120.0}`,
/// `{"outcome":"timeout"}`, `{"outcome":"crc_mismatch"}`, `{"outcome":"unknown","code":-2}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptedReceive {
    Frame {
        text: String,
        #[serde(default)]
        frequency_error_hz: f32,
    },
    Timeout,
    CrcMismatch,
    Unknown {
        code: i16,
    },
}

impl ScriptedReceive {
    pub fn frame(text: impl Into<String>) -> Self {
        ScriptedReceive::Frame {
            text: text.into(),
            frequency_error_hz: 0.0,
        }
    }

    pub fn frame_with_error(text: impl Into<String>, frequency_error_hz: f32) -> Self {
        ScriptedReceive::Frame {
            text: text.into(),
            frequency_error_hz,
        }
    }
}

/// Scripted stand-in for the LoRa chip. Replays receive results in order,
/// reports `Timeout` once the script runs out, and records every command the
/// station issues.
#[derive(Debug, Default)]
pub struct SimulatedTransceiver {
    script: VecDeque<ScriptedReceive>,
    begin_error: Option<i16>,
    send_error: Option<i16>,
    frequency_error: Option<i16>,
    bandwidth_error: Option<i16>,
    online_config: Option<RadioConfig>,
    last_frequency_error_hz: f32,

    frequency_mhz: f32,
    bandwidth_khz: f32,

    // Command log
    frequency_commands: Vec<f32>,
    bandwidth_commands: Vec<f32>,
    sent_frames: Vec<String>,
    frequency_error_reads: usize,
    receive_calls: usize,
}

impl SimulatedTransceiver {
    pub fn new(script: Vec<ScriptedReceive>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let script: Vec<ScriptedReceive> = serde_json::from_str(json)?;
        Ok(Self::new(script))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Makes `begin` fail with the given driver code.
    pub fn failing_begin(mut self, code: i16) -> Self {
        self.begin_error = Some(code);
        self
    }

    /// Makes every `send` fail with the given driver code.
    pub fn failing_send(mut self, code: i16) -> Self {
        self.send_error = Some(code);
        self
    }

    /// Makes every `set_frequency` fail with the given driver code. Failed
    /// attempts are still logged in `frequency_commands`.
    pub fn failing_set_frequency(mut self, code: i16) -> Self {
        self.frequency_error = Some(code);
        self
    }

    /// Makes every `set_bandwidth` fail with the given driver code. Failed
    /// attempts are still logged in `bandwidth_commands`.
    pub fn failing_set_bandwidth(mut self, code: i16) -> Self {
        self.bandwidth_error = Some(code);
        self
    }

    /// Lets frequency and bandwidth commands succeed again.
    pub fn clear_command_errors(&mut self) {
        self.frequency_error = None;
        self.bandwidth_error = None;
    }

    pub fn push(&mut self, entry: ScriptedReceive) {
        self.script.push_back(entry);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn is_online(&self) -> bool {
        self.online_config.is_some()
    }

    pub fn online_config(&self) -> Option<&RadioConfig> {
        self.online_config.as_ref()
    }

    pub fn frequency_mhz(&self) -> f32 {
        self.frequency_mhz
    }

    pub fn bandwidth_khz(&self) -> f32 {
        self.bandwidth_khz
    }

    pub fn frequency_commands(&self) -> &[f32] {
        &self.frequency_commands
    }

    pub fn bandwidth_commands(&self) -> &[f32] {
        &self.bandwidth_commands
    }

    pub fn sent_frames(&self) -> &[String] {
        &self.sent_frames
    }

    pub fn frequency_error_reads(&self) -> usize {
        self.frequency_error_reads
    }

    pub fn receive_calls(&self) -> usize {
        self.receive_calls
    }
}

impl Transceiver for SimulatedTransceiver {
    fn begin(&mut self, config: &RadioConfig) -> Result<(), RadioError> {
        if let Some(code) = self.begin_error {
            return Err(RadioError::new(code));
        }

        self.frequency_mhz = config.carrier_frequency_mhz;
        self.bandwidth_khz = config.bandwidth_khz;
        self.online_config = Some(config.clone());
        Ok(())
    }

    fn receive(&mut self) -> ReceiveOutcome {
        self.receive_calls += 1;

        match self.script.pop_front() {
            Some(ScriptedReceive::Frame {
                text,
                frequency_error_hz,
            }) => {
                self.last_frequency_error_hz = frequency_error_hz;
                ReceiveOutcome::Frame(text)
            }
            Some(ScriptedReceive::Timeout) | None => ReceiveOutcome::Timeout,
            Some(ScriptedReceive::CrcMismatch) => ReceiveOutcome::CrcMismatch,
            Some(ScriptedReceive::Unknown { code }) => ReceiveOutcome::Unknown(code),
        }
    }

    fn frequency_error_hz(&mut self) -> f32 {
        self.frequency_error_reads += 1;
        self.last_frequency_error_hz
    }

    fn set_frequency(&mut self, mhz: f32) -> Result<(), RadioError> {
        self.frequency_commands.push(mhz);
        if let Some(code) = self.frequency_error {
            return Err(RadioError::new(code));
        }
        self.frequency_mhz = mhz;
        Ok(())
    }

    fn set_bandwidth(&mut self, khz: f32) -> Result<(), RadioError> {
        self.bandwidth_commands.push(khz);
        if let Some(code) = self.bandwidth_error {
            return Err(RadioError::new(code));
        }
        self.bandwidth_khz = khz;
        Ok(())
    }

    fn send(&mut self, frame: &str) -> Result<(), RadioError> {
        if let Some(code) = self.send_error {
            return Err(RadioError::new(code));
        }
        self.sent_frames.push(frame.to_string());
        Ok(())
    }
}
