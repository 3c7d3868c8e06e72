use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::protocol::{DEFAULT_PAYLOAD_MARKER, SIGNATURE_LEN};

pub const DEFAULT_SIGNATURE: &str = "FOSSASAT-1";
pub const DEFAULT_CARRIER_FREQUENCY_MHZ: f32 = 436.7;
pub const DEFAULT_BANDWIDTH_KHZ: f32 = 125.0;
pub const DEFAULT_NARROW_BANDWIDTH_KHZ: f32 = 20.8;
pub const DEFAULT_SPREADING_FACTOR: u8 = 11;
pub const DEFAULT_CODING_RATE: u8 = 8;
pub const DEFAULT_SYNC_WORD: u8 = 0x12;
pub const DEFAULT_OUTPUT_POWER_DBM: i8 = 17;
pub const DEFAULT_LOOP_DELAY_MS: u64 = 200;

// LoRa bandwidth steps supported by the SX127x family (kHz)
const LORA_BANDWIDTHS_KHZ: [f32; 10] = [7.8, 10.4, 15.6, 20.8, 31.25, 41.7, 62.5, 125.0, 250.0, 500.0];

pub const MIN_CARRIER_FREQUENCY_MHZ: f32 = 137.0;
pub const MAX_CARRIER_FREQUENCY_MHZ: f32 = 1020.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("signature must be exactly 10 characters, got {0:?}")]
    InvalidSignature(String),
    #[error("payload marker {0:?} must not be a digit")]
    InvalidPayloadMarker(char),
    #[error("carrier frequency {0} MHz outside 137-1020 MHz")]
    InvalidFrequency(f32),
    #[error("unsupported LoRa bandwidth {0} kHz")]
    InvalidBandwidth(f32),
    #[error("narrow bandwidth {narrow} kHz must be below wide bandwidth {wide} kHz")]
    NarrowNotNarrower { narrow: f32, wide: f32 },
    #[error("spreading factor {0} outside 6-12")]
    InvalidSpreadingFactor(u8),
    #[error("coding rate {0} outside 5-8")]
    InvalidCodingRate(u8),
    #[error("output power {0} dBm outside 2-17 dBm")]
    InvalidOutputPower(i8),
}

/// LoRa modem parameters used to bring the transceiver online and to
/// switch between search and tracking bandwidth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    pub carrier_frequency_mhz: f32,
    /// Wide (search) bandwidth.
    pub bandwidth_khz: f32,
    /// Narrow (tracking) bandwidth used once the satellite has been found.
    pub narrow_bandwidth_khz: f32,
    pub spreading_factor: u8,
    pub coding_rate: u8,
    pub sync_word: u8,
    pub output_power_dbm: i8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            carrier_frequency_mhz: DEFAULT_CARRIER_FREQUENCY_MHZ,
            bandwidth_khz: DEFAULT_BANDWIDTH_KHZ,
            narrow_bandwidth_khz: DEFAULT_NARROW_BANDWIDTH_KHZ,
            spreading_factor: DEFAULT_SPREADING_FACTOR,
            coding_rate: DEFAULT_CODING_RATE,
            sync_word: DEFAULT_SYNC_WORD,
            output_power_dbm: DEFAULT_OUTPUT_POWER_DBM,
        }
    }
}

impl RadioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CARRIER_FREQUENCY_MHZ..=MAX_CARRIER_FREQUENCY_MHZ).contains(&self.carrier_frequency_mhz) {
            return Err(ConfigError::InvalidFrequency(self.carrier_frequency_mhz));
        }

        for bandwidth in [self.bandwidth_khz, self.narrow_bandwidth_khz] {
            if !is_lora_bandwidth(bandwidth) {
                return Err(ConfigError::InvalidBandwidth(bandwidth));
            }
        }

        if self.narrow_bandwidth_khz >= self.bandwidth_khz {
            return Err(ConfigError::NarrowNotNarrower {
                narrow: self.narrow_bandwidth_khz,
                wide: self.bandwidth_khz,
            });
        }

        if !(6..=12).contains(&self.spreading_factor) {
            return Err(ConfigError::InvalidSpreadingFactor(self.spreading_factor));
        }

        if !(5..=8).contains(&self.coding_rate) {
            return Err(ConfigError::InvalidCodingRate(self.coding_rate));
        }

        if !(2..=17).contains(&self.output_power_dbm) {
            return Err(ConfigError::InvalidOutputPower(self.output_power_dbm));
        }

        Ok(())
    }
}

fn is_lora_bandwidth(khz: f32) -> bool {
    LORA_BANDWIDTHS_KHZ.iter().any(|step| (step - khz).abs() < 0.01)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Callsign prefixed to every outbound frame.
    pub signature: String,
    pub payload_marker: char,
    pub loop_delay_ms: u64,
    pub radio: RadioConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            signature: DEFAULT_SIGNATURE.to_string(),
            payload_marker: DEFAULT_PAYLOAD_MARKER,
            loop_delay_ms: DEFAULT_LOOP_DELAY_MS,
            radio: RadioConfig::default(),
        }
    }
}

impl StationConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: StationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signature.chars().count() != SIGNATURE_LEN {
            return Err(ConfigError::InvalidSignature(self.signature.clone()));
        }
        // Function ids are digits; a digit marker would split inside them
        if self.payload_marker.is_ascii_digit() {
            return Err(ConfigError::InvalidPayloadMarker(self.payload_marker));
        }
        self.radio.validate()
    }

    pub fn loop_delay(&self) -> Duration {
        Duration::from_millis(self.loop_delay_ms)
    }
}
