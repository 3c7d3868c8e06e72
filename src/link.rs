use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{RadioConfig, MAX_CARRIER_FREQUENCY_MHZ, MIN_CARRIER_FREQUENCY_MHZ};
use crate::transceiver::{ReceiveOutcome, Transceiver};

const HZ_PER_MHZ: f32 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandwidthMode {
    /// Searching for the satellite on the default carrier.
    Wide,
    /// Tracking an acquired signal on a corrected carrier.
    Narrow,
}

/// Fixed radio settings the link falls back to or switches between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkPlan {
    pub default_carrier_mhz: f32,
    pub wide_bandwidth_khz: f32,
    pub narrow_bandwidth_khz: f32,
}

impl From<&RadioConfig> for LinkPlan {
    fn from(config: &RadioConfig) -> Self {
        Self {
            default_carrier_mhz: config.carrier_frequency_mhz,
            wide_bandwidth_khz: config.bandwidth_khz,
            narrow_bandwidth_khz: config.narrow_bandwidth_khz,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LinkTransition {
    None,
    /// Wide to narrow on a discovered signal.
    Acquired { carrier_frequency_mhz: f32 },
    /// Carrier correction while already narrow.
    Retuned { carrier_frequency_mhz: f32 },
    /// Narrow to wide after losing the signal.
    Lost,
}

/// Bandwidth-mode state of the single satellite link.
///
/// `Wide` always sits on the default carrier at the wide bandwidth; only
/// [`LinkState::acquire`] moves the link to `Narrow` and only a receive
/// timeout moves it back.
///
/// State always follows the transition even when the radio rejects a
/// command; `radio_in_sync` is cleared until a later reprogram succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkState {
    mode: BandwidthMode,
    carrier_frequency_mhz: f32,
    bandwidth_khz: f32,
    radio_in_sync: bool,
    plan: LinkPlan,
}

impl LinkState {
    pub fn new(plan: LinkPlan) -> Self {
        Self {
            mode: BandwidthMode::Wide,
            carrier_frequency_mhz: plan.default_carrier_mhz,
            bandwidth_khz: plan.wide_bandwidth_khz,
            radio_in_sync: true,
            plan,
        }
    }

    /// State of a link already tracking on `carrier_frequency_mhz`, for a
    /// radio that has been retuned there.
    pub fn tracking(plan: LinkPlan, carrier_frequency_mhz: f32) -> Self {
        Self {
            mode: BandwidthMode::Narrow,
            carrier_frequency_mhz,
            bandwidth_khz: plan.narrow_bandwidth_khz,
            radio_in_sync: true,
            plan,
        }
    }

    pub fn mode(&self) -> BandwidthMode {
        self.mode
    }

    pub fn is_tracking(&self) -> bool {
        self.mode == BandwidthMode::Narrow
    }

    pub fn carrier_frequency_mhz(&self) -> f32 {
        self.carrier_frequency_mhz
    }

    pub fn bandwidth_khz(&self) -> f32 {
        self.bandwidth_khz
    }

    pub fn plan(&self) -> &LinkPlan {
        &self.plan
    }

    /// False while the radio may still hold settings from before a failed
    /// frequency or bandwidth command.
    pub fn is_radio_in_sync(&self) -> bool {
        self.radio_in_sync
    }

    /// Reacts to a receive that produced no usable frame.
    ///
    /// Only a timeout while tracking changes state. Checksum errors and
    /// unrecognized driver codes are logged and leave the mode alone.
    pub fn on_receive_failure<R>(&mut self, outcome: &ReceiveOutcome, radio: &mut R) -> LinkTransition
    where
        R: Transceiver + ?Sized,
    {
        match outcome {
            ReceiveOutcome::Timeout => self.on_timeout(radio),
            ReceiveOutcome::CrcMismatch => {
                info!("CRC error, frame dropped ({:?} mode kept)", self.mode);
                LinkTransition::None
            }
            ReceiveOutcome::Unknown(code) => {
                info!("Receive failed with driver code {}, treated as CRC error", code);
                LinkTransition::None
            }
            ReceiveOutcome::Frame(_) => {
                debug!("Frame outcome passed to link failure handling, ignored");
                LinkTransition::None
            }
        }
    }

    fn on_timeout<R>(&mut self, radio: &mut R) -> LinkTransition
    where
        R: Transceiver + ?Sized,
    {
        info!("Receive timeout");

        match self.mode {
            BandwidthMode::Narrow => {
                info!("Signal lost, switching back to wide bandwidth mode");

                self.mode = BandwidthMode::Wide;
                self.carrier_frequency_mhz = self.plan.default_carrier_mhz;
                self.bandwidth_khz = self.plan.wide_bandwidth_khz;
                self.radio_in_sync = self.program_search(radio);

                LinkTransition::Lost
            }
            BandwidthMode::Wide => {
                info!("Satellite not found, listening in wide bandwidth mode");

                if !self.radio_in_sync {
                    warn!("Radio settings out of date, reprogramming search carrier");
                    self.radio_in_sync = self.program_search(radio);
                }

                LinkTransition::None
            }
        }
    }

    // Pushes the default carrier and wide bandwidth; true if both took.
    fn program_search<R>(&self, radio: &mut R) -> bool
    where
        R: Transceiver + ?Sized,
    {
        let mut ok = true;

        if let Err(e) = radio.set_frequency(self.carrier_frequency_mhz) {
            warn!("Failed to reset carrier to {} MHz: {}", self.carrier_frequency_mhz, e);
            ok = false;
        }
        if let Err(e) = radio.set_bandwidth(self.bandwidth_khz) {
            warn!("Failed to reset bandwidth to {} kHz: {}", self.bandwidth_khz, e);
            ok = false;
        }

        ok
    }

    /// Retunes toward a received signal and enters tracking mode.
    ///
    /// `frequency_error_hz` is the offset the radio measured on the frame that
    /// revealed the satellite; the carrier moves by that amount. A non-finite
    /// error, or one that would leave the tunable range, is discarded.
    pub fn acquire<R>(&mut self, frequency_error_hz: f32, radio: &mut R) -> LinkTransition
    where
        R: Transceiver + ?Sized,
    {
        let carrier_frequency_mhz = self.carrier_frequency_mhz + frequency_error_hz / HZ_PER_MHZ;
        if !frequency_error_hz.is_finite()
            || !(MIN_CARRIER_FREQUENCY_MHZ..=MAX_CARRIER_FREQUENCY_MHZ).contains(&carrier_frequency_mhz)
        {
            warn!(
                "Discarding frequency error {} Hz, carrier would be {} MHz",
                frequency_error_hz, carrier_frequency_mhz
            );
            return LinkTransition::None;
        }

        let was_tracking = self.is_tracking();
        // A bandwidth command that failed earlier is repeated on refinement
        let push_bandwidth = !was_tracking || !self.radio_in_sync;

        self.carrier_frequency_mhz = carrier_frequency_mhz;
        self.bandwidth_khz = self.plan.narrow_bandwidth_khz;
        self.mode = BandwidthMode::Narrow;

        let mut in_sync = true;
        if let Err(e) = radio.set_frequency(self.carrier_frequency_mhz) {
            warn!("Failed to retune carrier to {} MHz: {}", self.carrier_frequency_mhz, e);
            in_sync = false;
        }
        if push_bandwidth {
            if let Err(e) = radio.set_bandwidth(self.bandwidth_khz) {
                warn!("Failed to narrow bandwidth to {} kHz: {}", self.bandwidth_khz, e);
                in_sync = false;
            }
        }
        self.radio_in_sync = in_sync;

        if was_tracking {
            debug!(
                "Carrier refined by {} Hz to {} MHz",
                frequency_error_hz, self.carrier_frequency_mhz
            );
            LinkTransition::Retuned {
                carrier_frequency_mhz: self.carrier_frequency_mhz,
            }
        } else {
            info!(
                "Satellite acquired, tracking at {} MHz / {} kHz",
                self.carrier_frequency_mhz, self.bandwidth_khz
            );
            LinkTransition::Acquired {
                carrier_frequency_mhz: self.carrier_frequency_mhz,
            }
        }
    }
}
