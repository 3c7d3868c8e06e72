use crate::config::{ConfigError, StationConfig};
use crate::dispatch::{dispatch, TelemetryEvent, TelemetryHandler};
use crate::intents::{TransmitIntent, TransmitQueue, MAX_PENDING_INTENTS};
use crate::link::{BandwidthMode, LinkPlan, LinkState, LinkTransition};
use crate::protocol;
use crate::transceiver::{RadioError, ReceiveOutcome, Transceiver};
use heapless::Vec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Mutable state shared between the loop and telemetry handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct StationContext {
    pub link: LinkState,
    pub intents: TransmitQueue,
}

impl StationContext {
    pub fn new(plan: LinkPlan) -> Self {
        Self {
            link: LinkState::new(plan),
            intents: TransmitQueue::new(),
        }
    }

    pub fn request_transmit(&mut self, intent: TransmitIntent) {
        self.intents.request(intent);
    }
}

#[derive(Debug, Error)]
pub enum StationError {
    #[error("transceiver failed to come online: {0}")]
    RadioInit(RadioError),
    #[error("station loop used before the transceiver came online")]
    NotStarted,
    #[error("invalid station configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationStats {
    pub iterations: u64,
    pub frames_received: u32,
    pub frames_dispatched: u32,
    pub frames_ignored: u32,
    pub timeouts: u32,
    pub crc_errors: u32,
    pub unknown_outcomes: u32,
    pub acquisitions: u32,
    pub link_losses: u32,
    pub frames_transmitted: u32,
    pub transmit_failures: u32,
}

/// Receive result of one iteration, without the frame text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiveKind {
    Frame,
    Timeout,
    CrcMismatch,
    Unknown(i16),
}

impl From<&ReceiveOutcome> for ReceiveKind {
    fn from(outcome: &ReceiveOutcome) -> Self {
        match outcome {
            ReceiveOutcome::Frame(_) => ReceiveKind::Frame,
            ReceiveOutcome::Timeout => ReceiveKind::Timeout,
            ReceiveOutcome::CrcMismatch => ReceiveKind::CrcMismatch,
            ReceiveOutcome::Unknown(code) => ReceiveKind::Unknown(*code),
        }
    }
}

/// What one loop iteration did.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub outcome: ReceiveKind,
    pub event: Option<TelemetryEvent>,
    pub transmitted: Vec<TransmitIntent, MAX_PENDING_INTENTS>,
    pub transition: LinkTransition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStatus {
    pub online: bool,
    pub uptime_seconds: u64,
    pub mode: BandwidthMode,
    pub carrier_frequency_mhz: f32,
    pub bandwidth_khz: f32,
    pub pending_intents: usize,
    pub stats: StationStats,
}

/// The ground station control loop: one blocking receive per iteration,
/// followed by dispatch and uplink on a frame or link recovery otherwise.
pub struct GroundStation<R, H> {
    config: StationConfig,
    radio: R,
    handler: H,
    ctx: StationContext,
    stats: StationStats,
    online: bool,
    start_time: Instant,
}

impl<R, H> GroundStation<R, H>
where
    R: Transceiver,
    H: TelemetryHandler,
{
    pub fn new(config: StationConfig, radio: R, handler: H) -> Result<Self, StationError> {
        config.validate()?;
        let ctx = StationContext::new(LinkPlan::from(&config.radio));

        Ok(Self {
            config,
            radio,
            handler,
            ctx,
            stats: StationStats::default(),
            online: false,
            start_time: Instant::now(),
        })
    }

    /// Brings the transceiver online. A failure here is fatal: the loop
    /// refuses to run until `begin` has succeeded.
    pub fn begin(&mut self) -> Result<(), StationError> {
        let radio = &self.config.radio;
        info!(
            carrier_frequency_mhz = radio.carrier_frequency_mhz,
            bandwidth_khz = radio.bandwidth_khz,
            narrow_bandwidth_khz = radio.narrow_bandwidth_khz,
            spreading_factor = radio.spreading_factor,
            coding_rate = radio.coding_rate,
            sync_word = radio.sync_word,
            output_power_dbm = radio.output_power_dbm,
            "Configuring transceiver"
        );

        if let Err(e) = self.radio.begin(radio) {
            error!("Transceiver error code {:#x}", e.code);
            self.online = false;
            return Err(StationError::RadioInit(e));
        }

        info!("Transceiver online");
        self.online = true;
        self.start_time = Instant::now();
        Ok(())
    }

    /// Runs one iteration of the control loop.
    pub fn step(&mut self) -> Result<IterationReport, StationError> {
        if !self.online {
            return Err(StationError::NotStarted);
        }

        self.stats.iterations = self.stats.iterations.saturating_add(1);
        let outcome = self.radio.receive();
        let kind = ReceiveKind::from(&outcome);

        let report = match outcome {
            ReceiveOutcome::Frame(ref text) => {
                self.stats.frames_received = self.stats.frames_received.saturating_add(1);
                let (event, transition) = self.handle_frame(text);
                // Half-duplex: uplink only right after hearing the satellite
                let transmitted = self.transmit_pending();

                IterationReport {
                    outcome: kind,
                    event,
                    transmitted,
                    transition,
                }
            }
            ReceiveOutcome::Timeout | ReceiveOutcome::CrcMismatch | ReceiveOutcome::Unknown(_) => {
                match kind {
                    ReceiveKind::Timeout => self.stats.timeouts = self.stats.timeouts.saturating_add(1),
                    ReceiveKind::CrcMismatch => self.stats.crc_errors = self.stats.crc_errors.saturating_add(1),
                    _ => self.stats.unknown_outcomes = self.stats.unknown_outcomes.saturating_add(1),
                }

                let transition = self.ctx.link.on_receive_failure(&outcome, &mut self.radio);
                if transition == LinkTransition::Lost {
                    self.stats.link_losses = self.stats.link_losses.saturating_add(1);
                }

                IterationReport {
                    outcome: kind,
                    event: None,
                    transmitted: Vec::new(),
                    transition,
                }
            }
        };

        // NASA Rule 5: Safety assertion for the wide-mode carrier invariant
        debug_assert!(
            self.ctx.link.mode() == BandwidthMode::Narrow
                || self.ctx.link.carrier_frequency_mhz() == self.ctx.link.plan().default_carrier_mhz,
            "Wide mode on non-default carrier {} MHz",
            self.ctx.link.carrier_frequency_mhz()
        );

        Ok(report)
    }

    /// Loops `step` with the configured delay between iterations.
    /// `None` runs until the process ends.
    pub fn run(&mut self, max_iterations: Option<u64>) -> Result<(), StationError> {
        let delay = self.config.loop_delay();
        let mut completed = 0u64;

        loop {
            if max_iterations.is_some_and(|max| completed >= max) {
                return Ok(());
            }

            self.step()?;
            completed += 1;
            std::thread::sleep(delay);
        }
    }

    fn handle_frame(&mut self, text: &str) -> (Option<TelemetryEvent>, LinkTransition) {
        let frame = protocol::parse_with_marker(text, self.config.payload_marker);
        debug!(
            "Frame signature={:?} function_id={:?} payload={:?}",
            frame.signature, frame.function_id, frame.payload
        );

        let before = self.ctx.link.clone();
        let event = dispatch(&frame, &mut self.handler, &mut self.ctx, &mut self.radio);

        match event {
            Some(ref event) => {
                debug!("Dispatched {:?}", event.function_id());
                self.stats.frames_dispatched = self.stats.frames_dispatched.saturating_add(1);
            }
            None => {
                self.stats.frames_ignored = self.stats.frames_ignored.saturating_add(1);
            }
        }

        let transition = observe_transition(&before, &self.ctx.link);
        if let LinkTransition::Acquired { .. } = transition {
            self.stats.acquisitions = self.stats.acquisitions.saturating_add(1);
        }

        (event, transition)
    }

    fn transmit_pending(&mut self) -> Vec<TransmitIntent, MAX_PENDING_INTENTS> {
        let mut transmitted = Vec::new();

        for intent in self.ctx.intents.drain() {
            let frame = match protocol::encode_outbound(&self.config.signature, intent) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Failed to encode {:?}: {}", intent, e);
                    self.stats.transmit_failures = self.stats.transmit_failures.saturating_add(1);
                    continue;
                }
            };

            match self.radio.send(&frame) {
                Ok(()) => {
                    info!("Transmitted {:?}", intent);
                    self.stats.frames_transmitted = self.stats.frames_transmitted.saturating_add(1);
                    let _ = transmitted.push(intent);
                }
                Err(e) => {
                    warn!("Failed to transmit {:?}: {}", intent, e);
                    self.stats.transmit_failures = self.stats.transmit_failures.saturating_add(1);
                }
            }
        }

        transmitted
    }

    pub fn request_transmit(&mut self, intent: TransmitIntent) {
        self.ctx.request_transmit(intent);
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn context(&self) -> &StationContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut StationContext {
        &mut self.ctx
    }

    pub fn link_state(&self) -> &LinkState {
        &self.ctx.link
    }

    pub fn stats(&self) -> &StationStats {
        &self.stats
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn status(&self) -> StationStatus {
        StationStatus {
            online: self.online,
            uptime_seconds: if self.online { self.start_time.elapsed().as_secs() } else { 0 },
            mode: self.ctx.link.mode(),
            carrier_frequency_mhz: self.ctx.link.carrier_frequency_mhz(),
            bandwidth_khz: self.ctx.link.bandwidth_khz(),
            pending_intents: self.ctx.intents.len(),
            stats: self.stats,
        }
    }
}

fn observe_transition(before: &LinkState, after: &LinkState) -> LinkTransition {
    match (before.mode(), after.mode()) {
        (BandwidthMode::Wide, BandwidthMode::Narrow) => LinkTransition::Acquired {
            carrier_frequency_mhz: after.carrier_frequency_mhz(),
        },
        (BandwidthMode::Narrow, BandwidthMode::Wide) => LinkTransition::Lost,
        (BandwidthMode::Narrow, BandwidthMode::Narrow)
            if before.carrier_frequency_mhz() != after.carrier_frequency_mhz() =>
        {
            LinkTransition::Retuned {
                carrier_frequency_mhz: after.carrier_frequency_mhz(),
            }
        }
        _ => LinkTransition::None,
    }
}
