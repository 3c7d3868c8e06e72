use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dispatch::TelemetryHandler;
use crate::link::LinkTransition;
use crate::station::StationContext;
use crate::transceiver::Transceiver;

/// What the ground station has learned about the satellite so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionState {
    pub satellite_online: bool,
    /// `None` until a started or stopped signal has been heard.
    pub satellite_transmitting: Option<bool>,
    pub deployment_succeeded: bool,
    pub pongs_received: u32,
    pub power_reports_received: u32,
    pub last_power_info: Option<String>,
    pub last_transceiver_settings: Option<String>,
    pub last_frequency_error_hz: Option<f32>,
    pub acquisitions: u32,
}

/// Default telemetry handler: records satellite status and moves the link
/// into tracking mode when transceiver settings arrive.
#[derive(Debug, Default)]
pub struct MissionRecorder {
    state: MissionState,
}

impl MissionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_state(&self) -> &MissionState {
        &self.state
    }
}

impl TelemetryHandler for MissionRecorder {
    fn on_started_signal(&mut self, _ctx: &mut StationContext) {
        info!("Satellite started transmitting");
        self.state.satellite_transmitting = Some(true);
    }

    fn on_stopped_signal(&mut self, _ctx: &mut StationContext) {
        info!("Satellite stopped transmitting");
        self.state.satellite_transmitting = Some(false);
    }

    fn on_transmitted_online(&mut self, _ctx: &mut StationContext) {
        info!("Satellite reports online");
        self.state.satellite_online = true;
    }

    fn on_deployment_success(&mut self, _ctx: &mut StationContext) {
        info!("Satellite reports successful deployment");
        self.state.deployment_succeeded = true;
    }

    fn on_pong(&mut self, _ctx: &mut StationContext) {
        self.state.pongs_received = self.state.pongs_received.saturating_add(1);
        info!("Pong received ({} total)", self.state.pongs_received);
    }

    fn on_power_info(&mut self, payload: &str, _ctx: &mut StationContext) {
        info!("Power info: {}", payload);
        self.state.power_reports_received = self.state.power_reports_received.saturating_add(1);
        self.state.last_power_info = Some(payload.to_string());
    }

    fn on_transceiver_settings(
        &mut self,
        payload: &str,
        frequency_error_hz: f32,
        ctx: &mut StationContext,
        radio: &mut dyn Transceiver,
    ) {
        info!("Transceiver settings: {} (frequency error {} Hz)", payload, frequency_error_hz);
        self.state.last_transceiver_settings = Some(payload.to_string());
        self.state.last_frequency_error_hz = Some(frequency_error_hz);

        if let LinkTransition::Acquired { .. } = ctx.link.acquire(frequency_error_hz, radio) {
            self.state.acquisitions = self.state.acquisitions.saturating_add(1);
        }
    }
}
