use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::protocol::{FunctionId, ParsedFrame};
use crate::station::StationContext;
use crate::transceiver::Transceiver;

/// Telemetry event decoded from one downlink frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    StartedSignal,
    StoppedSignal,
    TransmittedOnline,
    DeploymentSuccess,
    Pong,
    PowerInfo { payload: String },
    TransceiverSettings { payload: String, frequency_error_hz: f32 },
}

impl TelemetryEvent {
    pub fn function_id(&self) -> FunctionId {
        match self {
            TelemetryEvent::StartedSignal => FunctionId::StartedSignal,
            TelemetryEvent::StoppedSignal => FunctionId::StoppedSignal,
            TelemetryEvent::TransmittedOnline => FunctionId::TransmittedOnline,
            TelemetryEvent::DeploymentSuccess => FunctionId::DeploymentSuccess,
            TelemetryEvent::Pong => FunctionId::Pong,
            TelemetryEvent::PowerInfo { .. } => FunctionId::PowerInfo,
            TelemetryEvent::TransceiverSettings { .. } => FunctionId::TransceiverSettings,
        }
    }
}

/// Receiver of decoded telemetry. One method per downlink function id.
///
/// Handlers own whatever state they record and may raise transmit intents
/// or change the link through `ctx`.
pub trait TelemetryHandler {
    fn on_started_signal(&mut self, ctx: &mut StationContext);
    fn on_stopped_signal(&mut self, ctx: &mut StationContext);
    fn on_transmitted_online(&mut self, ctx: &mut StationContext);
    fn on_deployment_success(&mut self, ctx: &mut StationContext);
    fn on_pong(&mut self, ctx: &mut StationContext);
    fn on_power_info(&mut self, payload: &str, ctx: &mut StationContext);

    /// `radio` is handed over so the handler can retune toward the signal.
    fn on_transceiver_settings(
        &mut self,
        payload: &str,
        frequency_error_hz: f32,
        ctx: &mut StationContext,
        radio: &mut dyn Transceiver,
    );
}

/// Routes a parsed frame to exactly one handler method.
///
/// Unknown ids and uplink-only ids are ignored and return `None`. The frame's
/// frequency error is read from `radio` only for transceiver settings.
pub fn dispatch<H, R>(
    frame: &ParsedFrame<'_>,
    handler: &mut H,
    ctx: &mut StationContext,
    radio: &mut R,
) -> Option<TelemetryEvent>
where
    H: TelemetryHandler + ?Sized,
    R: Transceiver,
{
    let Some(function) = frame.function() else {
        debug!("Ignoring frame with unknown function id {:?}", frame.function_id);
        return None;
    };

    let event = match function {
        FunctionId::StartedSignal => {
            handler.on_started_signal(ctx);
            TelemetryEvent::StartedSignal
        }
        FunctionId::StoppedSignal => {
            handler.on_stopped_signal(ctx);
            TelemetryEvent::StoppedSignal
        }
        FunctionId::TransmittedOnline => {
            handler.on_transmitted_online(ctx);
            TelemetryEvent::TransmittedOnline
        }
        FunctionId::DeploymentSuccess => {
            handler.on_deployment_success(ctx);
            TelemetryEvent::DeploymentSuccess
        }
        FunctionId::Pong => {
            handler.on_pong(ctx);
            TelemetryEvent::Pong
        }
        FunctionId::PowerInfo => {
            handler.on_power_info(frame.payload, ctx);
            TelemetryEvent::PowerInfo {
                payload: frame.payload.to_string(),
            }
        }
        FunctionId::TransceiverSettings => {
            let frequency_error_hz = radio.frequency_error_hz();
            handler.on_transceiver_settings(frame.payload, frequency_error_hz, ctx, radio);
            TelemetryEvent::TransceiverSettings {
                payload: frame.payload.to_string(),
                frequency_error_hz,
            }
        }
        FunctionId::Ping | FunctionId::StopTransmitting | FunctionId::StartTransmitting => {
            debug!("Ignoring uplink function id {} on downlink", function.tag());
            return None;
        }
    };

    Some(event)
}
