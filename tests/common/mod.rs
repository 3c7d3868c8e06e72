#![allow(dead_code)]

use groundlink::protocol::FunctionId;
use groundlink::{StationContext, TelemetryHandler, Transceiver, TransmitIntent};

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerCall {
    pub function: FunctionId,
    pub payload: Option<String>,
    pub frequency_error_hz: Option<f32>,
}

/// Handler that records every call and optionally raises intents or
/// acquires the link, so tests can observe dispatch from the outside.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub calls: Vec<HandlerCall>,
    pub raise_on: Vec<(FunctionId, TransmitIntent)>,
    pub acquire_on_settings: bool,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raising(mut self, function: FunctionId, intent: TransmitIntent) -> Self {
        self.raise_on.push((function, intent));
        self
    }

    pub fn acquiring(mut self) -> Self {
        self.acquire_on_settings = true;
        self
    }

    fn record(&mut self, function: FunctionId, payload: Option<&str>, frequency_error_hz: Option<f32>, ctx: &mut StationContext) {
        self.calls.push(HandlerCall {
            function,
            payload: payload.map(str::to_string),
            frequency_error_hz,
        });

        for (trigger, intent) in &self.raise_on {
            if *trigger == function {
                ctx.request_transmit(*intent);
            }
        }
    }
}

impl TelemetryHandler for RecordingHandler {
    fn on_started_signal(&mut self, ctx: &mut StationContext) {
        self.record(FunctionId::StartedSignal, None, None, ctx);
    }

    fn on_stopped_signal(&mut self, ctx: &mut StationContext) {
        self.record(FunctionId::StoppedSignal, None, None, ctx);
    }

    fn on_transmitted_online(&mut self, ctx: &mut StationContext) {
        self.record(FunctionId::TransmittedOnline, None, None, ctx);
    }

    fn on_deployment_success(&mut self, ctx: &mut StationContext) {
        self.record(FunctionId::DeploymentSuccess, None, None, ctx);
    }

    fn on_pong(&mut self, ctx: &mut StationContext) {
        self.record(FunctionId::Pong, None, None, ctx);
    }

    fn on_power_info(&mut self, payload: &str, ctx: &mut StationContext) {
        self.record(FunctionId::PowerInfo, Some(payload), None, ctx);
    }

    fn on_transceiver_settings(
        &mut self,
        payload: &str,
        frequency_error_hz: f32,
        ctx: &mut StationContext,
        radio: &mut dyn Transceiver,
    ) {
        self.record(FunctionId::TransceiverSettings, Some(payload), Some(frequency_error_hz), ctx);
        if self.acquire_on_settings {
            ctx.link.acquire(frequency_error_hz, radio);
        }
    }
}
