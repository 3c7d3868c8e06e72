use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use thiserror::Error;

use crate::intents::TransmitIntent;

/// Every frame on the link starts with a fixed-width callsign.
pub const SIGNATURE_LEN: usize = 10;
pub const DEFAULT_PAYLOAD_MARKER: char = 'S';
// SX127x FIFO limit for a single LoRa packet
pub const MAX_FRAME_SIZE: usize = 255;

const_assert!(MAX_FRAME_SIZE > SIGNATURE_LEN + 2);

pub type OutboundFrame = ArrayString<MAX_FRAME_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Message exceeds frame size")]
    MessageTooLarge,
}

/// Function identifiers of the satellite link protocol.
///
/// Downlink ids are dispatched to telemetry handlers; uplink ids are only
/// ever produced by the ground station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionId {
    StartedSignal,
    StoppedSignal,
    TransmittedOnline,
    DeploymentSuccess,
    Ping,
    Pong,
    StopTransmitting,
    StartTransmitting,
    PowerInfo,
    TransceiverSettings,
}

impl FunctionId {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "1" => Some(FunctionId::StartedSignal),
            "2" => Some(FunctionId::StoppedSignal),
            "3" => Some(FunctionId::TransmittedOnline),
            "4" => Some(FunctionId::DeploymentSuccess),
            "5" => Some(FunctionId::Ping),
            "6" => Some(FunctionId::Pong),
            "7" => Some(FunctionId::StopTransmitting),
            "8" => Some(FunctionId::StartTransmitting),
            "9" => Some(FunctionId::PowerInfo),
            "10" => Some(FunctionId::TransceiverSettings),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            FunctionId::StartedSignal => "1",
            FunctionId::StoppedSignal => "2",
            FunctionId::TransmittedOnline => "3",
            FunctionId::DeploymentSuccess => "4",
            FunctionId::Ping => "5",
            FunctionId::Pong => "6",
            FunctionId::StopTransmitting => "7",
            FunctionId::StartTransmitting => "8",
            FunctionId::PowerInfo => "9",
            FunctionId::TransceiverSettings => "10",
        }
    }

    pub fn is_uplink(self) -> bool {
        matches!(
            self,
            FunctionId::Ping | FunctionId::StopTransmitting | FunctionId::StartTransmitting
        )
    }
}

/// One received frame split into its three positional fields.
///
/// Borrows the received text; nothing outlives the loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedFrame<'a> {
    pub signature: &'a str,
    pub function_id: &'a str,
    pub payload: &'a str,
}

impl ParsedFrame<'_> {
    pub fn function(&self) -> Option<FunctionId> {
        FunctionId::from_tag(self.function_id)
    }
}

pub fn parse(raw: &str) -> ParsedFrame<'_> {
    parse_with_marker(raw, DEFAULT_PAYLOAD_MARKER)
}

/// Splits `raw` at the signature boundary and at the first `marker` after it.
///
/// Never fails: a missing marker leaves the payload empty and a frame shorter
/// than the signature leaves both function id and payload empty.
pub fn parse_with_marker(raw: &str, marker: char) -> ParsedFrame<'_> {
    // Split on a char boundary so multi-byte noise cannot panic the slice
    let signature_end = raw
        .char_indices()
        .nth(SIGNATURE_LEN)
        .map_or(raw.len(), |(index, _)| index);
    let (signature, rest) = raw.split_at(signature_end);

    let (function_id, payload) = match rest.find(marker) {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };

    ParsedFrame {
        signature,
        function_id,
        payload,
    }
}

/// Builds the uplink frame for a transmit intent: signature followed by the
/// function id, no payload.
pub fn encode_outbound(signature: &str, intent: TransmitIntent) -> Result<OutboundFrame, ProtocolError> {
    let mut frame = OutboundFrame::new();
    frame
        .try_push_str(signature)
        .map_err(|_| ProtocolError::MessageTooLarge)?;
    frame
        .try_push_str(intent.function_id().tag())
        .map_err(|_| ProtocolError::MessageTooLarge)?;
    Ok(frame)
}
