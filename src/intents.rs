use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::protocol::FunctionId;

pub const MAX_PENDING_INTENTS: usize = 3;

/// One-shot uplink requests raised by telemetry handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransmitIntent {
    Ping,
    StopTransmitting,
    StartTransmitting,
}

impl TransmitIntent {
    /// Fixed drain order: ping, stop, start.
    pub const DRAIN_ORDER: [TransmitIntent; MAX_PENDING_INTENTS] = [
        TransmitIntent::Ping,
        TransmitIntent::StopTransmitting,
        TransmitIntent::StartTransmitting,
    ];

    pub fn function_id(self) -> FunctionId {
        match self {
            TransmitIntent::Ping => FunctionId::Ping,
            TransmitIntent::StopTransmitting => FunctionId::StopTransmitting,
            TransmitIntent::StartTransmitting => FunctionId::StartTransmitting,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmitQueue {
    ping: bool,
    stop: bool,
    start: bool,
}

impl TransmitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raising an intent that is already pending does not queue a second send.
    pub fn request(&mut self, intent: TransmitIntent) {
        *self.flag_mut(intent) = true;
    }

    pub fn is_pending(&self, intent: TransmitIntent) -> bool {
        match intent {
            TransmitIntent::Ping => self.ping,
            TransmitIntent::StopTransmitting => self.stop,
            TransmitIntent::StartTransmitting => self.start,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.ping || self.stop || self.start)
    }

    pub fn len(&self) -> usize {
        TransmitIntent::DRAIN_ORDER
            .iter()
            .filter(|intent| self.is_pending(**intent))
            .count()
    }

    /// Takes every pending intent in drain order and clears its flag.
    pub fn drain(&mut self) -> Vec<TransmitIntent, MAX_PENDING_INTENTS> {
        let mut drained = Vec::new();

        for intent in TransmitIntent::DRAIN_ORDER {
            let flag = self.flag_mut(intent);
            if *flag {
                *flag = false;
                // Capacity equals the number of intents, push cannot fail
                let _ = drained.push(intent);
            }
        }

        debug_assert!(self.is_empty(), "Transmit queue not cleared by drain");
        drained
    }

    fn flag_mut(&mut self, intent: TransmitIntent) -> &mut bool {
        match intent {
            TransmitIntent::Ping => &mut self.ping,
            TransmitIntent::StopTransmitting => &mut self.stop,
            TransmitIntent::StartTransmitting => &mut self.start,
        }
    }
}
