use chrono::Utc;
use fox_relay_types::relay;

/// A payload in flight between two ranks.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub source: u32,
    pub dest: u32,
    pub context: u32,
    pub sequence: u64,
    pub values: Vec<i64>,
    pub timestamp: i64,
}

impl Envelope {
    pub fn new(source: u32, dest: u32, context: u32, sequence: u64, values: Vec<i64>) -> Self {
        Self {
            source,
            dest,
            context,
            sequence,
            values,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Milliseconds since the sender stamped the envelope.
    pub fn age_millis(&self) -> i64 {
        Utc::now().timestamp_millis() - self.timestamp
    }
}

impl From<relay::Envelope> for Envelope {
    fn from(envelope: relay::Envelope) -> Self {
        Self {
            source: envelope.source,
            dest: envelope.dest,
            context: envelope.context,
            sequence: envelope.sequence,
            values: envelope.values,
            timestamp: envelope.timestamp,
        }
    }
}

impl From<Envelope> for relay::Envelope {
    fn from(envelope: Envelope) -> Self {
        Self {
            source: envelope.source,
            dest: envelope.dest,
            context: envelope.context,
            sequence: envelope.sequence,
            values: envelope.values,
            timestamp: envelope.timestamp,
        }
    }
}
