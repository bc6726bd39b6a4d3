use std::any::Any;

/// Separates user traffic from the internal traffic of collective operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Channel {
    /// Point-to-point message with a user-chosen tag.
    User(u32),

    /// A rank announcing to the root that it has entered a collective operation.
    Arrival,

    /// Data exchanged as part of a collective operation.
    Collective,
}

/// A message in flight between two ranks.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) source: usize,
    pub(crate) channel: Channel,
    pub(crate) payload: Box<dyn Any + Send>,
}

impl Envelope {
    pub(crate) fn matches(&self, source: usize, channel: Channel) -> bool {
        self.source == source && self.channel == channel
    }
}
