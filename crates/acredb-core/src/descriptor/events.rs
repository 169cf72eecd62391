///
/// Audience
///
/// One of the real-time rooms a descriptor may address: the acting user's
/// personal room, their team's room, or their brokerage's room.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Audience {
    User,
    Team,
    Broker,
}

///
/// EventPolicy
///
/// Whether mutations on this entity publish change events and to which
/// audience rooms. Emission is opt-in per descriptor.
///

#[derive(Clone, Debug, Default)]
pub struct EventPolicy {
    pub emit: bool,
    pub audiences: Vec<Audience>,
}

impl EventPolicy {
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            emit: false,
            audiences: Vec::new(),
        }
    }

    #[must_use]
    pub fn rooms(audiences: impl Into<Vec<Audience>>) -> Self {
        Self {
            emit: true,
            audiences: audiences.into(),
        }
    }
}
