//! Connection state machine
//!
//! Each transition takes the current [`SessionState`] and one event and
//! returns the next state with the side effects the driver must perform.
//! Nothing in here touches the network or the clock.

use super::state::{ReadyState, SessionState, TransportError};
use crate::protocol::{CloseInfo, IncomingMessage, RawFrame};
use std::time::Duration;

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Caller asked to connect
    Connect,
    /// Transport handshake completed
    Opened,
    /// A data frame arrived
    Frame(RawFrame),
    /// Transport reported an error
    Error(String),
    /// Transport closed
    Closed(CloseInfo),
    /// Reconnect timer fired
    ReconnectDue,
    /// Manager is shutting down
    Teardown,
}

/// Work the driver performs after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    OpenTransport,
    CloseTransport,
    ScheduleReconnect(Duration),
    CancelReconnect,
    Deliver(IncomingMessage),
    ReconnectExhausted,
}

/// Fixed-interval reconnect limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: SessionState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Apply any event
#[must_use]
pub fn transition(state: SessionState, event: SocketEvent, policy: &ReconnectPolicy) -> Transition {
    match event {
        SocketEvent::Connect => on_connect(state),
        SocketEvent::Opened => on_open(state),
        SocketEvent::Frame(frame) => on_message(state, frame),
        SocketEvent::Error(message) => on_error(state, message),
        SocketEvent::Closed(info) => on_close(state, info, policy),
        SocketEvent::ReconnectDue => on_reconnect_timer(state),
        SocketEvent::Teardown => on_teardown(state),
    }
}

/// Explicit connect, only from `Closed`
///
/// Resets the attempt counter, so an exhausted session gets a fresh budget.
#[must_use]
pub fn on_connect(mut state: SessionState) -> Transition {
    if state.torn_down || state.ready_state.is_active() {
        return Transition::unchanged(state);
    }

    let mut effects = Vec::with_capacity(2);
    if state.reconnect_pending {
        state.reconnect_pending = false;
        effects.push(Effect::CancelReconnect);
    }
    state.reconnect_attempts = 0;
    state.exhausted = false;
    state.ready_state = ReadyState::Connecting;
    effects.push(Effect::OpenTransport);

    Transition::with(state, effects)
}

#[must_use]
pub fn on_open(mut state: SessionState) -> Transition {
    if state.ready_state != ReadyState::Connecting {
        return Transition::unchanged(state);
    }

    state.ready_state = ReadyState::Open;
    state.reconnect_attempts = 0;
    Transition::unchanged(state)
}

/// Decode and deliver a frame
#[must_use]
pub fn on_message(mut state: SessionState, frame: RawFrame) -> Transition {
    let message = IncomingMessage::decode(frame);
    state.last_message = Some(message.clone());
    Transition::with(state, vec![Effect::Deliver(message)])
}

/// Record a transport error
///
/// Moves toward `Closing` but never schedules a reconnect; the close that
/// follows does.
#[must_use]
pub fn on_error(mut state: SessionState, message: String) -> Transition {
    state.last_error = Some(TransportError::new(message));
    if matches!(state.ready_state, ReadyState::Connecting | ReadyState::Open) {
        state.ready_state = ReadyState::Closing;
    }
    Transition::unchanged(state)
}

/// Transport closed; decide whether to reconnect
#[must_use]
pub fn on_close(mut state: SessionState, info: CloseInfo, policy: &ReconnectPolicy) -> Transition {
    if state.ready_state == ReadyState::Closed {
        return Transition::unchanged(state);
    }

    state.ready_state = ReadyState::Closed;
    state.last_close = Some(info);

    if state.torn_down {
        return Transition::unchanged(state);
    }

    if state.reconnect_attempts < policy.max_attempts {
        state.reconnect_attempts += 1;
        state.reconnect_pending = true;
        Transition::with(state, vec![Effect::ScheduleReconnect(policy.interval)])
    } else {
        state.exhausted = true;
        Transition::with(state, vec![Effect::ReconnectExhausted])
    }
}

#[must_use]
pub fn on_reconnect_timer(mut state: SessionState) -> Transition {
    if !state.reconnect_pending || state.torn_down || state.ready_state.is_active() {
        return Transition::unchanged(state);
    }

    state.reconnect_pending = false;
    state.ready_state = ReadyState::Connecting;
    Transition::with(state, vec![Effect::OpenTransport])
}

/// Cancel any pending reconnect and close a live transport
#[must_use]
pub fn on_teardown(mut state: SessionState) -> Transition {
    if state.torn_down {
        return Transition::unchanged(state);
    }

    state.torn_down = true;
    let mut effects = Vec::with_capacity(2);
    if state.reconnect_pending {
        state.reconnect_pending = false;
        effects.push(Effect::CancelReconnect);
    }
    if state.ready_state.is_active() {
        state.ready_state = ReadyState::Closing;
        effects.push(Effect::CloseTransport);
    }

    Transition::with(state, effects)
}
