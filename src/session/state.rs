use serde::{Deserialize, Serialize};

/// Visible state of a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Connecting,
    Live,
    Error,
    Closed,
}

/// Inputs that can move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Start,
    /// Media or connection setup failed before the remote opened
    SetupFailed,
    RemoteOpen,
    RemoteError,
    RemoteClose,
    Stop,
}

impl SessionState {
    /// `Error` and `Closed` end the session; a new one is needed to retry
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Error | SessionState::Closed)
    }

    /// Next state for `trigger`, or `None` when the trigger does not apply
    pub fn next(self, trigger: Trigger) -> Option<SessionState> {
        use SessionState::*;
        match (self, trigger) {
            (Idle, Trigger::Start) => Some(Connecting),
            (Connecting, Trigger::SetupFailed) => Some(Error),
            (Connecting, Trigger::RemoteOpen) => Some(Live),
            (Connecting | Live, Trigger::RemoteError) => Some(Error),
            (Connecting | Live, Trigger::RemoteClose) => Some(Closed),
            (Idle | Connecting | Live | Error | Closed, Trigger::Stop) => Some(Closed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = SessionState::Idle;
        let state = state.next(Trigger::Start).unwrap();
        assert_eq!(state, SessionState::Connecting);
        let state = state.next(Trigger::RemoteOpen).unwrap();
        assert_eq!(state, SessionState::Live);
        assert_eq!(state.next(Trigger::RemoteClose), Some(SessionState::Closed));
        assert_eq!(state.next(Trigger::RemoteError), Some(SessionState::Error));
    }

    #[test]
    fn test_terminal_states_only_accept_stop() {
        for state in [SessionState::Error, SessionState::Closed] {
            assert!(state.is_terminal());
            assert_eq!(state.next(Trigger::Start), None);
            assert_eq!(state.next(Trigger::RemoteOpen), None);
            assert_eq!(state.next(Trigger::RemoteError), None);
            assert_eq!(state.next(Trigger::Stop), Some(SessionState::Closed));
        }
    }

    #[test]
    fn test_open_before_start_is_rejected() {
        assert_eq!(SessionState::Idle.next(Trigger::RemoteOpen), None);
        assert_eq!(SessionState::Live.next(Trigger::Start), None);
        assert_eq!(SessionState::Live.next(Trigger::RemoteOpen), None);
    }
}
