use std::fmt;

/// Lifecycle of a [`TransferSession`](crate::TransferSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, no file submitted yet.
    Idle,
    /// Opening the connection.
    Connecting,
    /// Streaming chunks.
    Sending,
    /// All chunks queued, waiting for the server's verdict.
    AwaitingLink,
    /// Share code issued; pinging and relaying stats.
    Live,
    /// Cleared or disposed.
    Closed,
    /// Terminated by an error.
    Failed,
}

impl SessionState {
    /// Whether `self -> next` is an edge of the session state machine.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Sending)
                | (Sending, AwaitingLink)
                | (AwaitingLink, Live)
                | (Idle | Connecting | Sending | AwaitingLink | Live, Closed)
                | (Connecting | Sending | AwaitingLink | Live, Failed)
        )
    }

    /// `Closed` and `Failed` have no outgoing edges.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Sending => "sending",
            SessionState::AwaitingLink => "awaiting_link",
            SessionState::Live => "live",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState::*;
    use super::*;

    const ALL: [SessionState; 7] = [Idle, Connecting, Sending, AwaitingLink, Live, Closed, Failed];

    #[test]
    fn happy_path_is_allowed() {
        let path = [Idle, Connecting, Sending, AwaitingLink, Live, Closed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn no_skipping_ahead() {
        assert!(!Idle.can_transition_to(Sending));
        assert!(!Connecting.can_transition_to(Live));
        assert!(!Sending.can_transition_to(Live));
    }

    #[test]
    fn no_going_back() {
        assert!(!Live.can_transition_to(AwaitingLink));
        assert!(!AwaitingLink.can_transition_to(Sending));
        assert!(!Sending.can_transition_to(Connecting));
    }

    #[test]
    fn terminal_states_are_sinks() {
        for from in [Closed, Failed] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn failed_reachable_from_active_states() {
        for from in [Connecting, Sending, AwaitingLink, Live] {
            assert!(from.can_transition_to(Failed));
        }
        assert!(!Idle.can_transition_to(Failed));
    }

    #[test]
    fn closed_reachable_from_every_non_terminal_state() {
        for from in ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(from.can_transition_to(Closed));
        }
    }
}
