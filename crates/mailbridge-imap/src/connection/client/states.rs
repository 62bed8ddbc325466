//! Type-state markers for IMAP client connection states.

/// Marker type for the not-authenticated state.
///
/// In this state, only LOGIN (and LOGOUT) are valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state.
///
/// In this state, a mailbox can be selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// Marker type for the selected state.
///
/// In this state, SEARCH and FETCH operate on the selected mailbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selected;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_state_markers_are_send_sync() {
        assert_send_sync::<NotAuthenticated>();
        assert_send_sync::<Authenticated>();
        assert_send_sync::<Selected>();
    }
}
