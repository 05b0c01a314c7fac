/// Error returned by [`Sender::try_send`](super::Sender::try_send).
///
/// Both variants hand the rejected item back to the caller.
#[derive(Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrySendError<T> {
    /// The buffer is at capacity.
    #[error("channel is full")]
    Full(T),

    /// The channel was closed before the send.
    #[error("channel is closed")]
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Recovers the item that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(item) | Self::Closed(item) => item,
        }
    }

    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

// Manual impl so `T` does not need to be `Debug`.
impl<T> core::fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full(_) => f.write_str("Full(..)"),
            Self::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}
