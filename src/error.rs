use thiserror::Error;

/// Returned by [`mpmc::Sender::send`](crate::mpmc::Sender::send) when the
/// queue has been closed. The rejected message is handed back.
#[derive(Error, Clone, Copy, PartialEq, Eq)]
#[error("sending on a closed queue")]
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    /// Recovers the message that could not be sent.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> core::fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SendError(..)")
    }
}

/// Returned by [`mpmc::Sender::try_send`](crate::mpmc::Sender::try_send).
#[derive(Error, Clone, Copy, PartialEq, Eq)]
pub enum TrySendError<T> {
    /// Every slot holds an unconsumed message.
    #[error("sending on a full queue")]
    Full(T),
    /// The queue has been closed.
    #[error("sending on a closed queue")]
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Recovers the message that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(value) | TrySendError::Closed(value) => value,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TrySendError::Full(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TrySendError::Closed(_))
    }
}

impl<T> core::fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TrySendError::Full(_) => f.write_str("Full(..)"),
            TrySendError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> From<SendError<T>> for TrySendError<T> {
    fn from(err: SendError<T>) -> Self {
        TrySendError::Closed(err.0)
    }
}

/// Returned by [`mpmc::Receiver::recv`](crate::mpmc::Receiver::recv) once
/// the queue is closed and every buffered message has been drained. This is
/// the end-of-stream signal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("receiving on a closed and drained queue")]
pub struct RecvError;

/// Returned by [`mpmc::Receiver::try_recv`](crate::mpmc::Receiver::try_recv).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// No message is currently buffered; more may arrive.
    #[error("receiving on an empty queue")]
    Empty,
    /// The queue is closed and drained; no message will ever arrive.
    #[error("receiving on a closed and drained queue")]
    Closed,
}

impl TryRecvError {
    pub fn is_empty(&self) -> bool {
        matches!(self, TryRecvError::Empty)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TryRecvError::Closed)
    }
}
