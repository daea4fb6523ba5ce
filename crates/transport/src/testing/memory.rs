//! In-memory transport for testing.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

use bytes::Bytes;

use crate::{ProtocolError, Request, Transport, TransportError};

#[derive(Debug, Default)]
struct Script {
    sent: Vec<Bytes>,
    replies: VecDeque<Result<Bytes, String>>,
}

/// A scripted transport for testing code that talks to the debug server.
///
/// Every request frame is recorded and answered with the next queued reply.
/// Clones share the same script, so a test can keep a handle after giving the
/// transport to a client.
///
/// # Example
///
/// ```
/// use transport::testing::{MemoryTransport, response_frame};
///
/// let transport = MemoryTransport::new();
/// transport.push_response(response_frame(0x01, &[]));
/// transport.push_failure("connection refused");
/// assert_eq!(transport.pending(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    script: Arc<Mutex<Script>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().expect("memory transport lock poisoned")
    }

    /// Queue a response frame.
    pub fn push_response(&self, frame: impl Into<Bytes>) {
        self.script().replies.push_back(Ok(frame.into()));
    }

    /// Queue a failed exchange.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.script().replies.push_back(Err(message.into()));
    }

    /// Number of queued replies not yet consumed
    pub fn pending(&self) -> usize {
        self.script().replies.len()
    }

    /// Every request frame sent so far
    pub fn sent(&self) -> Vec<Bytes> {
        self.script().sent.clone()
    }

    /// Every request sent so far, parsed.
    pub fn sent_requests(&self) -> Result<Vec<Request>, ProtocolError> {
        self.script()
            .sent
            .iter()
            .map(|frame| Request::parse(frame))
            .collect()
    }
}

impl Transport for MemoryTransport {
    async fn exchange(&self, frame: Bytes) -> Result<Bytes, TransportError> {
        let mut script = self.script();
        script.sent.push(frame);
        match script.replies.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(TransportError::Unavailable(message)),
            None => Err(TransportError::Unavailable(
                "no response queued".to_string(),
            )),
        }
    }
}
