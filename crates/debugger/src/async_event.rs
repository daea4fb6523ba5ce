use crate::state::Event;
use tokio::sync::mpsc;

/// Async event receiver that wraps tokio mpsc
#[derive(Debug)]
pub struct AsyncEventReceiver {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl AsyncEventReceiver {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Event>) -> Self {
        Self { rx }
    }

    /// Receive next event asynchronously
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Convert to a Stream for use with StreamExt
    pub fn into_stream(self) -> impl futures::Stream<Item = Event> {
        tokio_stream::wrappers::UnboundedReceiverStream::new(self.rx)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::state::SessionState;

    #[tokio::test]
    async fn stream_yields_queued_events_then_ends() {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = AsyncEventReceiver::new(rx);

        tx.send(Event::StateChanged(SessionState::Open)).unwrap();
        tx.send(Event::Console("hello".to_string())).unwrap();
        drop(tx);

        let received: Vec<Event> = events.into_stream().collect().await;
        assert_eq!(
            received,
            vec![
                Event::StateChanged(SessionState::Open),
                Event::Console("hello".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn drain_leaves_stream_empty() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut events = AsyncEventReceiver::new(rx);

        tx.send(Event::Output("1".to_string())).unwrap();
        tx.send(Event::Output("2".to_string())).unwrap();
        assert_eq!(events.drain().len(), 2);

        drop(tx);
        assert!(events.into_stream().next().await.is_none());
    }
}
