use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use image::ExecutableImage;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use transport::{Opcode, Request, Response, Transport};
use uvm_types::Flags;

use crate::{
    async_event::AsyncEventReceiver,
    error::ClientError,
    internals::{DebuggerInternals, LoadedImage},
    registers::RegisterSlot,
    state::SessionState,
};

/// Delay between attempts to open a session.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(2000);

/// Client for one debug session with the VM debug server.
///
/// Operations take `&self` and issue one request at a time; callers should not
/// start a second operation before the first completes. The state lock is never
/// held across a network exchange.
pub struct Debugger<T> {
    transport: T,
    internals: Mutex<DebuggerInternals>,
    event_rx: AsyncEventReceiver,
    cancel_token: CancellationToken,
    retry_interval: Duration,
}

impl<T> Debugger<T>
where
    T: Transport,
{
    pub fn new(transport: T) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            internals: Mutex::new(DebuggerInternals::new(event_tx)),
            event_rx: AsyncEventReceiver::new(event_rx),
            cancel_token: CancellationToken::new(),
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Get event receiver for subscribing to debugger events
    pub fn events(&mut self) -> &mut AsyncEventReceiver {
        &mut self.event_rx
    }

    /// Token that shuts the debugger down when cancelled.
    ///
    /// Cancelling it ends a pending [`open_session`](Self::open_session) retry
    /// loop with [`ClientError::Cancelled`].
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Parse and disassemble an image and make it the loaded image.
    ///
    /// On failure the previously loaded image and the session state are kept.
    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    pub async fn load_image(&self, bytes: Vec<u8>) -> Result<(), ClientError> {
        let loaded = match decode_image(&bytes) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, "rejected image");
                self.report(&e).await;
                return Err(e);
            }
        };
        tracing::debug!(lines = loaded.lines().len(), "image loaded");
        self.internals.lock().await.load(loaded);
        Ok(())
    }

    /// Open a session, retrying on a fixed interval until the server accepts.
    ///
    /// Does nothing when a session is already open.
    #[tracing::instrument(skip(self))]
    pub async fn open_session(&self) -> Result<(), ClientError> {
        if self.state().await != SessionState::Closed {
            return Ok(());
        }

        loop {
            if self.cancel_token.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            self.internals
                .lock()
                .await
                .print("Trying to open debug session...");

            let attempt = tokio::select! {
                _ = self.cancel_token.cancelled() => return Err(ClientError::Cancelled),
                attempt = self.try_request(Request::OpenSession) => attempt,
            };
            match attempt {
                Ok(Opcode::OpenSession) => return Ok(()),
                Ok(found) => {
                    let e = ClientError::UnexpectedResponse {
                        expected: Opcode::OpenSession,
                        found,
                    };
                    tracing::warn!(error = %e, "opening session failed, retrying");
                }
                Err(e) => tracing::warn!(error = %e, "opening session failed, retrying"),
            }

            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    tracing::debug!("open session cancelled");
                    return Err(ClientError::Cancelled);
                }
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }

    /// Close the session.
    ///
    /// Any response from the server closes the session locally, even an error.
    #[tracing::instrument(skip(self))]
    pub async fn close_session(&self) -> Result<(), ClientError> {
        if self.state().await == SessionState::Closed {
            return Ok(());
        }

        let frame = match self.send(Request::CloseSession).await {
            Ok(frame) => frame,
            Err(e) => {
                self.report(&e).await;
                return Err(e);
            }
        };
        self.internals.lock().await.close();

        if let Err(e) = self.dispatch(&frame).await {
            self.report(&e).await;
            return Err(e);
        }
        Ok(())
    }

    /// Send an image to the server and start it.
    #[tracing::instrument(skip_all, fields(len = file.len()))]
    pub async fn run(&self, file: Bytes) -> Result<(), ClientError> {
        self.request(Request::Run(file)).await
    }

    /// Run the loaded image.
    pub async fn run_loaded(&self) -> Result<(), ClientError> {
        let Some(loaded) = self.image().await else {
            let e = ClientError::NoImageLoaded;
            self.report(&e).await;
            return Err(e);
        };
        self.run(Bytes::copy_from_slice(loaded.image().bytes())).await
    }

    /// Execute a single instruction.
    #[tracing::instrument(skip(self))]
    pub async fn step(&self) -> Result<(), ClientError> {
        self.request(Request::NextInstruction).await
    }

    /// Resume execution until the next breakpoint or the end of the program.
    #[tracing::instrument(skip(self))]
    pub async fn continue_(&self) -> Result<(), ClientError> {
        self.request(Request::Continue).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), ClientError> {
        self.request(Request::Stop).await
    }

    /// Fetch the registers from the server.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_registers(&self) -> Result<(), ClientError> {
        self.request(Request::GetRegisters).await
    }

    /// Add or remove a breakpoint, returning whether it is now set.
    ///
    /// The local set is updated before the server is told, and is left as is
    /// when the request fails.
    #[tracing::instrument(skip_all, fields(address = %uvm_types::format_vaddr(address)))]
    pub async fn toggle_breakpoint(&self, address: u64) -> Result<bool, ClientError> {
        let set = self.internals.lock().await.toggle_breakpoint(address);
        let request = if set {
            Request::SetBreakpoint(address)
        } else {
            Request::RemoveBreakpoint(address)
        };
        self.request(request).await?;
        Ok(set)
    }

    /// Stop any retry loop and close the session if one is open.
    pub async fn shutdown(self) -> Result<(), ClientError> {
        self.cancel_token.cancel();
        self.close_session().await
    }

    pub async fn state(&self) -> SessionState {
        self.internals.lock().await.state
    }

    /// Breakpoint addresses in ascending order
    pub async fn breakpoints(&self) -> Vec<u64> {
        self.internals
            .lock()
            .await
            .breakpoints
            .iter()
            .copied()
            .collect()
    }

    pub async fn registers(&self) -> Vec<RegisterSlot> {
        self.internals.lock().await.bank.slots().to_vec()
    }

    pub async fn flags(&self) -> Flags {
        self.internals.lock().await.bank.flags()
    }

    pub async fn image(&self) -> Option<Arc<LoadedImage>> {
        self.internals.lock().await.image.clone()
    }

    /// Index of the disassembled line that `ip` points at
    pub async fn current_line(&self) -> Option<usize> {
        let internals = self.internals.lock().await;
        let ip = internals.bank.ip();
        internals.image.as_ref()?.line_at(ip)
    }

    /// Everything printed to the debug console so far
    pub async fn console(&self) -> String {
        self.internals.lock().await.console.clone()
    }

    async fn request(&self, request: Request) -> Result<(), ClientError> {
        match self.try_request(request).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.report(&e).await;
                Err(e)
            }
        }
    }

    async fn try_request(&self, request: Request) -> Result<Opcode, ClientError> {
        let frame = self.send(request).await?;
        self.dispatch(&frame).await
    }

    async fn send(&self, request: Request) -> Result<Bytes, ClientError> {
        let opcode = request.opcode();
        let frame = request.encode()?;
        tracing::debug!(%opcode, len = frame.len(), "sending request");
        let reply = self.transport.exchange(frame).await?;
        tracing::debug!(len = reply.len(), "received response");
        Ok(reply)
    }

    async fn dispatch(&self, frame: &[u8]) -> Result<Opcode, ClientError> {
        let response = Response::parse(frame).inspect_err(|e| {
            tracing::error!(error = %e, "discarding malformed response");
        })?;
        self.internals.lock().await.handle_response(response)
    }

    /// Print an error to the console; server errors are printed when handled.
    async fn report(&self, error: &ClientError) {
        if matches!(error, ClientError::Server(_)) {
            return;
        }
        self.internals.lock().await.print(error.to_string());
    }
}

fn decode_image(bytes: &[u8]) -> Result<LoadedImage, ClientError> {
    let image: ExecutableImage = image::parse(bytes)?;
    let lines = disasm::disassemble(&image)?;
    Ok(LoadedImage::new(image, lines))
}

impl<T> Drop for Debugger<T> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
