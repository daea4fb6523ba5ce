use std::{collections::BTreeSet, sync::Arc};

use disasm::DisassembledLine;
use image::ExecutableImage;
use tokio::sync::mpsc;
use transport::{Opcode, Payload, RegisterSnapshot, Response, ServerError};

use crate::{
    error::ClientError,
    registers::RegisterBank,
    state::{Event, SessionState},
};

/// A parsed image together with its disassembly.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    image: ExecutableImage,
    lines: Vec<DisassembledLine>,
}

impl LoadedImage {
    pub(crate) fn new(image: ExecutableImage, lines: Vec<DisassembledLine>) -> Self {
        Self { image, lines }
    }

    pub fn image(&self) -> &ExecutableImage {
        &self.image
    }

    pub fn lines(&self) -> &[DisassembledLine] {
        &self.lines
    }

    /// Index of the line whose instruction starts at `address`
    pub fn line_at(&self, address: u64) -> Option<usize> {
        self.lines.iter().position(|line| line.address == address)
    }
}

/// Client state guarded by the debugger's lock.
pub(crate) struct DebuggerInternals {
    pub(crate) state: SessionState,
    pub(crate) bank: RegisterBank,
    pub(crate) breakpoints: BTreeSet<u64>,
    pub(crate) image: Option<Arc<LoadedImage>>,
    pub(crate) console: String,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl DebuggerInternals {
    pub(crate) fn new(event_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            state: SessionState::Closed,
            bank: RegisterBank::new(),
            breakpoints: BTreeSet::new(),
            image: None,
            console: String::new(),
            event_tx,
        }
    }

    pub(crate) fn emit(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        tracing::debug!(from = %self.state, to = %state, "session state changed");
        self.state = state;
        self.emit(state.into());
    }

    /// Append a status line to the console.
    pub(crate) fn print(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !self.console.is_empty() && !self.console.ends_with('\n') {
            self.console.push('\n');
        }
        self.console.push_str(&line);
        self.console.push('\n');
        self.emit(Event::Console(line));
    }

    fn output(&mut self, text: String) {
        self.console.push_str(&text);
        self.emit(Event::Output(text));
    }

    pub(crate) fn load(&mut self, loaded: LoadedImage) {
        let entry_address = loaded.image().entry_address();
        let lines = loaded.lines().len();
        self.image = Some(Arc::new(loaded));
        self.emit(Event::ImageLoaded {
            entry_address,
            lines,
        });
        if self.state == SessionState::Open {
            self.set_state(SessionState::FileLoaded);
        }
    }

    pub(crate) fn toggle_breakpoint(&mut self, address: u64) -> bool {
        let set = if self.breakpoints.remove(&address) {
            false
        } else {
            self.breakpoints.insert(address);
            true
        };
        self.emit(Event::Breakpoints(
            self.breakpoints.iter().copied().collect(),
        ));
        set
    }

    pub(crate) fn close(&mut self) {
        if self.state != SessionState::Closed {
            self.set_state(SessionState::Closed);
            self.print("Closed debug session");
        }
    }

    /// Leave `Running` after the program stopped or failed.
    fn finish_running(&mut self) {
        if self.state == SessionState::Running {
            self.set_state(SessionState::FileLoaded);
        }
    }

    /// Apply a parsed response to the client state.
    ///
    /// The reaction depends only on the response opcode. An error response is
    /// printed and returned as [`ClientError::Server`].
    pub(crate) fn handle_response(&mut self, response: Response) -> Result<Opcode, ClientError> {
        let Response { opcode, payload } = response;
        tracing::debug!(%opcode, "handling response");

        match payload {
            Payload::Error(error) => {
                self.handle_server_error(error);
                return Err(ClientError::Server(error));
            }
            Payload::Registers(snapshot) => self.apply_snapshot(snapshot),
            Payload::Empty => {}
        }

        match opcode {
            Opcode::OpenSession => {
                if self.state == SessionState::Closed {
                    let next = if self.image.is_some() {
                        SessionState::FileLoaded
                    } else {
                        SessionState::Open
                    };
                    self.set_state(next);
                }
                self.print("Successfully opened debug session");
            }
            Opcode::CloseSession => self.close(),
            Opcode::Run | Opcode::Continue => self.set_state(SessionState::Running),
            Opcode::Stop => self.finish_running(),
            Opcode::ExecutionFinished => {
                self.finish_running();
                self.print("Finished execution");
            }
            Opcode::GetRegisters
            | Opcode::NextInstruction
            | Opcode::SetBreakpoint
            | Opcode::RemoveBreakpoint
            | Opcode::Error => {}
        }
        Ok(opcode)
    }

    fn handle_server_error(&mut self, error: ServerError) {
        tracing::warn!(%error, "server returned an error");
        match error {
            ServerError::Runtime(kind) => {
                self.print(format!("RUNTIME ERROR: {kind}"));
                self.finish_running();
            }
            other => self.print(format!("Response error: {other}")),
        }
    }

    fn apply_snapshot(&mut self, snapshot: RegisterSnapshot) {
        self.bank.apply(&snapshot.registers);
        self.emit(Event::Registers(self.bank.slots().to_vec()));

        if !snapshot.console.is_empty() {
            let text = String::from_utf8_lossy(&snapshot.console).into_owned();
            self.output(text);
        }
    }
}
