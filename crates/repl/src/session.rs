use std::{io::Write, path::PathBuf};

use color_eyre::eyre::{self, Context};
use debugger::{Debugger, Event};
use tokio::io::{AsyncBufReadExt, BufReader};
use transport::HttpTransport;
use uvm_types::format_vaddr;

const HELP: &str = "\
commands:
  load <file>     load and disassemble an image
  open            open a debug session (ctrl-c to give up)
  close           close the debug session
  run             run the loaded image
  step, s         execute one instruction
  continue, c     run until a breakpoint or the end
  stop            stop the program
  regs            show the registers
  break, b <addr> toggle a breakpoint
  breakpoints     list breakpoints
  list, l         show the disassembly
  quit, q         close the session and exit";

enum ShouldQuit {
    True,
    False,
}

struct App {
    debugger: Debugger<HttpTransport>,
}

impl App {
    fn print_events(&mut self) {
        for event in self.debugger.events().drain() {
            match event {
                Event::Console(line) => println!("{line}"),
                Event::Output(text) => print!("{text}"),
                Event::StateChanged(state) => println!("[session {state}]"),
                Event::ImageLoaded {
                    entry_address,
                    lines,
                } => println!(
                    "loaded image with {lines} instructions, entry {}",
                    format_vaddr(entry_address)
                ),
                Event::Registers(slots) => {
                    for slot in slots.iter().filter(|slot| slot.changed) {
                        println!("  {:<4} {}  {}", slot.name, slot.hex(), slot.value);
                    }
                }
                Event::Breakpoints(addresses) => {
                    tracing::debug!(count = addresses.len(), "breakpoints changed");
                }
            }
        }
    }

    async fn open(&self) {
        tokio::select! {
            result = self.debugger.open_session() => {
                if let Err(e) = result {
                    tracing::debug!(error = %e, "opening session");
                }
            }
            _ = tokio::signal::ctrl_c() => println!("gave up opening a session"),
        }
    }

    async fn print_registers(&self) {
        for slot in self.debugger.registers().await {
            let marker = if slot.changed { "*" } else { " " };
            println!(
                "{marker} {:<4} {}  {}",
                slot.name,
                slot.hex(),
                slot.value
            );
        }
        println!("  flags {}", self.debugger.flags().await);
    }

    async fn print_listing(&self) {
        let Some(loaded) = self.debugger.image().await else {
            println!("no image loaded");
            return;
        };
        let current = self.debugger.current_line().await;
        let breakpoints = self.debugger.breakpoints().await;
        for (i, line) in loaded.lines().iter().enumerate() {
            let at = if Some(i) == current { ">" } else { " " };
            let bp = if breakpoints.contains(&line.address) {
                "*"
            } else {
                " "
            };
            println!("{at}{bp} {}  {}", format_vaddr(line.address), line.text);
        }
    }

    #[tracing::instrument(skip(self))]
    async fn handle_input(&mut self, input: &str) -> eyre::Result<ShouldQuit> {
        let mut words = input.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(ShouldQuit::False);
        };
        let argument = words.next();

        // Failed operations are already reported through console events.
        let result = match (command, argument) {
            ("q" | "quit", _) => return Ok(ShouldQuit::True),
            ("help" | "h", _) => {
                println!("{HELP}");
                Ok(())
            }
            ("load", Some(path)) => match tokio::fs::read(path).await {
                Ok(bytes) => self.debugger.load_image(bytes).await,
                Err(e) => {
                    println!("cannot read {path}: {e}");
                    Ok(())
                }
            },
            ("open", _) => {
                self.open().await;
                Ok(())
            }
            ("close", _) => self.debugger.close_session().await,
            ("run", _) => self.debugger.run_loaded().await,
            ("s" | "step", _) => self.debugger.step().await,
            ("c" | "continue", _) => self.debugger.continue_().await,
            ("stop", _) => self.debugger.stop().await,
            ("regs", _) => {
                self.print_registers().await;
                Ok(())
            }
            ("b" | "break", Some(address)) => match parse_address(address) {
                Some(address) => self.debugger.toggle_breakpoint(address).await.map(|set| {
                    let verb = if set { "set" } else { "removed" };
                    println!("breakpoint {verb} at {}", format_vaddr(address));
                }),
                None => {
                    println!("invalid address '{address}'");
                    Ok(())
                }
            },
            ("breakpoints", _) => {
                for address in self.debugger.breakpoints().await {
                    println!("{}", format_vaddr(address));
                }
                Ok(())
            }
            ("l" | "list", _) => {
                self.print_listing().await;
                Ok(())
            }
            (other, _) => {
                println!("Unhandled command: '{other}', try 'help'");
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::debug!(error = %e, "command failed");
        }
        Ok(ShouldQuit::False)
    }
}

/// Parse `0x`-prefixed hex or decimal.
fn parse_address(text: &str) -> Option<u64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

pub async fn run(config: &config::Config, file: Option<PathBuf>) -> eyre::Result<()> {
    let transport =
        HttpTransport::with_timeout(config.server.url.clone(), config.server.request_timeout())
            .wrap_err("creating HTTP client")?;
    tracing::debug!(url = %transport.url(), "connecting to debug server");

    let debugger = Debugger::new(transport).with_retry_interval(config.session.retry_interval());
    let mut app = App { debugger };

    if let Some(file) = file {
        let bytes = tokio::fs::read(&file)
            .await
            .wrap_err_with(|| format!("reading {}", file.display()))?;
        if app.debugger.load_image(bytes).await.is_err() {
            app.print_events();
            eyre::bail!("could not load {}", file.display());
        }
    }
    app.open().await;
    app.print_events();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await.wrap_err("reading from stdin")? else {
            break;
        };
        let should_quit = app
            .handle_input(line.trim())
            .await
            .wrap_err("handling command")?;
        app.print_events();
        if let ShouldQuit::True = should_quit {
            break;
        }
    }

    let debugger = app.debugger;
    if let Err(e) = debugger.shutdown().await {
        tracing::debug!(error = %e, "closing session on exit");
    }
    Ok(())
}
