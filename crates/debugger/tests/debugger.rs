use std::{io::IsTerminal, time::Duration};

use bytes::Bytes;
use debugger::{ClientError, Debugger, Event, SessionState};
use eyre::Result;
use image::testing::ImageBuilder;
use tracing_subscriber::EnvFilter;
use transport::{
    ProtocolError, Request, ServerError,
    testing::{MemoryTransport, error_frame, register_frame, response_frame, runtime_error_frame},
};
use uvm_types::{RegisterId, RuntimeErrorKind};

#[ctor::ctor]
fn init() {
    let in_ci = std::env::var("CI")
        .map(|val| val == "true")
        .unwrap_or(false);

    if std::io::stderr().is_terminal() || in_ci {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .try_init();
    }

    // error traces
    let _ = color_eyre::install();
}

/// `nop`, `nop`, `exit` at 0x7A, 0x7B and 0x7C
fn program() -> Vec<u8> {
    ImageBuilder::new()
        .entry_address(0x7A)
        .code(&[0xA0, 0xA0, 0x50])
        .build()
}

/// A debugger with a scripted transport and a session already open.
async fn open_debugger() -> Result<(Debugger<MemoryTransport>, MemoryTransport)> {
    let transport = MemoryTransport::new();
    let debugger = Debugger::new(transport.clone());
    transport.push_response(response_frame(0x01, &[]));
    debugger.open_session().await?;
    assert_eq!(debugger.state().await, SessionState::Open);
    Ok((debugger, transport))
}

#[tokio::test]
async fn open_then_load_moves_to_file_loaded() -> Result<()> {
    let (mut debugger, transport) = open_debugger().await?;

    debugger.load_image(program()).await?;
    assert_eq!(debugger.state().await, SessionState::FileLoaded);
    assert_eq!(transport.sent_requests()?, vec![Request::OpenSession]);

    let events = debugger.events().drain();
    assert!(events.contains(&Event::StateChanged(SessionState::Open)));
    assert!(events.contains(&Event::ImageLoaded {
        entry_address: 0x7A,
        lines: 3
    }));
    assert_eq!(
        events.last(),
        Some(&Event::StateChanged(SessionState::FileLoaded))
    );
    Ok(())
}

#[tokio::test]
async fn image_loaded_before_open() -> Result<()> {
    let transport = MemoryTransport::new();
    let debugger = Debugger::new(transport.clone());

    debugger.load_image(program()).await?;
    assert_eq!(debugger.state().await, SessionState::Closed);

    transport.push_response(response_frame(0x01, &[]));
    debugger.open_session().await?;
    assert_eq!(debugger.state().await, SessionState::FileLoaded);
    Ok(())
}

#[tokio::test]
async fn error_response_leaves_state_alone() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;

    transport.push_response(error_frame(0x02));
    let err = debugger.step().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Server(ServerError::NotInSession)
    ));
    assert_eq!(debugger.state().await, SessionState::Open);
    assert!(
        debugger
            .console()
            .await
            .ends_with("Response error: NOT_IN_SESSION\n")
    );
    Ok(())
}

#[tokio::test]
async fn breakpoint_toggle_sends_set_then_remove() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;

    transport.push_response(response_frame(0xB0, &[]));
    assert!(debugger.toggle_breakpoint(0x40).await?);
    assert_eq!(debugger.breakpoints().await, vec![0x40]);

    transport.push_response(response_frame(0xB1, &[]));
    assert!(!debugger.toggle_breakpoint(0x40).await?);
    assert!(debugger.breakpoints().await.is_empty());

    let sent = transport.sent();
    let magic: [u8; 8] = [0x47, 0x72, 0xC3, 0xBC, 0x65, 0x7A, 0x69, 0x3F];
    let body: [u8; 8] = [0x40, 0, 0, 0, 0, 0, 0, 0];
    assert_eq!(&sent[1][..8], &magic);
    assert_eq!(sent[1][8], 0xB0);
    assert_eq!(&sent[1][9..], &body);
    assert_eq!(&sent[2][..8], &magic);
    assert_eq!(sent[2][8], 0xB1);
    assert_eq!(&sent[2][9..], &body);
    Ok(())
}

#[tokio::test]
async fn failed_toggle_keeps_local_membership() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;

    transport.push_failure("connection reset");
    let err = debugger.toggle_breakpoint(0x7B).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(debugger.breakpoints().await, vec![0x7B]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn open_session_retries_until_accepted() -> Result<()> {
    let transport = MemoryTransport::new();
    let debugger = Debugger::new(transport.clone());

    transport.push_failure("connection refused");
    transport.push_response(error_frame(0x01));
    transport.push_response(response_frame(0x01, &[]));

    let started = tokio::time::Instant::now();
    debugger.open_session().await?;

    assert!(started.elapsed() >= Duration::from_millis(4000));
    assert_eq!(transport.sent().len(), 3);
    assert_eq!(transport.pending(), 0);
    assert_eq!(debugger.state().await, SessionState::Open);

    let console = debugger.console().await;
    assert_eq!(console.matches("Trying to open debug session...").count(), 3);
    assert!(console.contains("Response error: ALREADY_IN_SESSION"));
    assert!(console.ends_with("Successfully opened debug session\n"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn retry_interval_is_configurable() -> Result<()> {
    let transport = MemoryTransport::new();
    let debugger =
        Debugger::new(transport.clone()).with_retry_interval(Duration::from_millis(250));

    transport.push_failure("connection refused");
    transport.push_response(response_frame(0x01, &[]));

    let started = tokio::time::Instant::now();
    debugger.open_session().await?;
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(250));
    assert!(elapsed < Duration::from_millis(2000));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancelling_stops_the_retry_loop() -> Result<()> {
    let transport = MemoryTransport::new();
    let debugger = Debugger::new(transport.clone());

    let token = debugger.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5000)).await;
        token.cancel();
    });

    let err = debugger.open_session().await.unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
    assert_eq!(debugger.state().await, SessionState::Closed);
    assert_eq!(transport.sent().len(), 3);
    Ok(())
}

#[tokio::test]
async fn run_continue_and_runtime_error() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;
    debugger.load_image(program()).await?;

    transport.push_response(register_frame(0xE0, &[(0x01, 0x7A)], b""));
    debugger.run_loaded().await?;
    assert_eq!(debugger.state().await, SessionState::Running);

    transport.push_response(runtime_error_frame(RuntimeErrorKind::DivisionByZero as u8));
    let err = debugger.continue_().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Server(ServerError::Runtime(RuntimeErrorKind::DivisionByZero))
    ));
    assert_eq!(debugger.state().await, SessionState::FileLoaded);
    assert!(
        debugger
            .console()
            .await
            .ends_with("RUNTIME ERROR: DIVISION_BY_ZERO\n")
    );

    let requests = transport.sent_requests()?;
    assert_eq!(requests[1], Request::Run(Bytes::from(program())));
    assert_eq!(requests[2], Request::Continue);
    Ok(())
}

#[tokio::test]
async fn stepping_tracks_the_current_line() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;
    debugger.load_image(program()).await?;

    transport.push_response(register_frame(0xE0, &[(0x01, 0x7A)], b""));
    debugger.run_loaded().await?;
    assert_eq!(debugger.current_line().await, Some(0));

    transport.push_response(register_frame(0xE1, &[(0x01, 0x7B)], b""));
    debugger.step().await?;
    assert_eq!(debugger.current_line().await, Some(1));
    assert_eq!(debugger.state().await, SessionState::Running);

    let registers = debugger.registers().await;
    let ip = &registers[0];
    assert_eq!(ip.id, RegisterId::IP);
    assert_eq!(ip.hex(), "0x000000000000007B");
    assert!(ip.changed);
    assert!(!registers[1].changed);

    transport.push_response(register_frame(0xFF, &[(0x01, 0x7C)], b"done\n"));
    debugger.continue_().await?;
    assert_eq!(debugger.state().await, SessionState::FileLoaded);
    assert_eq!(debugger.current_line().await, Some(2));

    let console = debugger.console().await;
    assert!(console.ends_with("done\nFinished execution\n"), "{console:?}");
    Ok(())
}

#[tokio::test]
async fn stop_returns_to_file_loaded() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;
    debugger.load_image(program()).await?;

    transport.push_response(register_frame(0xE2, &[], b""));
    debugger.continue_().await?;
    assert_eq!(debugger.state().await, SessionState::Running);

    transport.push_response(response_frame(0xE3, &[]));
    debugger.stop().await?;
    assert_eq!(debugger.state().await, SessionState::FileLoaded);
    Ok(())
}

#[tokio::test]
async fn repeated_register_blocks_are_unchanged() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;
    let values = [(0x01, 0x40), (0x05, (-1i64) as u64), (0x15, 1.5f64.to_bits())];

    transport.push_response(register_frame(0x10, &values, b""));
    debugger.refresh_registers().await?;
    assert_eq!(
        debugger
            .registers()
            .await
            .iter()
            .filter(|slot| slot.changed)
            .count(),
        3
    );

    transport.push_response(register_frame(0x10, &values, b""));
    debugger.refresh_registers().await?;
    assert!(debugger.registers().await.iter().all(|slot| !slot.changed));
    Ok(())
}

#[tokio::test]
async fn malformed_response_is_discarded() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;
    let before = debugger.registers().await;

    let mut frame = register_frame(0x10, &[(0x01, 0x99)], b"");
    frame[0] ^= 0xFF;
    transport.push_response(frame);
    let err = debugger.refresh_registers().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Protocol(ProtocolError::BadMagic { .. })
    ));

    transport.push_response(response_frame(0x10, &[0x01, 0x02]));
    let err = debugger.refresh_registers().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Protocol(ProtocolError::Truncated { .. })
    ));

    assert_eq!(debugger.registers().await, before);
    assert_eq!(debugger.state().await, SessionState::Open);
    assert!(debugger.console().await.contains("malformed response"));
    Ok(())
}

#[tokio::test]
async fn run_loaded_without_image() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;

    let err = debugger.run_loaded().await.unwrap_err();
    assert!(matches!(err, ClientError::NoImageLoaded));
    assert_eq!(transport.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn invalid_image_is_rejected() -> Result<()> {
    let (debugger, _transport) = open_debugger().await?;

    let err = debugger.load_image(vec![0; 16]).await.unwrap_err();
    assert!(matches!(err, ClientError::Format(_)));

    let no_code = ImageBuilder::new().names(&["data"]).build();
    let err = debugger.load_image(no_code).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));

    assert!(debugger.image().await.is_none());
    assert_eq!(debugger.state().await, SessionState::Open);
    Ok(())
}

#[tokio::test]
async fn close_on_error_response() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;

    transport.push_response(error_frame(0x02));
    let err = debugger.close_session().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Server(ServerError::NotInSession)
    ));
    assert_eq!(debugger.state().await, SessionState::Closed);

    // already closed, nothing is sent
    debugger.close_session().await?;
    assert_eq!(transport.sent().len(), 2);
    Ok(())
}

#[tokio::test]
async fn close_survives_transport_failure() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;

    transport.push_failure("connection refused");
    let err = debugger.close_session().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(debugger.state().await, SessionState::Open);

    transport.push_response(response_frame(0x02, &[]));
    debugger.close_session().await?;
    assert_eq!(debugger.state().await, SessionState::Closed);
    assert!(
        debugger
            .console()
            .await
            .ends_with("Closed debug session\n")
    );
    Ok(())
}

#[tokio::test]
async fn shutdown_closes_the_session() -> Result<()> {
    let (debugger, transport) = open_debugger().await?;

    transport.push_response(response_frame(0x02, &[]));
    debugger.shutdown().await?;
    assert_eq!(
        transport.sent_requests()?,
        vec![Request::OpenSession, Request::CloseSession]
    );
    Ok(())
}

#[tokio::test]
async fn events_follow_register_updates() -> Result<()> {
    let (mut debugger, transport) = open_debugger().await?;
    debugger.events().drain();

    transport.push_response(register_frame(0x10, &[(0x05, 7)], b"hi"));
    debugger.refresh_registers().await?;

    let Some(Event::Registers(slots)) = debugger.events().recv().await else {
        panic!("expected a registers event");
    };
    assert_eq!(slots[4].name, "r0");
    assert!(slots[4].changed);
    assert_eq!(
        debugger.events().recv().await,
        Some(Event::Output("hi".to_string()))
    );
    assert!(debugger.events().try_recv().is_none());
    Ok(())
}
