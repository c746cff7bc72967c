//! Integration tests for the bring-up sequence.
//!
//! All tests run under paused Tokio time, so holds and timeout windows are
//! exact and instantaneous.

use rfidlock_bringup::{BringupConfig, BringupError, BringupState, ReaderProtocol};
use rfidlock_core::constants::CALIBRATION_POWER_LEVELS;
use rfidlock_core::{CalibrationOutcome, Fault, SelectOutcome, TagPollOutcome};
use rfidlock_hardware::mock::{
    MockStatusBus, MockStatusBusHandle, MockTransport, MockTransportHandle, ReaderProfile,
    SimulatedReader,
};
use rfidlock_hardware::{HardwareError, SerialLink};
use rfidlock_protocol::ReaderCommand;
use rstest::rstest;
use std::time::Duration;
use tokio::time::Instant;

type MockSession = ReaderProtocol<MockTransport, MockStatusBus>;
type SimulatedSession = ReaderProtocol<SimulatedReader, MockStatusBus>;

async fn mock_session(config: BringupConfig) -> (MockSession, MockTransportHandle, MockStatusBusHandle) {
    let (transport, transport_handle) = MockTransport::new();
    let (bus, bus_handle) = MockStatusBus::new();

    let mut link = SerialLink::new(transport, config.build_timeout_window());
    link.init(&config.serial.link_settings()).await.unwrap();
    link.arm_timeout();

    (ReaderProtocol::new(link, bus, config), transport_handle, bus_handle)
}

async fn simulated_session(
    profile: ReaderProfile,
    config: BringupConfig,
) -> (SimulatedSession, MockStatusBusHandle) {
    let (bus, bus_handle) = MockStatusBus::new();

    let mut link = SerialLink::new(SimulatedReader::new(profile), config.build_timeout_window());
    link.init(&config.serial.link_settings()).await.unwrap();
    link.arm_timeout();

    (ReaderProtocol::new(link, bus, config), bus_handle)
}

#[tokio::test(start_paused = true)]
async fn test_full_run_against_simulated_reader() {
    let (mut session, bus) =
        simulated_session(ReaderProfile::default(), BringupConfig::default()).await;

    let report = session.run().await.unwrap();

    assert_eq!(report.handshake_attempts, 1);
    assert_eq!(report.identity_text().as_deref(), Some("NFC FS2JAST4.*."));
    assert_eq!(report.calibration.len(), 8);
    assert_eq!(report.protocol_select, Some(SelectOutcome::Success));
    assert_eq!(report.tag_poll, Some(TagPollOutcome::Detected));
    assert!(report.is_clean());

    assert_eq!(session.state(), BringupState::Idle);
    assert_eq!(session.machine().history().len(), 5);
    assert_eq!(bus.current().map(|p| p.bits()), Some(0x07));

    let (link, _) = session.into_parts();
    let commands = link.into_inner().commands();
    assert_eq!(commands.first(), Some(&ReaderCommand::Echo));
    assert_eq!(commands.get(1), Some(&ReaderCommand::Identity));
    assert_eq!(commands.last(), Some(&ReaderCommand::TagDetect));
    assert_eq!(commands.len(), 1 + 1 + 8 + 1 + 1);
}

#[tokio::test(start_paused = true)]
async fn test_first_echo_advances_without_settle_delay() {
    let (mut session, transport, bus) = mock_session(BringupConfig::default()).await;
    transport.push_bytes(&[0x55]).unwrap();

    let start = Instant::now();
    assert_eq!(session.handshake().await.unwrap(), 1);

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(transport.sent(), vec![0x55]);
    assert_eq!(bus.bits(), vec![0x0F, 0xF0]);
}

#[tokio::test(start_paused = true)]
async fn test_silent_reader_retries_after_window_and_settle() {
    let config = BringupConfig::default();
    let (mut session, bus) =
        simulated_session(ReaderProfile::default().with_silent_echoes(2), config.clone()).await;

    let start = Instant::now();
    assert_eq!(session.handshake().await.unwrap(), 3);

    let per_retry = config.timeout_window() + config.settle_delay();
    assert_eq!(start.elapsed(), per_retry * 2);
    assert_eq!(bus.bits(), vec![0x0F, 0xF0, 0x0F, 0xF0, 0x0F, 0xF0]);
}

#[tokio::test(start_paused = true)]
async fn test_transition_times_share_the_bus_clock() {
    let config = BringupConfig::default();
    let (mut session, bus) =
        simulated_session(ReaderProfile::default().with_silent_echoes(2), config.clone()).await;

    let start = Instant::now();
    session.run().await.unwrap();

    let echoed = session.machine().history()[0].timestamp;
    assert_eq!(echoed - start, (config.timeout_window() + config.settle_delay()) * 2);

    // Last handshake render happens at the moment of the transition
    let (rendered_at, pattern) = bus.history()[5];
    assert_eq!(pattern.bits(), 0xF0);
    assert_eq!(rendered_at, echoed);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_echo_byte_is_retried() {
    let (mut session, transport, _bus) = mock_session(BringupConfig::default()).await;
    transport.push_bytes(&[0xAA]).unwrap();

    // Answer the retry, sent after the 70 ms settle
    let reader = transport.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        reader.push_bytes(&[0x55]).unwrap();
    });

    assert_eq!(session.handshake().await.unwrap(), 2);
    assert_eq!(transport.sent(), vec![0x55, 0x55]);
}

#[tokio::test(start_paused = true)]
async fn test_late_echo_does_not_shift_identity() {
    let (mut session, transport, _bus) = mock_session(BringupConfig::default()).await;

    // First echo answered at 150 ms, after its 105 ms window. The retry
    // goes out at 175 ms and is answered promptly, followed by identity.
    let reader = transport.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        reader.push_bytes(&[0x55]).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        reader.push_bytes(&[0x55]).unwrap();
        reader.push_bytes(&[0x00, 0x02, b'O', b'K']).unwrap();
    });

    assert_eq!(session.handshake().await.unwrap(), 2);
    let identity = session.identity().await.unwrap();

    assert_eq!(identity.status(), 0x00);
    assert_eq!(identity.display_text(), "OK");
    assert!(identity.fault().is_none());
    assert_eq!(transport.sent(), vec![0x55, 0x55, 0x01, 0x00]);
}

#[tokio::test(start_paused = true)]
async fn test_identity_never_sent_before_echo() {
    let (mut session, _bus) = simulated_session(
        ReaderProfile::default().with_silent_echoes(3),
        BringupConfig::default(),
    )
    .await;

    let report = session.run().await.unwrap();
    assert_eq!(report.handshake_attempts, 4);

    let (link, _) = session.into_parts();
    let commands = link.into_inner().commands();
    let first_identity = commands
        .iter()
        .position(|c| *c == ReaderCommand::Identity)
        .unwrap();
    assert_eq!(first_identity, 4);
    assert!(commands[..4].iter().all(|c| *c == ReaderCommand::Echo));
}

#[tokio::test(start_paused = true)]
async fn test_handshake_attempt_limit() {
    let config = BringupConfig {
        max_handshake_attempts: Some(3),
        ..Default::default()
    };
    let (mut session, transport, _bus) = mock_session(config).await;

    let error = session.run().await.unwrap_err();
    assert!(matches!(
        error,
        BringupError::Sequence(rfidlock_core::Error::HandshakeExhausted { attempts: 3 })
    ));
    assert_eq!(session.state(), BringupState::AwaitingEcho);
    assert_eq!(transport.sent(), vec![0x55, 0x55, 0x55]);
}

#[tokio::test(start_paused = true)]
async fn test_calibration_classifies_each_level_in_order() {
    let (mut session, transport, bus) = mock_session(BringupConfig::default()).await;
    for outcome in [0x02, 0x01, 0x05, 0x02, 0x01, 0x01, 0x02, 0x02] {
        transport.push_bytes(&[0x00, 0x01, outcome]).unwrap();
    }

    let steps = session.calibration().await.unwrap();

    let outcomes: Vec<_> = steps.iter().map(|s| s.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            CalibrationOutcome::TagDetected,
            CalibrationOutcome::Timeout,
            CalibrationOutcome::Unexpected(0x05),
            CalibrationOutcome::TagDetected,
            CalibrationOutcome::Timeout,
            CalibrationOutcome::Timeout,
            CalibrationOutcome::TagDetected,
            CalibrationOutcome::TagDetected,
        ]
    );
    assert_eq!(
        bus.bits(),
        vec![
            0x0F, 0x00, 0xF0, 0x00, 0xFF, 0x00, 0x0F, 0x00, 0xF0, 0x00, 0xF0, 0x00, 0x0F, 0x00,
            0x0F, 0x00
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_calibration_frames_carry_power_table_in_order() {
    let (mut session, transport, _bus) = mock_session(BringupConfig::default()).await;
    for _ in CALIBRATION_POWER_LEVELS {
        transport.push_bytes(&[0x00, 0x01, 0x01]).unwrap();
    }

    let steps = session.calibration().await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 16 * 8);
    let powers: Vec<u8> = sent.chunks(16).map(|frame| frame[12]).collect();
    assert_eq!(powers, CALIBRATION_POWER_LEVELS.to_vec());
    assert_eq!(
        steps.iter().map(|s| s.power).collect::<Vec<_>>(),
        CALIBRATION_POWER_LEVELS.to_vec()
    );
}

#[tokio::test(start_paused = true)]
async fn test_calibration_holds_each_result() {
    let config = BringupConfig::default();
    let (mut session, transport, bus) = mock_session(config.clone()).await;
    for _ in CALIBRATION_POWER_LEVELS {
        transport.push_bytes(&[0x00, 0x01, 0x02]).unwrap();
    }

    session.calibration().await.unwrap();

    let history = bus.history();
    for pair in history.chunks(2) {
        assert_eq!(pair[1].0 - pair[0].0, config.calibration_hold());
    }
}

#[tokio::test(start_paused = true)]
async fn test_protocol_select_known_error_pattern() {
    let config = BringupConfig::default();
    let (mut session, transport, bus) = mock_session(config.clone()).await;
    transport.push_bytes(&[0x82, 0x00]).unwrap();

    let start = Instant::now();
    let outcome = session.protocol_select().await.unwrap();

    assert_eq!(outcome, SelectOutcome::KnownError(0x82));
    assert_eq!(outcome.fault(), Some(Fault::ProtocolError { code: 0x82 }));
    assert_eq!(bus.bits(), vec![0xC0, 0x00]);
    assert_eq!(start.elapsed(), config.result_hold());
    assert_eq!(transport.sent(), vec![0x02, 0x02, 0x02, 0x00]);
}

#[rstest]
#[case(0x00, 0x03)]
#[case(0x83, 0xC0)]
#[case(0x10, 0xFF)]
#[tokio::test(start_paused = true)]
async fn test_protocol_select_patterns(#[case] code: u8, #[case] pattern: u8) {
    let (mut session, transport, bus) = mock_session(BringupConfig::default()).await;
    transport.push_bytes(&[code, 0x00]).unwrap();

    session.protocol_select().await.unwrap();
    assert_eq!(bus.bits(), vec![pattern, 0x00]);
}

#[rstest]
#[case(0x80, TagPollOutcome::Detected, 0x0A)]
#[case(0x87, TagPollOutcome::NotDetected, 0xA0)]
#[case(0x33, TagPollOutcome::Unexpected(0x33), 0xAA)]
#[tokio::test(start_paused = true)]
async fn test_tag_poll_patterns(
    #[case] code: u8,
    #[case] expected: TagPollOutcome,
    #[case] pattern: u8,
) {
    let (mut session, transport, bus) = mock_session(BringupConfig::default()).await;
    transport.push_bytes(&[code, 0x00]).unwrap();

    assert_eq!(session.tag_poll().await.unwrap(), expected);
    assert_eq!(bus.bits(), vec![pattern, 0x00]);
    assert_eq!(transport.sent(), vec![0x04, 0x02, 0x26, 0x07]);
}

#[tokio::test(start_paused = true)]
async fn test_identity_over_capacity_is_truncated_and_drained() {
    let (mut session, transport, bus) = mock_session(BringupConfig::default()).await;
    let payload: Vec<u8> = (0x41..0x41 + 20).collect();
    transport.push_bytes(&[0x00, 20]).unwrap();
    transport.push_bytes(&payload).unwrap();
    // Next step's response follows the oversized identity
    transport.push_bytes(&[0x00, 0x00]).unwrap();

    let identity = session.identity().await.unwrap();

    assert_eq!(identity.payload(), &payload[..16]);
    assert_eq!(identity.discarded(), 4);
    assert_eq!(
        identity.fault(),
        Some(Fault::MalformedLength {
            declared: 20,
            capacity: 16
        })
    );

    let mut expected: Vec<u8> = payload[..16].to_vec();
    expected.push(0xFF);
    assert_eq!(bus.bits(), expected);

    // The link is still in step with the reader
    assert_eq!(
        session.protocol_select().await.unwrap(),
        SelectOutcome::Success
    );
}

#[tokio::test(start_paused = true)]
async fn test_identity_timing() {
    let config = BringupConfig::default();
    let (mut session, transport, bus) = mock_session(config.clone()).await;
    transport.push_bytes(&[0x00, 3, b'C', b'R', b'9']).unwrap();

    let start = Instant::now();
    let identity = session.identity().await.unwrap();

    assert_eq!(identity.display_text(), "CR9");
    assert_eq!(bus.bits(), vec![b'C', b'R', b'9']);
    assert_eq!(
        start.elapsed(),
        config.identity_hold() * 3 + config.settle_delay()
    );
    assert_eq!(transport.sent(), vec![0x01, 0x00]);
}

#[tokio::test(start_paused = true)]
async fn test_faults_do_not_halt_the_sequence() {
    let profile = ReaderProfile::default()
        .with_select_code(0x83)
        .with_tag_present(false);
    let (mut session, bus) = simulated_session(profile, BringupConfig::default()).await;

    let report = session.run().await.unwrap();

    assert_eq!(report.protocol_select, Some(SelectOutcome::KnownError(0x83)));
    assert_eq!(report.tag_poll, Some(TagPollOutcome::NotDetected));
    assert_eq!(report.faults(), vec![Fault::ProtocolError { code: 0x83 }]);
    assert_eq!(session.state(), BringupState::Idle);
    assert_eq!(bus.current().map(|p| p.bits()), Some(0x07));
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_aborts_run() {
    let (mut session, transport, _bus) = mock_session(BringupConfig::default()).await;
    transport.push_bytes(&[0x55, 0x00]).unwrap();
    drop(transport);

    let error = session.run().await.unwrap_err();
    assert!(matches!(
        error,
        BringupError::Hardware(HardwareError::Disconnected { .. })
    ));
    assert_eq!(session.state(), BringupState::Identity);
}
