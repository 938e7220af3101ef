//! End-to-end tests for the UUT simulators
//!
//! These drive a simulator over an in-memory duplex stream exactly the way
//! the orchestrator drives it over a serial port: CRLF-terminated ASCII
//! commands in, CRLF-terminated responses out. Covered here:
//! - the Main, Port N, and Generic vocabularies including fallback replies
//! - simulated processing delays for the slow test commands
//! - stop behavior while the loop is blocked on read

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

use uut_protocol::DeviceRole;
use uut_sim::{DeviceConfig, DeviceSimulator, DeviceState};

// ============================================================================
// Helper Functions
// ============================================================================

fn simulator(role: DeviceRole) -> (DeviceSimulator, DuplexStream) {
    let mut sim = DeviceSimulator::new(DeviceConfig {
        port_name: format!("sim-{}", role.label()),
        baud_rate: 9600,
        role,
    });
    let (host, device) = tokio::io::duplex(1024);
    sim.start_with_stream(device).unwrap();
    (sim, host)
}

/// Send one command line and read back the full CRLF-terminated reply
async fn exchange(host: &mut DuplexStream, command: &str) -> String {
    host.write_all(command.as_bytes()).await.unwrap();

    let mut reply = Vec::new();
    let mut buf = [0u8; 256];
    while !reply.ends_with(b"\n") {
        let n = tokio::time::timeout(Duration::from_secs(3), host.read(&mut buf))
            .await
            .expect("no reply before timeout")
            .unwrap();
        assert!(n > 0, "stream closed while waiting for reply");
        reply.extend_from_slice(&buf[..n]);
    }
    String::from_utf8(reply).unwrap()
}

// ============================================================================
// Main UUT vocabulary
// ============================================================================

#[tokio::test]
async fn test_main_uut_end_to_end() {
    let (mut sim, mut host) = simulator(DeviceRole::Main);

    assert_eq!(exchange(&mut host, "MAIN_POWER_ON\r\n").await, "MAIN_POWER:ON\r\n");
    assert_eq!(exchange(&mut host, "MAIN_INIT\r\n").await, "MAIN_INIT:OK\r\n");
    assert_eq!(exchange(&mut host, "MAIN_TEST_STATUS\r\n").await, "MAIN_STATUS:READY\r\n");
    assert_eq!(exchange(&mut host, "MAIN_SHUTDOWN\r\n").await, "MAIN_SHUTDOWN:OK\r\n");

    // Prefixed but unrecognized echoes the command; anything else is invalid
    assert_eq!(
        exchange(&mut host, "MAIN_FOO\r\n").await,
        "MAIN_UNKNOWN_CMD:MAIN_FOO\r\n"
    );
    assert_eq!(
        exchange(&mut host, "garbage\r\n").await,
        "MAIN_ERROR:INVALID_COMMAND\r\n"
    );

    sim.stop().await;
}

#[tokio::test]
async fn test_main_self_test_takes_its_time() {
    let (mut sim, mut host) = simulator(DeviceRole::Main);

    let begin = Instant::now();
    let reply = exchange(&mut host, "MAIN_SELF_TEST\r\n").await;
    let elapsed = begin.elapsed();

    assert_eq!(reply, "MAIN_SELF_TEST:PASS\r\n");
    assert!(elapsed >= Duration::from_millis(500), "replied too fast: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "replied too slow: {elapsed:?}");

    sim.stop().await;
}

// ============================================================================
// Secondary port vocabulary
// ============================================================================

#[tokio::test]
async fn test_port2_end_to_end() {
    let (mut sim, mut host) = simulator(DeviceRole::Port(2));

    assert_eq!(exchange(&mut host, "PORT2_ENABLE\r\n").await, "PORT2:ENABLED\r\n");
    assert_eq!(exchange(&mut host, "PORT2_DATA_CHECK\r\n").await, "PORT2:DATA_VALID\r\n");
    assert_eq!(exchange(&mut host, "PORT2_DISABLE\r\n").await, "PORT2:DISABLED\r\n");

    assert_eq!(
        exchange(&mut host, "PORT2_BOGUS\r\n").await,
        "PORT2_UNKNOWN_CMD:PORT2_BOGUS\r\n"
    );
    // A sibling port's command misses this device's prefix entirely
    assert_eq!(
        exchange(&mut host, "PORT1_ENABLE\r\n").await,
        "PORT2_ERROR:INVALID_COMMAND\r\n"
    );

    sim.stop().await;
}

#[tokio::test]
async fn test_port2_channel_test_delay() {
    let (mut sim, mut host) = simulator(DeviceRole::Port(2));

    let begin = Instant::now();
    let reply = exchange(&mut host, "PORT2_TEST\r\n").await;
    let elapsed = begin.elapsed();

    assert_eq!(reply, "PORT2:TEST_OK\r\n");
    assert!(elapsed >= Duration::from_millis(300), "replied too fast: {elapsed:?}");

    sim.stop().await;
}

// ============================================================================
// Generic device vocabulary
// ============================================================================

#[tokio::test]
async fn test_generic_device_with_and_without_crlf() {
    let (mut sim, mut host) = simulator(DeviceRole::Generic);

    // The generic device accepts commands with or without CRLF; responses
    // are CRLF-terminated either way. A bare LF still delimits the line.
    assert_eq!(exchange(&mut host, "ATZ\r\n").await, "OK\r\n");
    assert_eq!(exchange(&mut host, "INIT_RS232\n").await, "READY\r\n");
    assert_eq!(exchange(&mut host, "AT+STATUS\r\n").await, "STATUS_OK\r\n");
    assert_eq!(exchange(&mut host, "RUN_TEST_1\n").await, "PASS\r\n");
    assert_eq!(exchange(&mut host, "EXIT\r\n").await, "BYE\r\n");
    assert_eq!(exchange(&mut host, "AT+SHUTDOWN\r\n").await, "SHUTDOWN_OK\r\n");

    assert_eq!(
        exchange(&mut host, "WHATEVER\r\n").await,
        "ERROR: Unknown command\r\n"
    );

    sim.stop().await;
}

// ============================================================================
// Command/response alternation and shutdown
// ============================================================================

#[tokio::test]
async fn test_pipelined_commands_answered_in_order() {
    let (mut sim, mut host) = simulator(DeviceRole::Main);

    // Two commands in one write; responses must come back in order with
    // no interleaving.
    host.write_all(b"MAIN_POWER_ON\r\nMAIN_INIT\r\n").await.unwrap();

    let mut replies = Vec::new();
    let mut buf = [0u8; 256];
    while replies.iter().filter(|&&b| b == b'\n').count() < 2 {
        let n = tokio::time::timeout(Duration::from_secs(3), host.read(&mut buf))
            .await
            .expect("no reply before timeout")
            .unwrap();
        replies.extend_from_slice(&buf[..n]);
    }
    assert_eq!(
        String::from_utf8(replies).unwrap(),
        "MAIN_POWER:ON\r\nMAIN_INIT:OK\r\n"
    );

    sim.stop().await;
}

#[tokio::test]
async fn test_stop_while_blocked_on_read() {
    let (mut sim, _host) = simulator(DeviceRole::Main);

    // No traffic at all; the loop is parked in its timed read. Stop must
    // still complete within its bound.
    let begin = Instant::now();
    sim.stop().await;

    assert_eq!(sim.state(), DeviceState::Stopped);
    assert!(begin.elapsed() < Duration::from_secs(2));
}
