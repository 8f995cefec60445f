use assert_cmd::Command;
use std::io::prelude::*;
use std::net::{TcpListener, TcpStream};
use std::sync::{Mutex, MutexGuard};
use std::thread;

// Tests that touch the real daytime port must not overlap.
static DAYTIME_PORT: Mutex<()> = Mutex::new(());

fn daytime_port() -> MutexGuard<'static, ()> {
    DAYTIME_PORT.lock().unwrap_or_else(|e| e.into_inner())
}

fn daytime() -> Command {
    Command::cargo_bin("daytime").unwrap()
}

#[test]
fn no_arguments_is_a_usage_error() {
    let assert = daytime().assert().failure().code(1);
    let output = assert.get_output();

    assert!(output.stdout.is_empty());
    assert_eq!(output.stderr, b"usage: daytime <IPaddress>\n");
}

#[test]
fn two_arguments_is_a_usage_error() {
    let assert = daytime()
        .args(&["127.0.0.1", "127.0.0.2"])
        .assert()
        .failure()
        .code(1);
    let output = assert.get_output();

    assert!(output.stdout.is_empty());
    assert_eq!(output.stderr, b"usage: daytime <IPaddress>\n");
}

#[test]
fn unparsable_address_names_the_input() {
    let assert = daytime().arg("not.an.address").assert().failure().code(1);
    let output = assert.get_output();

    assert!(output.stdout.is_empty());
    assert_eq!(output.stderr, b"inet_pton error for not.an.address\n");
}

#[test]
fn refused_connection_reports_os_error() {
    let _port = daytime_port();

    // Someone actually runs a daytime service here; nothing to refuse.
    if TcpStream::connect("127.0.0.1:13").is_ok() {
        return;
    }

    let assert = daytime().arg("127.0.0.1").assert().failure().code(1);
    let output = assert.get_output();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.stdout.is_empty());
    assert!(stderr.starts_with("connect error: "), "{}", stderr);
    assert!(stderr.trim_end().len() > "connect error: ".len());
    assert_eq!(stderr.matches('\n').count(), 1);
}

#[test]
fn prints_server_reply_and_exits_zero() {
    let _port = daytime_port();

    // Port 13 is privileged; without the right to bind it there is no peer.
    let listener = match TcpListener::bind("127.0.0.1:13") {
        Ok(listener) => listener,
        Err(_) => return,
    };

    let server = thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        conn.write_all(b"2024-01-01 00:00:00\n").unwrap();
    });

    let assert = daytime().arg("127.0.0.1").assert().success().code(0);
    let output = assert.get_output();

    assert_eq!(output.stdout, b"2024-01-01 00:00:00\n");
    assert!(output.stderr.is_empty());
    server.join().unwrap();
}
