use assert_cmd::cargo::CommandCargoExt;
use assert_cmd::Command;
use std::io::prelude::*;
use std::net::{TcpListener, TcpStream};
use std::process;
use std::thread;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn connect_with_retry(port: u16) -> TcpStream {
    for _ in 0..100 {
        if let Ok(conn) = TcpStream::connect(("127.0.0.1", port)) {
            return conn;
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("daytimed never started listening on {}", port);
}

#[test]
fn serves_ctime_line_and_exits_after_count() {
    let port = free_port();
    let mut child = process::Command::cargo_bin("daytimed")
        .unwrap()
        .args(&["-d", "-p", &port.to_string(), "-n", "1"])
        .spawn()
        .unwrap();

    let mut conn = connect_with_retry(port);
    let mut got = String::new();
    conn.read_to_string(&mut got).unwrap();

    assert!(got.ends_with("\r\n"), "{:?}", got);
    assert_eq!(got.len(), "Fri Jan  5 09:03:07 2024\r\n".len(), "{:?}", got);
    assert!(child.wait().unwrap().success());
}

#[test]
fn bad_port_is_reported_on_one_line() {
    let assert = Command::cargo_bin("daytimed")
        .unwrap()
        .args(&["-d", "-p", "daytime"])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();

    assert!(stderr.starts_with("invalid port: daytime"), "{}", stderr);
    assert_eq!(stderr.matches('\n').count(), 1);
}

#[test]
fn help_goes_to_stdout() {
    let assert = Command::cargo_bin("daytimed")
        .unwrap()
        .arg("-h")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();

    assert!(stdout.contains("--port"));
}

#[test]
fn port_in_use_is_a_bind_error() {
    let taken = TcpListener::bind("0.0.0.0:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let assert = Command::cargo_bin("daytimed")
        .unwrap()
        .args(&["-d", "-p", &port.to_string()])
        .assert()
        .failure()
        .code(1);

    assert_eq!(
        assert.get_output().stderr,
        b"bind error: Address already in use\n"
    );
}
