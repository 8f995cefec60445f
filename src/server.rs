use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, TimeZone};
use getopts::Options;
use log::{debug, info};
use std::fmt;
use std::io;
use std::io::prelude::*;
use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

use crate::error::Diagnostic;
use crate::reporter::Reporter;
use crate::DAYTIME_PORT;

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    /// Stay attached to the terminal and keep reporting to stderr.
    pub debug_mode: bool,
    /// Number of connections to serve before exiting; `None` serves forever.
    pub count: Option<u64>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            port: DAYTIME_PORT,
            debug_mode: false,
            count: None,
        }
    }
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optflag("h", "help", "print this help menu");
    opts.optflag("d", "debug", "debug mode (no daemon, report to stderr)");
    opts.optopt("p", "port", "port number", "PORT");
    opts.optopt("n", "count", "exit after serving N connections", "N");
    opts
}

pub fn usage(program: &str) -> String {
    let brief = format!("Usage: {} [-d] [--port=n] [--count=n]", program);
    options().usage(&brief)
}

/// Parses the server command line (without the program name).
/// `Ok(None)` means help was requested.
pub fn parse_args(args: &[String]) -> Result<Option<Config>> {
    let matches = options().parse(args)?;

    if matches.opt_present("h") {
        return Ok(None);
    }

    if !matches.free.is_empty() {
        return Err(anyhow!("unexpected argument: {}", matches.free[0]));
    }

    let mut config = Config::default();
    config.debug_mode = matches.opt_present("d");

    if let Some(p) = matches.opt_str("p") {
        config.port = p.parse().with_context(|| format!("invalid port: {}", p))?;
    }

    if let Some(n) = matches.opt_str("n") {
        config.count = Some(n.parse().with_context(|| format!("invalid count: {}", n))?);
    }

    Ok(Some(config))
}

pub fn listen_socket(port: u16) -> Result<TcpListener, Diagnostic> {
    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    let listener =
        TcpListener::bind(addr).map_err(|why| Diagnostic::system("bind error", why))?;
    info!("listening on {}", addr);

    Ok(listener)
}

/// ctime(3) layout followed by CRLF: `Fri Jan  5 09:03:07 2024\r\n`.
pub fn daytime_string<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("{}\r\n", now.format("%a %b %e %H:%M:%S %Y"))
}

/// Serves connections one at a time, writing the current local time to each.
pub fn server_main(
    listener: &TcpListener,
    count: Option<u64>,
    reporter: &mut Reporter,
) -> Result<(), Diagnostic> {
    serve_with(listener, count, reporter, || daytime_string(&Local::now()))
}

/// Accept loop behind [`server_main`], with the reply text supplied by `now`.
///
/// A client that goes away before its reply is written, or an accept that
/// fails for a single pending connection, is reported and skipped. Only a
/// listener-level accept failure ends the loop.
pub fn serve_with<F>(
    listener: &TcpListener,
    count: Option<u64>,
    reporter: &mut Reporter,
    mut now: F,
) -> Result<(), Diagnostic>
where
    F: FnMut() -> String,
{
    let mut served: u64 = 0;

    while count.map_or(true, |n| served < n) {
        let (mut conn, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(why) if is_transient(&why) => {
                reporter.report(&Diagnostic::system("accept error", why));
                continue;
            }
            Err(why) => return Err(Diagnostic::system("accept error", why)),
        };
        debug!("connection from {}", peer);
        served += 1;

        if let Err(why) = conn.write_all(now().as_bytes()) {
            reporter.report(&Diagnostic::system(format!("write error to {}", peer), why));
        }
    }

    Ok(())
}

fn is_transient(why: &io::Error) -> bool {
    matches!(
        why.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
