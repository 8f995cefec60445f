use log::debug;
use std::io;
use std::io::prelude::*;
use std::net::{Ipv4Addr, SocketAddrV4, TcpStream};
use std::str::FromStr;

use crate::error::Diagnostic;
use crate::MAXLINE;

/// Dotted-decimal IPv4 only, the way inet_pton(AF_INET, ...) reads it.
pub fn parse_addr(text: &str) -> Result<Ipv4Addr, Diagnostic> {
    Ipv4Addr::from_str(text).map_err(|_| quit_err!("inet_pton error for {}", text))
}

pub fn open_connection(addr: Ipv4Addr, port: u16) -> Result<TcpStream, Diagnostic> {
    let servaddr = SocketAddrV4::new(addr, port);
    debug!("connecting to {}", servaddr);

    TcpStream::connect(servaddr).map_err(|why| Diagnostic::system("connect error", why))
}

/// Copies everything the peer sends to `out` until it closes the connection.
///
/// A zero-byte read ends the copy; any read error other than an interrupted
/// call is fatal. Returns the number of bytes copied.
pub fn copy_response<R: Read, W: Write>(conn: &mut R, out: &mut W) -> Result<u64, Diagnostic> {
    let mut recvline = [0u8; MAXLINE];
    let mut total: u64 = 0;

    loop {
        let n = match conn.read(&mut recvline) {
            Ok(0) => break,
            Ok(n) => n,
            Err(why) if why.kind() == io::ErrorKind::Interrupted => continue,
            Err(why) => return Err(Diagnostic::system("read error", why)),
        };

        out.write_all(&recvline[..n])
            .map_err(|why| Diagnostic::system("write error", why))?;
        total += n as u64;
        debug!("read {} bytes", n);
    }

    out.flush()
        .map_err(|why| Diagnostic::system("write error", why))?;

    Ok(total)
}

/// Parses `target`, connects to it on `port` and copies the response to `out`.
pub fn run<W: Write>(target: &str, port: u16, out: &mut W) -> Result<u64, Diagnostic> {
    let addr = parse_addr(target)?;
    let mut stream = open_connection(addr, port)?;

    copy_response(&mut stream, out)
}
