#[macro_use]
pub mod error;
pub mod client;
pub mod daemon;
pub mod reporter;
pub mod server;

/// Upper bound for a rendered diagnostic line and for one read from the peer.
pub const MAXLINE: usize = 1024;

/// Well-known port of the daytime protocol (RFC 867).
pub const DAYTIME_PORT: u16 = 13;
