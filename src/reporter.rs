use log::debug;
use std::ffi::CString;
use std::io;
use std::io::prelude::*;
use std::process;

use crate::error::Diagnostic;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Attached to a terminal: diagnostics go to stderr.
    Normal,
    /// Detached: diagnostics go to syslog.
    Daemonized,
}

/// Destination of a rendered diagnostic line.
pub trait Sink {
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

/// Writes to an error stream after flushing the output stream, so the
/// diagnostic lands after whatever normal output was already produced.
pub struct Console<O: Write, E: Write> {
    out: O,
    err: E,
}

impl<O: Write, E: Write> Console<O, E> {
    pub fn new(out: O, err: E) -> Console<O, E> {
        Console { out, err }
    }
}

impl Console<io::Stdout, io::Stderr> {
    pub fn stdio() -> Console<io::Stdout, io::Stderr> {
        Console::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Sink for Console<O, E> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        // A broken stdout must not keep the line off stderr.
        let flushed = self.out.flush();
        self.err.write_all(line.as_bytes())?;
        self.err.flush()?;
        flushed
    }
}

/// syslog(3) at `LOG_ERR`, facility `LOG_DAEMON`. Closes the log on drop.
pub struct Syslog {
    // openlog keeps this pointer; it has to live as long as the log is open.
    ident: CString,
}

impl Syslog {
    pub fn open(ident: &str) -> Syslog {
        let ident = CString::new(ident.replace('\0', "")).unwrap_or_default();

        unsafe { libc::openlog(ident.as_ptr(), libc::LOG_PID, libc::LOG_DAEMON) };

        Syslog { ident }
    }

    pub fn ident(&self) -> &str {
        self.ident.to_str().unwrap_or("")
    }
}

impl Sink for Syslog {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        let message = CString::new(line.trim_end_matches('\n').replace('\0', ""))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // "%s" keeps '%' in the message from being read as a conversion.
        unsafe {
            libc::syslog(
                libc::LOG_ERR,
                b"%s\0".as_ptr() as *const libc::c_char,
                message.as_ptr(),
            )
        };

        Ok(())
    }
}

impl Drop for Syslog {
    fn drop(&mut self) {
        unsafe { libc::closelog() };
    }
}

pub struct Reporter {
    ident: String,
    mode: Mode,
    sink: Box<dyn Sink>,
}

impl Reporter {
    /// A reporter in [`Mode::Normal`] writing to this process's stderr.
    pub fn new(ident: &str) -> Reporter {
        Reporter::with_sink(ident, Box::new(Console::stdio()))
    }

    pub fn with_sink(ident: &str, sink: Box<dyn Sink>) -> Reporter {
        Reporter {
            ident: ident.to_string(),
            mode: Mode::Normal,
            sink,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Switches to the system log. There is no way back to `Normal`.
    pub fn daemonize(&mut self) {
        if self.mode == Mode::Daemonized {
            return;
        }

        self.sink = Box::new(Syslog::open(&self.ident));
        self.mode = Mode::Daemonized;
    }

    /// Renders and emits one diagnostic. A failing sink is not an error here:
    /// the caller is about to exit either way.
    pub fn report(&mut self, diag: &Diagnostic) {
        let line = diag.render();

        if let Err(why) = self.sink.emit(&line) {
            debug!("{}: diagnostic sink failed: {}", self.ident, why);
        }
    }

    /// Reports `diag` and terminates the process with status 1.
    pub fn fatal(mut self, diag: &Diagnostic) -> ! {
        self.report(diag);
        process::exit(1);
    }
}
