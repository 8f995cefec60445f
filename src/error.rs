use nix::errno::Errno;
use std::error::Error;
use std::fmt;
use std::io;

use crate::MAXLINE;

/// Builds a [`Diagnostic::System`] from the calling thread's `errno`.
///
/// The OS error is read before the message arguments are evaluated, so a
/// format argument that itself touches `errno` cannot mask the failure being
/// reported.
#[macro_export]
macro_rules! sys_err {
    ($($arg:tt)+) => {{
        let cause = ::std::io::Error::last_os_error();
        $crate::error::Diagnostic::system(format!($($arg)+), cause)
    }};
}

/// Builds a [`Diagnostic::Plain`], for failures no system call is behind.
#[macro_export]
macro_rules! quit_err {
    ($($arg:tt)+) => {
        $crate::error::Diagnostic::plain(format!($($arg)+))
    };
}

#[derive(Debug)]
pub enum Diagnostic {
    /// A system or network primitive failed; carries the OS error.
    System { message: String, cause: io::Error },
    /// Bad usage or bad input.
    Plain { message: String },
}

impl Diagnostic {
    pub fn system(message: impl Into<String>, cause: io::Error) -> Diagnostic {
        Diagnostic::System {
            message: message.into(),
            cause,
        }
    }

    /// Keeps the errno a `nix` call returned; other `nix` failures are
    /// described by their own `Display`.
    pub fn from_nix(message: impl Into<String>, err: nix::Error) -> Diagnostic {
        let cause = match err.as_errno() {
            Some(errno) => io::Error::from_raw_os_error(errno as i32),
            None => io::Error::new(io::ErrorKind::Other, err),
        };
        Diagnostic::system(message, cause)
    }

    pub fn plain(message: impl Into<String>) -> Diagnostic {
        Diagnostic::Plain {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Diagnostic::System { message, .. } => message,
            Diagnostic::Plain { message } => message,
        }
    }

    pub fn cause(&self) -> Option<&io::Error> {
        match self {
            Diagnostic::System { cause, .. } => Some(cause),
            Diagnostic::Plain { .. } => None,
        }
    }

    /// Renders the line handed to a sink: `<message>[: <description>]\n`.
    ///
    /// The result never exceeds [`MAXLINE`] bytes and always ends with exactly
    /// one newline. The OS error description is cut first; the message is
    /// only cut when it does not fit on its own.
    pub fn render(&self) -> String {
        let budget = MAXLINE - 1;
        let mut line = String::with_capacity(MAXLINE);

        push_bounded(&mut line, self.message().trim_end_matches('\n'), budget);
        if let Some(cause) = self.cause() {
            push_bounded(&mut line, ": ", budget);
            push_bounded(&mut line, &describe(cause), budget);
        }
        line.push('\n');

        line
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::System { message, cause } => write!(f, "{}: {}", message, describe(cause)),
            Diagnostic::Plain { message } => write!(f, "{}", message),
        }
    }
}

impl Error for Diagnostic {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Diagnostic::System { cause, .. } => Some(cause),
            Diagnostic::Plain { .. } => None,
        }
    }
}

/// strerror(3) text for OS errors, `Display` of the error otherwise.
pub fn describe(cause: &io::Error) -> String {
    match cause.raw_os_error() {
        Some(code) => Errno::from_i32(code).desc().to_string(),
        None => cause.to_string(),
    }
}

fn push_bounded(line: &mut String, s: &str, budget: usize) {
    let room = budget.saturating_sub(line.len());
    line.push_str(truncate(s, room));
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }

    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
