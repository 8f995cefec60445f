use libc::_exit;
use log::info;
use nix::fcntl::{open, OFlag};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::stat::Mode;
use nix::unistd::{chdir, close, dup2, fork, setsid, ForkResult};

use crate::error::Diagnostic;
use crate::reporter::Reporter;

fn ignore_signal(sig: Signal) -> Result<(), Diagnostic> {
    let act = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());

    unsafe { sigaction(sig, &act) }
        .map_err(|e| Diagnostic::from_nix(format!("can't ignore {:?}", sig), e))?;

    Ok(())
}

/// Forks and lets the parent exit; the caller continues as the child.
fn fork_and_detach() -> Result<(), Diagnostic> {
    match unsafe { fork() }.map_err(|e| Diagnostic::from_nix("fork error", e))? {
        ForkResult::Parent { .. } => unsafe { _exit(0) },
        ForkResult::Child => Ok(()),
    }
}

/// Detaches the process from its terminal and switches `reporter` to syslog.
///
/// Session leader after the first fork, then a second fork so the daemon can
/// never reacquire a controlling terminal. SIGHUP, sent to the session when
/// the leader exits, is ignored.
pub fn become_daemon(reporter: &mut Reporter) -> Result<(), Diagnostic> {
    info!("{}: detaching", reporter.ident());

    fork_and_detach()?;
    setsid().map_err(|e| Diagnostic::from_nix("setsid error", e))?;
    ignore_signal(Signal::SIGHUP)?;
    fork_and_detach()?;

    chdir("/").map_err(|e| Diagnostic::from_nix("chdir error", e))?;

    let nio = open("/dev/null", OFlag::O_RDWR, Mode::empty())
        .map_err(|e| Diagnostic::from_nix("can't open /dev/null", e))?;
    for fd in 0..3 {
        dup2(nio, fd).map_err(|e| Diagnostic::from_nix("dup2 error", e))?;
    }
    if nio > 2 {
        close(nio).map_err(|e| Diagnostic::from_nix("close error", e))?;
    }

    reporter.daemonize();

    Ok(())
}
