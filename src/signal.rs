/// Name of the forceful kill performed by [tokio::process::Child::start_kill].
#[cfg(windows)]
pub(crate) const KILL_NAME: &str = "TerminateProcess";
#[cfg(not(windows))]
pub(crate) const KILL_NAME: &str = "SIGKILL";

/// Signals used to ask a child process to shut down, in order of escalation.
///
/// Killing the process is not listed here, see [KILL_NAME].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShutdownSignal {
    /// Typically sent by the controlling terminal when the user presses `Ctrl+C`.
    ///
    /// - on `cfg(unix)`: `SIGINT`
    /// - on `cfg(windows)`: `CTRL_C_EVENT`
    Interrupt,

    /// Typically sent when the operating system requests a termination.
    ///
    /// - on `cfg(unix)`: `SIGTERM`
    /// - on `cfg(windows)`: `CTRL_BREAK_EVENT`
    Terminate,
}

impl ShutdownSignal {
    pub(crate) fn name(self) -> &'static str {
        match self {
            #[cfg(windows)]
            ShutdownSignal::Interrupt => "CTRL_C_EVENT",
            #[cfg(windows)]
            ShutdownSignal::Terminate => "CTRL_BREAK_EVENT",
            #[cfg(not(windows))]
            ShutdownSignal::Interrupt => "SIGINT",
            #[cfg(not(windows))]
            ShutdownSignal::Terminate => "SIGTERM",
        }
    }
}

/// Delivers `signal` to the `child`.
///
/// Does nothing if the child was already polled to completion.
/// Raises a panic on platforms being neither unix nor windows!
pub(crate) fn send(child: &tokio::process::Child, signal: ShutdownSignal) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };

    #[cfg(unix)]
    {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        let nix_signal = match signal {
            ShutdownSignal::Interrupt => Signal::SIGINT,
            ShutdownSignal::Terminate => Signal::SIGTERM,
        };
        signal::kill(Pid::from_raw(pid as i32), nix_signal).map_err(std::io::Error::other)
    }

    #[cfg(windows)]
    {
        use windows_sys::Win32::Foundation::{CTRL_BREAK_EVENT, CTRL_C_EVENT};
        use windows_sys::Win32::System::Console::GenerateConsoleCtrlEvent;

        let event = match signal {
            ShutdownSignal::Interrupt => CTRL_C_EVENT,
            ShutdownSignal::Terminate => CTRL_BREAK_EVENT,
        };
        let success = unsafe { GenerateConsoleCtrlEvent(event, pid) };
        if success == 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(all(not(windows), not(unix)))]
    {
        panic!(
            "Cannot send {} to process. Platform is unsupported.",
            signal.name()
        )
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assertr::prelude::*;
    use std::os::unix::process::ExitStatusExt;

    #[tokio::test]
    async fn interrupt_stops_sleeping_child() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("1000")
            .spawn()
            .expect("Failed to spawn `sleep`");

        send(&child, ShutdownSignal::Interrupt).unwrap();
        let status = child.wait().await.unwrap();

        assert_that(status.signal()).is_equal_to(Some(2));
    }

    #[tokio::test]
    async fn sending_to_completed_child_is_a_noop() {
        let mut child = tokio::process::Command::new("true")
            .spawn()
            .expect("Failed to spawn `true`");
        child.wait().await.unwrap();

        assert_that(send(&child, ShutdownSignal::Terminate).is_ok()).is_true();
    }

    #[test]
    fn names_follow_platform_conventions() {
        assert_that(ShutdownSignal::Interrupt.name()).is_equal_to("SIGINT");
        assert_that(ShutdownSignal::Terminate.name()).is_equal_to("SIGTERM");
    }
}
