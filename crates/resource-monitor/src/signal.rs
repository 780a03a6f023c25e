// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Signal delivery to processes.
//!
//! Independent of the sampling cycle. A target is checked with signal 0
//! before the real signal is sent. A failed check reports the process as
//! not available and a failed send reports a delivery failure.

use crate::SignalError;
use std::io;

const NAMED_SIGNALS: &[(&str, i32)] = &[
    ("HUP", libc::SIGHUP),
    ("INT", libc::SIGINT),
    ("QUIT", libc::SIGQUIT),
    ("KILL", libc::SIGKILL),
    ("USR1", libc::SIGUSR1),
    ("USR2", libc::SIGUSR2),
    ("TERM", libc::SIGTERM),
    ("CONT", libc::SIGCONT),
    ("STOP", libc::SIGSTOP),
    ("TSTP", libc::SIGTSTP),
];

/// Highest signal number accepted in numeric form (last real-time signal).
const MAX_SIGNAL: i32 = 64;

/// Parses `TERM`, `SIGTERM`, `sigkill` or `9` into a signal number.
pub fn parse_signal(input: &str) -> Result<i32, SignalError> {
    let trimmed = input.trim();
    if let Ok(number) = trimmed.parse::<i32>() {
        return if (1..=MAX_SIGNAL).contains(&number) {
            Ok(number)
        } else {
            Err(SignalError::UnknownSignal(input.to_string()))
        };
    }

    let upper = trimmed.to_ascii_uppercase();
    let name = upper.strip_prefix("SIG").unwrap_or(&upper);
    NAMED_SIGNALS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, sig)| sig)
        .ok_or_else(|| SignalError::UnknownSignal(input.to_string()))
}

/// Short name for a signal number (`"TERM"`), or the number itself.
pub fn signal_name(sig: i32) -> String {
    NAMED_SIGNALS
        .iter()
        .find(|&&(_, s)| s == sig)
        .map_or_else(|| sig.to_string(), |(n, _)| format!("SIG{n}"))
}

/// Rejects PID 0, PID 1 and negative PIDs (process groups).
pub fn guard_pid(pid: i32) -> Result<(), SignalError> {
    if pid <= 1 {
        return Err(SignalError::RefusedPid(pid));
    }
    Ok(())
}

/// Sends `sig` to `pid`.
///
/// # Errors
/// - [`SignalError::RefusedPid`] for PIDs `<= 1`.
/// - [`SignalError::NotFound`] when the existence check fails.
/// - [`SignalError::DeliveryFailed`] when the kernel rejects the signal.
pub fn send_signal(pid: i32, sig: i32) -> Result<(), SignalError> {
    guard_pid(pid)?;

    // SAFETY: kill(2) takes plain integers and has no memory-safety
    // preconditions. Signal 0 performs only the permission/existence check.
    if unsafe { libc::kill(pid, 0) } == -1 {
        let reason = io::Error::last_os_error().to_string();
        tracing::debug!(pid, %reason, "signal existence check failed");
        return Err(SignalError::NotFound { pid, reason });
    }

    // SAFETY: as above; pid has been checked to be > 1.
    if unsafe { libc::kill(pid, sig) } == -1 {
        let reason = io::Error::last_os_error().to_string();
        tracing::warn!(pid, sig, %reason, "signal delivery failed");
        return Err(SignalError::DeliveryFailed { pid, reason });
    }

    tracing::info!(pid, signal = %signal_name(sig), "signal sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_parse_signal_names_and_numbers() {
        assert_eq!(parse_signal("TERM").unwrap(), libc::SIGTERM);
        assert_eq!(parse_signal("SIGKILL").unwrap(), libc::SIGKILL);
        assert_eq!(parse_signal("sigint").unwrap(), libc::SIGINT);
        assert_eq!(parse_signal(" 9 ").unwrap(), 9);
        assert_eq!(parse_signal("15").unwrap(), 15);
    }

    #[test]
    fn test_parse_signal_rejects_garbage() {
        assert_eq!(
            parse_signal("BOGUS"),
            Err(SignalError::UnknownSignal("BOGUS".to_string()))
        );
        assert!(parse_signal("0").is_err());
        assert!(parse_signal("-9").is_err());
        assert!(parse_signal("65").is_err());
        assert!(parse_signal("").is_err());
    }

    #[test]
    fn test_signal_name() {
        assert_eq!(signal_name(libc::SIGTERM), "SIGTERM");
        assert_eq!(signal_name(40), "40");
    }

    #[test]
    fn test_guard_pid() {
        assert_eq!(guard_pid(1), Err(SignalError::RefusedPid(1)));
        assert_eq!(guard_pid(0), Err(SignalError::RefusedPid(0)));
        assert_eq!(guard_pid(-42), Err(SignalError::RefusedPid(-42)));
        assert!(guard_pid(2).is_ok());
    }

    #[test]
    fn test_send_signal_refuses_init() {
        assert_eq!(
            send_signal(1, libc::SIGTERM),
            Err(SignalError::RefusedPid(1))
        );
    }

    #[test]
    fn test_send_signal_missing_process() {
        // Above the default pid_max, so never allocated.
        let result = send_signal(i32::MAX, libc::SIGTERM);
        assert!(matches!(result, Err(SignalError::NotFound { pid, .. }) if pid == i32::MAX));
    }

    #[test]
    fn test_send_signal_terminates_child() {
        let mut child = match Command::new("sleep").arg("30").spawn() {
            Ok(child) => child,
            Err(_) => return,
        };
        let pid = child.id() as i32;
        send_signal(pid, libc::SIGTERM).unwrap();
        let status = child.wait().unwrap();
        assert!(!status.success());
    }
}
