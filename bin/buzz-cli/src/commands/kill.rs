// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `buzz kill` command: signal a process and report the outcome as JSON.
//!
//! Exit codes: `0` delivered, `1` delivery failed, `2` usage error or a
//! refused PID.

use clap::{Args, Parser};
use resource_monitor::{guard_pid, parse_signal, send_signal, SignalError};
use serde_json::json;
use std::process::ExitCode;

/// Signal selection shared by `buzz kill` and the dashboard's `k` command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[group(multiple = false)]
pub struct SignalArgs {
    /// Send SIGKILL.
    #[arg(long, visible_alias = "sigkill")]
    pub force: bool,

    /// Send SIGTERM (the default).
    #[arg(long)]
    pub sigterm: bool,

    /// Send this signal, by name (TERM, SIGHUP) or number (9).
    #[arg(long, value_name = "SIG")]
    pub signal: Option<String>,
}

impl SignalArgs {
    pub fn resolve(&self) -> Result<i32, SignalError> {
        if self.force {
            return Ok(libc::SIGKILL);
        }
        match &self.signal {
            Some(raw) => parse_signal(raw),
            None => Ok(libc::SIGTERM),
        }
    }
}

/// The dashboard's `k <pid> [--sigkill|--sigterm|--signal <n>]` line.
#[derive(Parser, Debug)]
#[command(name = "k", no_binary_name = true, disable_help_flag = true)]
struct KillLine {
    #[arg(allow_negative_numbers = true)]
    pid: i32,

    #[command(flatten)]
    signal: SignalArgs,
}

/// Parses the arguments after `k` into a pid and a signal number.
pub fn parse_kill_line(args: &str) -> Result<(i32, i32), String> {
    let line = KillLine::try_parse_from(args.split_whitespace()).map_err(|e| {
        e.render()
            .to_string()
            .lines()
            .next()
            .unwrap_or("invalid kill command")
            .to_string()
    })?;
    let sig = line.signal.resolve().map_err(|e| e.to_string())?;
    Ok((line.pid, sig))
}

pub fn execute(pid: &str, signal: &SignalArgs) -> anyhow::Result<ExitCode> {
    let (report, code) = outcome(pid, signal);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(code))
}

/// JSON report and exit code for one `buzz kill` invocation.
fn outcome(pid: &str, signal: &SignalArgs) -> (serde_json::Value, u8) {
    let Ok(pid) = pid.trim().parse::<i32>() else {
        return (
            json!({ "action": "kill", "success": false, "error": "Invalid PID" }),
            2,
        );
    };
    match signal.resolve() {
        Ok(sig) => deliver(pid, sig),
        Err(e) => (failure(pid, None, &e), 2),
    }
}

fn deliver(pid: i32, sig: i32) -> (serde_json::Value, u8) {
    if let Err(e) = guard_pid(pid) {
        return (failure(pid, Some(sig), &e), 2);
    }
    match send_signal(pid, sig) {
        Ok(()) => (
            json!({ "action": "kill", "pid": pid, "signal": sig, "success": true }),
            0,
        ),
        Err(e) => (failure(pid, Some(sig), &e), 1),
    }
}

fn failure(pid: i32, sig: Option<i32>, err: &SignalError) -> serde_json::Value {
    json!({
        "action": "kill",
        "pid": pid,
        "signal": sig,
        "success": false,
        "error": err.to_string(),
    })
}
