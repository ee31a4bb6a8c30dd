use color_eyre::Result;
use qdvc_core::{BufferedConsole, CommandStatus, ExecutionOutcome};
use serde_json::{json, Value};

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub json: bool,
}

/// Prints whatever the command itself did not, and returns the exit code.
///
/// Per-file lines and the summary are written by the command; human mode only
/// adds the message of outcomes that never reached a command.
pub fn emit_output(
    opts: OutputOptions,
    style: &Style,
    outcome: &ExecutionOutcome,
    captured: Option<&BufferedConsole>,
) -> Result<i32> {
    let code = outcome.exit_code();

    if opts.json {
        let payload = json_payload(outcome, captured);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if let CommandStatus::UserError(_) = outcome.status {
        eprintln!("{}", style.status(outcome.status, &outcome.message));
    }

    Ok(code)
}

fn json_payload(outcome: &ExecutionOutcome, captured: Option<&BufferedConsole>) -> Value {
    let mut payload = qdvc_core::to_json_response(outcome);
    if let Some(console) = captured {
        payload["details"]["stdout"] = json!(console.stdout_lines());
        payload["details"]["stderr"] = json!(console.stderr_lines());
    }
    payload
}
