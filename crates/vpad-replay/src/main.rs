//! `vpad-replay [--semantic] [TRACE]`
//!
//! Reads a JSON trace from `TRACE` (or stdin when absent or `-`), replays it
//! and prints one JSON object per emitted event. `--semantic` drops visual
//! updates. Set `RUST_LOG=debug` to see state transitions.

use std::io::Read;
use vpad_replay::{Replayer, parse_trace};

fn main() {
    env_logger::init();

    let mut semantic = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--semantic" => semantic = true,
            "-h" | "--help" => {
                println!("usage: vpad-replay [--semantic] [TRACE]");
                return;
            }
            _ => path = Some(arg),
        }
    }

    let text = match read_input(path.as_deref()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("vpad-replay: {e}");
            std::process::exit(1);
        }
    };

    let trace = match parse_trace(&text) {
        Ok(trace) => trace,
        Err(e) => {
            eprintln!("vpad-replay: {e}");
            std::process::exit(1);
        }
    };
    let mut replayer = match Replayer::new(&trace) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("vpad-replay: {e}");
            std::process::exit(1);
        }
    };
    log::info!(
        "replaying {} step(s) over {} control(s)",
        trace.steps.len(),
        trace.controls.len()
    );

    for timed in replayer.run(&trace.steps) {
        if semantic && timed.emitted.event.is_visual() {
            continue;
        }
        match serde_json::to_string(&timed) {
            Ok(line) => println!("{line}"),
            Err(e) => log::error!("serialize event: {e}"),
        }
    }
}

fn read_input(path: Option<&str>) -> Result<String, String> {
    match path {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}")),
    }
}
