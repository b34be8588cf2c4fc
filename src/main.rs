use anyhow::Context;
use std::io::{self, BufRead, Write};

use tierbookd::{ipc, logging, EngineConfig};

const CONFIG_ENV: &str = "TIERBOOKD_CONFIG";

fn load_startup_config() -> anyhow::Result<EngineConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => EngineConfig::from_file(&path)
            .with_context(|| format!("loading {} from {:?}", CONFIG_ENV, path)),
        _ => Ok(EngineConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_sidecar_logger();

    let config = load_startup_config().inspect_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "startup failed");
    })?;
    let mut state = ipc::AppState::new(config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tierbookd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                tracing::warn!(error = %e, "undecodable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    Ok(())
}
