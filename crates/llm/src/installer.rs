//! Installing the Ollama daemon on the host.
//!
//! Only macOS (Homebrew) and Linux (official install script) are installed
//! automatically. Other systems get a manual instruction back.

use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;

use crate::error::ProviderError;
use crate::ollama::find_ollama_binary;
use crate::provider::ProviderKind;

const LINUX_INSTALL_SCRIPT: &str = "curl -fsSL https://ollama.com/install.sh | sh";
const MANUAL_INSTRUCTIONS: &str = "Download and run the installer from https://ollama.com/download";

/// How Ollama would be installed on a given OS family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPlan {
    Brew,
    Script,
    Manual(String),
}

impl InstallPlan {
    fn command(&self) -> Option<Command> {
        match self {
            Self::Brew => {
                let mut cmd = Command::new("brew");
                cmd.args(["install", "ollama"]);
                Some(cmd)
            }
            Self::Script => {
                let mut cmd = Command::new("sh");
                cmd.args(["-c", LINUX_INSTALL_SCRIPT]);
                Some(cmd)
            }
            Self::Manual(_) => None,
        }
    }
}

/// Pick the install plan for an OS name as reported by `std::env::consts::OS`.
pub fn install_plan_for(os: &str) -> InstallPlan {
    match os {
        "macos" => InstallPlan::Brew,
        "linux" => InstallPlan::Script,
        _ => InstallPlan::Manual(MANUAL_INSTRUCTIONS.to_string()),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InstallOutcome {
    AlreadyInstalled { path: String },
    Installed,
    /// Nothing was run; the caller must follow `instructions`.
    Manual { instructions: String },
}

/// Install Ollama on this host unless a binary is already present.
pub async fn install_ollama(timeout: Duration) -> Result<InstallOutcome, ProviderError> {
    if let Some(path) = find_ollama_binary() {
        return Ok(InstallOutcome::AlreadyInstalled {
            path: path.display().to_string(),
        });
    }
    run_plan(install_plan_for(std::env::consts::OS), timeout).await
}

async fn run_plan(plan: InstallPlan, timeout: Duration) -> Result<InstallOutcome, ProviderError> {
    let mut cmd = match plan.command() {
        Some(cmd) => cmd,
        None => {
            let instructions = match plan {
                InstallPlan::Manual(instructions) => instructions,
                _ => MANUAL_INSTRUCTIONS.to_string(),
            };
            return Ok(InstallOutcome::Manual { instructions });
        }
    };

    tracing::info!(?plan, "Installing Ollama");
    cmd.stdin(Stdio::null()).kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| ProviderError::Timeout {
            provider: ProviderKind::Ollama,
            seconds: timeout.as_secs(),
        })?
        .map_err(|e| ProviderError::InstallFailed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(5)..].join("\n");
        tracing::warn!(status = %output.status, "Ollama install failed");
        return Err(ProviderError::InstallFailed(format!(
            "installer exited with {}: {tail}",
            output.status
        )));
    }

    Ok(InstallOutcome::Installed)
}
