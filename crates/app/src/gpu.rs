//! GPU detection for advanced-mode eligibility.
//!
//! Probed once per process and cached; the result feeds the session's
//! capability check together with the API key.

use std::process::{Command, Stdio};
use std::sync::OnceLock;

static GPU_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Whether this machine has GPU acceleration usable for inference.
pub fn has_gpu_acceleration() -> bool {
    *GPU_AVAILABLE.get_or_init(probe)
}

/// Apple Silicon always has Metal. Elsewhere, look for NVIDIA (nvidia-smi)
/// or AMD ROCm (rocminfo). Integrated graphics don't count.
fn probe() -> bool {
    if cfg!(target_os = "macos") && cfg!(target_arch = "aarch64") {
        return true;
    }

    let nvidia_cmd = if cfg!(windows) { "nvidia-smi.exe" } else { "nvidia-smi" };
    if Command::new(nvidia_cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
    {
        return true;
    }

    if !cfg!(windows)
        && Command::new("rocminfo")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    {
        return true;
    }

    false
}
