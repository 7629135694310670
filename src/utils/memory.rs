// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Resident memory of the current process

use sysinfo::System;

/// Resident set size in MB, or `None` if the platform does not report it
pub fn resident_memory_mb() -> Option<f64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    if !sys.refresh_process(pid) {
        return None;
    }
    sys.process(pid)
        .map(|process| process.memory() as f64 / (1024.0 * 1024.0))
}

/// Warning text when resident memory exceeds `limit_gb`
pub fn memory_warning(resident_mb: f64, limit_gb: f64) -> Option<String> {
    let limit_mb = limit_gb * 1024.0;
    (resident_mb > limit_mb).then(|| {
        format!(
            "resident memory {:.0}MB exceeds MAX_MEMORY_GB ({:.1}GB)",
            resident_mb, limit_gb
        )
    })
}
