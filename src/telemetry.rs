// ABOUTME: On-demand process telemetry probe sampling CPU and memory via sysinfo.
// ABOUTME: CPU readings need two refreshes separated by the minimum OS sample window.

use std::sync::Arc;

use anyhow::{Context, Result};
use sysinfo::{Pid, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tokio::sync::Mutex;

/// One CPU/memory reading for this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceSample {
    /// Percentage of total machine CPU this process is using
    pub cpu_percent: f32,
    /// Resident memory in bytes
    pub memory_bytes: u64,
}

impl ResourceSample {
    pub fn memory_megabytes(&self) -> f64 {
        self.memory_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Shared probe for this process. Cloning shares the underlying system table,
/// which serializes concurrent samples behind one lock.
#[derive(Clone)]
pub struct TelemetryProbe {
    pid: Pid,
    system: Arc<Mutex<System>>,
}

impl TelemetryProbe {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| anyhow::anyhow!("cannot determine own pid: {}", e))?;
        Ok(Self {
            pid,
            system: Arc::new(Mutex::new(System::new())),
        })
    }

    /// Sample CPU and memory for this process.
    ///
    /// Not instant: the CPU reading requires waiting out the OS sample window
    /// between two refreshes.
    pub async fn sample(&self) -> Result<ResourceSample> {
        let mut system = self.system.lock().await;
        system.refresh_process(self.pid);
        tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        system.refresh_process(self.pid);

        let process = system
            .process(self.pid)
            .context("own process missing from system table")?;
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Ok(ResourceSample {
            cpu_percent: process.cpu_usage() / cores as f32,
            memory_bytes: process.memory(),
        })
    }
}
