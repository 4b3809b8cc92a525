use crate::models::{HealthData, MemoryUsage};
use anyhow::{Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use sysinfo::System;

/// Snapshot process uptime and memory usage
pub fn gather_health(started_at: DateTime<Utc>) -> Result<HealthData> {
    let pid = sysinfo::get_current_pid().map_err(|e| anyhow!("Cannot resolve current pid: {}", e))?;

    let mut system = System::new();
    system.refresh_memory();
    system.refresh_process(pid);

    let process = system
        .process(pid)
        .ok_or_else(|| anyhow!("Process {} not visible to the system probe", pid))?;

    let now = Utc::now();
    Ok(HealthData {
        status: "healthy".to_string(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: (now - started_at).num_seconds().max(0) as u64,
        memory: MemoryUsage {
            rss: process.memory(),
            virtual_memory: process.virtual_memory(),
            system_total: system.total_memory(),
            system_used: system.used_memory(),
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_gather_health_reports_uptime() {
        let started_at = Utc::now() - Duration::hours(1);
        let health = gather_health(started_at).unwrap();
        assert_eq!(health.status, "healthy");
        assert!((3600..3605).contains(&health.uptime));
        assert!(health.memory.system_total > 0);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
