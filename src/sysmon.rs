//! Read-only system health report.
//!
//! Performs non-destructive checks (disk usage, cache growth, journal
//! errors, installed kernels) and asks the model to turn the snapshot into
//! concrete recommendations. Nothing here ever modifies the system; when the
//! model is unreachable a deterministic fallback produces the advice
//! instead.

use crate::error::Result;
use crate::llm::ModelClient;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::debug;
use walkdir::WalkDir;

/// Render a byte count as a human-readable size.
#[must_use]
pub fn human_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{value:.1}{unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1}PB")
}

/// Disk usage of one mount point.
#[derive(Debug, Clone)]
pub struct DiskUsage {
    pub path: PathBuf,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent_used: f64,
}

/// Query disk usage for a path.
pub fn disk_usage(path: &Path) -> std::io::Result<DiskUsage> {
    let stats = fs2::statvfs(path)?;
    let total = stats.total_space();
    let free = stats.free_space();
    let used = total.saturating_sub(free);
    let percent_used = if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    };
    Ok(DiskUsage {
        path: path.to_path_buf(),
        total,
        used,
        free,
        percent_used,
    })
}

/// A cache directory and its recursive size.
#[derive(Debug, Clone)]
pub struct CacheDir {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Scan cache roots and report the largest subdirectories, biggest first.
///
/// Read-only; unreadable entries are skipped silently.
#[must_use]
pub fn find_large_cache_dirs(bases: &[PathBuf], top_n: usize) -> Vec<CacheDir> {
    let mut entries = Vec::new();
    for base in bases {
        if !base.is_dir() {
            continue;
        }
        let subdirs = match std::fs::read_dir(base) {
            Ok(iter) => iter,
            Err(_) => continue,
        };
        for entry in subdirs.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let size_bytes = WalkDir::new(&path)
                .into_iter()
                .flatten()
                .filter_map(|e| e.metadata().ok())
                .filter(|m| m.is_file())
                .map(|m| m.len())
                .sum();
            entries.push(CacheDir { path, size_bytes });
        }
    }
    entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    entries.truncate(top_n);
    entries
}

/// Default cache roots to inspect.
#[must_use]
pub fn default_cache_roots() -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from("/var/cache")];
    if let Some(home) = dirs::home_dir() {
        roots.insert(0, home.join(".cache"));
    }
    roots
}

/// Recent high-priority journal errors, or `None` when journalctl is
/// unavailable.
pub async fn journal_errors(max_lines: u32) -> Option<String> {
    let output = tokio::time::timeout(
        Duration::from_secs(8),
        AsyncCommand::new("journalctl")
            .args(["-p", "err", "-b", "--no-pager", "-n", &max_lines.to_string()])
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    if output.status.success() {
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!text.is_empty()).then_some(text)
    } else {
        debug!(
            "journalctl failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        None
    }
}

/// Installed kernel packages (rpm-based systems), newest first as reported.
pub async fn installed_kernels() -> Vec<String> {
    let output = match tokio::time::timeout(
        Duration::from_secs(5),
        AsyncCommand::new("rpm").args(["-q", "kernel"]).output(),
    )
    .await
    {
        Ok(Ok(output)) if output.status.success() => output,
        _ => return Vec::new(),
    };
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Aggregated snapshot handed to the model (and to the fallback rules).
#[derive(Debug, Clone, Default)]
pub struct HealthSnapshot {
    pub root_percent: Option<f64>,
    pub home_percent: Option<f64>,
    pub largest_cache: Option<CacheDir>,
    pub kernel_count: usize,
    pub error_lines: usize,
}

fn recommendation_prompt(snapshot: &HealthSnapshot) -> String {
    let fmt_pct = |p: Option<f64>| {
        p.map_or_else(|| "unknown".to_string(), |v| format!("{v:.1}%"))
    };
    let cache = snapshot.largest_cache.as_ref().map_or_else(
        || "none found".to_string(),
        |c| format!("{} ({})", c.path.display(), human_size(c.size_bytes)),
    );
    format!(
        "Analyze this system health snapshot and provide specific, actionable \
         recommendations (not generic) for optimization. Focus on the most \
         impactful action first.\n\n\
         Disk: root {} used, home {} used\n\
         Largest cache: {cache}\n\
         Kernels installed: {}\n\
         Recent errors: {} journal lines\n\n\
         Provide 2-3 concrete, specific recommendations. Include bash commands \
         if applicable.",
        fmt_pct(snapshot.root_percent),
        fmt_pct(snapshot.home_percent),
        snapshot.kernel_count,
        snapshot.error_lines,
    )
}

/// Rule-based recommendations used when the model is unreachable.
#[must_use]
pub fn fallback_recommendations(snapshot: &HealthSnapshot) -> Vec<String> {
    let mut advice = Vec::new();
    match snapshot.root_percent {
        Some(p) if p > 90.0 => {
            advice.push("Root partition >90% used - investigate large files and caches.".into());
        }
        Some(p) if p > 80.0 => {
            advice.push("Root partition >80% used - consider cleaning caches or logs.".into());
        }
        Some(_) => advice.push("Disk usage looks healthy.".into()),
        None => {}
    }
    if let Some(cache) = &snapshot.largest_cache {
        if cache.size_bytes > 500 * 1024 * 1024 {
            advice.push(format!(
                "Large cache at {} ({}) - consider cleanup.",
                cache.path.display(),
                human_size(cache.size_bytes)
            ));
        }
    }
    if snapshot.kernel_count > 3 {
        advice.push(format!(
            "{} kernels installed - keeping the latest 2-3 is usually enough.",
            snapshot.kernel_count
        ));
    }
    if advice.is_empty() {
        advice.push("No findings worth acting on.".into());
    }
    advice
}

/// Run every check and print the report.
pub async fn run_sysmon<W: Write>(client: &dyn ModelClient, out: &mut W) -> Result<()> {
    writeln!(out, "\n{}", " SYSTEM MONITOR REPORT (read-only)".bold())?;

    let mut snapshot = HealthSnapshot::default();

    writeln!(out, "\n{}", "== Disk usage ==".cyan())?;
    let mut mounts = vec![PathBuf::from("/")];
    if let Some(home) = dirs::home_dir() {
        mounts.push(home);
    }
    for (i, mount) in mounts.iter().enumerate() {
        match disk_usage(mount) {
            Ok(usage) => {
                writeln!(
                    out,
                    "- {}: {} used of {} ({:.1}%) - {} free",
                    usage.path.display(),
                    human_size(usage.used),
                    human_size(usage.total),
                    usage.percent_used,
                    human_size(usage.free)
                )?;
                if i == 0 {
                    snapshot.root_percent = Some(usage.percent_used);
                } else {
                    snapshot.home_percent = Some(usage.percent_used);
                }
            }
            Err(e) => writeln!(out, "- {}: error: {e}", mount.display())?,
        }
    }

    writeln!(out, "\n{}", "== Largest cache directories ==".cyan())?;
    let caches = find_large_cache_dirs(&default_cache_roots(), 10);
    if caches.is_empty() {
        writeln!(out, "No cache directories found or accessible.")?;
    }
    for cache in &caches {
        writeln!(
            out,
            "- {}: {}",
            cache.path.display(),
            human_size(cache.size_bytes)
        )?;
    }
    snapshot.largest_cache = caches.into_iter().next();

    writeln!(out, "\n{}", "== Recent system errors (priority=err) ==".cyan())?;
    match journal_errors(200).await {
        Some(errors) => {
            snapshot.error_lines = errors.lines().count();
            let shown: String = errors.chars().take(4000).collect();
            writeln!(out, "{shown}")?;
            if errors.chars().count() > 4000 {
                writeln!(out, "...truncated; use 'journalctl -p err -b' for the rest.")?;
            }
        }
        None => writeln!(out, "No recent errors found, or journalctl unavailable.")?,
    }

    let kernels = installed_kernels().await;
    snapshot.kernel_count = kernels.len();
    if !kernels.is_empty() {
        writeln!(out, "\n{}", "== Installed kernels ==".cyan())?;
        for kernel in &kernels {
            writeln!(out, "- {kernel}")?;
        }
    }

    writeln!(out, "\n{}", "== Recommendations ==".cyan())?;
    match client.run_prompt(&recommendation_prompt(&snapshot)).await {
        Ok(text) => writeln!(out, "{}", text.trim())?,
        Err(e) => {
            debug!("Model unavailable for sysmon summary: {}", e);
            for line in fallback_recommendations(&snapshot) {
                writeln!(out, "- {line}")?;
            }
        }
    }

    writeln!(
        out,
        "\nThis tool only inspects and reports. It never modifies the system."
    )?;
    Ok(())
}
