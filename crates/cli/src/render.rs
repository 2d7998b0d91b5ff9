// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable output.

use idepool_wire::{PoolReport, WorkspaceDetail};

pub fn workspace(detail: &WorkspaceDetail) {
    let ws = &detail.workspace;
    println!("{}", ws.id);
    println!("  service   {}", ws.service_name);
    println!("  status    {}", ws.status);
    if !ws.bucket.is_empty() {
        println!("  bucket    {} ({})", ws.bucket, ws.region);
    }
    println!("  editor    {}", ws.urls.editor);
    println!("  desktop   {}", ws.urls.desktop);
    println!("  web       {}", ws.urls.web);
    if let Some(uptime) = detail.uptime_secs {
        println!("  uptime    {}", format_secs(uptime));
    }
    if let Some(reason) = ws.shutdown_reason {
        println!("  shutdown  {reason}");
    }
    if let Some(health) = &detail.health {
        if health.consecutive_failures > 0 {
            println!("  health    {} consecutive probe failures", health.consecutive_failures);
        }
    }
}

pub fn workspace_table(workspaces: &[WorkspaceDetail]) {
    if workspaces.is_empty() {
        println!("no workspaces");
        return;
    }
    println!("{:<14} {:<10} {:<24} {:<10}", "ID", "STATUS", "BUCKET", "UPTIME");
    for detail in workspaces {
        let ws = &detail.workspace;
        let bucket = if ws.bucket.is_empty() { "(pre-warmed)" } else { ws.bucket.as_str() };
        let uptime = detail.uptime_secs.map(format_secs).unwrap_or_else(|| "-".to_string());
        println!("{:<14} {:<10} {:<24} {:<10}", ws.id.as_str(), ws.status.as_str(), bucket, uptime);
    }
}

pub fn pool(report: &PoolReport) {
    println!("pool");
    println!("  pre-warmed  {} / {} target", report.queue.pre_warmed, report.queue.target);
    println!("  assigned    {}", report.queue.assigned);
    println!("  running     {}", report.queue.running);
    if report.deficit > 0 {
        println!("  deficit     {}", report.deficit);
    }
    println!("resources");
    println!("  cpu         {:.1}% of {} cores", report.resources.cpu_usage_pct, report.resources.cpu_cores);
    println!("  memory      {:.1}%", report.resources.mem_pct);
    println!("  disk        {:.1}%", report.resources.disk_pct);
    println!("  workspaces  {}", report.resources.live_workspaces);
    println!("loops");
    for beat in &report.loops {
        println!("  {:<10} last tick at {} (epoch ms)", beat.name, beat.last_tick_ms);
    }
    println!("daemon up {}", format_secs(report.uptime_secs));
}

fn format_secs(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
