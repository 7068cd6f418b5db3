// ABOUTME: Terminal-facing output: colorized transport log lines, the ready
// ABOUTME: diagnostic block, and the per-invocation telemetry line.

use chrono::{DateTime, Local};
use colored::{Color, Colorize};

use crate::events::{GuildInfo, LogEvent, Severity};
use crate::telemetry::ResourceSample;

/// Display treatment for a transport log severity.
///
/// Pure mapping; `Unspecified` is the catch-all.
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Debug => Color::Blue,
        Severity::Error => Color::Yellow,
        Severity::Info => Color::Cyan,
        Severity::Verbose => Color::Green,
        Severity::Warning => Color::Magenta,
        Severity::Unspecified => Color::White,
    }
}

fn console_timestamp(at: DateTime<Local>) -> String {
    at.format("%d/%m. %H:%M:%S").to_string()
}

/// Uncolored transport log line.
pub fn format_gateway_log(at: DateTime<Local>, log: &LogEvent) -> String {
    format!("{} [{}] {}", console_timestamp(at), log.source, log.message)
}

pub fn print_gateway_log(log: &LogEvent) {
    let line = format_gateway_log(Local::now(), log);
    println!("{}", line.color(severity_color(log.severity)));
}

/// Telemetry line emitted once per dispatched command.
pub fn format_invocation_line(
    at: DateTime<Local>,
    sample: &ResourceSample,
    location: &str,
    command: &str,
) -> String {
    format!(
        "{} CPU: {:.2} RAM: {:.2} Location: {} Command: /{}",
        console_timestamp(at),
        sample.cpu_percent,
        sample.memory_megabytes(),
        location,
        command
    )
}

pub fn print_invocation_line(line: &str) {
    println!("{}", line);
}

/// One-time diagnostic block printed at ready.
pub fn print_ready_snapshot(guilds: &[GuildInfo], sample: &ResourceSample) {
    let mut total_members: u64 = 0;
    for guild in guilds {
        println!("{}, {}", guild.name, guild.member_count);
        total_members += guild.member_count;
    }
    println!("Total Users: {}", total_members);
    println!("CPU at Ready: {:.2}", sample.cpu_percent);
    println!("RAM at Ready: {:.2}", sample.memory_megabytes());
}
