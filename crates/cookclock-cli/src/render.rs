//! Terminal rendering of task cards.

use chrono::Local;
use cookclock_core::storage::DONE_COLOR;
use cookclock_core::{Config, Preset, Task, TaskStatus};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub color: bool,
}

/// One line per task, in registry order.
pub fn task_table(tasks: &[&Task], config: &Config, style: Style) -> String {
    if tasks.is_empty() {
        return "no active tasks".to_string();
    }
    tasks
        .iter()
        .map(|task| task_line(task, config, style))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn task_line(task: &Task, config: &Config, style: Style) -> String {
    let hex = if task.status() == TaskStatus::Done {
        DONE_COLOR
    } else {
        config.color_for(task.category())
    };
    let pct = task.progress_pct();
    let filled = usize::from(pct) * BAR_WIDTH / 100;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
    let scheduled = task
        .scheduled_start()
        .map(|at| {
            format!(
                "  starts {}",
                at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )
        })
        .unwrap_or_default();

    let line = format!(
        "#{:<3} {:<16} {:<9} {:>6} {} {:>3}%{}",
        task.id(),
        task.name(),
        task.status(),
        task.remaining_label(),
        bar,
        pct,
        scheduled
    );
    paint(&line, hex, style)
}

pub fn preset_table(presets: &[Preset], config: &Config, style: Style) -> String {
    presets
        .iter()
        .map(|p| {
            let line = format!(
                "{:<16} {:>6}",
                p.name,
                cookclock_core::format_clock(p.duration_secs)
            );
            paint(&line, config.color_for(&p.name), style)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap `text` in a 24-bit foreground color escape.
fn paint(text: &str, hex: &str, style: Style) -> String {
    match (style.color, parse_hex(hex)) {
        (true, Some((r, g, b))) => format!("\x1b[38;2;{r};{g};{b}m{text}\x1b[0m"),
        _ => text.to_string(),
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let h = hex.strip_prefix('#')?;
    if h.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(h.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
