use crate::badge::badge_label;
use crate::dashboard::Dashboard;
use crate::participant::ParticipantView;
use std::fmt::Write;

const BAR_WIDTH: usize = 20;

/// Renders the dashboard as a plain text frame
pub fn render(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let stats = dashboard.stats();

    let status = if dashboard.connected() {
        "● connected"
    } else {
        "○ disconnected"
    };
    let _ = writeln!(out, "Participant progress  [{status}]");
    if let Some(error) = dashboard.error() {
        let _ = writeln!(out, "! {error}");
    }
    let _ = writeln!(
        out,
        "Active: {}/{}   Average progress: {}%",
        stats.active_count, stats.total, stats.average_progress
    );
    if !dashboard.query().is_empty() {
        let _ = writeln!(out, "Search: {}", dashboard.query());
    }
    out.push('\n');

    let visible = dashboard.visible();
    if visible.is_empty() {
        let text = if dashboard.participants().is_empty() {
            "No participants yet"
        } else {
            "No participants match the search"
        };
        let _ = writeln!(out, "{text}");
        return out;
    }

    let name_width = visible
        .iter()
        .map(|participant| participant.name.chars().count())
        .max()
        .unwrap_or(0);
    for participant in visible {
        render_row(&mut out, participant, name_width);
    }
    out
}

fn render_row(out: &mut String, participant: &ParticipantView, name_width: usize) {
    let marker = if participant.is_online { '●' } else { '○' };
    let _ = writeln!(
        out,
        "{marker} {:<name_width$}  {} {:>3}%  last seen {}",
        participant.name,
        progress_bar(participant.progress),
        participant.progress,
        participant.last_active,
    );
    if !participant.badges.is_empty() {
        let labels: Vec<String> = participant
            .badges
            .iter()
            .map(|badge| badge_label(badge))
            .collect();
        let _ = writeln!(out, "    {}", labels.join(", "));
    }
}

/// Fixed width bar, full from 100% upwards
fn progress_bar(progress: u32) -> String {
    let filled = (progress.min(100) as usize * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
