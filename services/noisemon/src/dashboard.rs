//! Terminal dashboard
//!
//! Renders a [`SessionSnapshot`] as stacked cards. Output is plain text with `colored`
//! styling; callers turn colors off with `colored::control::set_override(false)`.

use std::fmt::Write;

use colored::{ColoredString, Colorize};

use noise_core::history::{history_caption, HISTORICAL_LEVELS};
use noise_core::simulator::{MAX_DB, MIN_DB};
use noise_core::{
    LocationStatus, LoudnessStatus, Notice, NoticeSeverity, SessionSnapshot, Severity,
};

const GAUGE_WIDTH: usize = 30;
const HISTORY_WIDTH: usize = 24;

pub const HELP: &str = "Commands: r/c/i environment, e <name> environment by name, \
s classify now, log <level> change log level, h help, q quit";

/// ANSI clear screen and home cursor
pub const CLEAR: &str = "\x1b[2J\x1b[H";

fn card(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", format!("== {} ==", title).bold());
}

fn bar(value: u8, width: usize) -> String {
    let span = f64::from(MAX_DB - MIN_DB);
    let filled = (f64::from(value.saturating_sub(MIN_DB)) / span * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

fn status_label(status: LoudnessStatus) -> ColoredString {
    match status {
        LoudnessStatus::ExceededLimit => status.label().red().bold(),
        LoudnessStatus::Loud => status.label().yellow(),
        LoudnessStatus::Moderate => status.label().normal(),
        LoudnessStatus::Quiet => status.label().green(),
    }
}

pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {} area",
        "Noise Monitor".bold().cyan(),
        snapshot.environment
    );

    card(&mut out, "Noise Level");
    match (snapshot.level, snapshot.status) {
        (Some(level), Some(status)) => {
            let gauge = bar(level, GAUGE_WIDTH);
            let gauge = if snapshot.is_alerting() {
                gauge.red()
            } else {
                gauge.green()
            };
            let _ = writeln!(out, "  {:>3} dB  [{}]  {}", level, gauge, status_label(status));
        },
        _ => {
            let _ = writeln!(out, "  waiting for the first reading...");
        },
    }
    let _ = writeln!(
        out,
        "  limit {} dB for a {} area",
        snapshot.threshold, snapshot.environment
    );

    card(&mut out, "Noise Source");
    let kind = snapshot.classification.kind();
    let mut source = format!("  {} {}", kind.icon(), snapshot.classification.name.bold());
    if snapshot.classifying {
        source.push_str(&format!("  {}", "(analyzing...)".dimmed()));
    }
    let _ = writeln!(out, "{}", source);
    let _ = writeln!(out, "  {}", snapshot.classification.description);
    if let Some(error) = &snapshot.microphone_error {
        let _ = writeln!(out, "  {} {}", "Microphone Access Denied:".red(), error);
    }
    let _ = writeln!(out, "  image: {}", snapshot.image.dimmed());

    card(&mut out, "Location");
    match &snapshot.location {
        LocationStatus::Locating => {
            let _ = writeln!(out, "  locating...");
        },
        LocationStatus::Resolved(location) => {
            let _ = writeln!(
                out,
                "  {} ({:.4}, {:.4})",
                location.city, location.coordinates.lat, location.coordinates.lng
            );
        },
        LocationStatus::Failed { coordinates, error } => {
            if let Some(c) = coordinates {
                let _ = writeln!(out, "  ({:.4}, {:.4})", c.lat, c.lng);
            }
            let _ = writeln!(out, "  {}", error.yellow());
        },
    }

    card(&mut out, "Historical Levels");
    let _ = writeln!(out, "  {}", history_caption(snapshot.location.city()));
    for point in HISTORICAL_LEVELS {
        let _ = writeln!(
            out,
            "  {:>5}  {} {} dB",
            point.time,
            bar(point.db, HISTORY_WIDTH),
            point.db
        );
    }

    card(&mut out, "Recent Alerts");
    if snapshot.alerts.is_empty() {
        let _ = writeln!(out, "  No recent alerts.");
    }
    for alert in &snapshot.alerts {
        let badge = match alert.severity {
            Severity::Destructive => format!("{} dB", alert.level).red().bold(),
            Severity::Secondary => format!("{} dB", alert.level).yellow(),
        };
        let _ = writeln!(
            out,
            "  {}  {:<18} {:<16} {} (limit {} dB)",
            alert.time.format("%H:%M:%S"),
            alert.location,
            alert.noise_type,
            badge,
            alert.threshold
        );
    }

    card(&mut out, "Health Suggestions");
    if snapshot.suggestions_loading {
        let _ = writeln!(out, "  {}", "loading suggestions...".dimmed());
    } else if let Some(error) = &snapshot.suggestions_error {
        let _ = writeln!(out, "  {}", error.yellow());
    }
    for suggestion in &snapshot.suggestions {
        let _ = writeln!(out, "  * {}", suggestion.title.bold());
        let _ = writeln!(out, "    {}", suggestion.description);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", HELP.dimmed());
    out
}

pub fn render_notice(notice: &Notice) -> String {
    let title = match notice.severity {
        NoticeSeverity::Destructive => notice.title.red().bold(),
        NoticeSeverity::Info => notice.title.cyan(),
    };
    format!("{}: {}", title, notice.description)
}
