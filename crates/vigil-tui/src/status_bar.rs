//! Status bar rendering: refresh countdown, last-update time, socket
//! state, and the failure banner.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use vigil_feed::{NotificationPermission, Phase};

/// Everything the status bar needs from the app, snapshotted per frame.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    pub phase: Phase,
    pub countdown: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub socket_connected: bool,
    pub socket_enabled: bool,
    pub sound_enabled: bool,
    pub permission: NotificationPermission,
    pub visible: bool,
}

/// Countdown label shown in the status bar.
pub fn countdown_label(snapshot: &StatusSnapshot) -> String {
    match snapshot.phase {
        Phase::Fetching => "Updating...".to_string(),
        Phase::Error => format!("Retrying in {}s", snapshot.countdown),
        Phase::Idle => {
            if snapshot.visible {
                format!("Auto-Refresh: {}s", snapshot.countdown)
            } else {
                "Auto-Refresh: paused".to_string()
            }
        }
    }
}

/// Human-readable last successful update time, or "Never" when no
/// fetch has completed yet.
pub fn last_update_label(last_success: Option<DateTime<Utc>>) -> String {
    match last_success {
        Some(ts) => {
            let local: DateTime<Local> = ts.into();
            format!("Updated {}", local.format("%H:%M:%S"))
        }
        None => "Never".to_string(),
    }
}

/// Socket connection indicator label.
pub fn socket_label(enabled: bool, connected: bool) -> &'static str {
    if !enabled {
        "Socket off"
    } else if connected {
        "Live"
    } else {
        "Offline"
    }
}

/// Failure banner text shown while the feed is in the error phase.
pub fn failure_banner(snapshot: &StatusSnapshot) -> Option<String> {
    if snapshot.phase != Phase::Error {
        return None;
    }
    let detail = snapshot.last_error.as_deref().unwrap_or("request failed");
    let last = match snapshot.last_success {
        Some(ts) => {
            let local: DateTime<Local> = ts.into();
            local.format("%H:%M:%S").to_string()
        }
        None => "Never (failed)".to_string(),
    };
    Some(format!(
        "Unable to refresh alerts. The system will keep retrying automatically. ({detail}) Last successful update: {last}"
    ))
}

/// Render the one-line status bar.
pub fn render_status_bar(frame: &mut Frame, area: Rect, snapshot: &StatusSnapshot) {
    let countdown_style = match snapshot.phase {
        Phase::Fetching => Style::default().fg(Color::Yellow),
        Phase::Error => Style::default().fg(Color::Red),
        Phase::Idle => Style::default().fg(Color::Green),
    };

    let socket_style = if snapshot.socket_enabled && snapshot.socket_connected {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let sound = if snapshot.sound_enabled {
        "Sound on"
    } else {
        "Sound off"
    };

    let line = Line::from(vec![
        Span::styled(countdown_label(snapshot), countdown_style),
        Span::raw("  |  "),
        Span::raw(last_update_label(snapshot.last_success)),
        Span::raw("  |  "),
        Span::styled(
            socket_label(snapshot.socket_enabled, snapshot.socket_connected),
            socket_style,
        ),
        Span::raw("  |  "),
        Span::raw(sound),
        Span::raw("  |  "),
        Span::raw(format!("Desktop: {}", snapshot.permission.label())),
        Span::raw("  |  "),
        Span::styled(
            "q quit  r refresh  a ack  s sound  n desktop",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let bar = Paragraph::new(line).block(Block::default().borders(Borders::TOP));
    frame.render_widget(bar, area);
}

/// Render the failure banner above the status bar when present.
pub fn render_failure_banner(frame: &mut Frame, area: Rect, snapshot: &StatusSnapshot) {
    if let Some(text) = failure_banner(snapshot) {
        let banner = Paragraph::new(text)
            .style(
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(banner, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> StatusSnapshot {
        StatusSnapshot {
            phase: Phase::Idle,
            countdown: 15,
            last_success: None,
            last_error: None,
            socket_connected: false,
            socket_enabled: true,
            sound_enabled: true,
            permission: NotificationPermission::GrantedDisabled,
            visible: true,
        }
    }

    #[test]
    fn test_countdown_label_phases() {
        let mut s = snapshot();
        assert_eq!(countdown_label(&s), "Auto-Refresh: 15s");

        s.phase = Phase::Fetching;
        assert_eq!(countdown_label(&s), "Updating...");

        s.phase = Phase::Error;
        s.countdown = 30;
        assert_eq!(countdown_label(&s), "Retrying in 30s");
    }

    #[test]
    fn test_countdown_label_paused_when_hidden() {
        let mut s = snapshot();
        s.visible = false;
        assert_eq!(countdown_label(&s), "Auto-Refresh: paused");
    }

    #[test]
    fn test_last_update_never() {
        assert_eq!(last_update_label(None), "Never");
    }

    #[test]
    fn test_failure_banner_without_prior_success() {
        let mut s = snapshot();
        s.phase = Phase::Error;
        s.last_error = Some("connection failed".to_string());

        let banner = failure_banner(&s).unwrap();
        assert!(banner.starts_with("Unable to refresh alerts."));
        assert!(banner.contains("keep retrying automatically"));
        assert!(banner.contains("connection failed"));
        assert!(banner.ends_with("Never (failed)"));
    }

    #[test]
    fn test_failure_banner_with_prior_success() {
        let mut s = snapshot();
        s.phase = Phase::Error;
        s.last_success = Some(Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap());

        let banner = failure_banner(&s).unwrap();
        assert!(!banner.contains("Never (failed)"));
        assert!(banner.contains("Last successful update:"));
    }

    #[test]
    fn test_no_banner_outside_error_phase() {
        assert!(failure_banner(&snapshot()).is_none());
    }

    #[test]
    fn test_socket_label() {
        assert_eq!(socket_label(true, true), "Live");
        assert_eq!(socket_label(true, false), "Offline");
        assert_eq!(socket_label(false, false), "Socket off");
    }
}
