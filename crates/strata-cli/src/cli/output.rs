//! Output formatting for CLI commands: tables and relative timestamps.

use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

/// Print a table with headers and rows.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
    table.set_header(header_cells);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

/// Color a status string consistently across commands.
pub fn status_color(status: &str) -> Color {
    match status {
        "completed" | "approved" | "ready" => Color::Green,
        "running" | "processing" | "planning_ready" | "queued" => Color::Yellow,
        "failed" | "cancelled" | "rejected" | "error" => Color::Red,
        _ => Color::Grey,
    }
}

/// Print a table with a status column colored per `status_color`.
pub fn print_table_with_status(headers: &[&str], rows: Vec<Vec<String>>, status_col: usize) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
    table.set_header(header_cells);
    for row in rows {
        let cells: Vec<Cell> = row
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                if i == status_col {
                    let color = status_color(&text);
                    Cell::new(text).fg(color)
                } else {
                    Cell::new(text)
                }
            })
            .collect();
        table.add_row(cells);
    }
    println!("{table}");
}

/// Format a timestamp as "X ago" relative to now.
pub fn format_time_ago(time: DateTime<Utc>) -> String {
    let secs = (Utc::now() - time).num_seconds().max(0);
    if secs < 60 {
        format!("{secs} second{} ago", if secs == 1 { "" } else { "s" })
    } else if secs < 3600 {
        let mins = secs / 60;
        format!("{mins} minute{} ago", if mins == 1 { "" } else { "s" })
    } else if secs < 86400 {
        let hours = secs / 3600;
        format!("{hours} hour{} ago", if hours == 1 { "" } else { "s" })
    } else {
        let days = secs / 86400;
        format!("{days} day{} ago", if days == 1 { "" } else { "s" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn format_time_ago_picks_the_right_unit() {
        let now = Utc::now();
        assert_eq!(format_time_ago(now - Duration::seconds(5)), "5 seconds ago");
        assert_eq!(format_time_ago(now - Duration::seconds(1)), "1 second ago");
        assert_eq!(format_time_ago(now - Duration::minutes(2)), "2 minutes ago");
        assert_eq!(format_time_ago(now - Duration::hours(1)), "1 hour ago");
        assert_eq!(format_time_ago(now - Duration::days(3)), "3 days ago");
    }

    #[test]
    fn status_color_groups_terminal_states() {
        assert_eq!(status_color("completed"), Color::Green);
        assert_eq!(status_color("failed"), Color::Red);
        assert_eq!(status_color("running"), Color::Yellow);
        assert_eq!(status_color("whatever"), Color::Grey);
    }
}
