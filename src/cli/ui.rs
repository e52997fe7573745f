use crate::core::ConversionError;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Result,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Result => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Renders a user-facing notification for `error`.
pub fn notification(error: &ConversionError) -> String {
    let message = match error {
        ConversionError::Validation(message) | ConversionError::InvalidSelection(message) => {
            message.clone()
        }
        ConversionError::RateFetch { .. }
        | ConversionError::MissingRate { .. }
        | ConversionError::OutOfRange { .. } => {
            format!("Failed to convert currency. Please try again later. ({error})")
        }
        other => other.to_string(),
    };
    format!(
        "{} {}",
        style_text(&format!("{}:", error.title()), StyleType::Error),
        message
    )
}

/// Renders the notification for a failed currency list load.
pub fn load_notification(error: &ConversionError) -> String {
    match error {
        ConversionError::RateFetch { .. } => format!(
            "{} Failed to fetch currencies. Please try again later. ({error})",
            style_text("Error:", StyleType::Error)
        ),
        other => notification(other),
    }
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned rate cell. The base currency itself is dimmed.
pub fn rate_cell(rate: f64, is_base: bool) -> Cell {
    let cell = Cell::new(format!("{rate:.4}")).set_alignment(CellAlignment::Right);
    if is_base {
        cell.fg(Color::DarkGrey)
    } else {
        cell
    }
}

/// Creates a spinner shown while a request is in flight.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
