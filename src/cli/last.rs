use super::ui;
use crate::core::ConversionController;

/// Renders the persisted last result without recomputing it.
pub async fn run(controller: &ConversionController) -> String {
    match controller.restore_last_result().await {
        Some(value) => format!(
            "{} {}",
            ui::style_text("Last conversion:", ui::StyleType::Label),
            ui::style_text(&value, ui::StyleType::Result)
        ),
        None => ui::style_text("No conversion stored yet.", ui::StyleType::Subtle),
    }
}
