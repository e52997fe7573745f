use super::ui;
use crate::core::ConversionController;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Default)]
pub struct ConvertArgs {
    pub amount: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub swap: bool,
}

/// Performs a single conversion and returns the rendered result line.
pub async fn run(controller: &ConversionController, args: &ConvertArgs) -> Result<String> {
    let pb = ui::new_spinner("Fetching currencies...");
    let loaded = controller.initialize().await;
    pb.finish_and_clear();
    loaded.context("Failed to fetch currencies. Please try again later.")?;

    if let Some(from) = &args.from {
        controller.select_from(from)?;
    }
    if let Some(to) = &args.to {
        controller.select_to(to)?;
    }
    if args.swap {
        controller.swap();
    }
    controller.set_amount(&args.amount);

    let pb = ui::new_spinner("Converting...");
    let converted = controller.convert().await;
    pb.finish_and_clear();
    let result = converted?;

    let state = controller.state();
    let from = state.from.unwrap_or_default();
    let to = state.to.unwrap_or_default();
    Ok(format!(
        "{} {} = {} {}",
        state.amount.trim(),
        from,
        ui::style_text(&result, ui::StyleType::Result),
        to
    ))
}
