use super::ui;
use crate::core::{RateSource, RateTable};
use anyhow::Result;
use comfy_table::Cell;

impl RateTable {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell(&format!("Rate (1 {})", self.base)),
        ]);

        for (code, rate) in self.iter() {
            table.add_row(vec![
                Cell::new(code),
                ui::rate_cell(*rate, *code == self.base),
            ]);
        }

        let mut output = format!(
            "Rates for {}",
            ui::style_text(&self.base, ui::StyleType::Title)
        );
        if let Some(date) = self.date {
            output.push_str(&ui::style_text(
                &format!(" (as of {date})"),
                ui::StyleType::Subtle,
            ));
        }
        output.push_str("\n\n");
        output.push_str(&table.to_string());
        output
    }
}

/// Fetches the rate table for `base` and renders it.
pub async fn run(rate_source: &dyn RateSource, base: &str) -> Result<String> {
    let pb = ui::new_spinner("Fetching rates...");
    let table = rate_source.fetch_rates(&base.to_uppercase()).await;
    pb.finish_and_clear();
    Ok(table?.display_as_table())
}
