//! Interactive converter session driven by line commands.

use super::ui;
use crate::core::{ConversionController, ConversionError, ConverterState};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  amount <value>   set the amount to convert
  from <code>      select the source currency
  to <code>        select the target currency
  swap             exchange source and target currencies
  convert          convert the amount with fresh rates
  clear            clear the amount and result
  show             show the current state
  list             list the loaded currencies
  help             show this help
  quit             leave the session";

#[derive(Debug, PartialEq)]
enum Command {
    Amount(String),
    From(String),
    To(String),
    Swap,
    Convert,
    Clear,
    Show,
    List,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim().to_string();

    match word.to_lowercase().as_str() {
        "amount" | "a" => Some(Command::Amount(rest)),
        "from" | "f" if !rest.is_empty() => Some(Command::From(rest)),
        "to" | "t" if !rest.is_empty() => Some(Command::To(rest)),
        "swap" | "s" => Some(Command::Swap),
        "convert" | "c" => Some(Command::Convert),
        "clear" => Some(Command::Clear),
        "show" => Some(Command::Show),
        "list" | "ls" => Some(Command::List),
        "help" | "?" => Some(Command::Help),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

fn render_state(state: &ConverterState) -> String {
    let amount = if state.amount.is_empty() {
        "-"
    } else {
        state.amount.as_str()
    };
    format!(
        "{} {}  {} {} -> {}  {} {}",
        ui::style_text("Amount:", ui::StyleType::Label),
        amount,
        ui::style_text("Pair:", ui::StyleType::Label),
        state.from.as_deref().unwrap_or("?"),
        state.to.as_deref().unwrap_or("?"),
        ui::style_text("Result:", ui::StyleType::Label),
        ui::style_text(&state.result, ui::StyleType::Result),
    )
}

/// Writes the notification for `error` unless it is one the user never sees.
fn report<W: Write>(output: &mut W, error: &ConversionError) -> Result<()> {
    if error.is_user_visible() {
        writeln!(output, "{}", ui::notification(error))?;
    } else {
        warn!("Suppressed error: {error}");
    }
    Ok(())
}

/// Runs the session until `quit` or end of input.
pub async fn run<R, W>(controller: &ConversionController, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        output,
        "{}",
        ui::style_text("Currency Converter", ui::StyleType::Title)
    )?;

    if let Err(e) = controller.initialize().await {
        writeln!(output, "{}", ui::load_notification(&e))?;
    }
    writeln!(output, "{}", render_state(&controller.state()))?;
    writeln!(
        output,
        "{}",
        ui::style_text("Type 'help' for commands.", ui::StyleType::Subtle)
    )?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            writeln!(
                output,
                "{}",
                ui::style_text(&format!("Unknown command: {}", line.trim()), ui::StyleType::Error)
            )?;
            continue;
        };
        debug!(?command, "Session command");

        match command {
            Command::Amount(amount) => controller.set_amount(&amount),
            Command::From(code) => {
                if let Err(e) = controller.select_from(&code) {
                    report(output, &e)?;
                }
            }
            Command::To(code) => {
                if let Err(e) = controller.select_to(&code) {
                    report(output, &e)?;
                }
            }
            Command::Swap => controller.swap(),
            Command::Convert => {
                if let Err(e) = controller.convert().await {
                    report(output, &e)?;
                }
            }
            Command::Clear => {
                if let Err(e) = controller.clear() {
                    report(output, &e)?;
                }
            }
            Command::Show => {}
            Command::List => {
                let currencies = controller.state().currencies;
                if currencies.is_empty() {
                    writeln!(
                        output,
                        "{}",
                        ui::style_text("No currencies loaded.", ui::StyleType::Subtle)
                    )?;
                } else {
                    writeln!(output, "{}", currencies.join(" "))?;
                }
                continue;
            }
            Command::Help => {
                writeln!(output, "{HELP}")?;
                continue;
            }
            Command::Quit => break,
        }
        writeln!(output, "{}", render_state(&controller.state()))?;
    }

    Ok(())
}
