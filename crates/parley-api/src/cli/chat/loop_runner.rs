//! Main chat loop orchestration.
//!
//! Drives one conversation against a `ChatBackend`: welcome banner, input
//! loop with a spinner while the reply is pending, slash commands, and
//! quota feedback after every send.

use std::io::Write;

use console::style;

use super::backend::ChatBackend;
use super::input::{ChatInput, InputEvent};

/// Run the interactive chat loop until the user quits.
pub async fn run<B: ChatBackend>(mut backend: B) -> anyhow::Result<()> {
    let quota = backend.start().await?;

    println!();
    println!(
        "  {} Parley chat ({} mode)",
        style("*").cyan().bold(),
        backend.mode()
    );
    println!(
        "  {}",
        style(format!(
            "{} of {} messages remaining. /quota for status, /quit to leave.",
            quota.remaining,
            quota.remaining + quota.count
        ))
        .dim()
    );
    println!();

    let (mut input, mut stdout) = ChatInput::new("you> ".to_string())?;

    loop {
        match input.read_line().await {
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => match text.as_str() {
                "/quit" | "/exit" => break,
                "/quota" => {
                    let quota = backend.quota().await?;
                    writeln!(
                        stdout,
                        "  {} {} sent, {} remaining",
                        style("quota:").dim(),
                        quota.count,
                        quota.remaining
                    )?;
                }
                _ => {
                    let spinner = indicatif::ProgressBar::new_spinner();
                    spinner.set_style(
                        indicatif::ProgressStyle::default_spinner()
                            .template("{spinner:.cyan} {msg}")
                            .unwrap(),
                    );
                    spinner.set_message("thinking...");
                    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

                    let result = backend.send(&text).await;
                    spinner.finish_and_clear();

                    match result {
                        Ok(exchange) => {
                            writeln!(
                                stdout,
                                "{} {}",
                                style("assistant>").cyan().bold(),
                                exchange.assistant_message.content
                            )?;

                            let quota = backend.quota().await?;
                            if !quota.can_send {
                                writeln!(
                                    stdout,
                                    "  {}",
                                    style("Message limit reached; further sends will fail.")
                                        .yellow()
                                )?;
                            } else if quota.remaining <= 3 {
                                writeln!(
                                    stdout,
                                    "  {}",
                                    style(format!("{} messages remaining", quota.remaining))
                                        .dim()
                                )?;
                            }
                        }
                        Err(e) => {
                            writeln!(stdout, "  {} {e}", style("!").red().bold())?;
                        }
                    }
                }
            },
            InputEvent::Eof | InputEvent::Interrupted => break,
        }
    }

    println!("\n  Goodbye.");
    Ok(())
}
