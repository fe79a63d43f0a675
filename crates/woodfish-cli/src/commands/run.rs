//! Interactive session on the terminal.
//!
//! Each stdin line is one command; an empty line is a tap.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{trace, warn};
use woodfish_core::{Command, Config, Event, OutcomeMode, Runtime, TapSignals};

use super::fortune::render;

const HELP: &str = "\
<enter> tap    a  toggle auto-tap    s  toggle sound
v  view last fortune    d  dismiss    r  new quote
w <width> <height>  resize viewport
i  show state    q  quit";

#[derive(Args)]
pub struct RunArgs {
    /// Start with auto-tap enabled
    #[arg(long)]
    auto: bool,
    /// Print every event as a JSON line
    #[arg(long)]
    json: bool,
}

/// Rings the terminal bell for the tap cue.
struct TerminalSignals;

impl TapSignals for TerminalSignals {
    fn play_tap_cue(&mut self) {
        let mut err = std::io::stderr();
        let _ = err.write_all(b"\x07");
        let _ = err.flush();
    }

    fn haptic_pulse(&mut self, duration: Duration) {
        trace!(ms = duration.as_millis() as u64, "haptic pulse");
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(session(config, args))
}

async fn session(config: Config, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut x, mut y) = (config.viewport.width / 2.0, config.viewport.height / 2.0);
    let runtime = Runtime::from_config(&config, TerminalSignals)?;
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ev_tx, mut ev_rx) = mpsc::channel(256);
    let driver = tokio::spawn(runtime.run(cmd_rx, ev_tx));

    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = ev_rx.recv().await {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!(error = %e, "failed to encode event"),
                }
            } else if let Some(text) = describe(&event) {
                println!("{text}");
            }
        }
    });

    if args.auto {
        cmd_tx.send(Command::ToggleAutoTap).await?;
    }
    if !json {
        println!("{HELP}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let cmd = match line.trim() {
            "" => Command::Tap { x, y },
            "a" => Command::ToggleAutoTap,
            "s" => Command::ToggleSound,
            "v" => Command::ViewLastFortune,
            "d" => Command::Dismiss,
            "r" => Command::RequestQuote,
            "i" => {
                let (reply, view) = oneshot::channel();
                cmd_tx.send(Command::View(reply)).await?;
                println!("{}", serde_json::to_string_pretty(&view.await?)?);
                continue;
            }
            resize if resize.starts_with("w ") => match parse_viewport(resize) {
                Some((width, height)) => {
                    (x, y) = (width / 2.0, height / 2.0);
                    Command::SetViewport { width, height }
                }
                None => {
                    eprintln!("usage: w <width> <height>");
                    continue;
                }
            },
            "q" => break,
            "?" | "h" => {
                println!("{HELP}");
                continue;
            }
            other => {
                eprintln!("unknown input: {other:?} (h for help)");
                continue;
            }
        };
        if cmd_tx.send(cmd).await.is_err() {
            break;
        }
    }

    let _ = cmd_tx.send(Command::Shutdown).await;
    let engine = driver.await?;
    printer.await?;
    if !json {
        println!("lifetime merit: {}", engine.merit().lifetime_count());
    }
    Ok(())
}

/// `w 390 844` as a positive width and height.
fn parse_viewport(input: &str) -> Option<(f64, f64)> {
    let mut parts = input.split_whitespace().skip(1).map(str::parse::<f64>);
    let (width, height) = (parts.next()?.ok()?, parts.next()?.ok()?);
    let valid = parts.next().is_none() && width > 0.0 && height > 0.0;
    valid.then_some((width, height))
}

/// One line of human-readable output, `None` for events not worth printing.
fn describe(event: &Event) -> Option<String> {
    let text = match event {
        Event::Tapped {
            feedback,
            lifetime_count,
            session_count,
            automatic,
            ..
        } => {
            let mark = if *automatic { " (auto)" } else { "" };
            format!("{}{mark}  lifetime {lifetime_count}  session {session_count}", feedback.label)
        }
        Event::FeedbackExpired { .. } => return None,
        Event::SessionEnded { session_count, .. } => {
            format!("session went quiet at {session_count} taps")
        }
        Event::OutcomeRaised { outcome, .. } => match outcome.mode {
            OutcomeMode::SessionSummary => format!(
                "session complete: {} merit gathered (d to dismiss)",
                outcome.session_merit
            ),
            OutcomeMode::FortuneDraw => format!(
                "session complete: {} merit gathered, drawing a fortune...",
                outcome.session_merit
            ),
            OutcomeMode::FortuneView => match &outcome.fortune {
                Some(fortune) => format!("{}(d to dismiss)", render(fortune)),
                None => return None,
            },
        },
        Event::FortuneRequested { .. } => return None,
        Event::FortuneRevealed {
            fortune,
            golden_unlocked,
            ..
        } => {
            let mut text = render(fortune);
            if *golden_unlocked {
                text.push_str("golden status unlocked\n");
            }
            text.push_str("(d to dismiss)");
            text
        }
        Event::OutcomeDismissed { .. } => "dismissed".to_string(),
        Event::AutoTapToggled { enabled, .. } => {
            format!("auto-tap {}", if *enabled { "on" } else { "off" })
        }
        Event::SoundToggled { enabled, .. } => {
            format!("sound {}", if *enabled { "on" } else { "off" })
        }
        Event::QuoteRequested { .. } => "asking for a quote...".to_string(),
        Event::QuoteUpdated { text, .. } => format!("「{text}」"),
    };
    Some(text)
}
