//! Command scripts for driving a headless agent
//!
//! One command per line, `#` starts a comment:
//!
//! ```text
//! show
//! play Wave
//! move 100 200 500
//! speak Hello there!
//! speak-for 1500 Bye
//! wait 2000
//! resize 640 480
//! hide
//! ```

use anyhow::{bail, Context, Result};
use mascot_agent::{Agent, Surface};
use std::str::FromStr;

/// One script command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show,
    Hide,
    Play(String),
    Move {
        right: f64,
        bottom: f64,
        duration_ms: Option<u64>,
    },
    Speak {
        text: String,
        duration_ms: Option<u64>,
    },
    Wait(u64),
    Resize {
        width: u32,
        height: u32,
    },
}

fn parse_arg<T: FromStr>(value: Option<&str>, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = value.with_context(|| format!("missing {what}"))?;
    value
        .parse()
        .with_context(|| format!("invalid {what}: '{value}'"))
}

fn strip_quotes(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let mut args = rest.split_whitespace();

        let command = match keyword {
            "show" => Command::Show,
            "hide" => Command::Hide,
            "play" => Command::Play(parse_arg(args.next(), "animation name")?),
            "move" => Command::Move {
                right: parse_arg(args.next(), "right offset")?,
                bottom: parse_arg(args.next(), "bottom offset")?,
                duration_ms: args.next().map(|d| parse_arg(Some(d), "duration")).transpose()?,
            },
            "speak" => Command::Speak {
                text: strip_quotes(rest).to_string(),
                duration_ms: None,
            },
            "speak-for" => {
                let (duration, text) = rest
                    .trim()
                    .split_once(char::is_whitespace)
                    .context("speak-for needs a duration and a text")?;
                Command::Speak {
                    text: strip_quotes(text).to_string(),
                    duration_ms: Some(parse_arg(Some(duration), "duration")?),
                }
            }
            "wait" => Command::Wait(parse_arg(args.next(), "wait duration")?),
            "resize" => Command::Resize {
                width: parse_arg(args.next(), "width")?,
                height: parse_arg(args.next(), "height")?,
            },
            other => bail!("unknown command '{other}'"),
        };

        Ok(command)
    }
}

/// Parses a whole script, skipping blank lines and comments
pub fn parse_script(source: &str) -> Result<Vec<Command>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.split('#').next().unwrap_or("").trim();
            (!line.is_empty()).then_some((i + 1, line))
        })
        .map(|(number, line)| {
            line.parse::<Command>()
                .with_context(|| format!("line {number}: {line}"))
        })
        .collect()
}

/// Applies one command; `Wait` is left to the caller since it drives time
pub fn apply<S: Surface>(agent: &mut Agent<S>, command: &Command) {
    match command {
        Command::Show => {
            agent.show();
        }
        Command::Hide => agent.hide(),
        Command::Play(name) => {
            agent.play(name);
        }
        Command::Move {
            right,
            bottom,
            duration_ms,
        } => match duration_ms {
            Some(duration_ms) => agent.move_to_with_duration(*right, *bottom, *duration_ms),
            None => agent.move_to(*right, *bottom),
        },
        Command::Speak { text, duration_ms } => {
            match duration_ms {
                Some(duration_ms) => agent.speak_with_duration(text, *duration_ms),
                None => agent.speak(text),
            };
        }
        Command::Wait(_) => {}
        Command::Resize { width, height } => agent.resize_viewport(*width, *height),
    }
}
