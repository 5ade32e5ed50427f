//! Line commands that stand in for the lock face.

use std::str::FromStr;

use anyhow::{Context, anyhow, bail, ensure};

use combolock_core::{Digit, SelectorIndex};

/// Most values accepted by one `spin` command. Longer gestures are easier
/// to type as several spins.
pub const MAX_SPIN_VALUES: usize = 16;

pub const HELP: &str = "\
commands:
  set <selector> <digit>         tap one selector to a digit
  spin <selector> <digit>...     drag one selector through several digits
  reset                          zero every selector
  status                         show lock status
  history                        show recent lock transitions
  help                           show this text
  quit                           stop the host";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Set { index: SelectorIndex, value: Digit },
    Spin { index: SelectorIndex, values: Vec<Digit> },
    Reset,
    Status,
    History,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let args: Vec<&str> = words.collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "set" => {
                ensure!(args.len() == 2, "usage: set <selector> <digit>");
                ConsoleCommand::Set {
                    index: parse_index(args[0])?,
                    value: parse_digit(args[1])?,
                }
            }
            "spin" => {
                let (index, values) = args
                    .split_first()
                    .ok_or_else(|| anyhow!("usage: spin <selector> <digit>..."))?;
                ensure!(!values.is_empty(), "spin needs at least one digit");
                ensure!(
                    values.len() <= MAX_SPIN_VALUES,
                    "spin takes at most {MAX_SPIN_VALUES} digits"
                );
                ConsoleCommand::Spin {
                    index: parse_index(index)?,
                    values: values
                        .iter()
                        .map(|v| parse_digit(v))
                        .collect::<anyhow::Result<_>>()?,
                }
            }
            "reset" => ConsoleCommand::Reset,
            "status" => ConsoleCommand::Status,
            "history" => ConsoleCommand::History,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => bail!("unknown command '{other}', try 'help'"),
        };
        Ok(command)
    }
}

fn parse_index(raw: &str) -> anyhow::Result<SelectorIndex> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a selector (0-3)"))
}

fn parse_digit(raw: &str) -> anyhow::Result<Digit> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a digit (0-9)"))
}
