//! Line commands read from stdin

use noise_core::Environment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    SetEnvironment(Environment),
    Classify,
    LogLevel(String),
    Help,
    Quit,
}

/// Parse one input line; `Ok(None)` for blank lines
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("r" | "c" | "i", []) => ConsoleCommand::SetEnvironment(
            head.parse().map_err(|e| format!("{}", e))?,
        ),
        ("e" | "env", [name]) => {
            ConsoleCommand::SetEnvironment(name.parse().map_err(|e| format!("{}", e))?)
        },
        ("e" | "env", _) => return Err("usage: e <residential|commercial|industrial>".to_string()),
        ("s" | "scan", []) => ConsoleCommand::Classify,
        ("log", [level]) => ConsoleCommand::LogLevel((*level).to_string()),
        ("log", _) => return Err("usage: log <level>".to_string()),
        ("h" | "help" | "?", []) => ConsoleCommand::Help,
        ("q" | "quit" | "exit", []) => ConsoleCommand::Quit,
        _ => return Err(format!("unknown command '{}'", line.trim())),
    };
    Ok(Some(command))
}
