use foundation::LayerKind;

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(String),
    Show(LayerKind),
    Hide(LayerKind),
    Up,
    Down,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    UnknownLayer(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(word) => write!(f, "unknown command `{word}` (try `help`)"),
            CommandError::MissingArgument(what) => write!(f, "missing {what}"),
            CommandError::UnknownLayer(key) => write!(f, "unknown layer `{key}`"),
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "commands: select <option|n>, show <layer>, hide <layer>, up, down, status, quit";

/// `n` alone names `Option n`, as in the `option=n` query parameter.
pub fn option_name(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        format!("Option {value}")
    } else {
        value.to_string()
    }
}

fn layer_arg(rest: &str) -> Result<LayerKind, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::MissingArgument("layer"));
    }
    LayerKind::from_key(rest).ok_or_else(|| CommandError::UnknownLayer(rest.to_string()))
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match word {
        "" => Err(CommandError::Empty),
        "select" | "option" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument("option name"));
            }
            Ok(Command::Select(option_name(rest)))
        }
        "show" => layer_arg(rest).map(Command::Show),
        "hide" => layer_arg(rest).map(Command::Hide),
        "up" => Ok(Command::Up),
        "down" => Ok(Command::Down),
        "status" | "ls" => Ok(Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}
