//! Line commands accepted at the prompt.

use runtime::{NameInput, Route};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Register(String),
    Create(String),
    Join(String),
    Quit,
    Attack,
    Defend,
    /// List joinable battles.
    Battles,
    Status,
    /// Show vitals of the active battle.
    Vitals,
    /// Without an id, list the battlegrounds and open the selection screen.
    Ground(Option<String>),
    Go(Route),
    Refresh,
    Help,
    Exit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command `{0}`, type `help` for a list")]
    Unknown(String),

    #[error("`{0}` needs a name")]
    MissingName(&'static str),

    #[error("names may only contain letters and digits: `{0}`")]
    InvalidName(String),

    #[error("unknown screen `{0}`")]
    UnknownScreen(String),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<CliCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let argument = (!rest.is_empty()).then_some(rest);

    let command = match verb.to_ascii_lowercase().as_str() {
        "register" => CliCommand::Register(name_argument("register", argument)?),
        "create" => CliCommand::Create(name_argument("create", argument)?),
        "join" => CliCommand::Join(name_argument("join", argument)?),
        "quit" | "forfeit" => CliCommand::Quit,
        "attack" | "a" => CliCommand::Attack,
        "defend" | "d" => CliCommand::Defend,
        "battles" | "ls" => CliCommand::Battles,
        "status" | "s" => CliCommand::Status,
        "vitals" | "v" => CliCommand::Vitals,
        "ground" => CliCommand::Ground(argument.map(str::to_string)),
        "go" => CliCommand::Go(screen(argument)?),
        "refresh" | "r" => CliCommand::Refresh,
        "help" | "?" => CliCommand::Help,
        "exit" => CliCommand::Exit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn name_argument(verb: &'static str, argument: Option<&str>) -> Result<String, ParseError> {
    let candidate = argument.ok_or(ParseError::MissingName(verb))?;
    let mut input = NameInput::new();
    if !input.set(candidate) {
        return Err(ParseError::InvalidName(candidate.to_string()));
    }
    Ok(input.value().to_string())
}

fn screen(argument: Option<&str>) -> Result<Route, ParseError> {
    match argument {
        Some("home") => Ok(Route::Home),
        Some("create") => Ok(Route::CreateBattle),
        Some("join") => Ok(Route::JoinBattle),
        Some("ground") => Ok(Route::Battleground),
        Some(other) => Err(ParseError::UnknownScreen(other.to_string())),
        None => Err(ParseError::UnknownScreen(String::new())),
    }
}

pub const HELP: &str = "\
commands:
  register <name>   register the connected account
  create <name>     open a battle and wait for an opponent
  join <name>       join a pending battle
  battles           list battles you can join
  attack | defend   play a move in the active battle
  quit              forfeit the active battle
  vitals            show both players in the active battle
  ground [id]       list or choose the battleground
  go <screen>       home, create, join or ground
  status            connection, screen and recent messages
  refresh           re-fetch the battle list
  exit              leave the client";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_validated_while_parsing() {
        assert_eq!(
            parse("create arena1"),
            Ok(Some(CliCommand::Create("arena1".into())))
        );
        assert_eq!(
            parse("join arena!"),
            Err(ParseError::InvalidName("arena!".into()))
        );
        assert_eq!(parse("register"), Err(ParseError::MissingName("register")));
    }

    #[test]
    fn names_with_spaces_are_rejected_whole() {
        assert_eq!(
            parse("register neo one"),
            Err(ParseError::InvalidName("neo one".into()))
        );
        assert_eq!(
            parse("  join   arena  "),
            Ok(Some(CliCommand::Join("arena".into())))
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn verbs_are_case_insensitive_and_aliased() {
        assert_eq!(parse("ATTACK"), Ok(Some(CliCommand::Attack)));
        assert_eq!(parse("d"), Ok(Some(CliCommand::Defend)));
        assert_eq!(parse("ground"), Ok(Some(CliCommand::Ground(None))));
        assert_eq!(
            parse("ground bg-saiman"),
            Ok(Some(CliCommand::Ground(Some("bg-saiman".into()))))
        );
    }

    #[test]
    fn screens_map_to_routes() {
        assert_eq!(parse("go join"), Ok(Some(CliCommand::Go(Route::JoinBattle))));
        assert!(matches!(
            parse("go battle"),
            Err(ParseError::UnknownScreen(_))
        ));
        assert!(matches!(parse("fly"), Err(ParseError::Unknown(_))));
    }
}
