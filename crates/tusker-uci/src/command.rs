//! UCI command parsing.

use std::time::Duration;

use tusker_core::{legal_moves, Move, Position};

use crate::error::UciError;

/// Parameters of the `go` command. All fields optional; a bare `go` searches
/// without limits.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves until the next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<u32>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search until `stop`.
    pub infinite: bool,
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    /// `uci` -- identify the engine.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- reset engine state.
    UciNewGame,
    /// `position` -- set up a position with optional moves applied.
    Position(Position),
    /// `go` -- start searching.
    Go(GoParams),
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
    /// Unrecognized command, silently ignored per UCI convention.
    Unknown(String),
}

/// Parse one line of UCI input.
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&first) = tokens.first() else {
        return Ok(Command::Unknown(String::new()));
    };

    match first {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "position" => parse_position(&tokens[1..]),
        "go" => parse_go(&tokens[1..]),
        _ => Ok(Command::Unknown(first.to_string())),
    }
}

/// Parse `position startpos|fen <fen> [moves m1 m2 ...]`.
///
/// Every listed move must be legal in the position it is applied to; an
/// illegal or malformed move rejects the whole command, so the search never
/// sees a corrupted position.
fn parse_position(tokens: &[&str]) -> Result<Command, UciError> {
    if tokens.is_empty() {
        return Err(UciError::MalformedPosition);
    }

    let (mut pos, rest) = if tokens[0] == "startpos" {
        (Position::starting_position(), &tokens[1..])
    } else if tokens[0] == "fen" {
        // A FEN is exactly six space-separated fields.
        if tokens.len() < 7 {
            return Err(UciError::InvalidFen {
                fen: tokens[1..].join(" "),
            });
        }
        let fen = tokens[1..7].join(" ");
        let pos: Position = fen
            .parse()
            .map_err(|_| UciError::InvalidFen { fen: fen.clone() })?;
        (pos, &tokens[7..])
    } else {
        return Err(UciError::MalformedPosition);
    };

    if let Some((&"moves", move_tokens)) = rest.split_first() {
        for token in move_tokens {
            let mv = Move::from_uci(token, &pos)
                .filter(|mv| legal_moves(&pos).iter().any(|m| m == mv))
                .ok_or_else(|| UciError::InvalidMove {
                    uci_move: token.to_string(),
                })?;
            pos = pos.make_move(mv);
        }
    }

    Ok(Command::Position(pos))
}

/// Parse the `go` arguments. Unknown tokens are skipped per UCI convention.
fn parse_go(tokens: &[&str]) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "wtime" => {
                params.wtime = Some(parse_millis(tokens.get(i + 1), "wtime")?);
                i += 2;
            }
            "btime" => {
                params.btime = Some(parse_millis(tokens.get(i + 1), "btime")?);
                i += 2;
            }
            "winc" => {
                params.winc = Some(parse_millis(tokens.get(i + 1), "winc")?);
                i += 2;
            }
            "binc" => {
                params.binc = Some(parse_millis(tokens.get(i + 1), "binc")?);
                i += 2;
            }
            "movestogo" => {
                params.movestogo = Some(parse_int(tokens.get(i + 1), "movestogo")?);
                i += 2;
            }
            "depth" => {
                params.depth = Some(parse_int(tokens.get(i + 1), "depth")?);
                i += 2;
            }
            "movetime" => {
                params.movetime = Some(parse_millis(tokens.get(i + 1), "movetime")?);
                i += 2;
            }
            "infinite" => {
                params.infinite = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    Ok(Command::Go(params))
}

fn parse_millis(token: Option<&&str>, param: &str) -> Result<Duration, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    let ms: u64 = value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })?;
    Ok(Duration::from_millis(ms))
}

fn parse_int<T: std::str::FromStr>(token: Option<&&str>, param: &str) -> Result<T, UciError> {
    let value = token.ok_or_else(|| UciError::MissingGoValue {
        param: param.to_string(),
    })?;
    value.parse().map_err(|_| UciError::InvalidGoValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tusker_core::Color;

    #[test]
    fn parse_simple_commands() {
        assert!(matches!(parse_command("uci").unwrap(), Command::Uci));
        assert!(matches!(parse_command("isready").unwrap(), Command::IsReady));
        assert!(matches!(parse_command("ucinewgame").unwrap(), Command::UciNewGame));
        assert!(matches!(parse_command("stop").unwrap(), Command::Stop));
        assert!(matches!(parse_command("quit").unwrap(), Command::Quit));
    }

    #[test]
    fn parse_startpos() {
        let cmd = parse_command("position startpos").unwrap();
        match cmd {
            Command::Position(pos) => assert_eq!(pos, Position::starting_position()),
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_startpos_with_moves() {
        let cmd = parse_command("position startpos moves e2e4 c7c5").unwrap();
        match cmd {
            Command::Position(pos) => {
                assert_eq!(pos.side_to_move(), Color::White);
                assert_eq!(pos.fullmove_number(), 2);
            }
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn parse_fen_position() {
        let cmd = parse_command(
            "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        )
        .unwrap();
        assert!(matches!(cmd, Command::Position(_)));
    }

    #[test]
    fn parse_fen_with_moves() {
        let cmd = parse_command(
            "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 moves d2d4",
        )
        .unwrap();
        match cmd {
            Command::Position(pos) => assert_eq!(pos.side_to_move(), Color::Black),
            _ => panic!("expected Position"),
        }
    }

    #[test]
    fn illegal_move_rejected() {
        let result = parse_command("position startpos moves e2e5");
        assert!(matches!(result, Err(UciError::InvalidMove { .. })));
    }

    #[test]
    fn malformed_move_rejected() {
        let result = parse_command("position startpos moves zz99");
        assert!(matches!(result, Err(UciError::InvalidMove { .. })));
    }

    #[test]
    fn invalid_fen_rejected() {
        assert!(matches!(
            parse_command("position fen banana"),
            Err(UciError::InvalidFen { .. })
        ));
    }

    #[test]
    fn bare_position_rejected() {
        assert!(matches!(
            parse_command("position"),
            Err(UciError::MalformedPosition)
        ));
    }

    #[test]
    fn parse_go_clock() {
        let cmd = parse_command("go wtime 300000 btime 300000 winc 2000 binc 2000 movestogo 20")
            .unwrap();
        match cmd {
            Command::Go(params) => {
                assert_eq!(params.wtime, Some(Duration::from_millis(300_000)));
                assert_eq!(params.btime, Some(Duration::from_millis(300_000)));
                assert_eq!(params.winc, Some(Duration::from_millis(2_000)));
                assert_eq!(params.binc, Some(Duration::from_millis(2_000)));
                assert_eq!(params.movestogo, Some(20));
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_depth_and_movetime() {
        match parse_command("go depth 6").unwrap() {
            Command::Go(params) => assert_eq!(params.depth, Some(6)),
            _ => panic!("expected Go"),
        }
        match parse_command("go movetime 5000").unwrap() {
            Command::Go(params) => {
                assert_eq!(params.movetime, Some(Duration::from_millis(5_000)));
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn parse_go_infinite_and_bare() {
        match parse_command("go infinite").unwrap() {
            Command::Go(params) => assert!(params.infinite),
            _ => panic!("expected Go"),
        }
        match parse_command("go").unwrap() {
            Command::Go(params) => {
                assert!(!params.infinite);
                assert!(params.wtime.is_none());
                assert!(params.depth.is_none());
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn go_missing_value_rejected() {
        assert!(parse_command("go wtime").is_err());
        assert!(parse_command("go depth abc").is_err());
    }

    #[test]
    fn go_unknown_tokens_skipped() {
        match parse_command("go ponder wtime 1000").unwrap() {
            Command::Go(params) => {
                assert_eq!(params.wtime, Some(Duration::from_millis(1_000)));
            }
            _ => panic!("expected Go"),
        }
    }

    #[test]
    fn unknown_command_passthrough() {
        assert!(matches!(
            parse_command("xyzzy").unwrap(),
            Command::Unknown(_)
        ));
        assert!(matches!(parse_command("").unwrap(), Command::Unknown(_)));
    }
}
