//! Event-driven, multi-threaded UCI engine loop.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use tracing::{debug, info, warn};

use tusker_core::Position;
use tusker_engine::{budget_from_go, SearchControl, SearchParams, SearchResult, Searcher, ENGINE_DEPTH};

use crate::command::{parse_command, Command, GoParams};
use crate::error::UciError;

/// Worker threads used for the root split.
const DEFAULT_THREADS: usize = 4;

/// Quiescence depth cap.
const DEFAULT_Q_DEPTH: i32 = 10;

/// Whether the engine is idle or has a search in flight.
enum EngineState {
    Idle,
    Searching,
}

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone(Box<SearchDone>),
    InputClosed,
}

/// Payload returned by the search thread when it finishes.
struct SearchDone {
    result: SearchResult,
    searcher: Searcher,
}

/// The UCI engine: current position, searcher, and search state.
///
/// The main thread runs an event loop; a reader thread feeds it commands and
/// a search thread (owning the [`Searcher`] while active) feeds it results.
pub struct UciEngine {
    pos: Position,
    searcher: Option<Searcher>,
    state: EngineState,
    stop_flag: Arc<AtomicBool>,
    pending_new_game: bool,
}

impl UciEngine {
    /// Create an engine holding the starting position.
    pub fn new() -> Self {
        Self {
            pos: Position::starting_position(),
            searcher: Some(Searcher::new()),
            state: EngineState::Idle,
            stop_flag: Arc::new(AtomicBool::new(false)),
            pending_new_game: false,
        }
    }

    /// Run the UCI event loop until `quit` or stdin closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        debug!(cmd = %trimmed, "received UCI command");
                        if stdin_tx
                            .send(EngineEvent::UciCommand(parse_command(trimmed)))
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(cmd)) => match cmd {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(pos) => self.pos = pos,
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::Stop => self.stop_flag.store(true, Ordering::Release),
                    Command::Quit => {
                        // Wind down any running search before exiting so the
                        // final bestmove is still printed.
                        if matches!(self.state, EngineState::Searching) {
                            self.stop_flag.store(true, Ordering::Release);
                            for event in &rx {
                                if let EngineEvent::SearchDone(done) = event {
                                    self.finish_search(*done);
                                    break;
                                }
                            }
                        }
                        break;
                    }
                    Command::Unknown(cmd) => {
                        if !cmd.is_empty() {
                            debug!(cmd, "ignoring unknown command");
                        }
                    }
                },
                EngineEvent::UciCommand(Err(err)) => {
                    warn!(error = %err, "rejected UCI command");
                }
                EngineEvent::SearchDone(done) => self.finish_search(*done),
                EngineEvent::InputClosed => break,
            }
        }

        info!("tusker shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name tusker");
        println!("id author the tusker authors");
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.pos = Position::starting_position();
        match &self.searcher {
            Some(searcher) => searcher.new_game(),
            // The search thread owns the searcher; clear when it returns.
            None => self.pending_new_game = true,
        }
    }

    fn handle_go(&mut self, go: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if matches!(self.state, EngineState::Searching) {
            warn!("go received while already searching, ignoring");
            return;
        }

        self.stop_flag = Arc::new(AtomicBool::new(false));
        let budget = budget_from_go(
            go.wtime,
            go.btime,
            go.winc,
            go.binc,
            go.movestogo,
            go.movetime,
            go.infinite,
            self.pos.side_to_move(),
        );
        let control = match budget {
            Some(budget) => SearchControl::new_timed(Arc::clone(&self.stop_flag), budget),
            None => SearchControl::new_infinite(Arc::clone(&self.stop_flag)),
        };

        let params = SearchParams {
            threads: DEFAULT_THREADS,
            max_depth: go.depth.unwrap_or(ENGINE_DEPTH),
            q_depth: DEFAULT_Q_DEPTH,
            quiet: false,
        };

        let searcher = self.searcher.take().unwrap_or_default();
        let pos = self.pos;
        let tx = tx.clone();

        std::thread::spawn(move || {
            let result = searcher.find_best_move(&pos, &params, &control, |depth, score, nodes, pv| {
                let elapsed_ms = control.elapsed().as_millis().max(1);
                let nps = (nodes as u128 * 1000) / elapsed_ms;
                let pv_line: Vec<String> = pv.iter().map(|m| m.to_uci()).collect();
                println!(
                    "info depth {} score cp {} nodes {} nps {} time {} pv {}",
                    depth,
                    score,
                    nodes,
                    nps,
                    elapsed_ms,
                    pv_line.join(" ")
                );
            });
            let _ = tx.send(EngineEvent::SearchDone(Box::new(SearchDone { result, searcher })));
        });

        self.state = EngineState::Searching;
    }

    fn finish_search(&mut self, done: SearchDone) {
        let searcher = done.searcher;
        if self.pending_new_game {
            searcher.new_game();
            self.pending_new_game = false;
        }
        self.searcher = Some(searcher);
        self.state = EngineState::Idle;

        if done.result.best_move.is_null() {
            println!("bestmove 0000");
        } else {
            println!("bestmove {}", done.result.best_move.to_uci());
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}
