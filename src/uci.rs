use crate::error::ChessError;
use crate::fen::STARTING_FEN;
use crate::move_generator::find_legal_move;
use crate::piece::Color;
use crate::position::Position;
use crate::r#move::Move;
use crate::search::{Engine, SearchBackend, SearchLimits, SearchResult};
use crate::perft_divide;

use regex::Regex;
use rustyline::config::Configurer;
use rustyline::Editor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UciError {
    #[error("no command given")]
    NoCommand,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArg(String),
    #[error("bad value for {0}")]
    BadValue(String),
    #[error("illegal or malformed move: {0}")]
    IllegalMove(String),
    #[error(transparent)]
    Chess(#[from] ChessError),
}

/// Arguments of a `go` command, times in milliseconds
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GoOptions {
    pub depth: Option<u8>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub infinite: bool,
}

impl GoOptions {
    /// Search bounds for `side`. A fixed move time wins over the clock.
    pub fn limits(&self, side: Color) -> SearchLimits {
        let mut limits = SearchLimits::default();
        if let Some(depth) = self.depth {
            limits.set_depth(depth);
        }
        if self.infinite {
            return limits;
        }

        let (clock, increment) = match side {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        if let Some(movetime) = self.movetime {
            limits.set_time(Some(Duration::from_millis(movetime)));
        } else if let Some(clock) = clock {
            limits.set_time_from_clock(
                Duration::from_millis(clock),
                increment.map(Duration::from_millis),
            );
        }
        limits
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    NewGame,
    Position { fen: String, moves: Vec<String> },
    Go(GoOptions),
    Stop,
    Display,
    Perft(usize),
    Quit,
}

impl UciCommand {
    pub fn parse(line: &str) -> Result<UciCommand, UciError> {
        let args_regex = args_regex();
        let mut args = args_regex
            .find_iter(line)
            .map(|m| m.as_str().trim_matches('"'));
        let cmd = args.next().ok_or(UciError::NoCommand)?;

        Ok(match cmd {
            "uci" => UciCommand::Uci,
            "isready" => UciCommand::IsReady,
            "ucinewgame" => UciCommand::NewGame,
            "position" => {
                let fen = match args.next() {
                    Some("startpos") => STARTING_FEN.to_string(),
                    Some("fen") => args
                        .by_ref()
                        .take_while(|a| *a != "moves")
                        .collect::<Vec<_>>()
                        .join(" "),
                    _ => return Err(UciError::MissingArg("<startpos | fen>".to_string())),
                };
                // a quoted fen arrives as one token, split it back into fields
                let fen = fen.split_whitespace().collect::<Vec<_>>().join(" ");
                let moves = args
                    .skip_while(|a| *a == "moves")
                    .map(String::from)
                    .collect();
                UciCommand::Position { fen, moves }
            }
            "go" => UciCommand::Go(Self::parse_go_args(args)?),
            "stop" => UciCommand::Stop,
            "d" => UciCommand::Display,
            "perft" => {
                let depth = args
                    .next()
                    .ok_or_else(|| UciError::MissingArg("<depth>".to_string()))?;
                UciCommand::Perft(
                    depth
                        .parse()
                        .map_err(|_| UciError::BadValue("perft depth".to_string()))?,
                )
            }
            "quit" => UciCommand::Quit,
            _ => return Err(UciError::UnknownCommand(cmd.to_string())),
        })
    }

    fn parse_go_args<'a, I: Iterator<Item = &'a str>>(mut args: I) -> Result<GoOptions, UciError> {
        fn value<'a, T: std::str::FromStr>(
            name: &str,
            args: &mut impl Iterator<Item = &'a str>,
        ) -> Result<Option<T>, UciError> {
            let text = args
                .next()
                .ok_or_else(|| UciError::MissingArg(format!("{} <value>", name)))?;
            text.parse::<T>()
                .map(Some)
                .map_err(|_| UciError::BadValue(name.to_string()))
        }

        let mut options = GoOptions::default();
        while let Some(arg) = args.next() {
            match arg {
                "depth" => options.depth = value(arg, &mut args)?,
                "movetime" => options.movetime = value(arg, &mut args)?,
                "wtime" => options.wtime = value(arg, &mut args)?,
                "btime" => options.btime = value(arg, &mut args)?,
                "winc" => options.winc = value(arg, &mut args)?,
                "binc" => options.binc = value(arg, &mut args)?,
                "infinite" => options.infinite = true,
                other => debug!(arg = other, "ignoring go argument"),
            }
        }
        Ok(options)
    }
}

fn args_regex() -> Regex {
    // the pattern is a literal, it always compiles
    Regex::new(r#"(".*?"|[^"\s]+)"#).unwrap_or_else(|_| unreachable!())
}

pub enum UciResponse<'a> {
    Id,
    UciOk,
    ReadyOk,
    BestMove(Option<Move>),
    Info(&'a SearchResult),
}

impl UciResponse<'_> {
    pub fn send(&self) {
        match self {
            Self::Id => println!(
                "id name gambit {}\nid author {}",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_AUTHORS")
            ),
            Self::UciOk => println!("uciok"),
            Self::ReadyOk => println!("readyok"),
            Self::BestMove(Some(mv)) => println!("bestmove {}", mv),
            Self::BestMove(None) => println!("bestmove 0000"),
            Self::Info(result) => println!("info {}", result),
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Line based UCI front end. Searches run on a background thread over a
/// copy of the current position.
pub struct Uci {
    position: Position,
    engine: Arc<Mutex<Engine>>,
    stop_flag: Arc<AtomicBool>,
    search_thread: Option<JoinHandle<()>>,
}

impl Default for Uci {
    fn default() -> Self {
        Uci {
            position: Position::initial(),
            engine: Arc::new(Mutex::new(Engine::new())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            search_thread: None,
        }
    }
}

impl Uci {
    pub fn run(&mut self) {
        let mut editor = Editor::<()>::new();
        editor.set_auto_add_history(true);

        while let Ok(line) = editor.readline("") {
            match UciCommand::parse(&line).and_then(|command| self.handle_command(command)) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) | Err(UciError::NoCommand) => (),
                Err(e) => warn!("{}", e),
            }
        }
        self.stop_search();
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    fn handle_command(&mut self, command: UciCommand) -> Result<Flow, UciError> {
        match command {
            UciCommand::Uci => {
                UciResponse::Id.send();
                UciResponse::UciOk.send();
            }
            UciCommand::IsReady => UciResponse::ReadyOk.send(),
            UciCommand::NewGame => {
                self.stop_search();
                self.position = Position::initial();
                match self.engine.lock() {
                    Ok(mut engine) => engine.new_game(),
                    Err(_) => error!("engine lock poisoned, tables not cleared"),
                }
            }
            UciCommand::Position { fen, moves } => self.set_position(&fen, &moves)?,
            UciCommand::Go(options) => self.start_search(&options),
            UciCommand::Stop => self.stop_search(),
            UciCommand::Display => println!("{}", self.position),
            UciCommand::Perft(depth) => {
                let start = Instant::now();
                let mut total = 0;
                for (mv, nodes) in perft_divide(&mut self.position, depth)? {
                    println!("{}: {}", mv, nodes);
                    total += nodes;
                }
                println!("\nnodes {} ({} ms)", total, start.elapsed().as_millis());
            }
            UciCommand::Quit => {
                self.stop_search();
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Replaces the current position, leaving it untouched if any part fails
    fn set_position(&mut self, fen: &str, moves: &[String]) -> Result<(), UciError> {
        let mut position = Position::from_fen(fen)?;
        for text in moves {
            let mv = find_legal_move(&mut position, text)
                .map_err(|_| UciError::IllegalMove(text.clone()))?
                .ok_or_else(|| UciError::IllegalMove(text.clone()))?;
            position.make_move(mv)?;
        }
        self.position = position;
        Ok(())
    }

    fn start_search(&mut self, options: &GoOptions) {
        self.stop_search();
        self.stop_flag.store(false, Ordering::SeqCst);

        let limits = options.limits(self.position.side_to_move());
        let mut position = self.position.copy();
        let engine = Arc::clone(&self.engine);
        let stop_flag = Arc::clone(&self.stop_flag);
        debug!(?limits, "starting search");

        self.search_thread = Some(thread::spawn(move || {
            let cancel: &dyn Fn() -> bool = &|| stop_flag.load(Ordering::Relaxed);
            let mut engine = match engine.lock() {
                Ok(engine) => engine,
                Err(_) => {
                    error!("engine lock poisoned, cannot search");
                    return;
                }
            };
            match engine.search(&mut position, &limits, Some(cancel)) {
                Ok(result) => {
                    UciResponse::Info(&result).send();
                    UciResponse::BestMove(result.best_move).send();
                }
                Err(e) => error!(error = %e, "search failed"),
            }
        }));
    }

    fn stop_search(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.search_thread.take() {
            if handle.join().is_err() {
                error!("search thread panicked");
            }
        }
    }
}
