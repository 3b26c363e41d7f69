use std::process::ExitCode;
use std::time::Instant;

use gambit::fen::STARTING_FEN;
use gambit::uci::Uci;
use gambit::{perft_divide, ChessError, Position};
use tracing_subscriber::EnvFilter;

fn run_perft(depth: usize, fen: &str) -> Result<(), ChessError> {
    let mut position = Position::from_fen(fen)?;
    println!("{}\n", position);

    let start = Instant::now();
    let mut total = 0;
    for (mv, nodes) in perft_divide(&mut position, depth)? {
        println!("{}: {}", mv, nodes);
        total += nodes;
    }
    let elapsed = start.elapsed();
    println!(
        "\ndepth {} nodes {} ({}s, {} nps)",
        depth,
        total,
        elapsed.as_secs_f32(),
        (total as f32 / elapsed.as_secs_f32()) as u64
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) != Some("perft") {
        Uci::default().run();
        return ExitCode::SUCCESS;
    }

    let expected_format = "Expected : perft <depth> [<FEN>]";
    let depth = match args.get(2).and_then(|d| d.parse::<usize>().ok()) {
        Some(depth) => depth,
        None => {
            eprintln!("{}", expected_format);
            return ExitCode::FAILURE;
        }
    };
    let fen = args.get(3).map_or(STARTING_FEN, String::as_str);

    match run_perft(depth, fen) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
