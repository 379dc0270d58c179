//! A minimal command-line front end for the search engine.
//!
//! This deliberately stops short of full UCI: it runs a single search on a
//! FEN and prints the result. The engine crate itself has no notion of a
//! protocol; this binary is just one possible caller of its facade.

use anyhow::{Context, Result};
use chess::board::Board;
use clap::Parser;
use engine::{Engine, SearchEvent, SearchLimits};
use std::sync::mpsc;
use std::time::Duration;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Parser, Debug)]
#[command(name = "gambit", about = "Search a chess position to a fixed depth or time limit")]
struct Args {
    /// FEN of the position to search. Defaults to the starting position.
    #[arg(long, default_value = START_FEN)]
    fen: String,

    /// Maximum depth to search to.
    #[arg(long, default_value_t = 10)]
    depth: usize,

    /// Stop the search after this many milliseconds, regardless of depth.
    #[arg(long)]
    movetime: Option<u64>,

    /// Transposition table size, in megabytes.
    #[arg(long, default_value_t = 16)]
    hash_mb: usize,

    /// Print every completed depth's principal variation, not just the
    /// final one.
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let board: Board = args.fen.parse().context("failed to parse FEN")?;

    let mut engine = Engine::new(args.hash_mb);
    engine.set_position(board);

    let limits = SearchLimits {
        max_depth: Some(args.depth),
        infinite: args.movetime.is_none(),
        ..Default::default()
    };

    let (tx, rx) = mpsc::channel();
    let verbose = args.verbose;

    engine.search(
        limits,
        move |event| {
            if verbose {
                print_report(&event);
            }
        },
        move |event| {
            let _ = tx.send(event);
        },
    );

    if let Some(movetime) = args.movetime {
        std::thread::sleep(Duration::from_millis(movetime));
        engine.stop();
    }

    let finish = rx.recv().context("search worker never reported a finish event")?;
    print_report(&finish);

    Ok(())
}

fn print_report(event: &SearchEvent) {
    let report = &event.report;
    let pv = report
        .pv
        .iter()
        .map(|mv| mv.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    println!(
        "depth {} seldepth {} score {} nodes {} time {}ms pv {}",
        report.depth,
        report.seldepth,
        report.score,
        report.nodes,
        report.duration.as_millis(),
        pv,
    );
}
