use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use merge_grid::config::GameConfig;
use merge_grid::engine::GridEngine;
use merge_grid::hints::choose_pair_first;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play the merge puzzle in the terminal", long_about = None)]
struct Args {
    /// Path to a TOML game config
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Board rows (overrides the config)
    #[clap(long)]
    rows: Option<usize>,

    /// Board columns (overrides the config)
    #[clap(long)]
    cols: Option<usize>,

    /// RNG seed for a reproducible session
    #[clap(short, long)]
    seed: Option<u64>,

    /// Directory with item<ID>_<LEVEL>.png assets
    #[clap(short, long)]
    assets: Option<PathBuf>,

    /// Tracing filter, e.g. "warn", "debug"
    #[clap(long, default_value = "warn")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let mut config = GameConfig::load_or_default(args.config.as_deref())?;
    if let Some(rows) = args.rows {
        config.engine.rows = rows;
    }
    if let Some(cols) = args.cols {
        config.engine.cols = cols;
    }
    if args.seed.is_some() {
        config.engine.seed = args.seed;
    }
    if args.assets.is_some() {
        config.items.asset_dir = args.assets;
    }

    let catalog = config.items.build_catalog()?;
    info!(items = ?catalog.available_items(), "starting session");
    let mut game = GridEngine::new(config.engine, catalog)?;

    println!("Welcome to Merge Grid!");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("---------------------");
        println!("Score: {}, Merges: {}", game.score(), game.moves());
        println!("{}", game.board().to_string_with_highlight(game.selection()));

        if game.is_game_over() {
            println!();
            println!("No merges left. GAME OVER! Final score: {}", game.score());
        }

        print!("Pick a tile (row col), 'h' for a hint, 'r' to restart, 'q' to quit: ");
        io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let input = line.context("failed to read input")?;
        let trimmed = input.trim();

        match trimmed {
            "q" => {
                println!("Thanks for playing!");
                break;
            }
            "r" => {
                game.reset();
                println!("New board.");
                continue;
            }
            "h" => {
                match choose_pair_first(game.board(), game.catalog()) {
                    Some((a, b)) => println!("Try {} {} then {} {}.", a.0, a.1, b.0, b.1),
                    None => println!("No legal merge on this board."),
                }
                continue;
            }
            _ => {}
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let [r, c] = parts[..] else {
            println!("Invalid input format. Use 'row col', 'h', 'r', or 'q'.");
            continue;
        };
        let (Ok(r), Ok(c)) = (r.parse::<usize>(), c.parse::<usize>()) else {
            println!("Invalid input: row and column must be numbers (e.g. '2 3').");
            continue;
        };
        if !game.board().in_bounds((r, c)) {
            // Outside the grid: no cell, so no engine call.
            println!(
                "Invalid coordinates: rows are 0..{}, columns 0..{}.",
                game.board().rows() - 1,
                game.board().cols() - 1
            );
            continue;
        }

        if game.toggle_select(r, c) {
            println!("Merged!");
        }
    }

    Ok(())
}
