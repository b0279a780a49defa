use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use merge_grid::config::GameConfig;
use merge_grid::engine::GridEngine;
use merge_grid::hints::{
    choose_pair_adjacent, choose_pair_first, choose_pair_highest_level, choose_pair_lowest_level,
    StrategyFn,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Evaluate merge strategies over seeded sessions",
    long_about = None
)]
struct Args {
    /// Path to a TOML game config
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Number of seeded sessions per strategy
    #[clap(short, long, default_value_t = 20)]
    games: u64,

    /// First seed; sessions use consecutive seeds from here
    #[clap(long, default_value_t = 0)]
    start_seed: u64,

    /// Stop a session after this many merges
    #[clap(long, default_value_t = 1000)]
    max_moves: u32,

    /// Tracing filter, e.g. "info", "debug"
    #[clap(long, default_value = "info")]
    log: String,
}

struct Outcome {
    score: u32,
    moves: u32,
    game_over: bool,
}

fn play_session(
    config: &GameConfig,
    strategy: StrategyFn,
    seed: u64,
    max_moves: u32,
) -> Result<Outcome> {
    let catalog = config.items.build_catalog()?;
    let mut game = GridEngine::with_rng(
        config.engine.clone(),
        catalog,
        SmallRng::seed_from_u64(seed),
    )?;

    while !game.is_game_over() && game.moves() < max_moves {
        let Some((a, b)) = strategy(game.board(), game.catalog()) else {
            // Only capped pairs remain: the board still counts as mergeable.
            debug!(seed, "no legal pair left");
            break;
        };
        game.toggle_select(a.0, a.1);
        if !game.toggle_select(b.0, b.1) {
            warn!(
                seed,
                ?a,
                ?b,
                "strategy offered a pair that did not merge:\n{}",
                game.board().to_plain_string()
            );
            break;
        }
    }

    Ok(Outcome {
        score: game.score(),
        moves: game.moves(),
        game_over: game.is_game_over(),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log))
        .with_target(false)
        .compact()
        .init();

    let config = GameConfig::load_or_default(args.config.as_deref())?;

    let strategies: Vec<(&str, StrategyFn)> = vec![
        ("FIRST", choose_pair_first),
        ("LOWEST", choose_pair_lowest_level),
        ("HIGHEST", choose_pair_highest_level),
        ("ADJACENT", choose_pair_adjacent),
    ];

    let mut all_outcomes: HashMap<&str, Vec<Outcome>> = HashMap::new();

    info!(
        games = args.games,
        rows = config.engine.rows,
        cols = config.engine.cols,
        "starting strategy evaluation"
    );

    for game_idx in 0..args.games {
        let seed = args.start_seed + game_idx;
        for &(name, strategy) in &strategies {
            let outcome = play_session(&config, strategy, seed, args.max_moves)?;
            debug!(
                strategy = name,
                seed,
                score = outcome.score,
                moves = outcome.moves,
                game_over = outcome.game_over,
                "session finished"
            );
            all_outcomes.entry(name).or_default().push(outcome);
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("Sessions per strategy: {}", args.games);
    println!("\n--- Averages ---");

    let mut rows: Vec<(&str, f64, f64, usize)> = all_outcomes
        .iter()
        .filter(|(_, outcomes)| !outcomes.is_empty())
        .map(|(&name, outcomes)| {
            let n = outcomes.len() as f64;
            let avg_score = outcomes.iter().map(|o| o.score as f64).sum::<f64>() / n;
            let avg_moves = outcomes.iter().map(|o| o.moves as f64).sum::<f64>() / n;
            let finished = outcomes.iter().filter(|o| o.game_over).count();
            (name, avg_score, avg_moves, finished)
        })
        .collect();

    // Sort by average score descending
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (name, avg_score, avg_moves, finished) in rows {
        println!(
            "Strategy {:<10}: Average Score = {:.2}, Average Merges = {:.2}, Game Overs = {}",
            name, avg_score, avg_moves, finished
        );
    }

    Ok(())
}
