use std::collections::BTreeMap;
use std::error::Error;

use chess_rules::board::Board;
use chess_rules::config::GameConfig;
use chess_rules::game::{Game, Status};
use rand::seq::SliceRandom;

const MAX_PLIES: usize = 500;
const DEFAULT_GAMES: usize = 20;

/// Plays one game of uniformly random legal moves and checks that
/// navigating back to the start and forward again reproduces it.
fn play_game(config: &GameConfig, rng: &mut impl rand::Rng) -> Result<Option<Status>, Box<dyn Error>> {
    let mut game = Game::with_config(Board::new(), config.clone());
    while !game.is_ended() && game.cursor() < MAX_PLIES {
        let mv = match game.legal_moves().choose(rng) {
            Some(mv) => mv.clone(),
            None => break,
        };
        game.make(mv)?;
    }

    let final_board = game.board().clone();
    let final_status = game.status();
    game.go_to_first();
    if !game.board().is_in_starting_position() {
        return Err("navigating to the first move did not restore the start".into());
    }
    game.go_to_last();
    if *game.board() != final_board || game.status() != final_status {
        return Err("navigating to the last move did not restore the end".into());
    }

    Ok(game.is_ended().then_some(final_status))
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let games = match args.next() {
        Some(n) => n.parse()?,
        None => DEFAULT_GAMES,
    };
    let config = match args.next() {
        Some(path) => GameConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => GameConfig::default(),
    };

    let mut rng = rand::thread_rng();
    let mut results: BTreeMap<String, u32> = BTreeMap::new();
    for i in 0..games {
        let outcome = play_game(&config, &mut rng)?;
        let label = match outcome {
            Some(status) => format!("{status:?}"),
            None => "unfinished".to_string(),
        };
        eprintln!("game {}: {label}", i + 1);
        *results.entry(label).or_insert(0) += 1;
    }

    eprintln!("--- {games} games ---");
    for (label, count) in &results {
        eprintln!("{label:>26}: {count}");
    }
    Ok(())
}
