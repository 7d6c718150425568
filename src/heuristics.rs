//! Autoplay strategies for difficulty calibration.
//!
//! These bots exist to measure levels, not to play well on purpose: the
//! advanced tier is tuned so that even the greedy strategy clears it only
//! rarely. Each strategy inspects a session and nominates the next tile to
//! commit; [`autoplay`] drives a session with a strategy until it ends.
use crate::engine::{Game, Phase, TileKind, DOCK_CAPACITY};
use itertools::Itertools;
use std::collections::HashMap;

/// A strategy nominates the id of the next tile to commit, or `None` to
/// stop playing.
pub type Strategy = fn(&Game) -> Option<String>;

fn dock_counts(game: &Game) -> HashMap<TileKind, usize> {
    game.dock().iter().map(|t| t.kind).counts()
}

/// Maximize dock progress: prefer the clickable tile whose kind is closest
/// to completing a triad in the dock; break ties toward the kind with the
/// most clickable copies on the board.
pub fn choose_greedy(game: &Game) -> Option<String> {
    let docked = dock_counts(game);
    let reachable = game
        .board()
        .iter()
        .filter(|t| t.clickable)
        .map(|t| t.kind)
        .counts();

    game.board()
        .iter()
        .filter(|t| t.clickable)
        .max_by_key(|t| {
            (
                docked.get(&t.kind).copied().unwrap_or(0),
                reachable[&t.kind],
            )
        })
        .map(|t| t.id.clone())
}

/// Like [`choose_greedy`], but never spends the dock's last free slot on a
/// tile that does not complete a triad. Stops (returns `None`) rather than
/// risk filling the dock.
pub fn choose_cautious(game: &Game) -> Option<String> {
    let docked = dock_counts(game);

    let completer = game
        .board()
        .iter()
        .filter(|t| t.clickable)
        .find(|t| docked.get(&t.kind).copied().unwrap_or(0) >= 2);
    if let Some(tile) = completer {
        return Some(tile.id.clone());
    }

    let free_slots = DOCK_CAPACITY.saturating_sub(game.dock().len());
    if free_slots <= 1 {
        return None;
    }
    choose_greedy(game)
}

/// Outcome of one automated play-through.
#[derive(Clone, Debug)]
pub struct Playout {
    pub won: bool,
    pub commits: u32,
    pub cleared_percent: u32,
}

/// Plays a session to completion with the given strategy: settle any
/// completed triads, declare a loss if the dock is stuck full, otherwise
/// commit the strategy's nominee. Ends when the session is won or lost, or
/// when the strategy gives up.
pub fn autoplay(mut game: Game, strategy: Strategy) -> Playout {
    let mut commits = 0;
    loop {
        while game.clear_match().is_some() {}
        if game.phase() != Phase::Playing {
            break;
        }
        if game.declare_loss() {
            break;
        }
        let Some(id) = strategy(&game) else {
            break;
        };
        if game.click(&id).is_err() {
            break;
        }
        commits += 1;
    }

    Playout {
        won: game.phase() == Phase::Won,
        commits,
        cleared_percent: game.cleared_percent(),
    }
}
