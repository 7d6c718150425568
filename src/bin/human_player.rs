use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};
use tristack::engine::{Game, Phase, Tile, DOCK_CAPACITY};

/// Pause between a completed triad and its removal from the dock.
const MATCH_DELAY: Duration = Duration::from_millis(200);
/// Pause between the dock filling up and the loss being declared, so a
/// simultaneous match can still save the session.
const LOSS_DELAY: Duration = Duration::from_millis(300);

fn print_dock(game: &Game) {
    let kinds: Vec<String> = game.dock().iter().map(|t| t.kind.to_string()).collect();
    println!(
        "Dock ({}/{}): {}",
        game.dock().len(),
        DOCK_CAPACITY,
        if kinds.is_empty() {
            "-".to_string()
        } else {
            kinds.join(" ")
        }
    );
}

/// Prints the board top layer first and returns the clickable tiles in the
/// order they were numbered.
fn print_board(game: &Game) -> Vec<String> {
    let mut tiles: Vec<&Tile> = game.board().iter().collect();
    tiles.sort_by_key(|t| {
        (
            std::cmp::Reverse(t.z),
            (t.y * 2.0) as i32,
            (t.x * 2.0) as i32,
        )
    });

    let mut clickable_ids = Vec::new();
    let buried = tiles.iter().filter(|t| !t.clickable).count();

    println!("Board ({} tiles, {} buried):", tiles.len(), buried);
    for tile in tiles {
        if tile.clickable {
            println!("  [{:>2}] {}", clickable_ids.len(), tile);
            clickable_ids.push(tile.id.clone());
        }
    }
    clickable_ids
}

/// Applies any pending match or loss, with the short feedback delays the
/// game uses between detection and effect.
fn settle(game: &mut Game) {
    while game.pending_match().is_some() {
        thread::sleep(MATCH_DELAY);
        if let Some(kind) = game.clear_match() {
            println!("✨ Matched three {kind}!");
        }
    }
    if game.loss_pending() {
        thread::sleep(LOSS_DELAY);
        game.declare_loss();
    }
}

fn rank(game: &Game) -> &'static str {
    if game.phase() == Phase::Won {
        return "Legend";
    }
    match game.cleared_percent() {
        81.. => "Whale",
        51..=80 => "Trader",
        21..=50 => "Newbie",
        _ => "Leek",
    }
}

/// Plays one session. Returns `true` if the player won.
fn play_level(level: u32) -> bool {
    let mut rng = SmallRng::from_entropy();
    let mut game = Game::new(level, &mut rng);
    let started = Instant::now();
    println!("\n=== Level {level}: {} tiles ===", game.initial_tile_count());

    loop {
        println!("---------------------");
        print_dock(&game);
        let clickable = print_board(&game);

        match game.phase() {
            Phase::Won => {
                println!("\n🏆 YOU WIN!");
            }
            Phase::Lost => {
                println!("\n💀 GAME OVER — the dock is full.");
            }
            Phase::Playing => {
                let charges = game.charges();
                print!(
                    "Pick a tile number, or 'u'ndo ({}), 's'huffle ({}), 'r'emove three ({}), 'q'uit: ",
                    charges.undo, charges.shuffle, charges.remove
                );
                io::stdout().flush().expect("stdout flush");

                let mut input = String::new();
                if io::stdin().read_line(&mut input).is_err() {
                    println!("Error reading input. Please try again.");
                    continue;
                }

                let result = match input.trim() {
                    "q" => break,
                    "u" => game.undo(),
                    "s" => game.shuffle(&mut rng),
                    "r" => game.remove_three(),
                    token => match token.parse::<usize>() {
                        Ok(n) if n < clickable.len() => game.click(&clickable[n]),
                        _ => {
                            println!("Enter a listed tile number, 'u', 's', 'r', or 'q'.");
                            continue;
                        }
                    },
                };

                match result {
                    Ok(()) => settle(&mut game),
                    Err(err) => println!("Rejected: {err}"),
                }
                continue;
            }
        }

        // Epilogue for a finished session.
        println!("Rank: {}", rank(&game));
        println!("Progress: {}%", game.cleared_percent());
        println!("Time: {}s", started.elapsed().as_secs());
        println!("---------------------");
        return game.phase() == Phase::Won;
    }

    println!("Thanks for playing!");
    false
}

fn main() {
    env_logger::init();
    println!("Welcome to tristack! Collect three of a kind before the dock fills up.");

    if play_level(1) {
        print!("Tutorial cleared! Continue to level 2? (y/n): ");
        io::stdout().flush().expect("stdout flush");
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_ok() && input.trim() == "y" {
            play_level(2);
        }
    }
}
