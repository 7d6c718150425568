use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tristack::engine::Game;
use tristack::heuristics::{autoplay, choose_cautious, choose_greedy, Strategy};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Number of levels to play per strategy
    #[clap(short, long, default_value_t = 100)]
    games: u32,

    /// Difficulty level to generate (1 = tutorial, 2 = advanced)
    #[clap(short, long, default_value_t = 2)]
    level: u32,

    /// Seed for the first level; game i uses start_seed + i
    #[clap(short, long, default_value_t = 0)]
    start_seed: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let strategies: Vec<(&str, Strategy)> =
        vec![("greedy", choose_greedy), ("cautious", choose_cautious)];

    println!(
        "Playing {} level-{} boards per strategy (seeds {}..{})...\n",
        args.games,
        args.level,
        args.start_seed,
        args.start_seed + args.games as u64
    );

    for (name, strategy) in &strategies {
        let mut wins = 0u32;
        let mut cleared_sum = 0u64;

        for i in 0..args.games {
            // Same seed sequence for every strategy, so they see the same
            // boards.
            let mut rng = SmallRng::seed_from_u64(args.start_seed + i as u64);
            let game = Game::new(args.level, &mut rng);
            let playout = autoplay(game, *strategy);

            if playout.won {
                wins += 1;
            }
            cleared_sum += playout.cleared_percent as u64;
        }

        let win_rate = wins as f64 * 100.0 / args.games.max(1) as f64;
        let mean_cleared = cleared_sum as f64 / args.games.max(1) as f64;
        println!(
            "{name:>8}: won {wins}/{} ({win_rate:.1}%), mean board cleared {mean_cleared:.1}%",
            args.games
        );
    }
}
