use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use autosweep::*;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// The solver plays on its own.
    Auto,
    /// Coordinates are read from stdin.
    Manual,
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,

    #[clap(long, default_value_t = 9)]
    rows: usize,

    #[clap(long, default_value_t = 9)]
    cols: usize,

    #[clap(long, default_value_t = 10)]
    mines: usize,

    /// Seed for mine placement and guessing. Random when omitted.
    #[clap(long)]
    seed: Option<u64>,

    /// Most expensive inference tier to try before guessing
    #[clap(long, value_enum, default_value_t = Tier::Global)]
    max_tier: Tier,

    #[clap(long, value_enum, default_value_t = GuessStrategy::Uniform)]
    guess: GuessStrategy,

    #[clap(long, value_enum, default_value_t = BackendKind::Sat)]
    backend: BackendKind,

    /// Let the global tier use the total number of mines
    #[clap(long)]
    mine_total: bool,

    /// Number of independent games to play in auto mode
    #[clap(long, default_value_t = 1)]
    games: u32,

    /// Pause between moves, to make a single game watchable
    #[clap(long, default_value_t = 0)]
    delay_ms: u64,
}

impl Args {
    fn game_config(&self, game: u32) -> GameConfig {
        let config = GameConfig::new(self.rows, self.cols, self.mines);
        match self.seed {
            Some(seed) => config.with_seed(seed.wrapping_add(u64::from(game))),
            None => config,
        }
    }

    fn player_config(&self, game: u32) -> PlayerConfig {
        PlayerConfig {
            max_tier: self.max_tier,
            guess: self.guess,
            backend: self.backend,
            mine_total: self.mine_total,
            seed: self.seed.map(|seed| seed.wrapping_add(u64::from(game))),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    args.player_config(0).validate()?;

    match args.mode {
        Mode::Auto => {
            let mut wins = 0;
            for game in 0..args.games {
                let verbose = args.games == 1;
                if play_auto(&args, game, verbose)? == GameState::Won {
                    wins += 1;
                }
            }
            if args.games > 1 {
                println!("Won {wins} of {} games.", args.games);
            }
            log::info!("won {wins}/{} games", args.games);
        }
        Mode::Manual => play_manual(&args)?,
    }
    Ok(())
}

fn play_auto(args: &Args, game: u32, verbose: bool) -> anyhow::Result<GameState> {
    let mut board = Board::new(args.game_config(game))?;
    let mut player = Player::with_config(
        args.rows,
        args.cols,
        args.mines,
        args.player_config(game),
    )?;

    if verbose {
        println!("--- Autonomous Minesweeper ---");
        print_board(board.projection());
    }

    while !board.is_ended() {
        player.observe(board.projection())?;
        let Some(point) = player.next_move()? else {
            log::warn!("player ran out of moves on an unfinished board");
            break;
        };

        board.apply_move(point)?;
        if verbose {
            println!("\n--- Move #{} ---", player.stats().moves);
            println!("Reveal {point}");
            print_board(board.projection());
        }
        if args.delay_ms > 0 {
            thread::sleep(Duration::from_millis(args.delay_ms));
        }
    }

    let stats = player.stats();
    log::info!(
        "game {game}: {:?} after {} moves, {} guesses",
        board.state(),
        stats.moves,
        stats.guesses
    );
    if verbose {
        report(board.state());
        println!(
            "Moves: {}, guesses: {}, safe cells per tier: {:?}, mines per tier: {:?}",
            stats.moves, stats.guesses, stats.safe_by_tier, stats.mines_by_tier
        );
    }
    Ok(board.state())
}

fn play_manual(args: &Args) -> anyhow::Result<()> {
    let mut board = Board::new(args.game_config(0))?;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    print_board(board.projection());
    while !board.is_ended() {
        print!("x y> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let Some(point) = parse_point(&line) else {
            println!("Expected two coordinates, e.g. `3 4`.");
            continue;
        };
        match board.apply_move(point) {
            Ok(_) => print_board(board.projection()),
            Err(err) if err.is_recoverable() => println!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }

    report(board.state());
    Ok(())
}

fn parse_point(line: &str) -> Option<Point> {
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some(Point { x, y })
}

fn report(state: GameState) {
    println!("\n--- Game Over ---");
    match state {
        GameState::Won => println!("Result: won!"),
        GameState::Lost => println!("Result: hit a mine and lost."),
        GameState::Playing => println!("Result: the game ended unexpectedly."),
    }
}

fn print_board(projection: &Projection) {
    // Print header
    print!("   ");
    for x in 0..projection.cols() {
        print!("{:^3}", x);
    }
    println!("\n  +{}", "---".repeat(projection.cols()));

    for y in 0..projection.rows() {
        print!("{:^2}|", y);
        for x in 0..projection.cols() {
            let display = match projection[Point { x, y }] {
                Cell::Hidden => " ■ ".to_string(),
                Cell::Mine => " * ".to_string(),
                Cell::Revealed(n) => format!(" {} ", n),
            };
            print!("{}", display);
        }
        println!();
    }
    println!();
}
