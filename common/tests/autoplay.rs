use autosweep::*;

/// Plays one game to the end, checking every move the player makes.
fn play(game: GameConfig, player_config: PlayerConfig) -> (Board, PlayerStats) {
    let mut board = Board::new(game).unwrap();
    let mut player =
        Player::with_config(game.rows, game.cols, game.mines, player_config).unwrap();

    let mut moves = 0;
    while !board.is_ended() {
        player.observe(board.projection()).unwrap();
        let guesses = player.stats().guesses;
        let next = player
            .next_move()
            .unwrap()
            .expect("an unfinished board always has an unknown safe cell");
        assert_eq!(board.cell(next), Some(Cell::Hidden), "{next} is not playable");
        let guessed = player.stats().guesses > guesses;

        if board.apply_move(next).unwrap() == MoveOutcome::Loss {
            assert!(guessed, "deduced {next} but it is a mine");
            assert!(board.is_mine(next));
        }

        moves += 1;
        assert!(moves <= game.rows * game.cols);
    }
    (board, player.stats().clone())
}

fn seeded(seed: u64) -> PlayerConfig {
    PlayerConfig {
        seed: Some(seed),
        ..Default::default()
    }
}

#[test]
fn test_beginner_games_finish() {
    for seed in 0..10 {
        let (board, stats) = play(GameConfig::beginner().with_seed(seed), seeded(seed));
        assert!(board.is_ended());
        assert!(stats.moves > 0);
        if board.state() == GameState::Won {
            assert_eq!(board.remaining_safe(), 0);
        }
    }
}

#[test]
fn test_deductions_never_hit_mines() {
    for seed in 0..10 {
        let game = GameConfig::new(12, 12, 20).with_seed(seed);
        let mut board = Board::new(game).unwrap();
        let mut player = Player::with_config(12, 12, 20, seeded(seed)).unwrap();

        // Guess once to open the board, then only play deduced cells.
        player.observe(board.projection()).unwrap();
        let opening = player.next_move().unwrap().unwrap();
        if board.apply_move(opening).unwrap() == MoveOutcome::Loss {
            continue;
        }
        while !board.is_ended() {
            player.observe(board.projection()).unwrap();
            let Some(next) = player.next_deduced_move().unwrap() else {
                break;
            };
            assert!(!board.is_mine(next), "deduced {next} but it is a mine");
            board.apply_move(next).unwrap();
        }
        for mine in player.belief().deduced_mines() {
            assert!(board.is_mine(mine), "{mine} is not a mine");
        }
    }
}

#[test]
fn test_every_configuration_plays_through() {
    let tiers = [Tier::Single, Tier::Pairs, Tier::Triples, Tier::Global];
    for (i, max_tier) in tiers.into_iter().enumerate() {
        for backend in [BackendKind::Sat, BackendKind::Enumeration] {
            for guess in [GuessStrategy::Uniform, GuessStrategy::Weighted] {
                let seed = 100 + i as u64;
                let config = PlayerConfig {
                    max_tier,
                    guess,
                    backend,
                    // The mine total is rejected for enumeration.
                    mine_total: max_tier == Tier::Global && backend == BackendKind::Sat,
                    seed: Some(seed),
                };
                let (board, _) = play(GameConfig::new(8, 8, 10).with_seed(seed), config);
                assert!(board.is_ended());
            }
        }
    }
}

#[test]
fn test_enumeration_with_mine_total_is_rejected() {
    let config = PlayerConfig {
        backend: BackendKind::Enumeration,
        mine_total: true,
        ..seeded(1)
    };
    assert!(config.validate().is_err());
    assert!(Player::with_config(9, 9, 10, config).is_err());
}

#[test]
fn test_full_pipeline_proves_at_least_single_tier() {
    // From the same opening, everything the single tier can prove the full
    // pipeline proves too.
    let game = GameConfig::new(10, 10, 12).with_seed(7);
    let mut weak_board = Board::new(game).unwrap();
    let start = weak_board
        .dims()
        .points()
        .find(|&p| weak_board.tile(p) == Some(Tile::Count(0)))
        .unwrap();
    weak_board.apply_move(start).unwrap();
    let mut strong_board = weak_board.clone();

    let deduce = |board: &mut Board, max_tier: Tier| {
        let mut player = Player::with_config(
            10,
            10,
            12,
            PlayerConfig {
                max_tier,
                ..seeded(7)
            },
        )
        .unwrap();
        loop {
            player.observe(board.projection()).unwrap();
            if board.is_ended() {
                break;
            }
            let Some(next) = player.next_deduced_move().unwrap() else {
                break;
            };
            board.apply_move(next).unwrap();
        }
    };

    deduce(&mut weak_board, Tier::Single);
    deduce(&mut strong_board, Tier::Global);
    assert!(strong_board.remaining_safe() <= weak_board.remaining_safe());
}
