//! End-to-end games through the session, including stats recording.

use bricks::ai::choose_move;
use bricks::auth::{AuthManager, Registration};
use bricks::game::{Actor, GameConfig, GameSession, GameState, MoveError, MoveResult, Phase};
use bricks::stats::{StatsRecorder, UserStats};
use bricks::storage::UserStore;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn config() -> GameConfig {
    GameConfig::new(12, 20, 1, 3).unwrap()
}

#[test]
fn scenario_a_human_takes_last_two() {
    let mut state = GameState::with_pile(config(), 2).unwrap();
    let result = state.apply_move(Actor::Human, 2).unwrap();
    assert_eq!(result, MoveResult::GameOver { winner: Actor::Human });
    assert_eq!(state.pile(), 0);
    assert!(!state.is_active());
    assert_eq!(state.winner(), Some(Actor::Human));
}

#[test]
fn scenario_b_computer_replies_from_four() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut state = GameState::with_pile(config(), 5).unwrap();
    state.apply_move(Actor::Human, 1).unwrap();
    assert_eq!(state.pile(), 4);
    assert_eq!(state.turn(), Actor::Computer);

    let amount = choose_move(4, 1, 3, &mut rng).unwrap();
    assert!([1, 2, 3].contains(&amount));
    let result = state.apply_move(Actor::Computer, amount).unwrap();
    assert_eq!(result, MoveResult::Continue { next: Actor::Human });
    assert_eq!(state.pile(), 4 - amount);
}

#[test]
fn scenario_c_cannot_take_more_than_pile() {
    // bounds wide enough that 4 is a legal amount in principle
    let wide = GameConfig::new(12, 20, 1, 5).unwrap();
    let mut state = GameState::with_pile(wide, 3).unwrap();
    assert_eq!(
        state.apply_move(Actor::Human, 4),
        Err(MoveError::InsufficientPile {
            amount: 4,
            remaining: 3
        })
    );
    assert_eq!(state.pile(), 3);
    assert_eq!(state.turn(), Actor::Human);

    // with the classic bounds the amount check comes first
    let mut state = GameState::with_pile(config(), 3).unwrap();
    assert!(matches!(
        state.apply_move(Actor::Human, 4),
        Err(MoveError::IllegalAmount { .. })
    ));
    assert_eq!(state.pile(), 3);
}

#[test]
fn scenario_d_out_of_turn() {
    let mut state = GameState::with_pile(config(), 10).unwrap();
    let before = state.clone();
    assert_eq!(
        state.apply_move(Actor::Computer, 1),
        Err(MoveError::OutOfTurn {
            expected: Actor::Human,
            actual: Actor::Computer
        })
    );
    assert_eq!(state, before);
}

#[test]
fn every_finished_game_is_recorded_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    let store = UserStore::open(&path).unwrap();
    let player = AuthManager::new(&store)
        .register(Registration {
            login: "alice".to_string(),
            password: "secret".to_string(),
            email: "alice@mail.com".to_string(),
            gender: "female".to_string(),
            age_category: "18-25".to_string(),
        })
        .unwrap();

    let mut session = GameSession::with_rng(config(), (), StdRng::seed_from_u64(9)).unwrap();
    for game in 0..20 {
        session.start(&player).unwrap();
        // the human always takes the smallest amount
        while let Phase::HumanTurn | Phase::ComputerTurn = session.phase() {
            if session.phase() == Phase::HumanTurn {
                session.human_move(1).unwrap();
            } else {
                session.computer_move().unwrap();
            }
        }
        assert_eq!(session.record_outcomes(&store).unwrap(), 1);

        let stats = store.stats("alice").unwrap();
        assert_eq!(stats.games_played, game + 1);
        assert!(stats.is_consistent());
    }

    let reopened = UserStore::open(&path).unwrap();
    let stats: UserStats = reopened.stats("alice").unwrap();
    assert_eq!(stats.games_played, 20);
    assert_eq!(stats.wins + stats.losses, 20);

    let board = reopened.leaderboard();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].games, 20);
}

#[test]
fn stored_file_keeps_original_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");
    std::fs::write(
        &path,
        r#"{
  "bob": {
    "password": "1234",
    "email": "bob@mail.com",
    "gender": "Не указан",
    "age_category": "18-25",
    "stats": {"games": 3, "wins": 2, "losses": 1},
    "created_at": "2024-05-01 12:00:00"
  }
}"#,
    )
    .unwrap();

    let store = UserStore::open(&path).unwrap();
    assert_eq!(
        store.stats("bob"),
        Some(UserStats {
            games_played: 3,
            wins: 2,
            losses: 1
        })
    );
    assert!(AuthManager::new(&store).login("bob", "1234").is_ok());

    store.record_outcome("bob", bricks::game::GameOutcome::Loss).unwrap();
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["bob"]["stats"], serde_json::json!({"games": 4, "wins": 2, "losses": 2}));
    assert_eq!(raw["bob"]["created_at"], "2024-05-01 12:00:00");
}
