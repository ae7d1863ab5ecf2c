use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::{Color, Square};

use super::*;
use crate::engine::testing::ScriptedEngine;
use crate::engine::Score;
use crate::rules::{move_from_uci, uci_of, Game};

const ITALIAN_MIDGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 10";

fn session(engine: &ScriptedEngine) -> EngineSession {
    EngineSession::with_rng(Box::new(engine.clone()), 200, StdRng::seed_from_u64(3))
}

fn play(game: &mut Game, moves: &[&str]) {
    for text in moves {
        let m = move_from_uci(game.position(), text).unwrap();
        game.apply(m).unwrap();
    }
}

fn analysed_turns(engine: &ScriptedEngine) -> Vec<Color> {
    engine
        .script
        .borrow()
        .analyzed
        .iter()
        .map(|(_, turn)| *turn)
        .collect()
}

#[test]
fn test_noise_clamp_drops_large_swings() {
    assert_eq!(filter_delta(900, 30), 0);
    assert_eq!(filter_delta(-801, 30), 0);
    assert_eq!(filter_delta(800, 30), 800);
    assert_eq!(filter_delta(-800, 30), -800);
}

#[test]
fn test_opening_damping() {
    assert_eq!(filter_delta(30, 1), 0);
    assert_eq!(filter_delta(-39, 14), 0);
    assert_eq!(filter_delta(50, 1), 50);
    assert_eq!(filter_delta(30, 15), 30);
}

#[test]
fn test_smoothing_is_exponential_average() {
    let mut evaluator = MoveEvaluator::new();
    assert_eq!(evaluator.smooth(100), 70);
    assert_eq!(evaluator.smooth(200), 161);
    assert_eq!(evaluator.smooth(0), 48);
}

#[test]
fn test_smoothing_rounds_halves_to_even() {
    // 0.7 * 15 = 10.5
    assert_eq!(MoveEvaluator::new().smooth(15), 10);
    // 0.7 * 25 = 17.5
    assert_eq!(MoveEvaluator::new().smooth(25), 18);
    assert_eq!(MoveEvaluator::new().smooth(-15), -10);
}

#[test]
fn test_both_analyses_share_side_to_move() {
    let engine = ScriptedEngine::default();
    // before: Black to move after White passes; after: Black to move after 1.e4
    engine.push_score(30);
    engine.push_score(-40);
    let mut session = session(&engine);
    let mut evaluator = MoveEvaluator::new();

    let game = Game::new();
    let e4 = move_from_uci(game.position(), "e2e4").unwrap();
    let score = evaluator.score(&mut session, &game, e4, Color::White);

    assert_eq!(analysed_turns(&engine), vec![Color::Black, Color::Black]);
    // White's view: -30 before, +40 after, a 70 swing smoothed to 49
    assert_eq!(score, Some(49));
    assert_eq!(
        engine.script.borrow().analyze_budgets,
        vec![Duration::from_millis(200), Duration::from_millis(200)]
    );
}

#[test]
fn test_in_check_position_is_not_passed() {
    let engine = ScriptedEngine::default();
    engine.push_score(0);
    engine.push_score(0);
    let mut session = session(&engine);
    let mut evaluator = MoveEvaluator::new();

    let mut game = Game::new();
    play(&mut game, &["e2e4", "f7f6", "d1h5"]);
    assert!(game.is_check());
    let block = move_from_uci(game.position(), "g7g6").unwrap();
    evaluator.score(&mut session, &game, block, Color::Black);

    assert_eq!(analysed_turns(&engine), vec![Color::Black, Color::White]);
}

#[test]
fn test_midgame_scores_are_smoothed_across_moves() {
    let engine = ScriptedEngine::default();
    engine.push_score(10);
    engine.push_score(-90);
    engine.push_score(0);
    engine.push_score(-200);
    let mut session = session(&engine);
    let mut evaluator = MoveEvaluator::new();

    let game = Game::from_fen(ITALIAN_MIDGAME).unwrap();
    assert!(game.ply() > OPENING_PLIES);
    let castle = game.find_move(Square::E1, Square::G1).unwrap();

    assert_eq!(
        evaluator.score(&mut session, &game, castle, Color::White),
        Some(70)
    );
    assert_eq!(
        evaluator.score(&mut session, &game, castle, Color::White),
        Some(161)
    );
}

#[test]
fn test_failed_analysis_yields_none_and_keeps_history() {
    let engine = ScriptedEngine::default();
    engine.push_failure();
    let mut session = session(&engine);
    let mut evaluator = MoveEvaluator::new();
    evaluator.smooth(100);

    let game = Game::new();
    let e4 = move_from_uci(game.position(), "e2e4").unwrap();
    assert_eq!(evaluator.score(&mut session, &game, e4, Color::White), None);
    assert_eq!(evaluator.previous_smoothed_delta(), 70.0);
}

#[test]
fn test_missing_score_yields_none() {
    let engine = ScriptedEngine::default();
    engine.push_analysis(vec![(Some("e7e5"), None)]);
    let mut session = session(&engine);
    let mut evaluator = MoveEvaluator::new();

    let game = Game::new();
    let e4 = move_from_uci(game.position(), "e2e4").unwrap();
    assert_eq!(evaluator.score(&mut session, &game, e4, Color::White), None);
    assert_eq!(engine.script.borrow().analyzed.len(), 1);
    assert_eq!(evaluator.previous_smoothed_delta(), 0.0);
}

#[test]
fn test_illegal_move_is_not_scored() {
    let engine = ScriptedEngine::default();
    let mut session = session(&engine);
    let mut evaluator = MoveEvaluator::new();

    let mut game = Game::new();
    let e4 = move_from_uci(game.position(), "e2e4").unwrap();
    game.apply(e4).unwrap();

    assert_eq!(evaluator.score(&mut session, &game, e4, Color::White), None);
    assert!(engine.script.borrow().analyzed.is_empty());
}

#[test]
fn test_preview_skips_incomplete_lines() {
    let engine = ScriptedEngine::default();
    engine.push_analysis(vec![
        (Some("e2e4"), Some(Score::Centipawns(30))),
        (Some("d2d4"), None),
        (Some("g1f3"), Some(Score::Mate(2))),
    ]);
    let mut session = session(&engine);
    let evaluator = MoveEvaluator::new();

    let game = Game::new();
    let previews = evaluator.preview(&mut session, &game, 1500, 3);
    let rendered: Vec<(String, i32)> = previews
        .into_iter()
        .map(|(m, cp)| (uci_of(m), cp))
        .collect();

    assert_eq!(
        rendered,
        vec![
            ("e2e4".to_string(), 30),
            ("g1f3".to_string(), MATE_VALUE - 2)
        ]
    );
    assert_eq!(
        engine.script.borrow().analyze_budgets,
        vec![Duration::from_millis(250)]
    );
}

#[test]
fn test_preview_failure_is_empty() {
    let engine = ScriptedEngine::default();
    engine.push_failure();
    let mut session = session(&engine);

    let previews = MoveEvaluator::new().preview(&mut session, &Game::new(), 1500, 3);
    assert!(previews.is_empty());
}
