//! Whole games between a host and its guests over in-memory links.

mod common;

use common::{projection, Table};
use ludo_sync::engine::{Color, GameSession, TokenLocation, TurnPhase, TOKENS_PER_COLOR};
use ludo_sync::sync::{GuestMirror, SyncMessage};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const MAX_STEPS: usize = 40_000;

/// What a finished game looked like.
struct Played {
    ranking: Vec<Color>,
    finish_order: Vec<Color>,
    colors: Vec<Color>,
}

fn progress_of(session: &GameSession) -> Vec<(Color, u8)> {
    session
        .colors()
        .flat_map(|c| {
            session
                .tokens(c)
                .into_iter()
                .flatten()
                .map(move |t| (c, t.progress()))
        })
        .collect()
}

/// A roll of 6 or a finishing move keeps the turn, unless that move
/// brought the color's last token home.
fn check_bonus(sent: &[SyncMessage]) {
    for pair in sent.windows(2) {
        if let [SyncMessage::TokenMove {
            roll,
            finished,
            player_index,
            tokens,
            ..
        }, SyncMessage::NextTurn { next_player_index }] = pair
        {
            let done = tokens[*player_index].iter().all(TokenLocation::is_finished);
            if (*roll == 6 || *finished) && !done {
                assert_eq!(next_player_index, player_index);
            }
        }
    }
}

fn play(players: usize, seed: u64, picks: &[usize]) -> Played {
    let mut table = Table::new(players, seed);
    table.start();
    table.assert_converged();

    let colors: Vec<Color> = table.session().colors().collect();
    let mut finish_order = Vec::new();
    let mut steps = 0;

    while !table.session().is_over() {
        assert!(steps < MAX_STEPS, "game did not end");
        let before = table.session().clone();

        let sent = match before.phase {
            TurnPhase::AwaitingRoll => table.roll_current(),
            TurnPhase::AwaitingSelection => table.select_current(picks[steps % picks.len()]),
            TurnPhase::GameOver => unreachable!(),
        };
        check_bonus(&sent);
        table.assert_converged();

        // Tokens only move forward, or back home on capture
        let after = table.session();
        for ((color, old), (_, new)) in progress_of(&before).into_iter().zip(progress_of(after)) {
            assert!(new >= old || new == 0, "{color} token went from {old} back to {new}");
        }

        for color in &colors {
            if after.all_finished(*color) && !finish_order.contains(color) {
                finish_order.push(*color);
            }
        }
        steps += 1;
    }

    Played {
        ranking: table.session().ranking.clone(),
        finish_order,
        colors,
    }
}

fn check_ranking(played: &Played) {
    assert_eq!(played.ranking.len(), played.colors.len());
    for color in &played.colors {
        assert_eq!(played.ranking.iter().filter(|c| *c == color).count(), 1);
    }
    // Everyone but the last place finished, in finishing order
    let n = played.colors.len();
    assert_eq!(&played.finish_order[..n - 1], &played.ranking[..n - 1]);
}

#[test]
fn test_two_player_game_completes() {
    let played = play(2, 7, &[0]);
    check_ranking(&played);
    assert_eq!(played.colors, vec![Color::Blue, Color::Green]);
}

#[test]
fn test_four_player_game_completes() {
    let played = play(4, 2024, &[0, 1, 2, 3]);
    check_ranking(&played);
}

#[test]
fn test_same_seed_same_game() {
    let a = play(3, 99, &[1, 0]);
    let b = play(3, 99, &[1, 0]);
    assert_eq!(a.ranking, b.ranking);
}

#[test]
fn test_next_turn_reaches_every_mirror() {
    let mut table = Table::new(3, 5);
    table.start();

    // Drive until the third seat holds the turn
    let mut steps = 0;
    while table.session().current_turn_index != 2 {
        assert!(steps < MAX_STEPS);
        match table.session().phase {
            TurnPhase::AwaitingRoll => table.roll_current(),
            _ => table.select_current(0),
        };
        steps += 1;
    }

    table.assert_converged();
    for guest in &table.guests {
        assert_eq!(guest.session().unwrap().current_turn_index, 2);
    }
}

#[test]
fn test_token_move_applied_twice() {
    let session = GameSession::new(["Ana", "Ben"]).unwrap();
    let mut tokens = session.token_arrays().to_vec();
    tokens[0][0] = TokenLocation::OnMainPath { step: 0 };
    let snapshot = SyncMessage::TokenMove {
        token: 0,
        roll: 6,
        tokens,
        player_index: 0,
        finished: false,
        captured: false,
    };

    let mut mirror = GuestMirror::new();
    mirror.apply(&SyncMessage::game_start(&session)).unwrap();
    mirror.apply(&snapshot).unwrap();
    let once = mirror.session().cloned();
    mirror.apply(&snapshot).unwrap();

    assert_eq!(mirror.session().cloned(), once);
    assert_eq!(
        mirror.session().unwrap().token(Color::Blue, 0),
        Some(TokenLocation::OnMainPath { step: 0 })
    );
}

#[test]
fn test_host_roll_and_guest_selection_agree() {
    let mut table = Table::new(2, 31);
    table.start();

    for _ in 0..200 {
        if table.session().is_over() {
            break;
        }
        if table.session().phase == TurnPhase::AwaitingSelection {
            let session = table.session();
            assert!(session.movable.len() > 1);
            assert!(session.movable.iter().all(|t| (*t as usize) < TOKENS_PER_COLOR));
            let before = projection(session);
            assert_eq!(projection(table.guests[0].session().unwrap()), before);
            table.select_current(1);
        } else {
            table.roll_current();
        }
        table.assert_converged();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_games_end_with_complete_ranking(
        players in 2usize..=4,
        seed in any::<u64>(),
        picks in prop::collection::vec(0usize..4, 1..8),
    ) {
        let played = play(players, seed, &picks);
        check_ranking(&played);
    }
}
