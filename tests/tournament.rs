//! Integration tests for the tournament aggregate: stages, windows and pending game lookup.

use ladder_tournaments::{
    relevant_games, CompletedGame, PendingStage, Signup, SkippedGame, Tournament, TournamentConfig, TournamentStage,
};

const DAY: i64 = 24 * 60 * 60 * 1000;
const START: i64 = 100 * DAY;

fn config(names: &[&str], group_play: bool) -> TournamentConfig {
    let mut c = TournamentConfig::new("spring", "Spring Cup", START);
    c.group_play_enabled = group_play;
    c.signed_up = names
        .iter()
        .enumerate()
        .map(|(i, p)| Signup {
            player: p.to_string(),
            time: START - DAY + i as i64,
        })
        .collect();
    c
}

fn game(winner: &str, loser: &str, played_at: i64) -> CompletedGame {
    CompletedGame {
        winner: winner.to_string(),
        loser: loser.to_string(),
        played_at,
        score: None,
    }
}

const FIVE: [&str; 5] = ["A", "B", "C", "D", "E"];
const SIX: [&str; 6] = ["p0", "p1", "p2", "p3", "p4", "p5"];

#[test]
fn before_the_start_date_nothing_is_built() {
    let t = Tournament::build(config(&FIVE, false), &[], Vec::new(), START - DAY).unwrap();
    assert_eq!(t.stage, TournamentStage::NotStarted);
    assert!(t.group_play.is_none());
    assert!(t.bracket.is_none());
    assert!(!t.has_pending_games());
    assert!(t.pending_games().is_empty());
    assert!(t.in_signup_period());
}

#[test]
fn signup_period_is_the_two_weeks_before_the_start() {
    let at = |now| Tournament::build(config(&FIVE, false), &[], Vec::new(), now).unwrap();
    assert!(at(START - 14 * DAY).in_signup_period());
    assert!(!at(START - 15 * DAY).in_signup_period());
    assert!(!at(START).in_signup_period());
}

#[test]
fn without_group_play_the_bracket_starts_on_the_start_date() {
    let t = Tournament::build(config(&FIVE, false), &[], Vec::new(), START).unwrap();
    assert_eq!(t.stage, TournamentStage::BracketStage);
    assert!(t.group_play.is_none());
    assert!(t.has_pending_games());

    let found = t.find_pending_game("C", "B").unwrap();
    assert_eq!(found.stage, PendingStage::Bracket { layer_index: 1 });
    assert_eq!(found.tournament_id, "spring");
    assert!(t.find_pending_game("A", "B").is_none());
    assert_eq!(t.pending_games_for("E").len(), 1);
    assert!(t.pending_games_for("A").is_empty());
}

#[test]
fn admin_seed_order_overrides_signup_order() {
    let mut c = config(&FIVE, false);
    c.player_order = Some(["E", "D", "C", "B", "A"].iter().map(|s| s.to_string()).collect());
    let t = Tournament::build(c, &[], Vec::new(), START).unwrap();
    assert!(t.find_pending_game("D", "C").is_some());
    assert!(t.find_pending_game("B", "A").is_some());
}

#[test]
fn games_before_the_start_date_do_not_count() {
    let games = vec![game("D", "E", START - 1)];
    let t = Tournament::build(config(&FIVE, false), &games, Vec::new(), START + DAY).unwrap();
    assert!(t.find_pending_game("D", "E").is_some());
}

#[test]
fn finished_bracket_completes_the_tournament() {
    let games = vec![
        game("D", "E", START + 1),
        game("B", "C", START + 2),
        game("A", "D", START + 3),
        game("A", "B", START + 4),
    ];
    let t = Tournament::build(config(&FIVE, false), &games, Vec::new(), START + DAY).unwrap();
    assert_eq!(t.stage, TournamentStage::Completed);
    assert_eq!(t.winner().map(String::as_str), Some("A"));
    assert_eq!(t.ended(), Some(START + 4));
    assert_eq!(t.recent_winner().map(String::as_str), Some("A"));
    assert!(!t.has_pending_games());

    let later = Tournament::build(config(&FIVE, false), &games, Vec::new(), START + 4 + 15 * DAY).unwrap();
    assert_eq!(later.winner().map(String::as_str), Some("A"));
    assert_eq!(later.recent_winner(), None);
}

#[test]
fn relevant_games_merge_games_and_skips_in_time_order() {
    let skip = SkippedGame::new("C", "B", START + 2);
    let games = vec![game("D", "E", START + 3), game("A", "Z", START + 1)];
    let skips = vec![skip.clone()];
    let relevant = relevant_games(&games, &skips, START);
    let times: Vec<i64> = relevant.iter().map(|e| e.time).collect();
    assert_eq!(times, vec![START + 1, START + 2, START + 3]);
    assert_eq!(relevant[1].player1, "C");
    assert_eq!(relevant[1].player2, "B");
    assert_eq!(relevant[1].skip.as_ref(), Some(&skip));
    assert_eq!(relevant_games(&games, &skips, START + 2).len(), 2);

    // Built from an unsorted game list: the skip and D's win both advance.
    let t = Tournament::build(config(&FIVE, false), &games, skips, START + DAY).unwrap();
    assert!(t.find_pending_game("B", "C").is_none());
    assert!(t.find_pending_game("D", "E").is_none());
    assert!(t.find_pending_game("A", "D").is_some());
    assert_eq!(t.bracket.as_ref().unwrap().layers[0][0].player2.as_deref(), Some("C"));
}

fn six_player_group_games() -> Vec<CompletedGame> {
    vec![
        game("p0", "p3", START + 10),
        game("p0", "p5", START + 11),
        game("p3", "p5", START + 12),
        game("p1", "p2", START + 13),
        game("p4", "p1", START + 14),
    ]
}

#[test]
fn open_group_games_keep_the_tournament_in_group_stage() {
    let t = Tournament::build(config(&SIX, true), &six_player_group_games(), Vec::new(), START + DAY).unwrap();
    assert_eq!(t.stage, TournamentStage::GroupStage);
    assert!(t.bracket.is_none());
    assert!(t.has_pending_games());

    let found = t.find_pending_game("p4", "p2").unwrap();
    assert_eq!(found.stage, PendingStage::Group { group_index: 1 });
    assert!(t.find_pending_game("p0", "p1").is_none());
}

#[test]
fn group_winners_move_on_to_the_bracket() {
    let skips = vec![SkippedGame::new("p2", "p4", START + 15)];
    let t = Tournament::build(config(&SIX, true), &six_player_group_games(), skips.clone(), START + DAY).unwrap();
    assert_eq!(t.stage, TournamentStage::BracketStage);
    let group_play = t.group_play.as_ref().unwrap();
    assert_eq!(group_play.ended, Some(START + 15));

    let bracket = t.bracket.as_ref().unwrap();
    assert_eq!(bracket.start, START + 16);
    // The group game p1 vs p2 must not resolve their bracket game.
    let semi = t.find_pending_game("p1", "p2").unwrap();
    assert_eq!(semi.stage, PendingStage::Bracket { layer_index: 1 });
    assert!(t.find_pending_game("p0", "p3").is_some());
    assert!(t.pending_games_for("p4").is_empty());

    let mut games = six_player_group_games();
    games.extend([
        game("p0", "p3", START + 20),
        game("p2", "p1", START + 21),
        game("p2", "p0", START + 22),
    ]);
    let done = Tournament::build(config(&SIX, true), &games, skips, START + DAY).unwrap();
    assert_eq!(done.stage, TournamentStage::Completed);
    assert_eq!(done.winner().map(String::as_str), Some("p2"));
}

#[test]
fn rebuilding_the_same_snapshot_is_identical() {
    let skips = vec![SkippedGame::new("p2", "p4", START + 15)];
    let build = || Tournament::build(config(&SIX, true), &six_player_group_games(), skips.clone(), START + DAY);
    assert_eq!(build(), build());
}

#[test]
fn view_reports_groups_bracket_and_flags() {
    let skips = vec![SkippedGame::new("p2", "p4", START + 15)];
    let t = Tournament::build(config(&SIX, true), &six_player_group_games(), skips, START + DAY).unwrap();
    let view = t.view();
    assert_eq!(view.stage, TournamentStage::BracketStage);
    assert_eq!(view.groups.len(), 2);
    assert_eq!(view.groups[0].played.len(), 3);
    assert!(view.groups.iter().all(|g| g.pending.is_empty()));
    assert_eq!(view.bracket.len(), 2);
    assert_eq!(view.bracket[1].pending.len(), 2);
    assert!(view.bracket[0].pending.is_empty());
    assert_eq!(view.champion, None);
    assert!(view.has_pending_games);
    assert!(!view.in_signup_period);
    assert_eq!(view.signed_up.len(), 6);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["stage"], "bracket_stage");
}
