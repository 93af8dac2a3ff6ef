//! Integration tests for group play: sizing, assignment, scoring and bracket seeding.

use ladder_tournaments::{
    assign_groups, compare_standings, get_group_sizes, round_robin, CompletedGame, GroupPlay, GroupScore, PlayerId,
    RelevantGame, SkippedGame,
};
use std::cmp::Ordering;

fn players(n: usize) -> Vec<PlayerId> {
    (0..n).map(|i| format!("p{i}")).collect()
}

fn win(winner: &str, loser: &str, played_at: i64) -> RelevantGame {
    RelevantGame::from(&CompletedGame {
        winner: winner.to_string(),
        loser: loser.to_string(),
        played_at,
        score: None,
    })
}

fn skip(advancing: &str, eliminated: &str, time: i64) -> RelevantGame {
    RelevantGame::from(&SkippedGame::new(advancing, eliminated, time))
}

#[test]
fn twenty_four_players_use_the_special_layout() {
    assert_eq!(get_group_sizes(24), vec![5, 5, 5, 5, 4]);
}

#[test]
fn group_sizes_are_balanced_and_cover_everyone() {
    for n in (1..=64).filter(|&n| n != 24) {
        let sizes = get_group_sizes(n);
        assert_eq!(sizes.iter().sum::<usize>(), n, "n = {n}");
        let max = sizes.iter().max().unwrap();
        let min = sizes.iter().min().unwrap();
        assert!(max - min <= 1, "n = {n}: {sizes:?}");
    }
}

#[test]
fn group_sizes_follow_the_preferred_size_table() {
    assert_eq!(get_group_sizes(2), vec![2]);
    assert_eq!(get_group_sizes(6), vec![3, 3]);
    assert_eq!(get_group_sizes(7), vec![4, 3]);
    assert_eq!(get_group_sizes(8), vec![4, 4]);
    assert_eq!(get_group_sizes(11), vec![4, 4, 3]);
    assert_eq!(get_group_sizes(12), vec![4, 4, 4]);
    assert_eq!(get_group_sizes(20), vec![5, 5, 5, 5]);
    assert_eq!(get_group_sizes(22), vec![5, 5, 4, 4, 4]);
    assert_eq!(get_group_sizes(25), vec![5, 5, 5, 5, 5]);
    assert!(get_group_sizes(0).is_empty());
}

#[test]
fn snake_assignment_spreads_top_and_bottom_seeds() {
    let groups = assign_groups(&players(6), &[3, 3]);
    assert_eq!(groups, vec![vec!["p0", "p3", "p5"], vec!["p1", "p2", "p4"]]);
}

#[test]
fn snake_assignment_fills_every_group_to_size() {
    for n in 1..=40 {
        let sizes = get_group_sizes(n);
        let groups = assign_groups(&players(n), &sizes);
        let filled: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(filled, sizes, "n = {n}");
        // Each group is in seed order.
        for g in &groups {
            let mut sorted = g.clone();
            sorted.sort_by_key(|p| p[1..].parse::<usize>().unwrap());
            assert_eq!(&sorted, g);
        }
    }
}

#[test]
fn round_robin_pairs_everyone_once() {
    let games = round_robin(&players(5));
    assert_eq!(games.len(), 10);
    assert!(games.iter().all(|g| g.has_both_players() && g.advance_to.is_none()));
    assert!(games.iter().any(|g| g.is_between("p4", "p0")));
}

#[test]
fn smaller_groups_get_their_points_scaled_up() {
    // 7 players -> groups of 4 and 3; the 3-group factor is (4 - 1) / (3 - 1).
    let gp = GroupPlay::build(&players(7), 0, &[]);
    assert_eq!(gp.groups.len(), 2);
    assert!(gp.groups[0].scores.iter().all(|s| s.group_size_adjustment_factor == 1.0));
    assert!(gp.groups[1].scores.iter().all(|s| s.group_size_adjustment_factor == 1.5));

    let mut score = GroupScore::new("a", (5.0 - 1.0) / (3.0 - 1.0), 0);
    assert_eq!(score.group_size_adjustment_factor, 2.0);
    score.add_win(3.0);
    score.add_loss(1.0);
    assert_eq!(score.score, 4.0);
    assert_eq!(score.adjusted_score, 8.0);
}

#[test]
fn tie_break_prefers_fewer_dnf_then_fewer_losses_then_score_then_seed() {
    let standing = |player: &str, wins, losses, dnf, score: f64, seed| GroupScore {
        player: player.to_string(),
        score,
        adjusted_score: 6.0,
        group_size_adjustment_factor: 1.0,
        wins,
        losses,
        dnf,
        seed_index: seed,
    };
    let clean = standing("a", 1, 1, 0, 4.0, 5);
    let skipped = standing("b", 1, 0, 1, 4.0, 0);
    assert_eq!(compare_standings(&clean, &skipped), Ordering::Less);

    let fewer_losses = standing("c", 1, 0, 0, 4.0, 5);
    assert_eq!(compare_standings(&fewer_losses, &clean), Ordering::Less);

    let higher_score = standing("d", 1, 1, 0, 5.0, 5);
    assert_eq!(compare_standings(&higher_score, &clean), Ordering::Less);

    let better_seed = standing("e", 1, 1, 0, 4.0, 1);
    assert_eq!(compare_standings(&better_seed, &clean), Ordering::Less);

    let more_wins = GroupScore { wins: 2, ..standing("f", 0, 0, 3, 0.0, 9) };
    assert_eq!(compare_standings(&more_wins, &clean), Ordering::Less);
}

fn six_player_results() -> Vec<RelevantGame> {
    vec![
        win("p0", "p3", 10),
        win("p0", "p5", 11),
        win("p3", "p5", 12),
        win("p1", "p2", 13),
        win("p4", "p1", 14),
        skip("p2", "p4", 15),
    ]
}

#[test]
fn results_fill_the_schedule_and_end_group_play() {
    let gp = GroupPlay::build(&players(6), 0, &six_player_results());
    assert_eq!(gp.ended, Some(15));
    assert!(gp.pending().next().is_none());
    assert_eq!(gp.groups[1].played().count(), 3);

    let skipped = gp.groups[1]
        .games
        .iter()
        .find(|g| g.is_between("p2", "p4"))
        .unwrap();
    assert_eq!(skipped.winner.as_deref(), Some("p2"));
    assert!(skipped.skipped.is_some());
    assert_eq!(skipped.completed_at, Some(15));
}

#[test]
fn skips_count_as_dnf_for_the_eliminated_player() {
    let gp = GroupPlay::build(&players(6), 0, &six_player_results());
    let group = &gp.groups[1];
    let order: Vec<&str> = group.scores.iter().map(|s| s.player.as_str()).collect();
    assert_eq!(order, vec!["p1", "p2", "p4"]);

    let p4 = group.scores.iter().find(|s| s.player == "p4").unwrap();
    assert_eq!((p4.wins, p4.losses, p4.dnf), (1, 0, 1));
    assert_eq!(p4.score, 4.0);
    let p2 = group.scores.iter().find(|s| s.player == "p2").unwrap();
    assert_eq!((p2.wins, p2.losses, p2.dnf), (1, 1, 0));
}

#[test]
fn bracket_seed_order_ranks_across_groups_and_truncates() {
    let gp = GroupPlay::build(&players(6), 0, &six_player_results());
    assert_eq!(gp.bracket_seed_order(), vec!["p0", "p1", "p2", "p3"]);
}

#[test]
fn group_play_stays_open_until_every_game_has_a_winner() {
    let mut results = six_player_results();
    results.pop();
    let gp = GroupPlay::build(&players(6), 0, &results);
    assert_eq!(gp.ended, None);
    let pending: Vec<_> = gp.pending().collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].0, 1);
    assert!(pending[0].1.is_between("p4", "p2"));
}

#[test]
fn events_before_start_and_outside_the_schedule_are_ignored() {
    let results = vec![win("p0", "p3", 5), win("p0", "p1", 20), win("p3", "p0", 21)];
    let gp = GroupPlay::build(&players(6), 10, &results);
    let game = gp.groups[0].games.iter().find(|g| g.is_between("p0", "p3")).unwrap();
    assert_eq!(game.winner.as_deref(), Some("p3"));
    assert_eq!(gp.groups.iter().flat_map(|g| g.played()).count(), 1);
}
