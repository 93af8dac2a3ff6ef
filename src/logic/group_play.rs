//! Group stage: group sizing, snake assignment, round robin schedule, scoring and bracket seeding.

use crate::logic::tournament::{POINTS_LOSS, POINTS_SKIP, POINTS_WIN};
use crate::models::{GroupScore, PlayerId, RelevantGame, TournamentGame};
use serde::Serialize;
use std::cmp::Ordering;

/// One round robin group.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Group {
    /// Players in seed order.
    pub players: Vec<PlayerId>,
    /// Every pairing of `players`, once.
    pub games: Vec<TournamentGame>,
    /// Standings, best first.
    pub scores: Vec<GroupScore>,
}

impl Group {
    pub fn played(&self) -> impl Iterator<Item = &TournamentGame> {
        self.games.iter().filter(|g| g.is_played())
    }

    pub fn pending(&self) -> impl Iterator<Item = &TournamentGame> {
        self.games.iter().filter(|g| g.is_playable())
    }
}

/// The group stage of a tournament, built from a seed order and the games played since `start`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupPlay {
    pub start: i64,
    pub groups: Vec<Group>,
    /// Time of the last group game once every group game is resolved.
    pub ended: Option<i64>,
}

impl GroupPlay {
    /// Build groups from `seed_order` (best first) and fill them from `events`.
    ///
    /// `events` must be in chronological order; events before `start` are ignored.
    pub fn build(seed_order: &[PlayerId], start: i64, events: &[RelevantGame]) -> Self {
        let sizes = get_group_sizes(seed_order.len());
        let mut groups: Vec<Group> = assign_groups(seed_order, &sizes)
            .into_iter()
            .map(|players| Group {
                games: round_robin(&players),
                players,
                scores: Vec::new(),
            })
            .collect();

        for event in events.iter().filter(|e| e.time >= start) {
            let open = groups
                .iter_mut()
                .flat_map(|g| g.games.iter_mut())
                .find(|g| g.is_open() && g.is_between(&event.player1, &event.player2));
            if let Some(game) = open {
                game.resolve(event);
            }
        }

        let largest = sizes.iter().copied().max().unwrap_or(0);
        for group in &mut groups {
            group.scores = score_group(group, largest, seed_order);
        }

        let ended = group_play_ended(&groups, start);
        log::debug!(
            "group play: {} players in {} groups, ended: {:?}",
            seed_order.len(),
            groups.len(),
            ended
        );
        Self { start, groups, ended }
    }

    pub fn has_ended(&self) -> bool {
        self.ended.is_some()
    }

    pub fn pending(&self) -> impl Iterator<Item = (usize, &TournamentGame)> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(i, g)| g.pending().map(move |game| (i, game)))
    }

    /// All players ranked across groups, truncated to the largest power of two.
    pub fn bracket_seed_order(&self) -> Vec<PlayerId> {
        let mut scores: Vec<&GroupScore> = self.groups.iter().flat_map(|g| g.scores.iter()).collect();
        scores.sort_by(|a, b| compare_standings(a, b));
        scores.truncate(largest_power_of_two_at_most(scores.len()));
        scores.into_iter().map(|s| s.player.clone()).collect()
    }
}

fn preferred_group_size(n: usize) -> usize {
    match n {
        0..=8 | 11 => 3,
        9..=19 | 21..=23 => 4,
        _ => 5,
    }
}

/// Group sizes for `n` players; sizes differ by at most one (except for 24 players).
pub fn get_group_sizes(n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    if n == 24 {
        return vec![5, 5, 5, 5, 4];
    }
    let size = preferred_group_size(n);
    let full_groups = n / size;
    let remainder = n % size;
    if full_groups == 0 {
        return vec![remainder];
    }
    let mut sizes = vec![size; full_groups];
    for i in 0..remainder {
        sizes[i % full_groups] += 1;
    }
    sizes
}

/// Snake-distribute seeded players into groups of the given sizes.
///
/// Each visit to a group places one player from the top and one from the bottom of the
/// remaining seeds; the visiting direction reverses after every pass over the groups.
/// Each group comes back in seed order.
pub fn assign_groups(seed_order: &[PlayerId], sizes: &[usize]) -> Vec<Vec<PlayerId>> {
    let mut groups: Vec<Vec<usize>> = sizes.iter().map(|&s| Vec::with_capacity(s)).collect();
    let (mut top, mut bottom) = (0, seed_order.len());
    let mut take_top = true;
    let mut forward = true;

    while top < bottom {
        let pass: Vec<usize> = if forward {
            (0..groups.len()).collect()
        } else {
            (0..groups.len()).rev().collect()
        };
        let before = bottom - top;
        for g in pass {
            for _ in 0..2 {
                if top >= bottom || groups[g].len() >= sizes[g] {
                    break;
                }
                let seed = if take_top {
                    top += 1;
                    top - 1
                } else {
                    bottom -= 1;
                    bottom
                };
                take_top = !take_top;
                groups[g].push(seed);
            }
        }
        if bottom - top == before {
            log::warn!("group sizes {:?} hold fewer than {} players", sizes, seed_order.len());
            break;
        }
        forward = !forward;
    }

    groups
        .into_iter()
        .map(|mut g| {
            g.sort_unstable();
            g.into_iter().map(|i| seed_order[i].clone()).collect()
        })
        .collect()
}

/// Every unordered pair of `players` as one game.
pub fn round_robin(players: &[PlayerId]) -> Vec<TournamentGame> {
    let mut games = Vec::with_capacity(players.len() * players.len().saturating_sub(1) / 2);
    for (i, a) in players.iter().enumerate() {
        for b in &players[i + 1..] {
            games.push(TournamentGame::new(a.clone(), b.clone()));
        }
    }
    games
}

fn score_group(group: &Group, largest: usize, seed_order: &[PlayerId]) -> Vec<GroupScore> {
    let factor = if group.players.len() > 1 {
        (largest as f64 - 1.0) / (group.players.len() as f64 - 1.0)
    } else {
        1.0
    };
    let mut scores: Vec<GroupScore> = group
        .players
        .iter()
        .map(|p| {
            let seed_index = seed_order.iter().position(|s| s == p).unwrap_or(usize::MAX);
            GroupScore::new(p.clone(), factor, seed_index)
        })
        .collect();

    for game in group.games.iter().filter(|g| g.is_resolved()) {
        let Some(winner) = game.winner.as_deref() else { continue };
        let Some(loser) = game.loser().cloned() else { continue };
        if let Some(s) = scores.iter_mut().find(|s| s.player == winner) {
            s.add_win(POINTS_WIN);
        }
        if let Some(s) = scores.iter_mut().find(|s| s.player == loser) {
            if game.skipped.is_some() {
                s.add_dnf(POINTS_SKIP);
            } else {
                s.add_loss(POINTS_LOSS);
            }
        }
    }

    scores.sort_by(compare_standings);
    scores
}

/// Ranking order: adjusted score, wins, fewest dnf, fewest losses, raw score, seed.
pub fn compare_standings(a: &GroupScore, b: &GroupScore) -> Ordering {
    b.adjusted_score
        .total_cmp(&a.adjusted_score)
        .then(b.wins.cmp(&a.wins))
        .then(a.dnf.cmp(&b.dnf))
        .then(a.losses.cmp(&b.losses))
        .then(b.score.total_cmp(&a.score))
        .then(a.seed_index.cmp(&b.seed_index))
}

fn group_play_ended(groups: &[Group], start: i64) -> Option<i64> {
    let mut games = groups.iter().flat_map(|g| g.games.iter()).peekable();
    if games.peek().is_none() {
        return Some(start);
    }
    let mut ended = start;
    for game in games {
        if game.winner.is_none() {
            return None;
        }
        ended = ended.max(game.completed_at.unwrap_or(start));
    }
    Some(ended)
}

pub(crate) fn largest_power_of_two_at_most(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}
