//! Single elimination bracket for any number of entrants.
//!
//! Layer 0 is the final; layer `L` holds `2^L` games. Seeds that are never pulled into
//! a deeper layer get a bye into the next round.

use crate::models::{AdvanceTo, PlayerId, RelevantGame, Role, TournamentError, TournamentGame};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bracket {
    pub start: i64,
    pub layers: Vec<Vec<TournamentGame>>,
}

impl Bracket {
    /// Place `seed_order` (best first) and fill results from `events` at or after `start`.
    pub fn build(seed_order: &[PlayerId], start: i64, events: &[RelevantGame]) -> Result<Self, TournamentError> {
        let mut bracket = Self::from_seed_order(seed_order, start)?;
        bracket.fill(events)?;
        log::debug!(
            "bracket: {} seeds in {} layers, winner: {:?}",
            seed_order.len(),
            bracket.layers.len(),
            bracket.winner()
        );
        Ok(bracket)
    }

    /// Empty bracket with every seed in its first-round slot.
    pub fn from_seed_order(seed_order: &[PlayerId], start: i64) -> Result<Self, TournamentError> {
        let mut layers = Vec::new();
        if seed_order.is_empty() {
            return Ok(Self { start, layers });
        }
        layers.push(vec![TournamentGame {
            player1: seed_order.first().cloned(),
            player2: seed_order.get(1).cloned(),
            ..TournamentGame::default()
        }]);

        for (seed, player) in seed_order.iter().enumerate().skip(2) {
            let layer = (usize::BITS - 1 - seed.leading_zeros()) as usize;
            let games_in_layer = 1usize << layer;
            if layers.len() == layer {
                layers.push(new_layer(layer));
            }

            let mirror = 2 * games_in_layer - 1 - seed;
            let mirror_player = &seed_order[mirror];
            let (game_index, role) = layers[layer - 1]
                .iter()
                .enumerate()
                .find_map(|(g, game)| game.role_of(mirror_player).map(|r| (g, r)))
                .ok_or_else(|| TournamentError::SeedMirrorNotFound {
                    seed,
                    player: player.clone(),
                    mirror,
                    layer: layer - 1,
                })?;

            let target = game_index * 2 + usize::from(role == Role::Player2);
            let game = &mut layers[layer][target];
            if game.player1.is_some() || game.player2.is_some() {
                return Err(TournamentError::SeedSlotOccupied {
                    seed,
                    player: player.clone(),
                    layer,
                    game: target,
                });
            }
            game.player1 = Some(mirror_player.clone());
            game.player2 = Some(player.clone());
            *layers[layer - 1][game_index].slot_mut(role) = None;
        }

        Ok(Self { start, layers })
    }

    /// Apply results in chronological order and advance winners.
    ///
    /// Each event resolves the first open game between its two players.
    pub fn fill(&mut self, events: &[RelevantGame]) -> Result<(), TournamentError> {
        let start = self.start;
        for event in events.iter().filter(|e| e.time >= start) {
            let found = self.layers.iter().enumerate().find_map(|(l, layer)| {
                layer
                    .iter()
                    .position(|g| g.is_open() && g.is_between(&event.player1, &event.player2))
                    .map(|g| (l, g))
            });
            let Some((layer, index)) = found else {
                continue;
            };

            let game = &mut self.layers[layer][index];
            game.resolve(event);
            let Some(advance_to) = game.advance_to else {
                continue;
            };
            self.advance(&event.player1, advance_to)?;
        }
        Ok(())
    }

    fn advance(&mut self, winner: &PlayerId, to: AdvanceTo) -> Result<(), TournamentError> {
        let conflict = || TournamentError::AdvancementConflict {
            winner: winner.clone(),
            layer: to.layer_index,
            game: to.game_index,
        };
        let slot = self
            .layers
            .get_mut(to.layer_index)
            .and_then(|layer| layer.get_mut(to.game_index))
            .ok_or_else(conflict)?
            .slot_mut(to.role);
        if slot.is_some() {
            return Err(conflict());
        }
        *slot = Some(winner.clone());
        Ok(())
    }

    pub fn final_game(&self) -> Option<&TournamentGame> {
        self.layers.first().and_then(|layer| layer.first())
    }

    /// The champion, once the final is resolved.
    pub fn winner(&self) -> Option<&PlayerId> {
        self.final_game().and_then(|g| g.winner.as_ref())
    }

    /// Completion time of the final.
    pub fn ended(&self) -> Option<i64> {
        self.final_game().and_then(|g| g.completed_at)
    }

    /// Resolved games of a layer with both players known.
    pub fn played(&self, layer: usize) -> Vec<&TournamentGame> {
        self.layers
            .get(layer)
            .map(|games| games.iter().filter(|g| g.is_played()).collect())
            .unwrap_or_default()
    }

    /// Playable games of a layer.
    pub fn pending_in(&self, layer: usize) -> Vec<&TournamentGame> {
        self.layers
            .get(layer)
            .map(|games| games.iter().filter(|g| g.is_playable()).collect())
            .unwrap_or_default()
    }

    /// Every playable game with its layer index.
    pub fn pending(&self) -> impl Iterator<Item = (usize, &TournamentGame)> {
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(l, games)| games.iter().filter(|g| g.is_playable()).map(move |g| (l, g)))
    }
}

fn new_layer(layer: usize) -> Vec<TournamentGame> {
    (0..1usize << layer)
        .map(|g| TournamentGame {
            advance_to: (layer > 0).then(|| AdvanceTo {
                layer_index: layer - 1,
                game_index: g / 2,
                role: if g % 2 == 0 { Role::Player1 } else { Role::Player2 },
            }),
            ..TournamentGame::default()
        })
        .collect()
}
