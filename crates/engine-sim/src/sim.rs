//! Scripted game world.

use botomy_core::action::{Skill, UsableItem};
use botomy_core::model::{GameInfo, OwnPlayer, Player};
use botomy_core::{ActionBatch, Command, GameState, Position, ResetOptions, Snapshot};
use uuid::Uuid;

/// Furthest the own player travels towards a `move_to` target in one tick.
pub const STEP_DISTANCE: f64 = 50.0;
/// Score awarded per `attack`.
pub const ATTACK_SCORE: i64 = 5;
/// Ticks spent in STARTING before the round begins.
pub const STARTING_TICKS: u64 = 3;
const MAX_HEALTH: i64 = 100;

/// Deterministic stand-in for the game engine.
///
/// A reset yields [`STARTING_TICKS`] STARTING ticks, `round_length` STARTED
/// ticks and then ENDED until the next reset.
#[derive(Debug, Clone)]
pub struct Simulation {
    snapshot: Snapshot,
    default_round_length: u64,
    round_length: u64,
    tick: u64,
    episodes: u64,
}

impl Simulation {
    /// Idle simulation that reports WAITING until the first reset.
    pub fn new(default_round_length: u64) -> Self {
        Self {
            snapshot: Snapshot::waiting(),
            default_round_length,
            round_length: default_round_length,
            tick: 0,
            episodes: 0,
        }
    }

    /// What the next tick posts.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Resets seen so far.
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// STARTED ticks in the current round.
    pub fn round_length(&self) -> u64 {
        self.round_length
    }

    /// Start a fresh round. `options.round_length` overrides the default.
    pub fn begin_episode(&mut self, seed: Option<i64>, options: &ResetOptions) {
        self.round_length = options
            .get("round_length")
            .and_then(|v| v.as_u64())
            .unwrap_or(self.default_round_length);
        self.tick = 0;
        self.episodes += 1;

        let spawn = seed.unwrap_or(0).rem_euclid(100) as f64 * 10.0;
        self.snapshot = Snapshot {
            game_info: GameInfo {
                match_id: Uuid::new_v4().to_string(),
                state: GameState::Starting,
                time_remaining_s: self.round_length as i64,
                ..GameInfo::default()
            },
            own_player: Some(OwnPlayer {
                player: Player {
                    id: "sim-bot".into(),
                    kind: "player".into(),
                    display_name: "sim-bot".into(),
                    position: Position::new(spawn, spawn),
                    health: MAX_HEALTH,
                    max_health: MAX_HEALTH,
                    ..Player::default()
                },
                ..OwnPlayer::default()
            }),
            ..Snapshot::default()
        };
    }

    /// Apply commands returned by the bridge.
    pub fn apply(&mut self, batch: &ActionBatch) {
        if !matches!(self.snapshot.state(), GameState::Starting | GameState::Started) {
            return;
        }
        let Some(own) = self.snapshot.own_player.as_mut() else {
            return;
        };
        let player = &mut own.player;

        for cmd in batch.commands() {
            match cmd {
                Command::MoveTo(target) => {
                    let (dx, dy) = (target.x - player.position.x, target.y - player.position.y);
                    let dist = (dx * dx + dy * dy).sqrt();
                    if dist <= STEP_DISTANCE {
                        player.position = *target;
                    } else {
                        let k = STEP_DISTANCE / dist;
                        player.position = player.position.offset(dx * k, dy * k);
                    }
                }
                Command::Attack => {
                    player.score += ATTACK_SCORE;
                    player.is_attacking = true;
                }
                Command::Shield => player.shield_raised = true,
                Command::Dash => player.is_dashing = true,
                Command::Use(UsableItem::BigPotion) => player.health = player.max_health,
                Command::RedeemSkillPoint(skill) => {
                    let lv = &mut player.levelling;
                    match skill {
                        Skill::Attack => lv.attack += 1,
                        Skill::Health => lv.health += 1,
                        Skill::Speed => lv.speed += 1,
                    }
                }
                Command::Speak(text) => player.speech = text.clone(),
                Command::Special
                | Command::Use(_)
                | Command::DebugInfo(_) => {}
            }
        }
    }

    /// Move to the next tick.
    pub fn advance(&mut self) {
        let info = &mut self.snapshot.game_info;
        match info.state {
            GameState::Starting => {
                self.tick += 1;
                if self.tick >= STARTING_TICKS {
                    self.tick = 0;
                    info.state = GameState::Started;
                }
            }
            GameState::Started => {
                self.tick += 1;
                info.time_remaining_s = (self.round_length - self.tick.min(self.round_length)) as i64;
                if self.tick >= self.round_length {
                    info.state = GameState::Ended;
                }
            }
            _ => {}
        }

        if let Some(own) = self.snapshot.own_player.as_mut() {
            own.player.is_attacking = false;
            own.player.is_dashing = false;
        }
    }
}
