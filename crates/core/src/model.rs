//! World snapshot posted by the engine every tick.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Episode lifecycle as reported by the engine.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    #[default]
    Waiting,
    Starting,
    Started,
    Ending,
    Ended,
    MatchCompleted,
}

impl GameState {
    /// True once the round is over (the decision loop should stop stepping).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::MatchCompleted)
    }
}

/// World coordinates. Screen orientation: `y` grows downwards.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Point at `(x, y)`.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise offset.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Facing of a character sprite.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Right,
    Left,
}

/// Match-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameInfo {
    pub friendly_fire: bool,
    pub game_type: String,
    pub map: String,
    pub match_id: String,
    pub state: GameState,
    #[serde(deserialize_with = "lenient_int")]
    pub time_remaining_s: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub latency: i64,
}

impl Default for GameInfo {
    fn default() -> Self {
        Self {
            friendly_fire: true,
            game_type: "rpg".into(),
            map: "default".into(),
            match_id: String::new(),
            state: GameState::Waiting,
            time_remaining_s: 0,
            latency: 0,
        }
    }
}

/// Pickup lying on the map.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Item {
    pub id: String,
    pub position: Position,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_int")]
    pub value: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub points: i64,
}

/// Hostile NPC.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Enemy {
    pub id: String,
    pub position: Position,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_int")]
    pub attack_damage: i64,
    pub direction: Direction,
    #[serde(deserialize_with = "lenient_int")]
    pub health: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub max_health: i64,
    pub is_attacking: bool,
    pub is_frozen: bool,
    pub is_pushed: bool,
    pub is_zapped: bool,
    #[serde(deserialize_with = "lenient_int")]
    pub points: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Levelling {
    #[serde(deserialize_with = "lenient_int")]
    pub level: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub available_skill_points: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub attack: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub speed: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub health: i64,
}

/// Another player in the match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Player {
    pub id: String,
    pub position: Position,
    #[serde(rename = "type")]
    pub kind: String,
    pub display_name: String,
    #[serde(deserialize_with = "lenient_int")]
    pub attack_damage: i64,
    pub direction: Direction,
    #[serde(deserialize_with = "lenient_int")]
    pub health: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub max_health: i64,
    pub base_speed: f64,
    #[serde(deserialize_with = "lenient_int")]
    pub score: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub points: i64,
    pub levelling: Levelling,
    pub special_equipped: String,
    pub speech: String,
    pub is_attacking: bool,
    pub is_dashing: bool,
    pub is_frozen: bool,
    pub is_pushed: bool,
    pub is_zapped: bool,
    pub is_overclocking: bool,
    pub has_health_regen: bool,
    pub shield_raised: bool,
    pub unleashing_shockwave: bool,
}

/// Something the own player is touching, relative to its position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Collision {
    #[serde(rename = "type")]
    pub kind: String,
    pub relative_position: Position,
}

/// Consumables held by the own player. Entries are engine-defined.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ItemInventory {
    pub big_potions: Vec<serde_json::Value>,
    pub speed_zappers: Vec<serde_json::Value>,
    pub rings: Vec<serde_json::Value>,
}

/// The player controlled through the bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OwnPlayer {
    #[serde(flatten)]
    pub player: Player,
    pub collisions: Vec<Collision>,
    pub items: ItemInventory,
    pub is_cloaked: bool,
    pub is_colliding: bool,
    pub is_dash_ready: bool,
    pub is_shield_ready: bool,
    pub is_special_ready: bool,
    pub is_zap_ready: bool,
    #[serde(deserialize_with = "lenient_int")]
    pub overclock_duration: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HazardStatus {
    #[default]
    Idle,
    Active,
    Charging,
}

/// Bomb, icicle or lightning storm.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Hazard {
    pub id: String,
    pub position: Position,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: HazardStatus,
    #[serde(deserialize_with = "lenient_int")]
    pub attack_damage: i64,
    pub owner_id: String,
}

/// Scoreboard line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerStat {
    pub id: String,
    #[serde(deserialize_with = "lenient_int")]
    pub score: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub kills: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub deaths: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub coins: i64,
    pub kd_ratio: f64,
    #[serde(deserialize_with = "lenient_int")]
    pub kill_streak: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub overclocks: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub xps: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub wolf_kills: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub ghoul_kills: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub tiny_kills: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub minotaur_kills: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub player_kills: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub self_destructs: i64,
}

/// One engine tick worth of world state.
///
/// The bridge only inspects `game_info.state`; everything else is carried
/// through to the decision loop untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub game_info: GameInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub own_player: Option<OwnPlayer>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub obstacles: Vec<Position>,
    #[serde(default)]
    pub hazards: Vec<Hazard>,
    #[serde(default)]
    pub stats: Vec<PlayerStat>,
}

impl Snapshot {
    /// Placeholder installed while a reset is negotiated: WAITING, no entities.
    pub fn waiting() -> Self {
        Self::default()
    }

    /// Episode state reported by the engine.
    pub fn state(&self) -> GameState {
        self.game_info.state
    }

    /// Own player's position, if the engine reported one.
    pub fn own_position(&self) -> Option<Position> {
        self.own_player.as_ref().map(|p| p.player.position)
    }

    /// Own player's score, zero when absent.
    pub fn own_score(&self) -> i64 {
        self.own_player.as_ref().map_or(0, |p| p.player.score)
    }

    /// True when the snapshot carries no entities at all.
    pub fn is_empty(&self) -> bool {
        self.own_player.is_none()
            && self.items.is_empty()
            && self.enemies.is_empty()
            && self.players.is_empty()
            && self.obstacles.is_empty()
            && self.hazards.is_empty()
            && self.stats.is_empty()
    }
}

/// Reads an engine counter that may arrive as an integer, a float (`12.0`,
/// `59.5`) or `null`. Floats are rounded to the nearest integer and `null`
/// reads as zero.
fn lenient_int<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct Counter;

    impl<'de> Visitor<'de> for Counter {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or null")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            // `as` saturates at the i64 bounds.
            Ok(v.round() as i64)
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }
    }

    de.deserialize_any(Counter)
}
