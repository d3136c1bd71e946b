//! Engine commands and the discrete action set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Position, Snapshot};

/// Consumable the own player can activate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UsableItem {
    Ring,
    SpeedZapper,
    BigPotion,
}

/// Attribute a skill point can be spent on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Attack,
    Health,
    Speed,
}

/// Free-form annotation the engine may render next to the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DebugInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub message: String,
}

/// One engine command.
///
/// Wire shape follows serde's external tagging: unit variants are bare
/// strings (`"attack"`), the rest are single-key objects
/// (`{"move_to": {"x": 1.0, "y": 2.0}}`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Attack,
    Special,
    Dash,
    Shield,
    MoveTo(Position),
    Speak(String),
    Use(UsableItem),
    RedeemSkillPoint(Skill),
    DebugInfo(DebugInfo),
}

/// Ordered commands delivered to the engine in one poll response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ActionBatch(pub Vec<Command>);

impl ActionBatch {
    /// The `[]` batch.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// No commands.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Commands in delivery order.
    pub fn commands(&self) -> &[Command] {
        &self.0
    }
}

impl From<Vec<Command>> for ActionBatch {
    fn from(value: Vec<Command>) -> Self {
        Self(value)
    }
}

impl FromIterator<Command> for ActionBatch {
    fn from_iter<T: IntoIterator<Item = Command>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Distance of a single move/dash target from the own player.
pub const MOVE_DELTA: f64 = 500.0;

/// Discrete action set exposed to a learning agent.
///
/// Discriminants are the action indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveRight = 0,
    MoveLeft,
    MoveUp,
    MoveDown,
    MoveUpRight,
    MoveUpLeft,
    MoveDownRight,
    MoveDownLeft,
    DashRight,
    DashLeft,
    DashUp,
    DashDown,
    DashUpRight,
    DashUpLeft,
    DashDownRight,
    DashDownLeft,
    Attack,
    Special,
    Shield,
    UseRing,
    UseSpeedZapper,
    UseBigPotion,
    RedeemSkillPointsAttack,
    RedeemSkillPointsHealth,
    RedeemSkillPointsSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("action index {0} out of range (0..{count})", count = Action::COUNT)]
pub struct ActionIndexError(pub usize);

impl Action {
    pub const COUNT: usize = 25;

    pub const ALL: [Action; Action::COUNT] = [
        Action::MoveRight,
        Action::MoveLeft,
        Action::MoveUp,
        Action::MoveDown,
        Action::MoveUpRight,
        Action::MoveUpLeft,
        Action::MoveDownRight,
        Action::MoveDownLeft,
        Action::DashRight,
        Action::DashLeft,
        Action::DashUp,
        Action::DashDown,
        Action::DashUpRight,
        Action::DashUpLeft,
        Action::DashDownRight,
        Action::DashDownLeft,
        Action::Attack,
        Action::Special,
        Action::Shield,
        Action::UseRing,
        Action::UseSpeedZapper,
        Action::UseBigPotion,
        Action::RedeemSkillPointsAttack,
        Action::RedeemSkillPointsHealth,
        Action::RedeemSkillPointsSpeed,
    ];

    /// Action at `index` in [`Action::ALL`].
    pub fn from_index(index: usize) -> Result<Self, ActionIndexError> {
        Self::ALL.get(index).copied().ok_or(ActionIndexError(index))
    }

    /// Position in [`Action::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit direction for movement actions, `None` otherwise.
    fn heading(self) -> Option<(f64, f64)> {
        use Action::*;
        let h = match self {
            MoveRight | DashRight => (1.0, 0.0),
            MoveLeft | DashLeft => (-1.0, 0.0),
            MoveUp | DashUp => (0.0, -1.0),
            MoveDown | DashDown => (0.0, 1.0),
            MoveUpRight | DashUpRight => (1.0, -1.0),
            MoveUpLeft | DashUpLeft => (-1.0, -1.0),
            MoveDownRight | DashDownRight => (1.0, 1.0),
            MoveDownLeft | DashDownLeft => (-1.0, 1.0),
            _ => return None,
        };
        Some(h)
    }

    /// Single command for non-movement actions.
    fn direct_command(self) -> Option<Command> {
        let cmd = match self {
            Action::Attack => Command::Attack,
            Action::Special => Command::Special,
            Action::Shield => Command::Shield,
            Action::UseRing => Command::Use(UsableItem::Ring),
            Action::UseSpeedZapper => Command::Use(UsableItem::SpeedZapper),
            Action::UseBigPotion => Command::Use(UsableItem::BigPotion),
            Action::RedeemSkillPointsAttack => Command::RedeemSkillPoint(Skill::Attack),
            Action::RedeemSkillPointsHealth => Command::RedeemSkillPoint(Skill::Health),
            Action::RedeemSkillPointsSpeed => Command::RedeemSkillPoint(Skill::Speed),
            _ => return None,
        };
        Some(cmd)
    }

    fn is_dash(self) -> bool {
        (Action::DashRight.index()..=Action::DashDownLeft.index()).contains(&self.index())
    }

    /// Translate into engine commands relative to the own player in `snapshot`.
    ///
    /// The batch always ends with a `debug_info` entry whose message is the
    /// JSON of the commands before it.
    pub fn encode(self, snapshot: &Snapshot) -> ActionBatch {
        let mut commands = Vec::with_capacity(3);

        if let Some((hx, hy)) = self.heading() {
            let origin = snapshot.own_position().unwrap_or_default();
            if self.is_dash() {
                commands.push(Command::Dash);
            }
            commands.push(Command::MoveTo(origin.offset(hx * MOVE_DELTA, hy * MOVE_DELTA)));
        } else if let Some(cmd) = self.direct_command() {
            commands.push(cmd);
        }

        let message = serde_json::to_string(&commands).unwrap_or_default();
        commands.push(Command::DebugInfo(DebugInfo {
            target_id: None,
            message,
        }));
        ActionBatch(commands)
    }
}

impl TryFrom<usize> for Action {
    type Error = ActionIndexError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::from_index(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OwnPlayer, Player};

    fn at(x: f64, y: f64) -> Snapshot {
        Snapshot {
            own_player: Some(OwnPlayer {
                player: Player {
                    position: Position::new(x, y),
                    ..Default::default()
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn indices_are_stable() {
        for (i, a) in Action::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
            assert_eq!(Action::from_index(i).unwrap(), *a);
        }
        assert_eq!(Action::from_index(25), Err(ActionIndexError(25)));
    }

    #[test]
    fn move_is_relative_to_own_player() {
        let batch = Action::MoveUpRight.encode(&at(100.0, 200.0));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.0[0], Command::MoveTo(Position::new(600.0, -300.0)));
        assert!(matches!(batch.0[1], Command::DebugInfo(_)));
    }

    #[test]
    fn debug_message_echoes_commands() {
        let batch = Action::Attack.encode(&Snapshot::waiting());
        assert_eq!(
            batch.0[1],
            Command::DebugInfo(DebugInfo {
                target_id: None,
                message: r#"["attack"]"#.into(),
            })
        );

        let batch = Action::DashRight.encode(&at(0.0, 0.0));
        let Command::DebugInfo(info) = &batch.0[2] else {
            panic!("missing debug_info: {batch:?}");
        };
        assert_eq!(info.message, r#"["dash",{"move_to":{"x":500.0,"y":0.0}}]"#);
    }

    #[test]
    fn dash_prepends_dash_command() {
        let batch = Action::DashLeft.encode(&at(0.0, 0.0));
        assert_eq!(batch.0[0], Command::Dash);
        assert_eq!(batch.0[1], Command::MoveTo(Position::new(-500.0, 0.0)));
    }

    #[test]
    fn move_without_own_player_uses_delta() {
        let batch = Action::MoveDown.encode(&Snapshot::waiting());
        assert_eq!(batch.0[0], Command::MoveTo(Position::new(0.0, 500.0)));
    }

    #[test]
    fn item_and_skill_actions() {
        let s = Snapshot::waiting();
        assert_eq!(
            Action::UseBigPotion.encode(&s).0[0],
            Command::Use(UsableItem::BigPotion)
        );
        assert_eq!(
            Action::RedeemSkillPointsSpeed.encode(&s).0[0],
            Command::RedeemSkillPoint(Skill::Speed)
        );
        assert_eq!(Action::Shield.encode(&s).0[0], Command::Shield);
    }
}
