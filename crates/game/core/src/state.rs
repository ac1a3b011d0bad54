//! Character activity states and the factory that stamps them.
//!
//! A [`State`] is an immutable record: which [`Action`] a character is
//! performing, the action-specific options carried by [`StateKind`], and the
//! timing the FSM uses to decide when it may move on. States are only ever
//! built through a [`StateFactory`], which owns the id counter and the
//! per-action default durations.

use crate::character::Character;
use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::math::Vector;
use crate::types::{CharacterId, StateId, Timestamp};

/// Fieldless tag of a [`StateKind`].
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[strum(serialize_all = "camelCase")]
pub enum Action {
    Idle,
    Walk,
    BasicAttack,
    /// Attack that re-arms itself until something stops it.
    ContinuousAttack,
    Shoot,
    Spawn,
    Die,
}

impl Action {
    /// Parses an action name, mapping failures to [`CoreError::UnknownAction`].
    pub fn parse(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| CoreError::UnknownAction(name.to_owned()))
    }

    pub fn is_attack(self) -> bool {
        matches!(self, Action::BasicAttack | Action::ContinuousAttack)
    }
}

/// Options of a walk.
///
/// With a destination the walk ends once the character stands on it. Without
/// one the character keeps stepping along `orientation` (or its current
/// facing) until something else interrupts it.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Walk {
    pub destination: Option<Vector>,
    pub orientation: Option<Vector>,
}

impl Walk {
    pub fn to(destination: Vector) -> Self {
        Self {
            destination: Some(destination),
            orientation: None,
        }
    }

    pub fn towards(orientation: Vector) -> Self {
        Self {
            destination: None,
            orientation: Some(orientation),
        }
    }
}

/// What a character is doing, with the options that action needs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")
)]
pub enum StateKind {
    Idle,
    Walk(Walk),
    BasicAttack { target: CharacterId },
    ContinuousAttack { target: CharacterId },
    Shoot,
    Spawn { origin: Option<String> },
    Die,
}

impl StateKind {
    pub fn action(&self) -> Action {
        match self {
            StateKind::Idle => Action::Idle,
            StateKind::Walk(_) => Action::Walk,
            StateKind::BasicAttack { .. } => Action::BasicAttack,
            StateKind::ContinuousAttack { .. } => Action::ContinuousAttack,
            StateKind::Shoot => Action::Shoot,
            StateKind::Spawn { .. } => Action::Spawn,
            StateKind::Die => Action::Die,
        }
    }

    pub fn target(&self) -> Option<&CharacterId> {
        match self {
            StateKind::BasicAttack { target } | StateKind::ContinuousAttack { target } => {
                Some(target)
            }
            _ => None,
        }
    }
}

/// Loose options used to build a state from an action name.
///
/// Fields that the named action does not use are ignored; fields it requires
/// must be present.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct StateParams {
    pub destination: Option<Vector>,
    pub orientation: Option<Vector>,
    pub target: Option<CharacterId>,
    pub origin: Option<String>,
}

impl StateParams {
    fn into_kind(self, action: Action) -> Result<StateKind> {
        let target = |target: Option<CharacterId>| {
            target.ok_or(CoreError::MissingParameter {
                action,
                field: "target",
            })
        };
        Ok(match action {
            Action::Idle => StateKind::Idle,
            Action::Walk => StateKind::Walk(Walk {
                destination: self.destination,
                orientation: self.orientation,
            }),
            Action::BasicAttack => StateKind::BasicAttack {
                target: target(self.target)?,
            },
            Action::ContinuousAttack => StateKind::ContinuousAttack {
                target: target(self.target)?,
            },
            Action::Shoot => StateKind::Shoot,
            Action::Spawn => StateKind::Spawn {
                origin: self.origin,
            },
            Action::Die => StateKind::Die,
        })
    }
}

/// One instance of a character activity.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    pub id: StateId,
    pub owner: CharacterId,
    /// `None` until the owning FSM activates the state.
    pub start: Option<Timestamp>,
    pub duration: u64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: StateKind,
}

impl State {
    pub fn action(&self) -> Action {
        self.kind.action()
    }

    /// Whether the state ran its full duration by `now`.
    ///
    /// A state that never started has not elapsed.
    pub fn is_elapsed(&self, now: Timestamp) -> bool {
        self.start
            .is_some_and(|start| start + self.duration <= now)
    }
}

/// Builds states with fresh ids and per-action default durations.
///
/// One factory lives in each engine; nothing about it is global.
#[derive(Clone, Debug)]
pub struct StateFactory {
    next_id: u64,
    spawn_retry_ms: u64,
    walk_duration_ms: u64,
    attack_duration_ms: u64,
    shoot_duration_ms: u64,
}

impl StateFactory {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            next_id: 0,
            spawn_retry_ms: config.spawn_retry_ms,
            walk_duration_ms: config.walk_duration_ms,
            attack_duration_ms: config.attack_duration_ms,
            shoot_duration_ms: config.shoot_duration_ms,
        }
    }

    /// Default duration of a freshly built state of `action`.
    pub fn default_duration(&self, action: Action) -> u64 {
        match action {
            Action::Idle | Action::Die => 0,
            Action::Walk => self.walk_duration_ms,
            Action::BasicAttack | Action::ContinuousAttack => self.attack_duration_ms,
            Action::Shoot => self.shoot_duration_ms,
            Action::Spawn => self.spawn_retry_ms,
        }
    }

    pub fn build(&mut self, kind: StateKind, owner: CharacterId) -> State {
        self.next_id += 1;
        State {
            id: StateId(self.next_id),
            owner,
            start: None,
            duration: self.default_duration(kind.action()),
            kind,
        }
    }

    /// Builds a state from an action name as received from transport.
    pub fn build_named(
        &mut self,
        name: &str,
        owner: CharacterId,
        params: StateParams,
    ) -> Result<State> {
        let action = Action::parse(name)?;
        let kind = params.into_kind(action)?;
        Ok(self.build(kind, owner))
    }

    /// Natural successor of `state`, stamped as a new state.
    pub fn next(&mut self, state: &State, character: &Character) -> Option<State> {
        let kind = successor(state, character)?;
        Some(self.build(kind, state.owner.clone()))
    }
}

/// Natural continuation of `state` given its owner's current situation.
///
/// `None` means the state does not advance by itself.
pub fn successor(state: &State, character: &Character) -> Option<StateKind> {
    match &state.kind {
        StateKind::Idle | StateKind::Die => None,
        StateKind::Walk(walk) => match (walk.destination, character.position) {
            (Some(destination), Some(position)) if position == destination => {
                Some(StateKind::Idle)
            }
            _ => Some(state.kind.clone()),
        },
        StateKind::BasicAttack { .. } | StateKind::Shoot => Some(StateKind::Idle),
        StateKind::ContinuousAttack { .. } => Some(state.kind.clone()),
        StateKind::Spawn { .. } if character.is_spawned() => Some(StateKind::Idle),
        StateKind::Spawn { .. } => Some(state.kind.clone()),
    }
}
