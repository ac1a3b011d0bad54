//! Named trigger fragments and the transition tables compiled from them.
//!
//! A [`Trigger`] is a small declarative fragment: for some event kind and
//! some current actions, run a handler that may propose the next state.
//! [`TriggerRegistry::build_transition_table`] merges fragments by sorted name
//! into a two-level [`TransitionTable`]; clauses landing on the same
//! (event, state) cell keep their merge order.

use std::collections::BTreeMap;

use crate::character::Character;
use crate::dice::RollSource;
use crate::error::{CoreError, Result};
use crate::events::{EventKey, EventKind, GameEvent, StateKey};
use crate::rules::{Update, UpdateResult};
use crate::state::{Action, State, StateKind, Walk};

/// What a handler may look at while deciding.
pub struct TriggerContext<'a> {
    pub character: &'a Character,
    pub state: &'a State,
    pub rolls: &'a mut dyn RollSource,
}

/// Proposes a next state for the character, or `None` to pass.
pub type Handler = fn(&mut TriggerContext<'_>, &GameEvent) -> Option<StateKind>;

/// One (event, states) → handler rule of a trigger.
#[derive(Clone, Debug)]
pub struct Clause {
    pub event: EventKey,
    pub states: Vec<StateKey>,
    pub handler: Handler,
}

/// Named, composable transition fragment.
#[derive(Clone, Debug)]
pub struct Trigger {
    pub name: String,
    pub clauses: Vec<Clause>,
}

impl Trigger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clauses: Vec::new(),
        }
    }

    pub fn on(
        mut self,
        event: EventKey,
        states: impl IntoIterator<Item = StateKey>,
        handler: Handler,
    ) -> Self {
        self.clauses.push(Clause {
            event,
            states: states.into_iter().collect(),
            handler,
        });
        self
    }
}

/// Names of the triggers shipped with the engine.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[strum(serialize_all = "camelCase")]
pub enum TriggerName {
    /// Idle characters go after anyone moving within view range.
    AttackOnRangeIfIdle,
    /// Idle characters strike back at whoever attacked them.
    AttackWhenAttackedAndIdle,
    /// Walking characters strike back at whoever attacked them.
    AttackWhenAttackedAndWalking,
    /// Walk directly away from anyone moving within view range.
    FleeOnSight,
    /// Wander off whenever anything happens while idle.
    Uneasy,
    /// Drop an attack whose target is gone.
    StopAttackingWhenResultIdle,
    /// Stop walking after bumping into something.
    IdleAfterCollision,
    /// Keep pursuing the target after bumping into something on the way.
    ResumeAttackAfterCollision,
    /// Projectiles strike whatever they hit, and die on walls.
    ProjectileImpact,
    /// Projectiles die once their blow is resolved.
    ProjectileSpent,
}

/// Triggers every projectile is built with.
pub const PROJECTILE_TRIGGERS: [TriggerName; 2] =
    [TriggerName::ProjectileImpact, TriggerName::ProjectileSpent];

/// Two-level lookup: event key → state key → ordered handlers.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    entries: BTreeMap<EventKey, BTreeMap<StateKey, Vec<Handler>>>,
}

impl TransitionTable {
    /// Handlers for `event` while in `action`.
    ///
    /// Rows are tried most specific first: a signal's own name, then the
    /// event kind, then the wildcard row. The first row with a cell for the
    /// action (or a wildcard cell) wins. Within a row the action's cell wins
    /// over the wildcard cell.
    pub fn handlers(&self, event: &GameEvent, action: Action) -> Option<&[Handler]> {
        event
            .keys()
            .iter()
            .filter_map(|key| self.entries.get(key))
            .find_map(|row| {
                row.get(&StateKey::Action(action))
                    .or_else(|| row.get(&StateKey::Any))
            })
            .map(Vec::as_slice)
    }

    /// Event keys an FSM using this table must subscribe to.
    pub fn event_keys(&self) -> impl Iterator<Item = EventKey> + '_ {
        self.entries.keys().cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn append(&mut self, clause: &Clause) {
        let row = self.entries.entry(clause.event.clone()).or_default();
        for state in &clause.states {
            row.entry(*state).or_default().push(clause.handler);
        }
    }
}

/// Per-engine catalogue of triggers, looked up by name.
#[derive(Clone, Debug, Default)]
pub struct TriggerRegistry {
    triggers: BTreeMap<String, Trigger>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in trigger.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for trigger in builtin::all() {
            registry.register(trigger);
        }
        registry
    }

    /// Adds or replaces a trigger under its name.
    pub fn register(&mut self, trigger: Trigger) {
        self.triggers.insert(trigger.name.clone(), trigger);
    }

    pub fn get(&self, name: &str) -> Option<&Trigger> {
        self.triggers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.triggers.keys().map(String::as_str)
    }

    /// Compiles the named triggers into one table.
    ///
    /// Names are merged in sorted order, so handler priority never depends on
    /// the order the caller listed them in. Duplicates are merged once.
    pub fn build_transition_table<S: AsRef<str>>(&self, names: &[S]) -> Result<TransitionTable> {
        let mut sorted: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut table = TransitionTable::default();
        for name in sorted {
            let trigger = self
                .get(name)
                .ok_or_else(|| CoreError::UnknownTrigger(name.to_owned()))?;
            for clause in &trigger.clauses {
                table.append(clause);
            }
        }
        Ok(table)
    }
}

mod builtin {
    use super::*;

    const UPDATES: EventKey = EventKey::Kind(EventKind::CharacterUpdate);
    const IDLE: StateKey = StateKey::Action(Action::Idle);
    const WALK: StateKey = StateKey::Action(Action::Walk);
    const BASIC_ATTACK: StateKey = StateKey::Action(Action::BasicAttack);
    const CONTINUOUS_ATTACK: StateKey = StateKey::Action(Action::ContinuousAttack);

    pub(super) fn all() -> Vec<Trigger> {
        vec![
            named(TriggerName::AttackOnRangeIfIdle).on(UPDATES, [IDLE], attack_on_sight),
            named(TriggerName::AttackWhenAttackedAndIdle).on(UPDATES, [IDLE], retaliate),
            named(TriggerName::AttackWhenAttackedAndWalking).on(UPDATES, [WALK], retaliate),
            named(TriggerName::FleeOnSight).on(UPDATES, [StateKey::Any], flee),
            named(TriggerName::Uneasy).on(EventKey::Any, [IDLE], wander),
            named(TriggerName::StopAttackingWhenResultIdle).on(
                UPDATES,
                [BASIC_ATTACK, CONTINUOUS_ATTACK],
                stop_attacking,
            ),
            named(TriggerName::IdleAfterCollision).on(UPDATES, [WALK], idle_after_collision),
            named(TriggerName::ResumeAttackAfterCollision).on(
                UPDATES,
                [BASIC_ATTACK, CONTINUOUS_ATTACK],
                resume_attack,
            ),
            named(TriggerName::ProjectileImpact).on(UPDATES, [WALK], projectile_impact),
            named(TriggerName::ProjectileSpent).on(UPDATES, [BASIC_ATTACK], projectile_spent),
        ]
    }

    fn named(name: TriggerName) -> Trigger {
        Trigger::new(name.to_string())
    }

    /// Update about the context's own character.
    fn own_update<'e>(ctx: &TriggerContext<'_>, event: &'e GameEvent) -> Option<&'e Update> {
        event
            .as_update()
            .filter(|update| update.character == ctx.character.id)
    }

    /// Someone else moving within view range.
    fn sighting<'e>(ctx: &TriggerContext<'_>, event: &'e GameEvent) -> Option<&'e Update> {
        let update = event.as_update()?;
        if update.character == ctx.character.id
            || !matches!(update.result, UpdateResult::Walk | UpdateResult::Collision)
        {
            return None;
        }
        let seen = update.position?;
        let here = ctx.character.position?;
        (here.distance(seen) <= ctx.character.view_range()).then_some(update)
    }

    fn attack_on_sight(ctx: &mut TriggerContext<'_>, event: &GameEvent) -> Option<StateKind> {
        let update = sighting(ctx, event)?;
        Some(StateKind::ContinuousAttack {
            target: update.character.clone(),
        })
    }

    fn retaliate(ctx: &mut TriggerContext<'_>, event: &GameEvent) -> Option<StateKind> {
        let update = own_update(ctx, event)?;
        if !update.result.is_attack_outcome() {
            return None;
        }
        let aggressor = update.aggressor.as_ref()?;
        (*aggressor != ctx.character.id).then(|| StateKind::BasicAttack {
            target: aggressor.clone(),
        })
    }

    fn flee(ctx: &mut TriggerContext<'_>, event: &GameEvent) -> Option<StateKind> {
        let update = sighting(ctx, event)?;
        let away = ctx.character.position? - update.position?;
        if away.norm() == 0.0 {
            return None;
        }
        Some(StateKind::Walk(Walk::towards(away.normalize())))
    }

    fn wander(ctx: &mut TriggerContext<'_>, _event: &GameEvent) -> Option<StateKind> {
        let here = ctx.character.position?;
        let x = ctx.rolls.unit();
        let heading = crate::math::Vector::new(x, 1.0 - x);
        Some(StateKind::Walk(Walk::to(
            here + heading * ctx.character.move_speed(),
        )))
    }

    fn stop_attacking(ctx: &mut TriggerContext<'_>, event: &GameEvent) -> Option<StateKind> {
        let update = own_update(ctx, event)?;
        (update.result == UpdateResult::Idle && update.action.is_attack()).then_some(StateKind::Idle)
    }

    fn idle_after_collision(ctx: &mut TriggerContext<'_>, event: &GameEvent) -> Option<StateKind> {
        let update = own_update(ctx, event)?;
        (update.result == UpdateResult::Collision).then_some(StateKind::Idle)
    }

    fn resume_attack(ctx: &mut TriggerContext<'_>, event: &GameEvent) -> Option<StateKind> {
        let update = own_update(ctx, event)?;
        (update.result == UpdateResult::Collision).then(|| ctx.state.kind.clone())
    }

    fn projectile_impact(ctx: &mut TriggerContext<'_>, event: &GameEvent) -> Option<StateKind> {
        let update = own_update(ctx, event)?;
        if update.result != UpdateResult::Collision {
            return None;
        }
        Some(match &update.collided_with {
            Some(target) => StateKind::BasicAttack {
                target: target.clone(),
            },
            None => StateKind::Die,
        })
    }

    fn projectile_spent(ctx: &mut TriggerContext<'_>, event: &GameEvent) -> Option<StateKind> {
        let update = event.as_update()?;
        let spent = update.aggressor.as_ref() == Some(&ctx.character.id)
            && (update.result.is_attack_outcome() || update.result == UpdateResult::Idle);
        spent.then_some(StateKind::Die)
    }
}
