//! Per-character state machine.
//!
//! An [`Fsm`] holds the character's current [`State`] and at most one staged
//! successor. Events stage successors through the transition table; ticks
//! commit them once the current state has run its course. Players add a
//! queue of intents that pre-empts everything else once they are spawned.

use std::collections::VecDeque;

use crate::character::Character;
use crate::dice::RollSource;
use crate::events::{EventKey, GameEvent};
use crate::state::{State, StateFactory};
use crate::transitions::{TransitionTable, TriggerContext};
use crate::types::{CharacterId, Timestamp};

/// Where an FSM's next state comes from besides its triggers.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum IntentStrategy {
    /// Purely trigger driven.
    #[default]
    Autonomous,
    /// Queued player intents, consumed one per elapsed state.
    PlayerQueue(VecDeque<State>),
}

#[derive(Clone, Debug)]
pub struct Fsm {
    character: CharacterId,
    state: State,
    next_state: Option<State>,
    table: TransitionTable,
    intents: IntentStrategy,
}

impl Fsm {
    pub fn new(initial: State, table: TransitionTable, intents: IntentStrategy) -> Self {
        Self {
            character: initial.owner.clone(),
            state: initial,
            next_state: None,
            table,
            intents,
        }
    }

    pub fn character(&self) -> &CharacterId {
        &self.character
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Successor proposed by the latest event, if any.
    pub fn staged(&self) -> Option<&State> {
        self.next_state.as_ref()
    }

    /// Event keys the owning engine must route to this FSM.
    pub fn subscriptions(&self) -> Vec<EventKey> {
        self.table.event_keys().collect()
    }

    pub fn accepts_intents(&self) -> bool {
        matches!(self.intents, IntentStrategy::PlayerQueue(_))
    }

    pub fn pending_intents(&self) -> usize {
        match &self.intents {
            IntentStrategy::PlayerQueue(queue) => queue.len(),
            IntentStrategy::Autonomous => 0,
        }
    }

    /// Queues a player intent. Returns `false` for autonomous FSMs.
    pub fn queue_intent(&mut self, state: State) -> bool {
        match &mut self.intents {
            IntentStrategy::PlayerQueue(queue) => {
                queue.push_back(state);
                true
            }
            IntentStrategy::Autonomous => false,
        }
    }

    /// Runs the table's handlers for `event` and stages the first proposal.
    ///
    /// A later proposal replaces an earlier one that has not been committed
    /// yet. Returns whether something was staged.
    pub fn handle_event(
        &mut self,
        character: &Character,
        event: &GameEvent,
        factory: &mut StateFactory,
        rolls: &mut dyn RollSource,
    ) -> bool {
        let Some(handlers) = self.table.handlers(event, self.state.action()) else {
            tracing::debug!(
                character = %self.character,
                event = %event.kind(),
                action = %self.state.action(),
                "event dropped: no transition"
            );
            return false;
        };
        let mut ctx = TriggerContext {
            character,
            state: &self.state,
            rolls,
        };
        let Some(kind) = handlers.iter().find_map(|handler| handler(&mut ctx, event)) else {
            return false;
        };
        self.next_state = Some(factory.build(kind, self.character.clone()));
        true
    }

    /// Advances the machine to `now`.
    ///
    /// Returns `true` when a state became active this tick and must be
    /// executed. A freshly installed state activates on its first tick; after
    /// that the machine only moves on once the current state has elapsed.
    pub fn tick(
        &mut self,
        now: Timestamp,
        character: Option<&Character>,
        factory: &mut StateFactory,
    ) -> bool {
        if self.state.start.is_none() {
            self.state.start = Some(now);
            return true;
        }
        if !self.state.is_elapsed(now) {
            return false;
        }

        if let IntentStrategy::PlayerQueue(queue) = &mut self.intents
            && character.is_some_and(Character::is_spawned)
            && let Some(intent) = queue.pop_front()
        {
            self.next_state = None;
            self.commit(intent, now);
            return true;
        }

        let next = self.next_state.take().or_else(|| {
            character.and_then(|character| factory.next(&self.state, character))
        });
        match next {
            Some(next) => {
                self.commit(next, now);
                true
            }
            None => false,
        }
    }

    fn commit(&mut self, mut state: State, now: Timestamp) {
        state.start = Some(now);
        self.state = state;
    }
}
