use crate::Component;
use feral_core::Dt;
use log::trace;

/// Trait that state identifiers must implement.
///
/// This trait allows users to define their own phase enums while ensuring
/// they work properly with the [`PhaseMachine`].
pub trait StateIdentifier:
    std::fmt::Debug
    + std::fmt::Display
    + Clone
    + Copy
    + std::hash::Hash
    + Eq
    + Send
    + Sync
    + 'static
{
    /// Convert to string for logging and debugging purposes.
    ///
    /// # Returns
    ///
    /// A static string representation of the state identifier.
    fn as_str(&self) -> &'static str;

    /// Whether the machine can never leave this state once entered.
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Canonical phases every creature archetype reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorPhase {
    /// Standing still between patrol legs.
    Idle,
    /// Walking between waypoints, no target.
    Patrol,
    /// Chasing an acquired target.
    Pursue,
    /// Circling the target, waiting for an opening.
    Engage,
    /// Committed strike window.
    Attack,
    /// Backing away after a strike.
    Disengage,
    /// Terminal.
    Dead,
}

impl BehaviorPhase {
    /// Whether the phase is part of a fight with a target.
    pub fn is_combat(&self) -> bool {
        matches!(
            self,
            BehaviorPhase::Pursue
                | BehaviorPhase::Engage
                | BehaviorPhase::Attack
                | BehaviorPhase::Disengage
        )
    }
}

impl StateIdentifier for BehaviorPhase {
    fn as_str(&self) -> &'static str {
        match self {
            BehaviorPhase::Idle => "idle",
            BehaviorPhase::Patrol => "patrol",
            BehaviorPhase::Pursue => "pursue",
            BehaviorPhase::Engage => "engage",
            BehaviorPhase::Attack => "attack",
            BehaviorPhase::Disengage => "disengage",
            BehaviorPhase::Dead => "dead",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, BehaviorPhase::Dead)
    }
}

impl std::fmt::Display for BehaviorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Flat finite state machine tracking the active phase and how long it has lasted.
///
/// The machine holds no per-phase logic. The owner decides transitions and
/// calls [`PhaseMachine::transition_to`]; the machine enforces the timer reset
/// and terminal state rules.
#[derive(Debug, Clone)]
pub struct PhaseMachine<S: StateIdentifier> {
    /// Current active phase.
    current: S,
    /// Previously active phase.
    previous: Option<S>,
    /// Seconds spent in the current phase.
    time_in_state: f32,
    /// Number of transitions taken since creation.
    transitions: u32,
    /// Whether the machine is currently enabled.
    enabled: bool,
}

impl<S: StateIdentifier> PhaseMachine<S> {
    /// Creates a new machine in its initial phase.
    ///
    /// # Arguments
    ///
    /// * `initial` - The phase to start in.
    ///
    /// # Returns
    ///
    /// A new [`PhaseMachine`] instance.
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            previous: None,
            time_in_state: 0.0,
            transitions: 0,
            enabled: true,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    /// Seconds elapsed since the current phase was entered.
    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn transition_count(&self) -> u32 {
        self.transitions
    }

    /// Moves to a new phase and resets the phase timer.
    ///
    /// Re-entering the current phase is allowed and restarts its timer.
    ///
    /// # Arguments
    ///
    /// * `next` - The phase to enter.
    ///
    /// # Returns
    ///
    /// `false` if the machine is in a terminal phase and refused to move.
    pub fn transition_to(&mut self, next: S) -> bool {
        if self.current.is_terminal() {
            return false;
        }

        trace!("Phase {} -> {} after {:.2}s", self.current, next, self.time_in_state);
        self.previous = Some(self.current);
        self.current = next;
        self.time_in_state = 0.0;
        self.transitions += 1;
        true
    }

    /// Restarts the current phase timer without changing phase.
    pub fn reset_timer(&mut self) {
        self.time_in_state = 0.0;
    }

    /// Advances the phase timer.
    ///
    /// # Arguments
    ///
    /// * `dt` - The duration since the last tick.
    pub fn tick(&mut self, dt: Dt) {
        if !self.enabled {
            return;
        }
        self.time_in_state += dt.as_secs_f32();
    }

    /// Enable or disable the machine. A disabled machine keeps its phase but stops its timer.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the current phase is terminal.
    pub fn is_finished(&self) -> bool {
        self.current.is_terminal()
    }
}

// Manual Component implementation for generic machine.
impl<S: StateIdentifier> Component for PhaseMachine<S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_machine_creation() {
        let machine = PhaseMachine::new(BehaviorPhase::Patrol);
        assert_eq!(machine.current(), BehaviorPhase::Patrol);
        assert_eq!(machine.previous(), None);
        assert_eq!(machine.time_in_state(), 0.0);
        assert!(machine.is_enabled());
    }

    #[test]
    fn test_transition_resets_timer() {
        let mut machine = PhaseMachine::new(BehaviorPhase::Patrol);
        machine.tick(Duration::from_millis(500));
        assert!((machine.time_in_state() - 0.5).abs() < 1e-6);

        assert!(machine.transition_to(BehaviorPhase::Pursue));
        assert_eq!(machine.time_in_state(), 0.0);
        assert_eq!(machine.previous(), Some(BehaviorPhase::Patrol));
        assert_eq!(machine.transition_count(), 1);
    }

    #[test]
    fn test_self_transition_restarts_timer() {
        let mut machine = PhaseMachine::new(BehaviorPhase::Attack);
        machine.tick(Duration::from_secs(1));
        assert!(machine.transition_to(BehaviorPhase::Attack));
        assert_eq!(machine.time_in_state(), 0.0);
        assert_eq!(machine.previous(), Some(BehaviorPhase::Attack));
    }

    #[test]
    fn test_terminal_phase_is_final() {
        let mut machine = PhaseMachine::new(BehaviorPhase::Engage);
        assert!(machine.transition_to(BehaviorPhase::Dead));
        assert!(machine.is_finished());

        assert!(!machine.transition_to(BehaviorPhase::Patrol));
        assert!(!machine.transition_to(BehaviorPhase::Dead));
        assert_eq!(machine.current(), BehaviorPhase::Dead);
        assert_eq!(machine.transition_count(), 1);
    }

    #[test]
    fn test_disabled_machine_keeps_time() {
        let mut machine = PhaseMachine::new(BehaviorPhase::Idle);
        machine.set_enabled(false);
        machine.tick(Duration::from_secs(2));
        assert_eq!(machine.time_in_state(), 0.0);

        machine.set_enabled(true);
        machine.tick(Duration::from_secs(2));
        assert!((machine.time_in_state() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_timer_keeps_phase() {
        let mut machine = PhaseMachine::new(BehaviorPhase::Patrol);
        machine.tick(Duration::from_secs(3));
        machine.reset_timer();
        assert_eq!(machine.current(), BehaviorPhase::Patrol);
        assert_eq!(machine.time_in_state(), 0.0);
        assert_eq!(machine.transition_count(), 0);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(BehaviorPhase::Disengage.to_string(), "disengage");
        assert!(BehaviorPhase::Attack.is_combat());
        assert!(!BehaviorPhase::Idle.is_combat());
    }
}
