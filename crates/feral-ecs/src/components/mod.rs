pub mod archetype;
pub mod behavior;
pub mod collision;
pub mod fsm;
pub mod lifecycle;
pub mod steering;
pub mod targets;
pub mod transforms;

/// Components that advance their own timers once per simulation tick.
pub trait Tick {
    fn on_tick(&mut self, dt: feral_core::Dt);
}
