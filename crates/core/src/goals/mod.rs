//! Goals module - reading goal models, transition rules, services, and traits.

mod goals_model;
mod goals_service;
mod goals_state_machine;
mod goals_traits;


pub use goals_model::{Goal, GoalStatus, NewReadingGoal, SweepReport, TransitionDecision};
pub use goals_service::{CompletedGoalPolicy, GoalProgressConfig, GoalProgressService};
pub use goals_state_machine::{
    apply_recomputed_progress, bonus_for, decide_reversal, decide_transition,
};
pub use goals_traits::{
    GoalProgressServiceTrait, GoalRepositoryTrait, GoalUnitOfWork, GoalWork,
};
