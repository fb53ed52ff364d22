//! The rules interpreter: movement, shooting legality, ability effects,
//! damage, and shot-plan execution.

pub mod damage;
pub mod effects;
pub mod movement;
pub mod shooting;
pub mod shot_plan;
