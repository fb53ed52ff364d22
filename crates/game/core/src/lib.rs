//! Deterministic rules engine for the soul-enchantment board game.
//!
//! `soulchess-core` is the canonical rules crate: board geometry, card data
//! types, the action/guard/reducer pipeline, and the shot-plan combat
//! resolver. Every public operation is a pure function of
//! `(state, env, action)`; hosts (servers, UIs, bots) depend on the types
//! re-exported here and never mutate state directly.

pub mod action;
pub mod board;
pub mod catalog;
pub mod env;
pub mod error;
pub mod event;
pub mod guards;
pub mod preview;
pub mod reducer;
pub mod rng;
pub mod rules;
pub mod state;
pub mod stats;

pub use action::Action;
pub use board::{BOARD_HEIGHT, BOARD_WIDTH, PieceBase, Pos, Side, has_crossed_river, in_palace};
pub use catalog::{
    Ability, AbilityCondition, AbilityKind, AuraGate, Catalog, ItemCard, ItemEffect, ItemTiming,
    PerCorpses, PierceMode, SacrificeTarget, SoldierTier, SoulCard,
};
pub use env::GameEnv;
pub use guards::can_dispatch;
pub use error::{DataError, EngineError, Reject};
pub use event::Event;
pub use preview::{PreviewHit, ShotPreview, build_shot_preview, shootable_target_ids};
pub use reducer::{Transition, reduce};
pub use rng::{RngMode, RngState, create_rng_state};
pub use rules::movement::legal_moves;
pub use rules::shot_plan::{InstanceKind, ShotInstance, ShotOutcome, ShotPlan, build_shot_plan};
pub use state::{
    CorpseEntry, Enchant, GameState, Hand, ITEM_DISPLAY_SLOTS, PerSide, Resources, RulesConfig,
    StatusState, TurnFlags, TurnPhase, TurnState, Unit, UnitId, create_initial_state,
};
pub use stats::{AttackKey, AttackStat, DefStat, UnitStats};
