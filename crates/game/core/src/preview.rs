//! Non-committing shot projections for UI and bots.
//!
//! Previews go through the same plan builder as live shots, so a target
//! reported shootable here is guaranteed to be accepted by the reducer
//! against the same snapshot. Predicted amounts are raw per-instance damage
//! at the configured fixed die value (splash mirroring the direct hit, as
//! at execution); sharing, guards, and invincibility resolve only at
//! execution time.

use crate::env::GameEnv;
use crate::error::Reject;
use crate::rules::damage;
use crate::rules::shooting;
use crate::rules::shot_plan::{self, InstanceKind};
use crate::state::{GameState, UnitId};

/// One projected damage instance.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewHit {
    pub kind: InstanceKind,
    pub source: UnitId,
    pub target: UnitId,
    pub amount: i32,
}

/// Projection of what a shot would do, in resolution order.
#[derive(Clone, Debug, PartialEq)]
pub struct ShotPreview {
    pub attacker: UnitId,
    pub target: UnitId,
    pub mana_cost: i32,
    /// The die value the amounts assume.
    pub dice_assumed: u32,
    pub hits: Vec<PreviewHit>,
}

/// Every enemy the unit could legally shoot right now, ascending id order.
pub fn shootable_target_ids(
    state: &GameState,
    env: &GameEnv<'_>,
    attacker_id: &UnitId,
) -> Vec<UnitId> {
    let Some(attacker) = state.unit(attacker_id) else {
        return Vec::new();
    };
    state
        .units_of_side(attacker.side.opponent())
        .filter(|enemy| {
            shot_plan::build_shot_plan(state, env, attacker_id, &enemy.id, None).is_ok()
        })
        .map(|enemy| enemy.id.clone())
        .collect()
}

/// Builds a projection of the given shot without touching state.
pub fn build_shot_preview(
    state: &GameState,
    env: &GameEnv<'_>,
    attacker_id: &UnitId,
    target_id: &UnitId,
    extra_target: Option<&UnitId>,
) -> Result<ShotPreview, Reject> {
    let plan = shot_plan::build_shot_plan(state, env, attacker_id, target_id, extra_target)?;
    let dice = state.rules.dice_fixed;
    let mut direct_raw: Option<i32> = None;
    let mut hits = Vec::new();
    for inst in plan.ordered_instances() {
        let Some(source) = state.unit(&inst.source) else {
            continue;
        };
        let Some(target) = state.unit(&inst.target) else {
            continue;
        };
        // Splash mirrors the direct hit's amount, like the executor.
        let amount = match (inst.fixed_damage, inst.kind) {
            (Some(fixed), _) => fixed,
            (None, InstanceKind::Splash) => direct_raw
                .unwrap_or_else(|| damage::compute_raw_damage(state, env, source, target, dice)),
            (None, _) => damage::compute_raw_damage(state, env, source, target, dice),
        };
        if inst.kind == InstanceKind::Direct {
            direct_raw = Some(amount);
        }
        hits.push(PreviewHit {
            kind: inst.kind,
            source: inst.source.clone(),
            target: inst.target.clone(),
            amount,
        });
    }
    Ok(ShotPreview {
        attacker: attacker_id.clone(),
        target: target_id.clone(),
        mana_cost: shooting::effective_shoot_cost(state, &plan.shoot_rules, attacker_id),
        dice_assumed: dice,
        hits,
    })
}
