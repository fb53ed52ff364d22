//! Two-channel error model.
//!
//! [`Reject`] is the expected, recoverable channel: guard and reducer
//! validation failures that are a normal part of interactive play. Its
//! `Display` strings are stable and surfaced verbatim to callers; several
//! are asserted by tests, so changing them is a breaking change.
//!
//! [`DataError`] is the hard-failure channel: missing catalog entries or
//! corrupt state invariants. These indicate a bug in state construction or
//! catalog data, not a player mistake, and are not recoverable mid-match.

/// Caller-facing validation failure. Cheap and side-effect-free to produce;
/// rejected actions leave state completely unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Reject {
    #[error("Wrong phase")]
    WrongPhase,
    #[error("Not your unit")]
    NotYourUnit,
    #[error("Not an enemy")]
    NotAnEnemy,
    #[error("Unit not found")]
    UnitNotFound,
    #[error("Out of range")]
    OutOfRange,
    #[error("Blocked")]
    Blocked,
    #[error("Need screen")]
    NeedScreen,
    #[error("Not enough mana")]
    NotEnoughMana,
    #[error("Not enough gold")]
    NotEnoughGold,
    #[error("Already shot this turn")]
    AlreadyShot,
    #[error("Already moved this turn")]
    AlreadyMoved,
    #[error("Illegal move")]
    IllegalMove,
    #[error("Soul hand full ({0})")]
    SoulHandFull(u32),
    #[error("Item hand full ({0})")]
    ItemHandFull(u32),
    #[error("No card in display")]
    NoCardInDisplay,
    #[error("No item in display")]
    NoItemInDisplay,
    #[error("Deck is empty")]
    DeckEmpty,
    #[error("Already bought a soul this turn")]
    SoulAlreadyBought,
    #[error("No necro actions left")]
    NoNecroActions,
    #[error("Blood ritual already used")]
    BloodRitualUsed,
    #[error("King HP too low")]
    KingHpTooLow,
    #[error("No corpse there")]
    NoCorpse,
    #[error("Soul not in hand")]
    SoulNotInHand,
    #[error("Item not in hand")]
    ItemNotInHand,
    #[error("Not in enemy graveyard")]
    NotInEnemyGraveyard,
    #[error("Base mismatch")]
    BaseMismatch,
    #[error("Position occupied")]
    PositionOccupied,
    #[error("Wrong timing")]
    WrongTiming,
    #[error("No sacrifice ability")]
    NoSacrificeAbility,
    #[error("Invalid target")]
    InvalidTarget,
    #[error("Unknown card")]
    UnknownCard,
}

/// Programmer/data fault. Reaching one of these mid-match means the state or
/// catalog was built wrong.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("unknown soul card `{0}`")]
    UnknownSoulCard(String),
    #[error("unknown item card `{0}`")]
    UnknownItemCard(String),
    #[error("corrupt state: {0}")]
    CorruptState(&'static str),
}

/// Combined failure type returned by the reducer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Reject(#[from] Reject),
    #[error(transparent)]
    Data(#[from] DataError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(Reject::SoulHandFull(5).to_string(), "Soul hand full (5)");
        assert_eq!(Reject::ItemHandFull(3).to_string(), "Item hand full (3)");
        assert_eq!(Reject::NoItemInDisplay.to_string(), "No item in display");
        assert_eq!(Reject::Blocked.to_string(), "Blocked");
        assert_eq!(Reject::NeedScreen.to_string(), "Need screen");
        assert_eq!(Reject::OutOfRange.to_string(), "Out of range");
        assert_eq!(Reject::AlreadyShot.to_string(), "Already shot this turn");
        assert_eq!(Reject::NotEnoughMana.to_string(), "Not enough mana");
    }
}
