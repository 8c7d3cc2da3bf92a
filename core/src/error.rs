use thiserror::Error;

/// World-breaking fault that leaves the simulation in an inconsistent state.
///
/// Callers are expected to propagate it and end the current session rather
/// than continue ticking.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MajorIssue {
    /// A room with the same name was generated twice.
    #[error("room `{room}` has already been generated")]
    DuplicateRoom {
        /// Name of the offending room.
        room: String,
    },
    /// A room required to continue could not be generated.
    #[error("room `{room}` could not be generated")]
    UnknownRoom {
        /// Name of the missing room.
        room: String,
    },
    /// An entity requested a sprite sheet that was never loaded.
    #[error("sprite sheet `{sheet}` required by `{entity}` is not loaded")]
    MissingSheet {
        /// Name of the entity being created.
        entity: String,
        /// Name of the missing sheet.
        sheet: String,
    },
    /// A loaded sheet lacks the animation an entity falls back to.
    #[error("sheet `{sheet}` has no `{animation}` animation")]
    MissingAnimation {
        /// Name of the sheet that was searched.
        sheet: String,
        /// Name of the missing animation.
        animation: String,
    },
    /// Two skill definitions share a name.
    #[error("skill `{skill}` is already registered")]
    DuplicateSkill {
        /// Name of the duplicated skill.
        skill: String,
    },
}
