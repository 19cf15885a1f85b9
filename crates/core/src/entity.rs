//! Records with a stable identity.

/// A stored record addressed by a typed id.
///
/// Storage backends key their tables by [`Entity::id`].
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}
