//! Entity identifiers

slotmap::new_key_type! {
    /// Opaque entity identifier.
    ///
    /// Generational: once an entity is destroyed its slot may be reused, but the
    /// new id never compares equal to the old one.
    pub struct Entity;
}
