//! Photo identifier generation.
//!
//! Identifiers must be collision-resistant enough that no uniqueness check
//! against the store is needed.  The generator sits behind a trait so tests
//! can substitute deterministic ids.

/// Source of unique photo identifiers.
pub trait IdGenerator: Send + Sync + 'static {
    /// Produce a new identifier, unique with negligible collision probability.
    fn generate(&self) -> String;
}

/// Default generator: random UUID v4 (122 bits of entropy), rendered in the
/// standard 36-character hyphenated form.
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_36_chars() {
        let id = UuidGenerator.generate();
        assert_eq!(id.len(), 36);
        assert_eq!(id.matches('-').count(), 4);
    }

    #[test]
    fn uuid_ids_are_distinct() {
        let a = UuidGenerator.generate();
        let b = UuidGenerator.generate();
        assert_ne!(a, b);
    }
}
