//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// Used for comments: ULIDs sort by creation time, which keeps the
    /// `(created_at, id)` ordering stable when timestamps collide.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a new random UUID v4, used for poll IDs.
    #[must_use]
    pub fn generate_uuid_v4(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
