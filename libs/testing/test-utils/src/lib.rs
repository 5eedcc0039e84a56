//! Shared test utilities for the domain crates
//!
//! - `TestDatabase`: PostgreSQL container with migrations applied (feature `postgres`)
//! - [`TestDataBuilder`]: deterministic event titles and image payloads
//! - [`assertions`]: assertion helpers
//!
//! Container-backed tests need a Docker daemon and are marked `#[ignore]`;
//! run them with `cargo test -- --ignored`.
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_postgres_test");
//!
//!     let title = builder.title("launch");
//!     let png = builder.image_bytes(0);
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Seeded generator so each test gets stable, non-colliding data
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_event");
    /// assert!(builder.title("main").contains("main"));
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// `test-<prefix>-<seed>-<suffix>`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    pub fn title(&self, suffix: &str) -> String {
        self.name("event", suffix)
    }

    /// Deterministic bytes for the `index`-th image of a test, starting with
    /// the PNG signature
    pub fn image_bytes(&self, index: u8) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&self.seed.to_le_bytes());
        bytes.push(index);
        bytes
    }
}

pub mod assertions {
    use uuid::Uuid;

    pub fn assert_uuid_eq(actual: Uuid, expected: Uuid, context: &str) {
        assert_eq!(
            actual, expected,
            "{}: expected UUID {}, got {}",
            context, expected, actual
        );
    }

    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert every item is distinct
    pub fn assert_all_distinct<T: PartialEq + std::fmt::Debug>(items: &[T], context: &str) {
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                assert_ne!(a, b, "{}: duplicate value", context);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.title("launch"), builder2.title("launch"));
        assert_eq!(builder1.image_bytes(3), builder2.image_bytes(3));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.title("main"), builder2.title("main"));
    }

    #[test]
    fn test_image_bytes_vary_by_index() {
        let builder = TestDataBuilder::new(7);

        assert!(builder.image_bytes(0).starts_with(&[0x89, b'P', b'N', b'G']));
        assert_ne!(builder.image_bytes(0), builder.image_bytes(1));
    }

    #[test]
    #[should_panic(expected = "duplicate value")]
    fn test_assert_all_distinct_panics_on_duplicates() {
        assertions::assert_all_distinct(&["a", "b", "a"], "paths");
    }
}
