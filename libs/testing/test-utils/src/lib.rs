//! Shared test utilities for the accounts workspace
//!
//! - `TestDatabase`: PostgreSQL container with the real migrations applied (feature: "postgres")
//! - `TestDataBuilder`: deterministic, collision-free test data
//! - `assertions`: assertion helpers with readable failure messages
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! #[ignore] // needs Docker
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let data = TestDataBuilder::from_test_name("my_postgres_test");
//!
//!     let login = data.login("owner");
//!     let email = data.email("owner");
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Builder for test data with deterministic randomization.
///
/// Values derive from a seed, so the same test always produces the same
/// logins while different tests never collide on the shared unique index.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name; the recommended constructor.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let data = TestDataBuilder::from_test_name("test_create_user");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// A display name, e.g. `Test owner 1234`.
    pub fn name(&self, suffix: &str) -> String {
        format!("Test {} {}", suffix, self.seed)
    }

    /// A login that is unique per (test, suffix), e.g. `t1234-owner`.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let data = TestDataBuilder::new(7);
    /// assert_eq!(data.login("owner"), "t7-owner");
    /// ```
    pub fn login(&self, suffix: &str) -> String {
        format!("t{}-{}", self.seed, suffix)
    }

    pub fn email(&self, suffix: &str) -> String {
        format!("{}@example.com", self.login(suffix))
    }
}

/// Test assertion helpers
pub mod assertions {
    use std::fmt::Debug;

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that a result is Ok and return the value
    pub fn assert_ok<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
        result.unwrap_or_else(|e| panic!("{}: expected Ok, got Err({:?})", context, e))
    }

    /// Assert that `items` holds exactly `expected` entries
    pub fn assert_len<T: Debug>(items: &[T], expected: usize, context: &str) {
        assert_eq!(
            items.len(),
            expected,
            "{}: expected {} items, got {:?}",
            context,
            expected,
            items
        );
    }
}
