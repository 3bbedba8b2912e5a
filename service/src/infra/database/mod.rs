//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// Name of the unique constraint over [`User`] logins.
///
/// [`User`]: crate::domain::User
pub const USERS_LOGIN_KEY: &str = "users_login_key";

/// Name of the unique constraint allowing a single [`Agent`] per [`User`].
///
/// [`Agent`]: crate::domain::Agent
/// [`User`]: crate::domain::User
pub const AGENTS_USER_KEY: &str = "agents_user_id_key";

/// Name of the unique constraint allowing a single [`Company`] only.
///
/// [`Company`]: crate::domain::Company
pub const COMPANIES_SINGLETON_KEY: &str = "companies_singleton_key";

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(any(test, feature = "memory"))]
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match *self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(ref e) => e.is_unique_violation(constraint),
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unique_violation(constraint),
        }
    }
}
