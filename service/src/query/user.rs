//! [`Query`] collection related to [`User`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::domain::{user, User};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

/// Queries [`User`]s by their [`user::Id`]s, at once for a whole page of
/// agents.
///
/// Missing [`User`]s are omitted.
pub type ByIds = DatabaseQuery<By<HashMap<user::Id, User>, Vec<user::Id>>>;
