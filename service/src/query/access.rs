//! [`Query`] collection related to access control.

use common::operations::By;

use crate::domain::{access::Role, Actor};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries the current [`Role`] of an [`Actor`].
pub type RoleOf = DatabaseQuery<By<Role, Actor>>;
