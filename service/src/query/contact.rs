//! [`Query`] collection related to a single [`Contact`].

use common::operations::By;

use crate::domain::{contact, Contact};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Contact`] by its [`contact::Id`].
pub type ById = DatabaseQuery<By<Option<Contact>, contact::Id>>;
