//! [`Query`] collection related to multiple [`Agent`]s.

use common::operations::By;

use crate::{domain::Agent, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries all the [`Agent`]s, oldest first.
pub type All = DatabaseQuery<By<Vec<Agent>, read::agent::All>>;
