//! [`Query`] collection related to a single [`Agent`].

use common::operations::By;

use crate::{
    domain::{agent, user, Agent},
    read,
};
#[cfg(doc)]
use crate::{domain::User, Query};

use super::DatabaseQuery;

/// Queries an [`Agent`] by its [`agent::Id`].
pub type ById = DatabaseQuery<By<Option<Agent>, agent::Id>>;

/// Queries an [`Agent`] by the [`user::Id`] of its [`User`].
pub type ByUser = DatabaseQuery<By<Option<Agent>, user::Id>>;

/// Queries listing [`read::agent::Stats`] of an [`Agent`].
pub type Stats = DatabaseQuery<By<read::agent::Stats, agent::Id>>;
