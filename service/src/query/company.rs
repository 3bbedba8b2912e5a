//! [`Query`] collection related to the [`Company`].

use common::operations::By;

use crate::domain::{company, Company};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries the only [`Company`], if it exists.
pub type Singleton = DatabaseQuery<By<Option<Company>, company::Singleton>>;
