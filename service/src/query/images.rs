//! [`Query`] collection related to [`Image`]s of multiple [`Property`]s.

use std::collections::HashMap;

use common::operations::By;

use crate::domain::property::{self, Image};
#[cfg(doc)]
use crate::{domain::Property, Query};

use super::DatabaseQuery;

/// Queries [`Image`]s of the [`Property`]s with the provided
/// [`property::Id`]s, each in gallery order.
///
/// [`Property`]s without any [`Image`] are omitted.
pub type ByProperties =
    DatabaseQuery<By<HashMap<property::Id, Vec<Image>>, Vec<property::Id>>>;
