//! [`Query`] collection related to a single [`Property`].

use common::operations::By;

use crate::domain::{
    property::{self, image, Image},
    Property,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Property`] by its [`property::Id`].
pub type ById = DatabaseQuery<By<Option<Property>, property::Id>>;

/// Queries [`Image`]s of a [`Property`] in gallery order.
pub type Images = DatabaseQuery<By<Vec<Image>, property::Id>>;

/// Queries an [`Image`] by its [`image::Id`].
pub type ImageById = DatabaseQuery<By<Option<Image>, image::Id>>;
