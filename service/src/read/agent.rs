//! [`Agent`]-related read definitions.

use serde::Serialize;

#[cfg(doc)]
use crate::domain::{Agent, Property};

/// Selector of all the [`Agent`]s, oldest first.
#[derive(Clone, Copy, Debug, Default)]
pub struct All;

/// Numbers of [`Property`] listings of an [`Agent`] by their status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Stats {
    /// Number of available listings.
    pub available: u32,

    /// Number of listings with a pending deal.
    pub pending: u32,

    /// Number of sold listings.
    pub sold: u32,
}

impl Stats {
    /// Returns the total number of listings.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.available + self.pending + self.sold
    }
}
