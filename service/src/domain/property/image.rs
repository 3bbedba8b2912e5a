//! [`Image`] definitions.

use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Property;
use crate::domain::{media, property};

/// Image of a [`Property`].
#[derive(Clone, Debug, Serialize)]
pub struct Image {
    /// ID of this [`Image`].
    pub id: Id,

    /// ID of the [`Property`] this [`Image`] belongs to.
    pub property_id: property::Id,

    /// Stored file of this [`Image`].
    pub file: media::Ref,

    /// [`Caption`] of this [`Image`], if any.
    pub caption: Option<Caption>,

    /// Indicator whether this [`Image`] represents its [`Property`] in
    /// listings.
    ///
    /// At most one [`Image`] of a [`Property`] is primary.
    pub is_primary: bool,

    /// Position of this [`Image`] in its [`Property`] gallery.
    pub order: Order,
}

impl Image {
    /// Sorts the provided [`Image`]s in gallery order: by [`Order`]
    /// ascending, primary first on equal [`Order`].
    pub fn arrange(images: &mut [Self]) {
        images.sort_by_key(|i| (i.order, !i.is_primary, i.id));
    }

    /// Picks the primary [`Image`] among the provided ones, falling back to
    /// the first one in gallery order.
    #[must_use]
    pub fn primary(images: &[Self]) -> Option<&Self> {
        images
            .iter()
            .find(|i| i.is_primary)
            .or_else(|| images.iter().min_by_key(|i| (i.order, i.id)))
    }

    /// Picks the [`Image`] to become primary once the primary one is removed
    /// from the provided `remaining` ones.
    ///
    /// [`None`] is returned if some of the `remaining` [`Image`]s is still
    /// primary, or there are none left.
    #[must_use]
    pub fn successor(remaining: &[Self]) -> Option<&Self> {
        if remaining.iter().any(|i| i.is_primary) {
            return None;
        }
        remaining.iter().min_by_key(|i| (i.order, i.id))
    }
}

/// ID of an [`Image`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Position of an [`Image`] in a gallery.
pub type Order = u16;

/// Caption of an [`Image`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Caption(String);

impl Caption {
    /// Creates a new [`Caption`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Caption`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        text.trim() == text && !text.is_empty() && text.chars().count() <= 200
    }
}

impl FromStr for Caption {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("invalid `Caption`")
    }
}

/// Placement of newly attached [`Image`]s after the existing ones.
///
/// The first attached [`Image`] becomes primary unless some existing one
/// already is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Placement {
    /// [`Order`] of the next attached [`Image`].
    next_order: Order,

    /// Indicator whether the next attached [`Image`] becomes primary.
    needs_primary: bool,
}

impl Placement {
    /// Creates a new [`Placement`] after the `existing` [`Image`]s.
    #[must_use]
    pub fn after(existing: &[Image]) -> Self {
        Self {
            next_order: existing
                .iter()
                .map(|i| i.order.saturating_add(1))
                .max()
                .unwrap_or(0),
            needs_primary: !existing.iter().any(|i| i.is_primary),
        }
    }

    /// Returns the `(is_primary, order)` of the next attached [`Image`] and
    /// advances this [`Placement`].
    pub fn place(&mut self) -> (bool, Order) {
        let placed = (self.needs_primary, self.next_order);
        self.needs_primary = false;
        self.next_order = self.next_order.saturating_add(1);
        placed
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::{media, property};

    use super::{Id, Image, Placement};

    fn image(order: u16, is_primary: bool) -> Image {
        Image {
            id: Id::new(),
            property_id: property::Id::default(),
            file: media::Ref::new(media::Namespace::Properties, "x.jpg")
                .unwrap(),
            caption: None,
            is_primary,
            order,
        }
    }

    #[test]
    fn first_of_fresh_gallery_becomes_primary() {
        let mut placement = Placement::after(&[]);

        assert_eq!(placement.place(), (true, 0));
        assert_eq!(placement.place(), (false, 1));
        assert_eq!(placement.place(), (false, 2));
    }

    #[test]
    fn appends_after_existing_primary() {
        let existing = [image(0, true), image(4, false)];
        let mut placement = Placement::after(&existing);

        assert_eq!(placement.place(), (false, 5));
    }

    #[test]
    fn restores_primary_when_missing() {
        let existing = [image(1, false)];
        let mut placement = Placement::after(&existing);

        assert_eq!(placement.place(), (true, 2));
    }

    #[test]
    fn successor_is_next_by_order() {
        let remaining = [image(3, false), image(1, false), image(2, false)];
        assert_eq!(Image::successor(&remaining).unwrap().order, 1);

        let remaining = [image(3, false), image(1, true)];
        assert!(Image::successor(&remaining).is_none());

        assert!(Image::successor(&[]).is_none());
    }

    #[test]
    fn arranges_by_order_then_primary() {
        let mut images = vec![image(2, false), image(0, false), image(0, true)];
        Image::arrange(&mut images);

        assert_eq!(
            images.iter().map(|i| (i.order, i.is_primary)).collect::<Vec<_>>(),
            vec![(0, true), (0, false), (2, false)],
        );
    }
}
