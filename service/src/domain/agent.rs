//! [`Agent`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::{media, user};

/// Real estate agent listing [`Property`]s.
///
/// An [`Agent`] can manage listings only once authorized by a site
/// administrator.
///
/// [`Property`]: crate::domain::Property
#[derive(Clone, Debug, Serialize)]
pub struct Agent {
    /// ID of this [`Agent`].
    pub id: Id,

    /// ID of the [`User`] backing this [`Agent`].
    pub user_id: user::Id,

    /// Contact [`user::Phone`] of this [`Agent`].
    pub phone: user::Phone,

    /// [`Bio`] of this [`Agent`], if any.
    pub bio: Option<Bio>,

    /// Photo of this [`Agent`], if any.
    pub photo: Option<media::Ref>,

    /// [`Specialization`] of this [`Agent`], if any.
    pub specialization: Option<Specialization>,

    /// Indicator whether this [`Agent`] is allowed to manage listings.
    pub is_authorized: bool,

    /// [`DateTime`] when this [`Agent`] was created.
    pub created_at: CreationDateTime,
}

/// ID of an [`Agent`].
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

/// Free-form biography of an [`Agent`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Bio(String);

impl Bio {
    /// Creates a new [`Bio`] if the given `text` is not blank.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty()).then_some(Self(text))
    }
}

impl FromStr for Bio {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("empty `Bio`")
    }
}

/// Area of expertise of an [`Agent`], e.g. "Residential".
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Specialization(String);

impl Specialization {
    /// Creates a new [`Specialization`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Specialization`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        text.trim() == text && !text.is_empty() && text.chars().count() <= 100
    }
}

impl FromStr for Specialization {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("invalid `Specialization`")
    }
}

/// [`DateTime`] when an [`Agent`] was created.
pub type CreationDateTime = DateTimeOf<(Agent, unit::Creation)>;
