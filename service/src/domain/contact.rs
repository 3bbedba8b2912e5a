//! [`Contact`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Property;
use crate::domain::{property, user};

/// Inquiry submitted by a site visitor, optionally about a [`Property`].
///
/// Only its [`Contact::responded`] flag changes once created.
#[derive(Clone, Debug, Serialize)]
pub struct Contact {
    /// ID of this [`Contact`].
    pub id: Id,

    /// [`Name`] of the inquirer.
    pub name: Name,

    /// [`user::Email`] to reply to.
    pub email: user::Email,

    /// [`user::Phone`] of the inquirer, if provided.
    pub phone: Option<user::Phone>,

    /// [`Message`] of this [`Contact`].
    pub message: Message,

    /// ID of the [`Property`] this [`Contact`] is about, if any.
    ///
    /// Becomes [`None`] once the [`Property`] is removed.
    pub property_id: Option<property::Id>,

    /// Indicator whether this [`Contact`] has been responded to.
    pub responded: bool,

    /// [`DateTime`] when this [`Contact`] was submitted.
    pub created_at: CreationDateTime,
}

/// ID of a [`Contact`].
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
    PartialEq,
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

/// Name of an inquirer.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.chars().count() <= 100
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("invalid `Name`")
    }
}

/// Free-form message of a [`Contact`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Message(String);

impl Message {
    /// Creates a new [`Message`] if the given `text` is not blank.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty()).then_some(Self(text))
    }
}

impl FromStr for Message {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("empty `Message`")
    }
}

/// [`DateTime`] when a [`Contact`] was submitted.
pub type CreationDateTime = DateTimeOf<(Contact, unit::Creation)>;
