//! [`Company`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{media, property::Coordinates, user};

/// Real estate agency running the site.
///
/// Exactly one [`Company`] exists at most.
#[derive(Clone, Debug, Serialize)]
pub struct Company {
    /// ID of this [`Company`].
    pub id: Id,

    /// [`Name`] of this [`Company`].
    pub name: Name,

    /// Short slogan of this [`Company`], if any.
    pub tagline: Option<String>,

    /// Long description of this [`Company`], if any.
    pub about: Option<String>,

    /// Contact [`user::Email`] of this [`Company`], if any.
    pub email: Option<user::Email>,

    /// Contact [`user::Phone`] of this [`Company`], if any.
    pub phone: Option<user::Phone>,

    /// Office address of this [`Company`], if any.
    pub address: Option<String>,

    /// Logo of this [`Company`], if any.
    pub logo: Option<media::Ref>,

    /// [`Socials`] of this [`Company`].
    pub socials: Socials,

    /// [`Stats`] of this [`Company`].
    pub stats: Stats,

    /// Office [`Coordinates`] of this [`Company`], if known.
    pub location: Option<Coordinates>,

    /// [`DateTime`] when this [`Company`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Company`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Company {
    /// Creates a new [`Company`] with the provided [`Name`] and everything
    /// else left blank.
    #[must_use]
    pub fn blank(name: Name) -> Self {
        let now = common::DateTime::now();
        Self {
            id: Id::new(),
            name,
            tagline: None,
            about: None,
            email: None,
            phone: None,
            address: None,
            logo: None,
            socials: Socials::default(),
            stats: Stats::default(),
            location: None,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }
}

/// Links to social network pages of a [`Company`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct Socials {
    /// Facebook page URL.
    pub facebook: Option<String>,

    /// Instagram page URL.
    pub instagram: Option<String>,

    /// LINE account URL.
    pub line: Option<String>,

    /// Website URL.
    pub website: Option<String>,
}

/// Counters advertised on the about page.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Stats {
    /// Years on the market.
    pub years_experience: u32,

    /// Number of properties sold.
    pub properties_sold: u32,

    /// Number of happy clients.
    pub happy_clients: u32,
}

/// Key identifying the only [`Company`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Singleton;

/// ID of a [`Company`].
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

/// Name of a [`Company`].
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
        name.trim() == name && !name.is_empty() && name.chars().count() <= 200
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("invalid `Name`")
    }
}

/// [`DateTime`] when a [`Company`] was created.
pub type CreationDateTime = DateTimeOf<(Company, unit::Creation)>;

/// [`DateTime`] when a [`Company`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Company, unit::Modification)>;
