//! [`Property`] definitions.

pub mod image;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money, Numeric};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Agent;
use crate::domain::agent;

pub use self::image::Image;

/// Real estate listed for sale or rent.
#[derive(Clone, Debug, Serialize)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// ID of the [`Agent`] owning this [`Property`], if any.
    ///
    /// Becomes [`None`] once the owning [`Agent`] is removed.
    pub agent_id: Option<agent::Id>,

    /// Editable [`Details`] of this [`Property`].
    #[serde(flatten)]
    pub details: Details,

    /// Indicator whether this [`Property`] is promoted on the home page.
    pub featured: bool,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Property`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Property {
    /// Indicates whether this [`Property`] is owned by the provided
    /// [`Agent`].
    #[must_use]
    pub fn is_owned_by(&self, agent_id: agent::Id) -> bool {
        self.agent_id == Some(agent_id)
    }
}

/// Details of a [`Property`] editable by its owning [`Agent`].
#[derive(Clone, Debug, Serialize)]
pub struct Details {
    /// [`Title`] of the listing.
    pub title: Title,

    /// [`Description`] of the listing.
    pub description: Description,

    /// Asking price (or monthly rent).
    pub price: Money,

    /// [`ListingType`] of the listing.
    pub listing_type: ListingType,

    /// [`Kind`] of the real estate.
    #[serde(rename = "property_type")]
    pub kind: Kind,

    /// Current [`Status`] of the listing.
    pub status: Status,

    /// Street [`Address`].
    pub address: Address,

    /// [`City`] the real estate is located in.
    pub city: City,

    /// [`PostalCode`], if known.
    pub postal_code: Option<PostalCode>,

    /// Geographical [`Coordinates`], if known.
    pub location: Option<Coordinates>,

    /// Number of bedrooms.
    pub bedrooms: Count,

    /// Number of bathrooms.
    pub bathrooms: Count,

    /// Living [`Area`].
    pub area: Area,

    /// [`Year`] the building was built, if known.
    pub year_built: Option<Year>,

    /// Number of parking spaces.
    pub parking_spaces: Count,
}

/// ID of a [`Property`].
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

define_kind! {
    #[doc = "Kind of a [`Property`] listing."]
    enum ListingType {
        #[doc = "Listed for sale."]
        #[label = "For Sale"]
        Sale = 1,

        #[doc = "Listed for rent."]
        #[label = "For Rent"]
        Rent = 2,
    }
}

impl ListingType {
    /// Returns the CSS class of a badge marking this [`ListingType`].
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Sale => "bg-green-500",
            Self::Rent => "bg-blue-500",
        }
    }

    /// Returns the text of a badge marking this [`ListingType`].
    #[must_use]
    pub const fn badge_text(self) -> &'static str {
        match self {
            Self::Sale => "FOR SALE / 出售",
            Self::Rent => "FOR RENT / 出租",
        }
    }
}

define_kind! {
    #[doc = "Kind of a real estate."]
    enum Kind {
        #[doc = "Detached house."]
        #[label = "House"]
        House = 1,

        #[doc = "Apartment in a multi-unit building."]
        #[label = "Apartment"]
        Apartment = 2,

        #[doc = "Condominium unit."]
        #[label = "Condo"]
        Condo = 3,

        #[doc = "Villa."]
        #[label = "Villa"]
        Villa = 4,

        #[doc = "Land plot."]
        #[label = "Land"]
        Land = 5,
    }
}

define_kind! {
    #[doc = "Status of a [`Property`] listing."]
    enum Status {
        #[doc = "Open for offers."]
        #[label = "Available"]
        Available = 1,

        #[doc = "Deal is in progress."]
        #[label = "Pending"]
        Pending = 2,

        #[doc = "Deal is closed."]
        #[label = "Sold"]
        Sold = 3,
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Available
    }
}

/// Title of a [`Property`] listing.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title
            && !title.is_empty()
            && title.chars().count() <= 200
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("invalid `Title`")
    }
}

/// Free-form description of a [`Property`] listing.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is not blank.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty()).then_some(Self(text))
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("empty `Description`")
    }
}

/// Street address of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Address(String);

impl Address {
    /// Creates a new [`Address`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Address`].
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        address.trim() == address
            && !address.is_empty()
            && address.chars().count() <= 255
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("invalid `Address`")
    }
}

/// City a [`Property`] is located in.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct City(String);

impl City {
    /// Creates a new [`City`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`City`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.chars().count() <= 100
    }
}

impl Default for City {
    fn default() -> Self {
        Self("Hualien".into())
    }
}

impl FromStr for City {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("invalid `City`")
    }
}

/// Postal code of a [`Property`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PostalCode(String);

impl PostalCode {
    /// Creates a new [`PostalCode`] if the given `code` is valid.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        Self::check(&code).then_some(Self(code))
    }

    /// Checks whether the given `code` is a valid [`PostalCode`].
    fn check(code: impl AsRef<str>) -> bool {
        let code = code.as_ref();
        code.trim() == code && !code.is_empty() && code.chars().count() <= 10
    }
}

impl FromStr for PostalCode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim()).ok_or("invalid `PostalCode`")
    }
}

/// Number of rooms or parking spaces.
pub type Count = u16;

/// Living area of a [`Property`] in square meters.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Area(Decimal);

impl Area {
    /// Number of square feet in a square meter.
    const SQFT_PER_SQM: Decimal = Decimal::from_parts(10_764, 0, 0, false, 3);

    /// [`Numeric`] bounds of the column storing an [`Area`].
    pub const COLUMN: Numeric = Numeric::new(10, 2);

    /// Creates a new [`Area`] if the given amount of square meters is
    /// positive and fits into the [`Area::COLUMN`].
    #[must_use]
    pub fn new(sqm: Decimal) -> Option<Self> {
        (sqm > Decimal::ZERO && Self::COLUMN.fits(sqm))
            .then(|| Self(sqm.normalize()))
    }

    /// Returns this [`Area`] in square meters.
    #[must_use]
    pub const fn sqm(&self) -> Decimal {
        self.0
    }

    /// Returns this [`Area`] in whole square feet, rounded down.
    #[must_use]
    pub fn sqft(&self) -> u64 {
        u64::try_from((self.0 * Self::SQFT_PER_SQM).trunc()).unwrap_or(u64::MAX)
    }
}

impl FromStr for Area {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sqm = Decimal::from_str(s.trim()).map_err(|_| "invalid `Area`")?;
        Self::new(sqm).ok_or("non-positive or out of range `Area`")
    }
}

/// Geographical coordinates of a [`Property`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Coordinates {
    /// Latitude in degrees, within `-90..=90`.
    pub latitude: Decimal,

    /// Longitude in degrees, within `-180..=180`.
    pub longitude: Decimal,
}

impl Coordinates {
    /// [`Numeric`] bounds of the columns storing each component.
    pub const COLUMN: Numeric = Numeric::new(9, 6);

    /// Creates new [`Coordinates`] if both components are in range and fit
    /// into the [`Coordinates::COLUMN`].
    #[must_use]
    pub fn new(latitude: Decimal, longitude: Decimal) -> Option<Self> {
        let lat = Decimal::from(90);
        let long = Decimal::from(180);
        let valid = (-lat..=lat).contains(&latitude)
            && (-long..=long).contains(&longitude)
            && Self::COLUMN.fits(latitude)
            && Self::COLUMN.fits(longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// Year a building was built in.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Year(u16);

impl Year {
    /// Creates a new [`Year`] if the given `year` is plausible.
    #[must_use]
    pub fn new(year: u16) -> Option<Self> {
        (1000..=9999).contains(&year).then_some(Self(year))
    }

    /// Returns this [`Year`] as a number.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<i32> for Year {
    type Error = &'static str;

    fn try_from(year: i32) -> Result<Self, Self::Error> {
        u16::try_from(year)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Year`")
    }
}

impl FromStr for Year {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Year`")
    }
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when a [`Property`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Property, unit::Modification)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::{Area, Coordinates, Kind, ListingType, Status, Year};

    #[test]
    fn area_converts_to_whole_square_feet() {
        assert_eq!(Area::from_str("100").unwrap().sqft(), 1076);
        assert_eq!(Area::from_str("85.5").unwrap().sqft(), 920);
        assert_eq!(Area::from_str("1").unwrap().sqft(), 10);

        assert!(Area::from_str("0").is_err());
        assert!(Area::from_str("-3").is_err());
    }

    #[test]
    fn area_is_stored_exactly() {
        assert!(Area::from_str("99999999.99").is_ok());
        assert!(Area::from_str("100000000").is_err());
        assert!(Area::from_str("85.555").is_err());
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("HOUSE".parse::<Kind>().unwrap(), Kind::House);
        assert_eq!("rent".parse::<ListingType>().unwrap(), ListingType::Rent);
        assert!("castle".parse::<Kind>().is_err());

        assert_eq!(Status::default(), Status::Available);
    }

    #[test]
    fn listing_badges() {
        assert_eq!(ListingType::Sale.badge_class(), "bg-green-500");
        assert_eq!(ListingType::Rent.badge_class(), "bg-blue-500");
        assert!(ListingType::Sale.badge_text().starts_with("FOR SALE"));
    }

    #[test]
    fn coordinates_in_range() {
        let lat = "23.97".parse().unwrap();
        let long = "121.6".parse().unwrap();
        assert!(Coordinates::new(lat, long).is_some());
        assert!(Coordinates::new(91.into(), 0.into()).is_none());
        assert!(Coordinates::new(0.into(), (-181).into()).is_none());

        let precise = "23.9712345".parse().unwrap();
        assert!(Coordinates::new(precise, long).is_none());
    }

    #[test]
    fn year_is_plausible() {
        assert_eq!(Year::from_str("1998").unwrap().get(), 1998);
        assert!(Year::from_str("98").is_err());
        assert!(Year::from_str("soon").is_err());
    }
}
