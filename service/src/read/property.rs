//! [`Property`]-related read definitions.

use crate::domain::{agent, property, Property};

/// Selector of featured available [`Property`] listings, newest first.
#[derive(Clone, Copy, Debug)]
pub struct Featured {
    /// Maximum number of listings to select.
    pub limit: usize,
}

impl Default for Featured {
    fn default() -> Self {
        Self { limit: 6 }
    }
}

/// Selector of available [`Property`] listings similar to the given one,
/// newest first.
#[derive(Clone, Copy, Debug)]
pub struct Similar {
    /// ID of the [`Property`] to exclude.
    pub to: property::Id,

    /// [`property::Kind`] of the similar [`Property`] listings.
    pub kind: property::Kind,

    /// Maximum number of listings to select.
    pub limit: usize,
}

impl Similar {
    /// Creates a new [`Similar`] selector for the provided [`Property`].
    #[must_use]
    pub const fn to(property: &Property) -> Self {
        Self {
            to: property.id,
            kind: property.details.kind,
            limit: 3,
        }
    }
}

/// Selector of [`Property`] listings owned by an [`Agent`], newest first.
///
/// [`Agent`]: crate::domain::Agent
#[derive(Clone, Copy, Debug)]
pub struct OwnedBy {
    /// ID of the owning [`Agent`].
    ///
    /// [`Agent`]: crate::domain::Agent
    pub agent_id: agent::Id,

    /// [`property::Status`] to restrict the listings with, if any.
    pub status: Option<property::Status>,
}

pub mod search {
    //! Search over available [`Property`] listings.
    //!
    //! Request parameters are applied by an ordered list of [`FILTERS`], each
    //! one narrowing the [`Filter`] independently. A parameter which is
    //! absent, blank or malformed leaves its restriction out.

    use std::cmp::Ordering;

    use common::Money;
    use derive_more::{Display, Error};
    use serde::Serialize;
    use smart_default::SmartDefault;
    use strum::{AsRefStr, EnumString};

    use crate::domain::{
        property::{self, Kind, ListingType, Status},
        Property,
    };

    /// Applies a single raw request parameter value to a [`Filter`].
    pub type Builder = fn(&mut Filter, &str) -> Result<(), Malformed>;

    /// Request parameters recognized as [`Filter`] restrictions, in order of
    /// application.
    pub const FILTERS: &[(&str, Builder)] = &[
        ("listing_type", listing_type),
        ("property_type", kinds),
        ("type", kinds_alias),
        ("location", location),
        ("min_price", min_price),
        ("max_price", max_price),
        ("bedrooms", bedrooms),
        ("bathrooms", bathrooms),
    ];

    /// Malformed request parameter value.
    #[derive(Clone, Copy, Debug, Display, Error)]
    #[display("{_0}")]
    pub struct Malformed(#[error(not(source))] &'static str);

    /// Conjunction of restrictions over available [`Property`] listings.
    #[derive(Clone, Debug, Default, Eq, PartialEq)]
    pub struct Filter {
        /// [`ListingType`] to match exactly.
        pub listing_type: Option<ListingType>,

        /// [`Kind`]s any of which to match. Empty means any [`Kind`].
        pub kinds: Vec<Kind>,

        /// Case-insensitive substring of the city, address or postal code.
        pub location: Option<String>,

        /// Inclusive lower bound of the price.
        pub min_price: Option<Money>,

        /// Inclusive upper bound of the price.
        pub max_price: Option<Money>,

        /// Minimal number of bedrooms.
        pub min_bedrooms: Option<property::Count>,

        /// Minimal number of bathrooms.
        pub min_bathrooms: Option<property::Count>,
    }

    impl Filter {
        /// Builds a [`Filter`] from request parameters looked up by name.
        ///
        /// Malformed values are skipped and logged.
        #[must_use]
        pub fn from_params<'p>(
            param: impl Fn(&str) -> Option<&'p str>,
        ) -> Self {
            let mut filter = Self::default();
            for (name, build) in FILTERS {
                let Some(raw) =
                    param(name).map(str::trim).filter(|v| !v.is_empty())
                else {
                    continue;
                };
                if let Err(e) = build(&mut filter, raw) {
                    tracing::debug!(
                        param = name,
                        value = raw,
                        "skipping malformed search filter: {e}",
                    );
                }
            }
            filter
        }

        /// Checks whether the provided [`Property`] listing is available and
        /// satisfies every restriction of this [`Filter`].
        #[must_use]
        pub fn matches(&self, listing: &Property) -> bool {
            let d = &listing.details;

            d.status == Status::Available
                && self.listing_type.map_or(true, |t| d.listing_type == t)
                && (self.kinds.is_empty() || self.kinds.contains(&d.kind))
                && self.location.as_deref().map_or(true, |loc| {
                    let loc = loc.to_lowercase();
                    [
                        Some(d.city.as_ref()),
                        Some(d.address.as_ref()),
                        d.postal_code.as_ref().map(AsRef::as_ref),
                    ]
                    .into_iter()
                    .flatten()
                    .any(|s: &str| s.to_lowercase().contains(&loc))
                })
                && self.min_price.map_or(true, |min| d.price >= min)
                && self.max_price.map_or(true, |max| d.price <= max)
                && self.min_bedrooms.map_or(true, |min| d.bedrooms >= min)
                && self.min_bathrooms.map_or(true, |min| d.bathrooms >= min)
        }
    }

    /// Applies the `listing_type` parameter.
    fn listing_type(f: &mut Filter, raw: &str) -> Result<(), Malformed> {
        f.listing_type =
            Some(raw.parse().map_err(|_| Malformed("unknown listing type"))?);
        Ok(())
    }

    /// Applies the comma-separated `property_type` parameter.
    ///
    /// Unknown [`Kind`]s in the list are ignored.
    fn kinds(f: &mut Filter, raw: &str) -> Result<(), Malformed> {
        let mut kinds = raw
            .split(',')
            .filter_map(|k| k.trim().parse::<Kind>().ok())
            .collect::<Vec<_>>();
        if kinds.is_empty() {
            return Err(Malformed("no known property types"));
        }
        kinds.sort_by_key(|k| k.u8());
        kinds.dedup();
        f.kinds = kinds;
        Ok(())
    }

    /// Applies the `type` parameter, unless `property_type` is applied
    /// already.
    fn kinds_alias(f: &mut Filter, raw: &str) -> Result<(), Malformed> {
        if f.kinds.is_empty() {
            kinds(f, raw)
        } else {
            Ok(())
        }
    }

    /// Applies the `location` parameter.
    fn location(f: &mut Filter, raw: &str) -> Result<(), Malformed> {
        if raw.chars().count() > 255 {
            return Err(Malformed("location is too long"));
        }
        f.location = Some(raw.to_owned());
        Ok(())
    }

    /// Applies the `min_price` parameter.
    fn min_price(f: &mut Filter, raw: &str) -> Result<(), Malformed> {
        f.min_price = Some(raw.parse().map_err(Malformed)?);
        Ok(())
    }

    /// Applies the `max_price` parameter.
    fn max_price(f: &mut Filter, raw: &str) -> Result<(), Malformed> {
        f.max_price = Some(raw.parse().map_err(Malformed)?);
        Ok(())
    }

    /// Applies the `bedrooms` parameter.
    fn bedrooms(f: &mut Filter, raw: &str) -> Result<(), Malformed> {
        f.min_bedrooms =
            Some(raw.parse().map_err(|_| Malformed("invalid bedrooms"))?);
        Ok(())
    }

    /// Applies the `bathrooms` parameter.
    fn bathrooms(f: &mut Filter, raw: &str) -> Result<(), Malformed> {
        f.min_bathrooms =
            Some(raw.parse().map_err(|_| Malformed("invalid bathrooms"))?);
        Ok(())
    }

    /// Order of search results.
    ///
    /// Ties are broken by [`property::Id`], so every order is total.
    #[derive(
        AsRefStr,
        Clone,
        Copy,
        Debug,
        EnumString,
        Eq,
        PartialEq,
        Serialize,
        SmartDefault,
    )]
    #[serde(rename_all = "snake_case")]
    #[strum(serialize_all = "snake_case")]
    pub enum Sort {
        /// Cheapest first.
        PriceLow,

        /// Most expensive first.
        PriceHigh,

        /// Largest area first.
        Sqft,

        /// Most recently created first.
        #[default]
        Newest,
    }

    impl Sort {
        /// Parses a [`Sort`] out of a raw request parameter.
        ///
        /// Missing or unrecognized values fall back to [`Sort::Newest`].
        #[must_use]
        pub fn parse(raw: Option<&str>) -> Self {
            raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
        }

        /// Compares two [`Property`] listings according to this [`Sort`].
        #[must_use]
        pub fn compare(self, a: &Property, b: &Property) -> Ordering {
            let (x, y) = (&a.details, &b.details);
            match self {
                Self::PriceLow => x.price.cmp(&y.price),
                Self::PriceHigh => y.price.cmp(&x.price),
                Self::Sqft => y.area.cmp(&x.area),
                Self::Newest => b.created_at.cmp(&a.created_at),
            }
            .then_with(|| a.id.cmp(&b.id))
        }
    }

    #[cfg(test)]
    mod spec {
        use std::collections::HashMap;

        use common::DateTime;

        use crate::domain::{property, Property};

        use super::{Filter, Sort};

        fn listing(
            kind: property::Kind,
            price: &str,
            city: &str,
            rooms: u16,
        ) -> Property {
            Property {
                id: property::Id::new(),
                agent_id: None,
                details: property::Details {
                    title: property::Title::new("Listing").unwrap(),
                    description: property::Description::new("-").unwrap(),
                    price: price.parse().unwrap(),
                    listing_type: property::ListingType::Sale,
                    kind,
                    status: property::Status::Available,
                    address: property::Address::new("12 Zhongshan Rd")
                        .unwrap(),
                    city: property::City::new(city).unwrap(),
                    postal_code: property::PostalCode::new("970"),
                    location: None,
                    bedrooms: rooms,
                    bathrooms: rooms,
                    area: "80".parse().unwrap(),
                    year_built: None,
                    parking_spaces: 0,
                },
                featured: false,
                created_at: DateTime::now().coerce(),
                updated_at: DateTime::now().coerce(),
            }
        }

        fn filter(params: &[(&str, &str)]) -> Filter {
            let params = params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<HashMap<_, _>>();
            Filter::from_params(|k| params.get(k).map(String::as_str))
        }

        #[test]
        fn builds_from_params() {
            let f = filter(&[
                ("listing_type", "rent"),
                ("property_type", "house, condo,castle"),
                ("location", " hualien "),
                ("min_price", "100,000"),
                ("bedrooms", "2"),
            ]);

            assert_eq!(f.listing_type, Some(property::ListingType::Rent));
            assert_eq!(
                f.kinds,
                vec![property::Kind::House, property::Kind::Condo],
            );
            assert_eq!(f.location.as_deref(), Some("hualien"));
            assert_eq!(f.min_price, Some("100000".parse().unwrap()));
            assert_eq!(f.min_bedrooms, Some(2));
            assert_eq!(f.max_price, None);
        }

        #[test]
        fn skips_malformed_params() {
            let f = filter(&[
                ("listing_type", "lease"),
                ("property_type", "castle"),
                ("min_price", "cheap"),
                ("max_price", "-5"),
                ("bedrooms", "two"),
                ("bathrooms", ""),
            ]);

            assert_eq!(f, Filter::default());
        }

        #[test]
        fn type_is_alias_of_property_type() {
            let f = filter(&[("type", "villa")]);
            assert_eq!(f.kinds, vec![property::Kind::Villa]);

            let f = filter(&[("type", "villa"), ("property_type", "land")]);
            assert_eq!(f.kinds, vec![property::Kind::Land]);
        }

        #[test]
        fn matches_conjunction() {
            let house = listing(property::Kind::House, "150000", "Hualien", 3);

            assert!(filter(&[]).matches(&house));
            assert!(filter(&[("location", "HUAL")]).matches(&house));
            assert!(filter(&[("location", "970")]).matches(&house));
            assert!(filter(&[("location", "zhongshan")]).matches(&house));
            assert!(filter(&[("min_price", "150000"), ("max_price", "150000")])
                .matches(&house));
            assert!(filter(&[("bedrooms", "3"), ("bathrooms", "1")])
                .matches(&house));

            assert!(!filter(&[("location", "Taipei")]).matches(&house));
            assert!(!filter(&[("max_price", "149999.99")]).matches(&house));
            assert!(!filter(&[("bedrooms", "4")]).matches(&house));
            assert!(!filter(&[("property_type", "condo")]).matches(&house));
            assert!(!filter(&[("listing_type", "rent"), ("location", "hualien")])
                .matches(&house));
        }

        #[test]
        fn matches_available_only() {
            let mut sold = listing(property::Kind::House, "1", "Hualien", 1);
            sold.details.status = property::Status::Sold;

            assert!(!Filter::default().matches(&sold));
        }

        #[test]
        fn parses_sort_leniently() {
            assert_eq!(Sort::parse(Some("price_low")), Sort::PriceLow);
            assert_eq!(Sort::parse(Some("price_high")), Sort::PriceHigh);
            assert_eq!(Sort::parse(Some("sqft")), Sort::Sqft);
            assert_eq!(Sort::parse(Some("cheapest")), Sort::Newest);
            assert_eq!(Sort::parse(None), Sort::Newest);
        }

        #[test]
        fn sorts_with_stable_ties() {
            let a = listing(property::Kind::House, "100", "Hualien", 1);
            let b = listing(property::Kind::House, "100", "Hualien", 1);
            let c = listing(property::Kind::House, "50", "Hualien", 1);

            let mut all = vec![a.clone(), b.clone(), c.clone()];
            all.sort_by(|x, y| Sort::PriceLow.compare(x, y));
            assert_eq!(all[0].id, c.id);
            assert_eq!(all[1].id, a.id.min(b.id));

            all.sort_by(|x, y| Sort::PriceHigh.compare(x, y));
            assert_eq!(all[2].id, c.id);
            assert_eq!(all[0].id, a.id.min(b.id));
        }
    }
}

pub mod list {
    //! [`Property`] list definitions.

    use std::num::NonZeroUsize;

    use common::define_pagination;

    use crate::domain::Property;

    use super::search::{Filter, Sort};

    define_pagination!(Property, Criteria);

    /// Number of [`Property`] listings on a [`Page`].
    pub const PER_PAGE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(8);

    /// Criteria of listing [`Property`]s.
    #[derive(Clone, Debug, Default)]
    pub struct Criteria {
        /// [`Filter`] to apply.
        pub filter: Filter,

        /// [`Sort`] to order with.
        pub sort: Sort,
    }
}
