//! Views of domain entities exposed to page templates.
//!
//! Every view carries exactly what the templates show, with values already
//! formatted for display.

use std::collections::HashMap;

use common::{pagination, Money};
use serde::Serialize;
use service::{
    domain::{
        access::Role,
        agent, company,
        property::{self, Image},
        user, Agent, Property, User,
    },
    read,
};

use crate::storage::FileStorage;

/// Badge marking a [`property::ListingType`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Badge {
    /// CSS class of this [`Badge`].
    pub class: &'static str,

    /// Text of this [`Badge`].
    pub text: &'static str,
}

impl From<property::ListingType> for Badge {
    fn from(listing_type: property::ListingType) -> Self {
        Self {
            class: listing_type.badge_class(),
            text: listing_type.badge_text(),
        }
    }
}

/// Value of a selectable option along with its label.
#[derive(Clone, Debug, Serialize)]
pub struct Choice {
    /// Submitted value.
    pub value: String,

    /// Displayed label.
    pub label: &'static str,
}

/// Choice lists of the [`Property`] form.
#[derive(Clone, Debug, Serialize)]
pub struct Choices {
    /// [`property::ListingType`] options.
    pub listing_types: Vec<Choice>,

    /// [`property::Kind`] options.
    pub property_types: Vec<Choice>,

    /// [`property::Status`] options.
    pub statuses: Vec<Choice>,
}

impl Choices {
    /// Lists all the options of the [`Property`] form.
    #[must_use]
    pub fn all() -> Self {
        Self {
            listing_types: property::ListingType::ALL
                .iter()
                .map(|v| Choice {
                    value: v.to_string(),
                    label: v.label(),
                })
                .collect(),
            property_types: property::Kind::ALL
                .iter()
                .map(|v| Choice {
                    value: v.to_string(),
                    label: v.label(),
                })
                .collect(),
            statuses: property::Status::ALL
                .iter()
                .map(|v| Choice {
                    value: v.to_string(),
                    label: v.label(),
                })
                .collect(),
        }
    }
}

/// Formatted price.
#[derive(Clone, Debug, Serialize)]
pub struct Price {
    /// Exact amount.
    pub amount: Money,

    /// Amount with thousands separated, e.g. `1,250,000`.
    pub display: String,
}

impl From<Money> for Price {
    fn from(amount: Money) -> Self {
        Self {
            amount,
            display: amount.grouped(),
        }
    }
}

/// Living area in both units.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Area {
    /// Area in square meters.
    pub sqm: property::Area,

    /// Area in whole square feet.
    pub sqft: u64,
}

impl From<property::Area> for Area {
    fn from(sqm: property::Area) -> Self {
        Self {
            sqm,
            sqft: sqm.sqft(),
        }
    }
}

/// [`Property`] as shown in listings.
#[derive(Clone, Debug, Serialize)]
pub struct PropertyCard {
    /// ID of the [`Property`].
    pub id: property::Id,

    /// Title of the [`Property`].
    pub title: property::Title,

    /// [`Price`] of the [`Property`].
    pub price: Price,

    /// [`property::ListingType`] of the [`Property`].
    pub listing_type: property::ListingType,

    /// [`Badge`] of the [`property::ListingType`].
    pub badge: Badge,

    /// [`property::Kind`] of the [`Property`].
    pub property_type: property::Kind,

    /// Label of the [`property::Kind`].
    pub property_type_label: &'static str,

    /// [`property::Status`] of the [`Property`].
    pub status: property::Status,

    /// Label of the [`property::Status`].
    pub status_label: &'static str,

    /// Street address of the [`Property`].
    pub address: property::Address,

    /// City of the [`Property`].
    pub city: property::City,

    /// Number of bedrooms.
    pub bedrooms: property::Count,

    /// Number of bathrooms.
    pub bathrooms: property::Count,

    /// Living [`Area`].
    pub area: Area,

    /// Indicator whether the [`Property`] is featured.
    pub featured: bool,

    /// URL of the primary [`Image`], if any.
    pub image: Option<String>,

    /// When the [`Property`] was listed.
    pub created_at: property::CreationDateTime,
}

impl PropertyCard {
    /// Creates a new [`PropertyCard`] out of the [`Property`] and its
    /// [`Image`]s.
    #[must_use]
    pub fn new(
        property: &Property,
        images: &[Image],
        storage: &impl FileStorage,
    ) -> Self {
        let details = &property.details;
        Self {
            id: property.id,
            title: details.title.clone(),
            price: details.price.into(),
            listing_type: details.listing_type,
            badge: details.listing_type.into(),
            property_type: details.kind,
            property_type_label: details.kind.label(),
            status: details.status,
            status_label: details.status.label(),
            address: details.address.clone(),
            city: details.city.clone(),
            bedrooms: details.bedrooms,
            bathrooms: details.bathrooms,
            area: details.area.into(),
            featured: property.featured,
            image: Image::primary(images).map(|i| storage.url(&i.file)),
            created_at: property.created_at,
        }
    }

    /// Creates [`PropertyCard`]s out of the [`Property`]s, picking their
    /// primary [`Image`]s out of the provided ones.
    #[must_use]
    pub fn list(
        properties: &[Property],
        images: &HashMap<property::Id, Vec<Image>>,
        storage: &impl FileStorage,
    ) -> Vec<Self> {
        properties
            .iter()
            .map(|p| {
                let own = images.get(&p.id).map_or(&[][..], Vec::as_slice);
                Self::new(p, own, storage)
            })
            .collect()
    }
}

/// [`Image`] of a [`Property`] gallery.
#[derive(Clone, Debug, Serialize)]
pub struct GalleryImage {
    /// ID of the [`Image`].
    pub id: property::image::Id,

    /// URL of the [`Image`] file.
    pub url: String,

    /// Caption of the [`Image`], if any.
    pub caption: Option<property::image::Caption>,

    /// Indicator whether the [`Image`] is primary.
    pub is_primary: bool,
}

impl GalleryImage {
    /// Creates a new [`GalleryImage`] out of the [`Image`].
    #[must_use]
    pub fn new(image: &Image, storage: &impl FileStorage) -> Self {
        Self {
            id: image.id,
            url: storage.url(&image.file),
            caption: image.caption.clone(),
            is_primary: image.is_primary,
        }
    }
}

/// [`Property`] as shown on its own page.
#[derive(Clone, Debug, Serialize)]
pub struct PropertyDetail {
    /// [`PropertyCard`] part.
    #[serde(flatten)]
    pub card: PropertyCard,

    /// Description of the [`Property`].
    pub description: property::Description,

    /// Postal code, if known.
    pub postal_code: Option<property::PostalCode>,

    /// Coordinates for the map, if known.
    pub location: Option<property::Coordinates>,

    /// Year the building was built, if known.
    pub year_built: Option<property::Year>,

    /// Number of parking spaces.
    pub parking_spaces: property::Count,

    /// Gallery of the [`Property`] in order.
    pub images: Vec<GalleryImage>,

    /// When the [`Property`] was last modified.
    pub updated_at: property::ModificationDateTime,
}

impl PropertyDetail {
    /// Creates a new [`PropertyDetail`] out of the [`Property`] and its
    /// [`Image`]s.
    #[must_use]
    pub fn new(
        property: &Property,
        mut images: Vec<Image>,
        storage: &impl FileStorage,
    ) -> Self {
        Image::arrange(&mut images);
        let details = &property.details;
        Self {
            card: PropertyCard::new(property, &images, storage),
            description: details.description.clone(),
            postal_code: details.postal_code.clone(),
            location: details.location,
            year_built: details.year_built,
            parking_spaces: details.parking_spaces,
            images: images
                .iter()
                .map(|i| GalleryImage::new(i, storage))
                .collect(),
            updated_at: property.updated_at,
        }
    }
}

/// [`Agent`] as shown in cards.
#[derive(Clone, Debug, Serialize)]
pub struct AgentCard {
    /// ID of the [`Agent`].
    pub id: agent::Id,

    /// Display name of the [`Agent`].
    pub name: String,

    /// Email of the [`Agent`], if known.
    pub email: Option<user::Email>,

    /// Phone of the [`Agent`].
    pub phone: user::Phone,

    /// Bio of the [`Agent`], if any.
    pub bio: Option<agent::Bio>,

    /// Specialization of the [`Agent`], if any.
    pub specialization: Option<agent::Specialization>,

    /// URL of the [`Agent`] photo, if any.
    pub photo: Option<String>,

    /// Indicator whether the [`Agent`] may manage listings.
    pub is_authorized: bool,
}

impl AgentCard {
    /// Creates a new [`AgentCard`] out of the [`Agent`] and the [`User`]
    /// backing it.
    #[must_use]
    pub fn new(
        agent: &Agent,
        user: Option<&User>,
        storage: &impl FileStorage,
    ) -> Self {
        Self {
            id: agent.id,
            name: user.map_or_else(|| "Agent".to_owned(), User::full_name),
            email: user.and_then(|u| u.email.clone()),
            phone: agent.phone.clone(),
            bio: agent.bio.clone(),
            specialization: agent.specialization.clone(),
            photo: agent.photo.as_ref().map(|f| storage.url(f)),
            is_authorized: agent.is_authorized,
        }
    }
}

/// Numbers of listings by status.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Counts {
    /// Available listings.
    pub available: u32,

    /// Listings with a pending deal.
    pub pending: u32,

    /// Sold listings.
    pub sold: u32,

    /// All the listings.
    pub total: u32,
}

impl From<read::agent::Stats> for Counts {
    fn from(stats: read::agent::Stats) -> Self {
        Self {
            available: stats.available,
            pending: stats.pending,
            sold: stats.sold,
            total: stats.total(),
        }
    }
}

/// Pagination info of a listing page.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Pagination {
    /// Current page number, starting from `1`.
    pub number: usize,

    /// Total number of pages, at least `1`.
    pub pages: usize,

    /// Indicator whether a previous page exists.
    pub has_previous: bool,

    /// Indicator whether a next page exists.
    pub has_next: bool,

    /// Total number of matching items.
    pub total: usize,
}

impl<T> From<&pagination::Page<T>> for Pagination {
    fn from(page: &pagination::Page<T>) -> Self {
        Self {
            number: page.window.number,
            pages: page.window.pages,
            has_previous: page.has_previous(),
            has_next: page.has_next(),
            total: page.window.total,
        }
    }
}

/// [`company::Company`] as shown on every page.
#[derive(Clone, Debug, Serialize)]
pub struct Company {
    /// [`company::Company`] record.
    #[serde(flatten)]
    pub company: company::Company,

    /// URL of the logo, if any.
    pub logo_url: Option<String>,
}

impl Company {
    /// Creates a new [`Company`] view out of the record.
    #[must_use]
    pub fn new(company: company::Company, storage: &impl FileStorage) -> Self {
        let logo_url = company.logo.as_ref().map(|f| storage.url(f));
        Self { company, logo_url }
    }
}

/// Summary of the current actor.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ActorSummary {
    /// Indicator whether the actor is signed in.
    pub is_authenticated: bool,

    /// Display name of the signed in user.
    pub name: Option<String>,

    /// Indicator whether the actor is a site administrator.
    pub is_admin: bool,

    /// ID of the actor's agent profile, if any.
    pub agent_id: Option<agent::Id>,

    /// Indicator whether the actor may manage listings.
    pub is_authorized_agent: bool,
}

impl ActorSummary {
    /// Summarizes the [`Role`] of the signed in [`User`].
    #[must_use]
    pub fn new(role: Role, user: Option<&User>) -> Self {
        let name = user.map(User::full_name);
        match role {
            Role::Anonymous => Self::default(),
            Role::Member { is_admin, .. } => Self {
                is_authenticated: true,
                name,
                is_admin,
                agent_id: None,
                is_authorized_agent: false,
            },
            Role::Agent {
                is_admin,
                agent_id,
                is_authorized,
                ..
            } => Self {
                is_authenticated: true,
                name,
                is_admin,
                agent_id: Some(agent_id),
                is_authorized_agent: is_authorized,
            },
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};
    use service::domain::{
        agent, media,
        property::{self, image, Image},
        user, Agent, Property,
    };

    use crate::storage;

    use super::{AgentCard, PropertyCard, PropertyDetail};

    fn storage() -> storage::Local {
        storage::Local::new("/tmp/unused", "/media/")
    }

    fn property() -> Property {
        let now = DateTime::now();
        Property {
            id: property::Id::new(),
            agent_id: None,
            details: property::Details {
                title: property::Title::new("Sea view villa").unwrap(),
                description: property::Description::new("Quiet.").unwrap(),
                price: "1250000".parse::<Money>().unwrap(),
                listing_type: property::ListingType::Sale,
                kind: property::Kind::Villa,
                status: property::Status::Available,
                address: property::Address::new("1 Coast Rd").unwrap(),
                city: property::City::default(),
                postal_code: None,
                location: None,
                bedrooms: 4,
                bathrooms: 2,
                area: "100".parse().unwrap(),
                year_built: None,
                parking_spaces: 1,
            },
            featured: true,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        }
    }

    fn image(property: &Property, file: &str, order: u16) -> Image {
        Image {
            id: image::Id::new(),
            property_id: property.id,
            file: media::Ref::new(media::Namespace::Properties, file).unwrap(),
            caption: None,
            is_primary: false,
            order,
        }
    }

    #[test]
    fn card_formats_for_display() {
        let p = property();
        let card = PropertyCard::new(&p, &[], &storage());

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["price"]["display"], "1,250,000");
        assert_eq!(json["area"]["sqft"], 1076);
        assert_eq!(json["badge"]["class"], "bg-green-500");
        assert_eq!(json["property_type"], "villa");
        assert_eq!(json["property_type_label"], "Villa");
        assert!(json["image"].is_null());
    }

    #[test]
    fn detail_orders_gallery_and_picks_primary() {
        let p = property();
        let mut first = image(&p, "a.jpg", 0);
        first.is_primary = true;
        let images = vec![image(&p, "c.jpg", 2), first, image(&p, "b.jpg", 1)];

        let detail = PropertyDetail::new(&p, images, &storage());

        let urls =
            detail.images.iter().map(|i| i.url.as_str()).collect::<Vec<_>>();
        assert_eq!(
            urls,
            [
                "/media/properties/a.jpg",
                "/media/properties/b.jpg",
                "/media/properties/c.jpg",
            ],
        );
        assert_eq!(
            detail.card.image.as_deref(),
            Some("/media/properties/a.jpg"),
        );
    }

    #[test]
    fn agent_card_falls_back_to_login() {
        let user = service::domain::User {
            id: user::Id::new(),
            login: user::Login::new("mei").unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new("correct horse").unwrap(),
            )
            .unwrap(),
            first_name: None,
            last_name: None,
            email: None,
            is_admin: false,
            created_at: DateTime::now().coerce(),
        };
        let agent = Agent {
            id: agent::Id::new(),
            user_id: user.id,
            phone: user::Phone::new("0912 345 678").unwrap(),
            bio: None,
            photo: None,
            specialization: None,
            is_authorized: true,
            created_at: DateTime::now().coerce(),
        };

        let card = AgentCard::new(&agent, Some(&user), &storage());
        assert_eq!(card.name, "mei");
        assert!(card.photo.is_none());
    }
}
