//! Helpers for testing [`Command`]s and [`Query`]s against the [`Memory`]
//! database.
//!
//! [`Command`]: crate::Command
//! [`Query`]: crate::Query

use std::time::Duration;

use common::{operations::Insert, DateTime};

use crate::{
    domain::{agent, property, user, Agent, Property, User},
    infra::{Database as _, Memory},
    Config, Service,
};

/// Password every [`User`] created by [`user()`] signs in with.
pub(crate) const PASSWORD: &str = "correct horse";

/// Creates a new [`Service`] backed by an empty [`Memory`] database.
pub(crate) fn service() -> Service<Memory> {
    Service::new(
        Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(b"test"),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(b"test"),
            session_ttl: Duration::from_secs(30 * 60),
        },
        Memory::new(),
    )
}

/// Creates a new (not stored) [`User`] with the provided `login`.
pub(crate) fn user(login: &str, is_admin: bool) -> User {
    User {
        id: user::Id::new(),
        login: user::Login::new(login).unwrap(),
        password_hash: user::PasswordHash::new(
            &user::Password::new(PASSWORD).unwrap(),
        )
        .unwrap(),
        first_name: None,
        last_name: None,
        email: None,
        is_admin,
        created_at: DateTime::now().coerce(),
    }
}

/// Stores a new administrator [`User`].
pub(crate) async fn admin(svc: &Service<Memory>) -> User {
    let admin = user("admin", true);
    svc.database().execute(Insert(admin.clone())).await.unwrap();
    admin
}

/// Stores a new [`Agent`] backed by a new [`User`] with the provided `login`.
pub(crate) async fn agent(
    svc: &Service<Memory>,
    login: &str,
    is_authorized: bool,
) -> (User, Agent) {
    let user = user(login, false);
    let agent = Agent {
        id: agent::Id::new(),
        user_id: user.id,
        phone: user::Phone::new("0912345678").unwrap(),
        bio: None,
        photo: None,
        specialization: None,
        is_authorized,
        created_at: DateTime::now().coerce(),
    };
    svc.database().execute(Insert(user.clone())).await.unwrap();
    svc.database().execute(Insert(agent.clone())).await.unwrap();
    (user, agent)
}

/// Creates new [`property::Details`] of an available listing for sale.
pub(crate) fn details(kind: property::Kind, price: &str) -> property::Details {
    property::Details {
        title: property::Title::new(format!("{} for sale", kind.label()))
            .unwrap(),
        description: property::Description::new("Sunny, near the sea.")
            .unwrap(),
        price: price.parse().unwrap(),
        listing_type: property::ListingType::Sale,
        kind,
        status: property::Status::Available,
        address: property::Address::new("1 Zhongzheng Rd").unwrap(),
        city: property::City::default(),
        postal_code: property::PostalCode::new("970"),
        location: None,
        bedrooms: 3,
        bathrooms: 2,
        area: "120.5".parse().unwrap(),
        year_built: property::Year::new(2005),
        parking_spaces: 1,
    }
}

/// Stores a new [`Property`] with the provided [`property::Details`],
/// created `age` seconds after a fixed moment.
pub(crate) async fn property(
    svc: &Service<Memory>,
    agent_id: Option<agent::Id>,
    details: property::Details,
    age: u64,
) -> Property {
    let created_at = DateTime::from_unix_timestamp(1_700_000_000).unwrap()
        + Duration::from_secs(age);
    let property = Property {
        id: property::Id::new(),
        agent_id,
        details,
        featured: false,
        created_at: created_at.coerce(),
        updated_at: created_at.coerce(),
    };
    svc.database()
        .execute(Insert(property.clone()))
        .await
        .unwrap();
    property
}
