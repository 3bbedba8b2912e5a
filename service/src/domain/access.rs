//! Access control definitions.
//!
//! Every mutating [`Command`] resolves the [`Role`] of its [`Actor`] right
//! before acting and checks it here, so nothing about permissions outlives a
//! single call.
//!
//! [`Command`]: crate::Command

use derive_more::{Display, Error};
use serde::Serialize;

#[cfg(doc)]
use crate::domain::{Agent, User};
use crate::domain::{agent, user, Property};

/// Identity of whoever performs an operation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Actor {
    /// Visitor without a session.
    #[default]
    Anonymous,

    /// Signed in [`User`].
    User(user::Id),
}

impl Actor {
    /// Returns the ID of the signed in [`User`], if any.
    #[must_use]
    pub const fn user_id(self) -> Option<user::Id> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(id),
        }
    }
}

/// Role of an [`Actor`] as currently stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    /// Visitor without a session, or with a session of a removed [`User`].
    Anonymous,

    /// Signed in [`User`] without an [`Agent`] profile.
    Member {
        /// ID of the [`User`].
        user_id: user::Id,

        /// Indicator whether the [`User`] is a site administrator.
        is_admin: bool,
    },

    /// Signed in [`User`] with an [`Agent`] profile.
    Agent {
        /// ID of the [`User`].
        user_id: user::Id,

        /// Indicator whether the [`User`] is a site administrator.
        is_admin: bool,

        /// ID of the [`Agent`].
        agent_id: agent::Id,

        /// Indicator whether the [`Agent`] may manage listings.
        is_authorized: bool,
    },
}

impl Role {
    /// Returns the ID of the [`Agent`], whether authorized or not.
    ///
    /// # Errors
    ///
    /// If this [`Role`] has no [`Agent`] profile.
    pub fn agent(self) -> Result<agent::Id, Denial> {
        match self {
            Self::Anonymous => Err(Denial::Unauthenticated),
            Self::Member { .. } => Err(Denial::NotAgent),
            Self::Agent { agent_id, .. } => Ok(agent_id),
        }
    }

    /// Returns the ID of the [`Agent`] allowed to manage listings.
    ///
    /// # Errors
    ///
    /// If this [`Role`] is not an authorized [`Agent`].
    pub fn authorized_agent(self) -> Result<agent::Id, Denial> {
        match self {
            Self::Agent {
                agent_id,
                is_authorized: true,
                ..
            } => Ok(agent_id),
            Self::Agent {
                is_authorized: false,
                ..
            } => Err(Denial::AgentNotAuthorized),
            Self::Anonymous => Err(Denial::Unauthenticated),
            Self::Member { .. } => Err(Denial::NotAgent),
        }
    }

    /// Returns the ID of the [`Agent`] allowed to modify the provided
    /// [`Property`].
    ///
    /// # Errors
    ///
    /// Unless this [`Role`] is the authorized [`Agent`] owning the
    /// [`Property`].
    pub fn owner_of(self, property: &Property) -> Result<agent::Id, Denial> {
        let agent_id = self.authorized_agent()?;
        if property.is_owned_by(agent_id) {
            Ok(agent_id)
        } else {
            Err(Denial::NotOwner)
        }
    }

    /// Returns the ID of the administrator [`User`].
    ///
    /// # Errors
    ///
    /// If this [`Role`] is not a site administrator.
    pub fn admin(self) -> Result<user::Id, Denial> {
        match self {
            Self::Anonymous => Err(Denial::Unauthenticated),
            Self::Member {
                user_id,
                is_admin: true,
            }
            | Self::Agent {
                user_id,
                is_admin: true,
                ..
            } => Ok(user_id),
            Self::Member { .. } | Self::Agent { .. } => Err(Denial::NotAdmin),
        }
    }

    /// Evaluates the [`Access`] of this [`Role`] to the provided
    /// [`Property`].
    #[must_use]
    pub fn access_to(self, property: &Property) -> Access {
        match self.owner_of(property) {
            Ok(_) => Access::Owner,
            Err(Denial::Unauthenticated) => Access::Anonymous,
            Err(Denial::NotAgent | Denial::NotAdmin) => Access::NonAgent,
            Err(Denial::AgentNotAuthorized) => Access::UnauthorizedAgent,
            Err(Denial::NotOwner) => Access::NotOwner,
        }
    }
}

/// Access of an [`Actor`] to a particular [`Property`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Visitor without a session.
    Anonymous,

    /// Signed in [`User`] without an [`Agent`] profile.
    NonAgent,

    /// [`Agent`] not yet authorized by an administrator.
    UnauthorizedAgent,

    /// Authorized [`Agent`] not owning the [`Property`].
    NotOwner,

    /// Authorized [`Agent`] owning the [`Property`].
    Owner,
}

impl Access {
    /// Indicates whether this [`Access`] allows to edit or delete the
    /// [`Property`] and its images.
    #[must_use]
    pub const fn can_modify(self) -> bool {
        matches!(self, Self::Owner)
    }
}

/// Reason of denying an operation to an [`Actor`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum Denial {
    /// [`Actor`] is not signed in.
    #[display("Please log in to continue")]
    Unauthenticated,

    /// [`Actor`] has no [`Agent`] profile.
    #[display("Only agents may do this")]
    NotAgent,

    /// [`Agent`] is not yet authorized by an administrator.
    #[display("Your agent account is awaiting approval")]
    AgentNotAuthorized,

    /// [`Agent`] does not own the [`Property`].
    #[display("You can only manage your own properties")]
    NotOwner,

    /// [`Actor`] is not a site administrator.
    #[display("Only administrators may do this")]
    NotAdmin,
}

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};

    use crate::domain::{agent, property, user, Property};

    use super::{Access, Denial, Role};

    fn property_of(agent_id: Option<agent::Id>) -> Property {
        Property {
            id: property::Id::new(),
            agent_id,
            details: property::Details {
                title: property::Title::new("Seaside house").unwrap(),
                description: property::Description::new("Nice").unwrap(),
                price: Money::ZERO,
                listing_type: property::ListingType::Sale,
                kind: property::Kind::House,
                status: property::Status::Available,
                address: property::Address::new("1 Shore Rd").unwrap(),
                city: property::City::default(),
                postal_code: None,
                location: None,
                bedrooms: 1,
                bathrooms: 1,
                area: "50".parse().unwrap(),
                year_built: None,
                parking_spaces: 0,
            },
            featured: false,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn agent(agent_id: agent::Id, is_authorized: bool) -> Role {
        Role::Agent {
            user_id: user::Id::new(),
            is_admin: false,
            agent_id,
            is_authorized,
        }
    }

    #[test]
    fn evaluates_every_access_state() {
        let owner = agent::Id::new();
        let property = property_of(Some(owner));

        assert_eq!(Role::Anonymous.access_to(&property), Access::Anonymous);
        assert_eq!(
            Role::Member {
                user_id: user::Id::new(),
                is_admin: true,
            }
            .access_to(&property),
            Access::NonAgent,
        );
        assert_eq!(
            agent(owner, false).access_to(&property),
            Access::UnauthorizedAgent,
        );
        assert_eq!(
            agent(agent::Id::new(), true).access_to(&property),
            Access::NotOwner,
        );
        assert_eq!(agent(owner, true).access_to(&property), Access::Owner);
    }

    #[test]
    fn only_owner_modifies() {
        let owner = agent::Id::new();

        assert!(agent(owner, true)
            .access_to(&property_of(Some(owner)))
            .can_modify());
        assert!(!agent(owner, true).access_to(&property_of(None)).can_modify());
        assert!(!agent(owner, false)
            .access_to(&property_of(Some(owner)))
            .can_modify());
    }

    #[test]
    fn unauthorized_agent_cannot_create() {
        let id = agent::Id::new();

        assert_eq!(agent(id, true).authorized_agent(), Ok(id));
        assert_eq!(
            agent(id, false).authorized_agent(),
            Err(Denial::AgentNotAuthorized),
        );
        assert_eq!(agent(id, false).agent(), Ok(id));
        assert_eq!(
            Role::Anonymous.authorized_agent(),
            Err(Denial::Unauthenticated),
        );
    }

    #[test]
    fn admin_is_checked_by_flag() {
        let user_id = user::Id::new();
        let admin = Role::Member {
            user_id,
            is_admin: true,
        };

        assert_eq!(admin.admin(), Ok(user_id));
        assert_eq!(agent(agent::Id::new(), true).admin(), Err(Denial::NotAdmin));
        assert_eq!(Role::Anonymous.admin(), Err(Denial::Unauthenticated));
    }
}
