//! In-memory [`Database`] implementation.
//!
//! Every operation is applied immediately under a single lock, so
//! [`Transact`] and [`Commit`] are no-ops and a failed [`Command`] doesn't roll
//! back the writes it has already made.
//!
//! [`Command`]: crate::Command

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    pagination,
};
use derive_more::{Display, Error as StdError};
use tracerr::Traced;

use crate::{
    domain::{
        access::Role,
        agent, company, contact,
        property::{self, image, Image},
        user, Actor, Agent, Company, Contact, Property, User,
    },
    infra::{database, Database},
    read::{self, property::search::Sort},
};

/// In-memory [`Database`].
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Mutex<State>>);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the [`State`] of this [`Memory`] database.
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the [`Event`]s recorded so far, oldest first.
    #[cfg(test)]
    pub(crate) fn journal(&self) -> Vec<Event> {
        self.state().journal.clone()
    }

    /// Appends the provided [`Event`] to the journal.
    #[cfg(test)]
    fn record(&self, event: Event) {
        self.state().journal.push(event);
    }
}

/// Transactional step recorded by the [`Memory`] database.
#[cfg(test)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Event {
    /// [`Transact`] is executed.
    Transact,

    /// [`Commit`] is executed.
    Commit,

    /// [`Property`] is locked.
    LockProperty(property::Id),

    /// [`Image`] is inserted.
    InsertImage(image::Id),

    /// [`Contact`] is inserted.
    InsertContact(contact::Id),
}

/// Stored entities.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Agent`]s.
    agents: HashMap<agent::Id, Agent>,

    /// Stored [`Property`] listings.
    properties: HashMap<property::Id, Property>,

    /// Stored [`Image`]s.
    images: HashMap<image::Id, Image>,

    /// Stored [`Contact`]s.
    contacts: HashMap<contact::Id, Contact>,

    /// The only [`Company`], if created.
    company: Option<Company>,

    /// Recorded [`Event`]s.
    #[cfg(test)]
    journal: Vec<Event>,
}

impl State {
    /// Returns available [`Property`] listings satisfying the `pred`icate,
    /// newest first.
    fn available_newest(
        &self,
        pred: impl Fn(&Property) -> bool,
    ) -> Vec<Property> {
        let mut found = self
            .properties
            .values()
            .filter(|p| p.details.status == property::Status::Available)
            .filter(|p| pred(p))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by(|a, b| Sort::Newest.compare(a, b));
        found
    }

    /// Returns the [`Image`]s of the provided [`Property`] in gallery order.
    fn images_of(&self, property_id: property::Id) -> Vec<Image> {
        let mut images = self
            .images
            .values()
            .filter(|i| i.property_id == property_id)
            .cloned()
            .collect::<Vec<_>>();
        Image::arrange(&mut images);
        images
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |x| x == *c),
        }
    }
}

/// Creates a new [`database::Error`] of violating the provided unique
/// constraint.
fn unique_violation(constraint: &'static str) -> Traced<database::Error> {
    tracerr::new!(database::Error::from(Error::UniqueViolation(constraint)))
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        #[cfg(test)]
        self.record(Event::Transact);
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        #[cfg(test)]
        self.record(Event::Commit);
        Ok(())
    }
}

impl Database<Select<By<Role, Actor>>> for Memory {
    type Ok = Role;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Role, Actor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let state = self.state();
        let Some(user) = by
            .into_inner()
            .user_id()
            .and_then(|id| state.users.get(&id))
        else {
            return Ok(Role::Anonymous);
        };

        Ok(
            match state.agents.values().find(|a| a.user_id == user.id) {
                None => Role::Member {
                    user_id: user.id,
                    is_admin: user.is_admin,
                },
                Some(agent) => Role::Agent {
                    user_id: user.id,
                    is_admin: user.is_admin,
                    agent_id: agent.id,
                    is_authorized: agent.is_authorized,
                },
            },
        )
    }
}

impl<IDs> Database<Select<By<HashMap<user::Id, User>, IDs>>> for Memory
where
    IDs: AsRef<[user::Id]>,
{
    type Ok = HashMap<user::Id, User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<user::Id, User>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let state = self.state();
        Ok(by
            .into_inner()
            .as_ref()
            .iter()
            .filter_map(|id| state.users.get(id).map(|u| (*id, u.clone())))
            .collect())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().users.get(&by.into_inner()).cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Login>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();
        Ok(self
            .state()
            .users
            .values()
            .find(|u| &u.login == login)
            .cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state
            .users
            .values()
            .any(|u| u.login == user.login && u.id != user.id)
        {
            return Err(unique_violation(database::USERS_LOGIN_KEY));
        }
        _ = state.users.insert(user.id, user);
        Ok(())
    }
}

impl Database<Select<By<Option<Agent>, agent::Id>>> for Memory {
    type Ok = Option<Agent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Agent>, agent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().agents.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Agent>, user::Id>>> for Memory {
    type Ok = Option<Agent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Agent>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        Ok(self
            .state()
            .agents
            .values()
            .find(|a| a.user_id == user_id)
            .cloned())
    }
}

impl Database<Select<By<Vec<Agent>, read::agent::All>>> for Memory {
    type Ok = Vec<Agent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Agent>, read::agent::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut agents =
            self.state().agents.values().cloned().collect::<Vec<_>>();
        agents.sort_by_key(|a| (a.created_at, a.id));
        Ok(agents)
    }
}

impl Database<Select<By<read::agent::Stats, agent::Id>>> for Memory {
    type Ok = read::agent::Stats;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::agent::Stats, agent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let agent_id = by.into_inner();
        let mut stats = read::agent::Stats::default();
        for p in self
            .state()
            .properties
            .values()
            .filter(|p| p.is_owned_by(agent_id))
        {
            let counter = match p.details.status {
                property::Status::Available => &mut stats.available,
                property::Status::Pending => &mut stats.pending,
                property::Status::Sold => &mut stats.sold,
            };
            *counter += 1;
        }
        Ok(stats)
    }
}

impl Database<Insert<Agent>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(agent): Insert<Agent>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(agent)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<Agent>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(agent): Update<Agent>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state
            .agents
            .values()
            .any(|a| a.user_id == agent.user_id && a.id != agent.id)
        {
            return Err(unique_violation(database::AGENTS_USER_KEY));
        }
        _ = state.agents.insert(agent.id, agent);
        Ok(())
    }
}

impl Database<Select<By<Option<Property>, property::Id>>> for Memory {
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().properties.get(&by.into_inner()).cloned())
    }
}

impl
    Database<
        Select<
            By<read::property::list::Page, read::property::list::Selector>,
        >,
    > for Memory
{
    type Ok = read::property::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::property::list::Page, read::property::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::list::Selector {
            arguments,
            filter: read::property::list::Criteria { filter, sort },
        } = by.into_inner();

        let mut found = self
            .state()
            .properties
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by(|a, b| sort.compare(a, b));

        Ok(pagination::Page::slice(found, &arguments))
    }
}

impl Database<Select<By<Vec<Property>, read::property::Featured>>> for Memory {
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, read::property::Featured>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::Featured { limit } = by.into_inner();
        let mut found = self.state().available_newest(|p| p.featured);
        found.truncate(limit);
        Ok(found)
    }
}

impl Database<Select<By<Vec<Property>, read::property::Similar>>> for Memory {
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, read::property::Similar>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::Similar { to, kind, limit } = by.into_inner();
        let mut found = self
            .state()
            .available_newest(|p| p.id != to && p.details.kind == kind);
        found.truncate(limit);
        Ok(found)
    }
}

impl Database<Select<By<Vec<Property>, read::property::OwnedBy>>> for Memory {
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, read::property::OwnedBy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::OwnedBy { agent_id, status } = by.into_inner();
        let mut found = self
            .state()
            .properties
            .values()
            .filter(|p| p.is_owned_by(agent_id))
            .filter(|p| status.map_or(true, |s| p.details.status == s))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by(|a, b| Sort::Newest.compare(a, b));
        Ok(found)
    }
}

impl Database<Insert<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().properties.insert(property.id, property);
        Ok(())
    }
}

impl Database<Lock<By<Property, property::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        #[cfg_attr(
            not(test),
            expect(unused_variables, reason = "recorded in tests only")
        )]
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        #[cfg(test)]
        self.record(Event::LockProperty(by.into_inner()));
        Ok(())
    }
}

impl Database<Delete<By<Property, property::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut state = self.state();

        _ = state.properties.remove(&id);
        state.images.retain(|_, i| i.property_id != id);
        for c in state.contacts.values_mut() {
            if c.property_id == Some(id) {
                c.property_id = None;
            }
        }
        Ok(())
    }
}

impl Database<Select<By<Vec<Image>, property::Id>>> for Memory {
    type Ok = Vec<Image>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Image>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().images_of(by.into_inner()))
    }
}

impl<IDs> Database<Select<By<HashMap<property::Id, Vec<Image>>, IDs>>>
    for Memory
where
    IDs: AsRef<[property::Id]>,
{
    type Ok = HashMap<property::Id, Vec<Image>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<property::Id, Vec<Image>>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let state = self.state();
        Ok(by
            .into_inner()
            .as_ref()
            .iter()
            .map(|id| (*id, state.images_of(*id)))
            .filter(|(_, images)| !images.is_empty())
            .collect())
    }
}

impl Database<Select<By<Option<Image>, image::Id>>> for Memory {
    type Ok = Option<Image>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Image>, image::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().images.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Image>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(image): Insert<Image>,
    ) -> Result<Self::Ok, Self::Err> {
        #[cfg(test)]
        self.record(Event::InsertImage(image.id));
        self.execute(Update(image)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<Image>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(image): Update<Image>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().images.insert(image.id, image);
        Ok(())
    }
}

impl Database<Delete<By<Image, image::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Image, image::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().images.remove(&by.into_inner());
        Ok(())
    }
}

impl Database<Select<By<Option<Contact>, contact::Id>>> for Memory {
    type Ok = Option<Contact>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contact>, contact::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().contacts.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Contact>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contact): Insert<Contact>,
    ) -> Result<Self::Ok, Self::Err> {
        #[cfg(test)]
        self.record(Event::InsertContact(contact.id));
        self.execute(Update(contact)).await.map_err(tracerr::wrap!())
    }
}

impl Database<Update<Contact>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contact): Update<Contact>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().contacts.insert(contact.id, contact);
        Ok(())
    }
}

impl Database<Select<By<Option<Company>, company::Singleton>>> for Memory {
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Option<Company>, company::Singleton>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().company.clone())
    }
}

impl Database<Lock<By<Company, company::Singleton>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Company, company::Singleton>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Insert<Company>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(company): Insert<Company>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if state.company.is_some() {
            return Err(unique_violation(database::COMPANIES_SINGLETON_KEY));
        }
        state.company = Some(company);
        Ok(())
    }
}
