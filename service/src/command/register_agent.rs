//! [`Command`] for registering a new [`Agent`].

use argon2::password_hash;
use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tokio::task;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{
    agent::{Bio, Specialization},
    user::{Email, Login, Name, Password, Phone},
};
use crate::{
    domain::{agent, user, Agent, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`Agent`] along with the [`User`]
/// backing it.
///
/// A registered [`Agent`] is not authorized to manage listings until a site
/// administrator approves it.
#[derive(Clone, Debug)]
pub struct RegisterAgent {
    /// [`Login`] of a new [`User`].
    pub login: user::Login,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// Repeated [`Password`] of a new [`User`].
    pub password_confirmation: SecretBox<user::Password>,

    /// First [`Name`] of a new [`User`].
    pub first_name: Option<user::Name>,

    /// Last [`Name`] of a new [`User`].
    pub last_name: Option<user::Name>,

    /// [`Email`] of a new [`User`].
    pub email: Option<user::Email>,

    /// [`Phone`] of a new [`Agent`].
    pub phone: user::Phone,

    /// [`Bio`] of a new [`Agent`].
    pub bio: Option<agent::Bio>,

    /// [`Specialization`] of a new [`Agent`].
    pub specialization: Option<agent::Specialization>,
}

/// Output of [`RegisterAgent`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`User`].
    pub user: User,

    /// Created [`Agent`].
    pub agent: Agent,
}

impl<Db> Command<RegisterAgent> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Insert<Agent>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RegisterAgent) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RegisterAgent {
            login,
            password,
            password_confirmation,
            first_name,
            last_name,
            email,
            phone,
            bio,
            specialization,
        } = cmd;

        if password.expose_secret() != password_confirmation.expose_secret() {
            return Err(tracerr::new!(E::PasswordMismatch));
        }

        let existing = self
            .database()
            .execute(Select(By::new(&login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::LoginOccupied(login)));
        }

        let password_hash = task::spawn_blocking(move || {
            user::PasswordHash::new(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let user = User {
            id: user::Id::new(),
            login,
            password_hash,
            first_name,
            last_name,
            email,
            is_admin: false,
            created_at: now.coerce(),
        };
        let agent = Agent {
            id: agent::Id::new(),
            user_id: user.id,
            phone,
            bio,
            photo: None,
            specialization,
            is_authorized: false,
            created_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let inserted = tx.execute(Insert(user.clone())).await;
        if let Err(e) = &inserted {
            // Concurrent registration has taken the `Login` first.
            if e
                .as_ref()
                .is_unique_violation(Some(database::USERS_LOGIN_KEY))
            {
                return Err(tracerr::new!(E::LoginOccupied(user.login)));
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(agent.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output { user, agent })
    }
}

/// Error of [`RegisterAgent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Hashing the [`user::Password`] didn't complete.
    #[display("Password hashing task failed: {_0}")]
    Hashing(task::JoinError),

    /// [`user::Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    #[from(ignore)]
    LoginOccupied(#[error(not(source))] user::Login),

    /// Failed to hash the [`user::Password`].
    #[display("Failed to hash password: {_0}")]
    PasswordHash(password_hash::Error),

    /// [`user::Password`] doesn't match its confirmation.
    #[display("Passwords don't match")]
    PasswordMismatch,
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};
    use secrecy::SecretBox;

    use crate::{
        domain::{access::Role, user, Actor},
        infra::Database as _,
        testing, Command as _,
    };

    use super::{ExecutionError, RegisterAgent};

    fn secret(password: &str) -> SecretBox<user::Password> {
        SecretBox::new(Box::new(user::Password::new(password).unwrap()))
    }

    fn registration(login: &str, confirmation: &str) -> RegisterAgent {
        RegisterAgent {
            login: user::Login::new(login).unwrap(),
            password: secret(testing::PASSWORD),
            password_confirmation: secret(confirmation),
            first_name: user::Name::new("Mei"),
            last_name: user::Name::new("Lin"),
            email: user::Email::new("mei@example.com"),
            phone: user::Phone::new("0912 345 678").unwrap(),
            bio: None,
            specialization: None,
        }
    }

    #[tokio::test]
    async fn registers_unauthorized_agent() {
        let svc = testing::service();

        let out = svc
            .execute(registration("mei", testing::PASSWORD))
            .await
            .unwrap();

        assert!(!out.agent.is_authorized);
        assert_eq!(out.agent.user_id, out.user.id);
        assert!(!out.user.is_admin);

        let role = svc
            .database()
            .execute(Select(By::<Role, _>::new(Actor::User(out.user.id))))
            .await
            .unwrap();
        assert_eq!(
            role,
            Role::Agent {
                user_id: out.user.id,
                is_admin: false,
                agent_id: out.agent.id,
                is_authorized: false,
            },
        );
    }

    #[tokio::test]
    async fn stores_verifiable_password_hash() {
        let svc = testing::service();

        let out = svc
            .execute(registration("mei", testing::PASSWORD))
            .await
            .unwrap();

        let hash = &out.user.password_hash;
        assert!(hash.to_string().starts_with("$argon2id$"));
        assert!(hash.verify(&user::Password::new(testing::PASSWORD).unwrap()));
        assert!(!hash.verify(&user::Password::new("wrong horse").unwrap()));
    }

    #[tokio::test]
    async fn rejects_mismatched_confirmation() {
        let svc = testing::service();

        let err = svc
            .execute(registration("mei", "another password"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PasswordMismatch));
    }

    #[tokio::test]
    async fn rejects_occupied_login() {
        let svc = testing::service();
        drop(svc.execute(registration("mei", testing::PASSWORD)).await.unwrap());

        let err = svc
            .execute(registration("mei", testing::PASSWORD))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LoginOccupied(_)));
    }
}
