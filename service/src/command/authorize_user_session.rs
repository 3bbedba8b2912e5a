//! [`Command`] for authorizing a [`User`] by a [`Session`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        Actor, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by a [`Session`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

/// Output of [`AuthorizeUserSession`] [`Command`].
#[derive(Clone, Copy, Debug)]
pub struct Output {
    /// Authorized [`Session`].
    pub session: Session,

    /// [`Actor`] the [`Session`] identifies.
    pub actor: Actor,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        let user = self
            .database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())?;

        Ok(Output {
            session,
            actor: Actor::User(user.id),
        })
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{operations::Insert, DateTime};

    use crate::{
        command::{create_user_session, CreateUserSession},
        domain::{user::session, Actor},
        infra::Database as _,
        testing, Command as _,
    };

    use super::AuthorizeUserSession;

    #[tokio::test]
    async fn resolves_actor_of_valid_token() {
        let svc = testing::service();
        let user = testing::user("alice", false);
        svc.database().execute(Insert(user.clone())).await.unwrap();

        let create_user_session::Output { token, .. } = svc
            .execute(CreateUserSession::ByUserId(user.id))
            .await
            .unwrap();
        let out = svc.execute(AuthorizeUserSession { token }).await.unwrap();

        assert_eq!(out.actor, Actor::User(user.id));
        assert_eq!(out.session.user_id, user.id);
    }

    #[tokio::test]
    async fn rejects_garbage_and_unknown_users() {
        let svc = testing::service();

        let token = "not-a-jwt".parse::<session::Token>().unwrap();
        assert!(svc.execute(AuthorizeUserSession { token }).await.is_err());

        let ghost = testing::user("ghost", false);
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &session::Session {
                user_id: ghost.id,
                expires_at: (DateTime::now() + Duration::from_secs(60))
                    .coerce(),
            },
            &svc.config().jwt_encoding_key,
        )
        .unwrap()
        .parse::<session::Token>()
        .unwrap();
        assert!(svc.execute(AuthorizeUserSession { token }).await.is_err());
    }
}
