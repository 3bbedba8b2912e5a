//! [`Command`] for granting or revoking [`Agent`] authorization.

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Property, User};
use crate::{
    domain::{
        access::{Denial, Role},
        agent, Actor, Agent,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for granting or revoking the permission of an [`Agent`] to
/// manage [`Property`] listings.
///
/// Only a site administrator [`User`] may do this.
#[derive(Clone, Copy, Debug)]
pub struct AuthorizeAgent {
    /// [`Actor`] changing the authorization.
    pub actor: Actor,

    /// ID of the [`Agent`] to change the authorization of.
    pub agent_id: agent::Id,

    /// Indicator whether the [`Agent`] becomes authorized or not.
    pub is_authorized: bool,
}

impl<Db> Command<AuthorizeAgent> for Service<Db>
where
    Db: Database<
            Select<By<Role, Actor>>,
            Ok = Role,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Agent>, agent::Id>>,
            Ok = Option<Agent>,
            Err = Traced<database::Error>,
        > + Database<Update<Agent>, Err = Traced<database::Error>>,
{
    type Ok = Agent;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeAgent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeAgent {
            actor,
            agent_id,
            is_authorized,
        } = cmd;

        let admin_id = self
            .database()
            .execute(Select(By::new(actor)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .admin()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let mut agent = self
            .database()
            .execute(Select(By::new(agent_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::AgentNotExists(agent_id))
            .map_err(tracerr::wrap!())?;

        if agent.is_authorized != is_authorized {
            agent.is_authorized = is_authorized;
            self.database()
                .execute(Update(agent.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tracing::info!(
                agent_id = %agent.id,
                admin_id = %admin_id,
                is_authorized,
                "`Agent` authorization changed",
            );
        }

        Ok(agent)
    }
}

/// Error of [`AuthorizeAgent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Agent`] with the provided ID does not exist.
    #[display("`Agent(id: {_0})` does not exist")]
    #[from(ignore)]
    AgentNotExists(#[error(not(source))] agent::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not a site administrator.
    #[display("Authorizing the `Agent` is denied: {_0}")]
    Denied(Denial),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::{
            access::{Denial, Role},
            Actor,
        },
        infra::Database as _,
        testing, Command as _,
    };

    use super::{AuthorizeAgent, ExecutionError};

    #[tokio::test]
    async fn admin_authorizes_agent() {
        let svc = testing::service();
        let admin = testing::admin(&svc).await;
        let (user, agent) = testing::agent(&svc, "mei", false).await;

        let updated = svc
            .execute(AuthorizeAgent {
                actor: Actor::User(admin.id),
                agent_id: agent.id,
                is_authorized: true,
            })
            .await
            .unwrap();
        assert!(updated.is_authorized);

        let role = svc
            .database()
            .execute(Select(By::<Role, _>::new(Actor::User(user.id))))
            .await
            .unwrap();
        assert_eq!(role.authorized_agent(), Ok(agent.id));
    }

    #[tokio::test]
    async fn agent_cannot_authorize_itself() {
        let svc = testing::service();
        let (user, agent) = testing::agent(&svc, "mei", false).await;

        let err = svc
            .execute(AuthorizeAgent {
                actor: Actor::User(user.id),
                agent_id: agent.id,
                is_authorized: true,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::NotAdmin),
        ));
    }
}
