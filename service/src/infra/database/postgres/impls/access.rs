//! [`Role`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{access::Role, Actor},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Role, Actor>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Role;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Role, Actor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(user_id) = by.into_inner().user_id() else {
            return Ok(Role::Anonymous);
        };

        const SQL: &str = "\
            SELECT u.id AS user_id, u.is_admin, \
                   a.id AS agent_id, a.is_authorized \
            FROM users AS u \
            LEFT JOIN agents AS a ON a.user_id = u.id \
            WHERE u.id = $1::UUID";
        let Some(row) = self
            .query_opt(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(Role::Anonymous);
        };

        let user_id = row.get("user_id");
        let is_admin = row.get("is_admin");
        Ok(match row.get("agent_id") {
            None => Role::Member { user_id, is_admin },
            Some(agent_id) => Role::Agent {
                user_id,
                is_admin,
                agent_id,
                is_authorized: row.get("is_authorized"),
            },
        })
    }
}
