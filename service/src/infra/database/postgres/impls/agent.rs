//! [`Agent`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{agent, user, Agent},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Reads an [`Agent`] out of a [`Row`].
fn from_row(row: &Row) -> Agent {
    Agent {
        id: row.get("id"),
        user_id: row.get("user_id"),
        phone: row.get("phone"),
        bio: row.get("bio"),
        photo: row.get("photo"),
        specialization: row.get("specialization"),
        is_authorized: row.get("is_authorized"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Agent>, agent::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Agent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Agent>, agent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, phone, bio, photo, specialization, \
                   is_authorized, created_at \
            FROM agents \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Agent>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Agent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Agent>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, user_id, phone, bio, photo, specialization, \
                   is_authorized, created_at \
            FROM agents \
            WHERE user_id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Agent>, read::agent::All>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Agent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Agent>, read::agent::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, user_id, phone, bio, photo, specialization, \
                   is_authorized, created_at \
            FROM agents \
            ORDER BY created_at ASC, id ASC";
        Ok(self
            .query(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Agent>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Agent>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(agent): Insert<Agent>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(agent)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Agent>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(agent): Update<Agent>,
    ) -> Result<Self::Ok, Self::Err> {
        let Agent {
            id,
            user_id,
            phone,
            bio,
            photo,
            specialization,
            is_authorized,
            created_at,
        } = agent;

        const SQL: &str = "\
            INSERT INTO agents (\
                id, user_id, phone, bio, photo, specialization, \
                is_authorized, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::TEXT, $5::VARCHAR, \
                $6::VARCHAR, $7::BOOLEAN, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET user_id = EXCLUDED.user_id, \
                phone = EXCLUDED.phone, \
                bio = EXCLUDED.bio, \
                photo = EXCLUDED.photo, \
                specialization = EXCLUDED.specialization, \
                is_authorized = EXCLUDED.is_authorized, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[
                &id,
                &user_id,
                &phone,
                &bio,
                &photo,
                &specialization,
                &is_authorized,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
