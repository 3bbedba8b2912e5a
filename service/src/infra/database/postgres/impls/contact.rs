//! [`Contact`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{contact, Contact},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Contact>, contact::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contact>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contact>, contact::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, email, phone, message, property_id, \
                   responded, created_at \
            FROM contacts \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Contact {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                phone: row.get("phone"),
                message: row.get("message"),
                property_id: row.get("property_id"),
                responded: row.get("responded"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<Contact>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Contact>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contact): Insert<Contact>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(contact)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Contact>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contact): Update<Contact>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contact {
            id,
            name,
            email,
            phone,
            message,
            property_id,
            responded,
            created_at,
        } = contact;

        const SQL: &str = "\
            INSERT INTO contacts (\
                id, name, email, phone, message, property_id, \
                responded, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::TEXT, $6::UUID, $7::BOOLEAN, $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET responded = EXCLUDED.responded";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &email,
                &phone,
                &message,
                &property_id,
                &responded,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
