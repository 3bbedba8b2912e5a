//! [`Image`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::property::{self, image, Image},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Reads an [`Image`] out of a [`Row`].
fn from_row(row: &Row) -> Image {
    Image {
        id: row.get("id"),
        property_id: row.get("property_id"),
        file: row.get("file"),
        caption: row.get("caption"),
        is_primary: row.get("is_primary"),
        order: image::Order::try_from(row.get::<_, i32>("position"))
            .expect("`position` overflow"),
    }
}

impl<C> Database<Select<By<Vec<Image>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Image>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Image>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, property_id, file, caption, is_primary, position \
            FROM property_images \
            WHERE property_id = $1::UUID \
            ORDER BY position ASC, is_primary DESC, id ASC";
        Ok(self
            .query(SQL, &[&property_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C, IDs> Database<Select<By<HashMap<property::Id, Vec<Image>>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[property::Id]>,
{
    type Ok = HashMap<property::Id, Vec<Image>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<property::Id, Vec<Image>>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[property::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const SQL: &str = "\
            SELECT id, property_id, file, caption, is_primary, position \
            FROM property_images \
            WHERE property_id = ANY($1::UUID[]) \
            ORDER BY property_id, position ASC, is_primary DESC, id ASC";
        let mut images = HashMap::<_, Vec<_>>::new();
        for image in self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
        {
            images.entry(image.property_id).or_default().push(image);
        }
        Ok(images)
    }
}

impl<C> Database<Select<By<Option<Image>, image::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Image>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Image>, image::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, property_id, file, caption, is_primary, position \
            FROM property_images \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Image>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Image>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(image): Insert<Image>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(image)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Image>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(image): Update<Image>,
    ) -> Result<Self::Ok, Self::Err> {
        let Image {
            id,
            property_id,
            file,
            caption,
            is_primary,
            order,
        } = image;
        let position = i32::from(order);

        const SQL: &str = "\
            INSERT INTO property_images (\
                id, property_id, file, caption, is_primary, position\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::VARCHAR, \
                $5::BOOLEAN, $6::INT4\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET property_id = EXCLUDED.property_id, \
                file = EXCLUDED.file, \
                caption = EXCLUDED.caption, \
                is_primary = EXCLUDED.is_primary, \
                position = EXCLUDED.position";
        self.exec(
            SQL,
            &[&id, &property_id, &file, &caption, &is_primary, &position],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Image, image::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Image, image::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: image::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM property_images \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
