//! [`Company`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{company, property::Coordinates, Company},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Company>, company::Singleton>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Company>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Option<Company>, company::Singleton>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT id, name, tagline, about, email, phone, address, logo, \
                   facebook_url, instagram_url, line_url, website_url, \
                   years_experience, properties_sold, happy_clients, \
                   latitude, longitude, created_at, updated_at \
            FROM companies \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| {
                let counter = |column: &str| {
                    u32::try_from(row.get::<_, i32>(column))
                        .unwrap_or_else(|_| panic!("negative `{column}`"))
                };
                Company {
                    id: row.get("id"),
                    name: row.get("name"),
                    tagline: row.get("tagline"),
                    about: row.get("about"),
                    email: row.get("email"),
                    phone: row.get("phone"),
                    address: row.get("address"),
                    logo: row.get("logo"),
                    socials: company::Socials {
                        facebook: row.get("facebook_url"),
                        instagram: row.get("instagram_url"),
                        line: row.get("line_url"),
                        website: row.get("website_url"),
                    },
                    stats: company::Stats {
                        years_experience: counter("years_experience"),
                        properties_sold: counter("properties_sold"),
                        happy_clients: counter("happy_clients"),
                    },
                    location: row
                        .get::<_, Option<Decimal>>("latitude")
                        .zip(row.get::<_, Option<Decimal>>("longitude"))
                        .and_then(|(lat, long)| Coordinates::new(lat, long)),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                }
            }))
    }
}

impl<C> Database<Lock<By<Company, company::Singleton>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Company, company::Singleton>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(hashtext('companies'))";
        self.exec(SQL, &[])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Company>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(company): Insert<Company>,
    ) -> Result<Self::Ok, Self::Err> {
        let Company {
            id,
            name,
            tagline,
            about,
            email,
            phone,
            address,
            logo,
            socials:
                company::Socials {
                    facebook,
                    instagram,
                    line,
                    website,
                },
            stats:
                company::Stats {
                    years_experience,
                    properties_sold,
                    happy_clients,
                },
            location,
            created_at,
            updated_at,
        } = company;
        let counter = |n: u32| i32::try_from(n).unwrap_or(i32::MAX);
        let years_experience = counter(years_experience);
        let properties_sold = counter(properties_sold);
        let happy_clients = counter(happy_clients);
        let latitude = location.map(|l| l.latitude);
        let longitude = location.map(|l| l.longitude);

        const SQL: &str = "\
            INSERT INTO companies (\
                id, name, tagline, about, email, phone, address, logo, \
                facebook_url, instagram_url, line_url, website_url, \
                years_experience, properties_sold, happy_clients, \
                latitude, longitude, created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::TEXT, \
                $5::VARCHAR, $6::VARCHAR, $7::VARCHAR, $8::VARCHAR, \
                $9::VARCHAR, $10::VARCHAR, $11::VARCHAR, $12::VARCHAR, \
                $13::INT4, $14::INT4, $15::INT4, \
                $16::NUMERIC, $17::NUMERIC, \
                $18::TIMESTAMPTZ, $19::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &name,
                &tagline,
                &about,
                &email,
                &phone,
                &address,
                &logo,
                &facebook,
                &instagram,
                &line,
                &website,
                &years_experience,
                &properties_sold,
                &happy_clients,
                &latitude,
                &longitude,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
