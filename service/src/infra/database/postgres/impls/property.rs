//! [`Property`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Lock, Select, Update},
    pagination,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{agent, property, Property},
    infra::{
        database::{
            self,
            postgres::{Connection, LikePattern},
            Postgres,
        },
        Database,
    },
    read::{
        self,
        property::search::{Filter, Sort},
    },
};

/// Columns of the `properties` table selected into a [`Property`].
const COLUMNS: &str = "\
    id, agent_id, \
    title, description, price, \
    listing_type, kind, status, \
    address, city, postal_code, latitude, longitude, \
    bedrooms, bathrooms, area_sqm, year_built, parking_spaces, \
    featured, created_at, updated_at";

/// Reads a [`Property`] out of a [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Property {
    let count = |column: &str| {
        property::Count::try_from(row.get::<_, i32>(column))
            .unwrap_or_else(|_| panic!("`{column}` overflow"))
    };

    Property {
        id: row.get("id"),
        agent_id: row.get("agent_id"),
        details: property::Details {
            title: row.get("title"),
            description: row.get("description"),
            price: row.get("price"),
            listing_type: row.get("listing_type"),
            kind: row.get("kind"),
            status: row.get("status"),
            address: row.get("address"),
            city: row.get("city"),
            postal_code: row.get("postal_code"),
            location: row
                .get::<_, Option<Decimal>>("latitude")
                .zip(row.get::<_, Option<Decimal>>("longitude"))
                .and_then(|(lat, long)| property::Coordinates::new(lat, long)),
            bedrooms: count("bedrooms"),
            bathrooms: count("bathrooms"),
            area: row.get("area_sqm"),
            year_built: row
                .get::<_, Option<i32>>("year_built")
                .map(property::Year::try_from)
                .transpose()
                .expect("`year_built` out of range"),
            parking_spaces: count("parking_spaces"),
        },
        featured: row.get("featured"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Returns the SQL `ORDER BY` expression of the provided [`Sort`].
const fn order_by(sort: Sort) -> &'static str {
    match sort {
        Sort::PriceLow => "price ASC, id ASC",
        Sort::PriceHigh => "price DESC, id ASC",
        Sort::Sqft => "area_sqm DESC, id ASC",
        Sort::Newest => "created_at DESC, id ASC",
    }
}

/// Returns the SQL selecting the requested page of the `properties` matching
/// the `conditions` along with their `total` number.
///
/// Counting and paging run as a single statement, so both see the same
/// snapshot. The requested page is clamped the way [`Arguments::resolve()`]
/// does it. With no matches, the only row has `NULL`s besides the `total`.
///
/// [`Arguments::resolve()`]: pagination::Arguments::resolve
fn page_sql(
    conditions: &str,
    order: &str,
    page_idx: usize,
    per_page_idx: usize,
) -> String {
    format!(
        "WITH matching AS (\
             SELECT {COLUMNS} \
             FROM properties \
             WHERE {conditions}\
         ), counted AS (\
             SELECT COUNT(*)::INT8 AS total \
             FROM matching\
         ) \
         SELECT counted.total, listed.* \
         FROM counted \
         LEFT JOIN LATERAL (\
             SELECT * \
             FROM matching \
             ORDER BY {order} \
             LIMIT ${per_page_idx}::INT8 \
             OFFSET (LEAST(${page_idx}::INT8, \
                           GREATEST((counted.total + ${per_page_idx}::INT8 - 1) \
                                    / ${per_page_idx}::INT8, 1)) \
                     - 1) * ${per_page_idx}::INT8\
         ) AS listed ON TRUE \
         ORDER BY {order}"
    )
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C>
    Database<
        Select<
            By<read::property::list::Page, read::property::list::Selector>,
        >,
    > for Postgres<C>
where
    C: Connection,
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
        let Filter {
            listing_type,
            kinds,
            location,
            min_price,
            max_price,
            min_bedrooms,
            min_bathrooms,
        } = &filter;

        let available = property::Status::Available;
        let location = location.as_deref().map(LikePattern::containing);
        let min_bedrooms = min_bedrooms.map(i32::from);
        let min_bathrooms = min_bathrooms.map(i32::from);
        let page = i64::try_from(arguments.page.get()).unwrap_or(i64::MAX);
        let per_page = i64::try_from(arguments.per_page.get())
            .expect("`per_page` overflow");

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&available];

        let listing_type_idx = listing_type.as_ref().map(|t| {
            ps.push(t);
            ps.len()
        });
        let kinds_idx = (!kinds.is_empty()).then(|| {
            ps.push(kinds);
            ps.len()
        });
        let location_idx = location.as_ref().map(|l| {
            ps.push(l);
            ps.len()
        });
        let min_price_idx = min_price.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });
        let max_price_idx = max_price.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });
        let min_bedrooms_idx = min_bedrooms.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });
        let min_bathrooms_idx = min_bathrooms.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let conditions = format!(
            "status = $1::INT2 \
             {listing_type} \
             {kinds} \
             {location} \
             {min_price} \
             {max_price} \
             {min_bedrooms} \
             {min_bathrooms}",
            listing_type = listing_type_idx.into_iter().format_with(
                "",
                |idx, f| f(&format_args!("AND listing_type = ${idx}::INT2")),
            ),
            kinds = kinds_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND kind = ANY(${idx}::INT2[])"))
            }),
            location = location_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!(
                    "AND (city ILIKE ${idx}::VARCHAR \
                          OR address ILIKE ${idx}::VARCHAR \
                          OR postal_code ILIKE ${idx}::VARCHAR)"
                ))
            }),
            min_price = min_price_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND price >= ${idx}::NUMERIC"))
            }),
            max_price = max_price_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND price <= ${idx}::NUMERIC"))
            }),
            min_bedrooms = min_bedrooms_idx.into_iter().format_with(
                "",
                |idx, f| f(&format_args!("AND bedrooms >= ${idx}::INT4")),
            ),
            min_bathrooms = min_bathrooms_idx.into_iter().format_with(
                "",
                |idx, f| f(&format_args!("AND bathrooms >= ${idx}::INT4")),
            ),
        );

        ps.push(&page);
        let page_idx = ps.len();
        ps.push(&per_page);
        let per_page_idx = ps.len();

        let sql =
            page_sql(&conditions, order_by(sort), page_idx, per_page_idx);
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let total = rows.first().map_or(0, |row| row.get::<_, i64>("total"));
        let window = arguments
            .resolve(usize::try_from(total).expect("`COUNT(*)` overflow"));

        let listed = rows
            .iter()
            .filter(|row| row.get::<_, Option<property::Id>>("id").is_some());
        Ok(pagination::Page::new(listed.map(from_row), window))
    }
}

impl<C> Database<Select<By<Vec<Property>, read::property::Featured>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, read::property::Featured>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::Featured { limit } = by.into_inner();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE status = $1::INT2 \
                   AND featured \
             ORDER BY {order} \
             LIMIT $2::INT8",
            order = order_by(Sort::Newest),
        );
        Ok(self
            .query(&sql, &[&property::Status::Available, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Property>, read::property::Similar>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, read::property::Similar>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::Similar { to, kind, limit } = by.into_inner();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE status = $1::INT2 \
                   AND kind = $2::INT2 \
                   AND id <> $3::UUID \
             ORDER BY {order} \
             LIMIT $4::INT8",
            order = order_by(Sort::Newest),
        );
        Ok(self
            .query(&sql, &[&property::Status::Available, &kind, &to, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Property>, read::property::OwnedBy>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, read::property::OwnedBy>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::property::OwnedBy { agent_id, status } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM properties \
             WHERE agent_id = $1::UUID \
                   AND ($2::INT2 IS NULL OR status = $2::INT2) \
             ORDER BY {order}",
            order = order_by(Sort::Newest),
        );
        Ok(self
            .query(&sql, &[&agent_id, &status])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<read::agent::Stats, agent::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::agent::Stats;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::agent::Stats, agent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let agent_id = by.into_inner();

        const SQL: &str = "\
            SELECT status, COUNT(*)::INT8 AS count \
            FROM properties \
            WHERE agent_id = $1::UUID \
            GROUP BY status";
        let mut stats = read::agent::Stats::default();
        for row in self
            .query(SQL, &[&agent_id])
            .await
            .map_err(tracerr::wrap!())?
        {
            let count = u32::try_from(row.get::<_, i64>("count"))
                .expect("`count` overflow");
            match row.get("status") {
                property::Status::Available => stats.available = count,
                property::Status::Pending => stats.pending = count,
                property::Status::Sold => stats.sold = count,
            }
        }
        Ok(stats)
    }
}

impl<C> Database<Insert<Property>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Property>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let Property {
            id,
            agent_id,
            details:
                property::Details {
                    title,
                    description,
                    price,
                    listing_type,
                    kind,
                    status,
                    address,
                    city,
                    postal_code,
                    location,
                    bedrooms,
                    bathrooms,
                    area,
                    year_built,
                    parking_spaces,
                },
            featured,
            created_at,
            updated_at,
        } = property;
        let latitude = location.map(|l| l.latitude);
        let longitude = location.map(|l| l.longitude);
        let bedrooms = i32::from(bedrooms);
        let bathrooms = i32::from(bathrooms);
        let year_built = year_built.map(|y| i32::from(y.get()));
        let parking_spaces = i32::from(parking_spaces);

        const SQL: &str = "\
            INSERT INTO properties (\
                id, agent_id, \
                title, description, price, \
                listing_type, kind, status, \
                address, city, postal_code, latitude, longitude, \
                bedrooms, bathrooms, area_sqm, year_built, parking_spaces, \
                featured, created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::TEXT, $5::NUMERIC, \
                $6::INT2, $7::INT2, $8::INT2, \
                $9::VARCHAR, $10::VARCHAR, $11::VARCHAR, \
                $12::NUMERIC, $13::NUMERIC, \
                $14::INT4, $15::INT4, $16::NUMERIC, $17::INT4, $18::INT4, \
                $19::BOOLEAN, $20::TIMESTAMPTZ, $21::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET agent_id = EXCLUDED.agent_id, \
                title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                price = EXCLUDED.price, \
                listing_type = EXCLUDED.listing_type, \
                kind = EXCLUDED.kind, \
                status = EXCLUDED.status, \
                address = EXCLUDED.address, \
                city = EXCLUDED.city, \
                postal_code = EXCLUDED.postal_code, \
                latitude = EXCLUDED.latitude, \
                longitude = EXCLUDED.longitude, \
                bedrooms = EXCLUDED.bedrooms, \
                bathrooms = EXCLUDED.bathrooms, \
                area_sqm = EXCLUDED.area_sqm, \
                year_built = EXCLUDED.year_built, \
                parking_spaces = EXCLUDED.parking_spaces, \
                featured = EXCLUDED.featured, \
                created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &agent_id,
                &title,
                &description,
                &price,
                &listing_type,
                &kind,
                &status,
                &address,
                &city,
                &postal_code,
                &latitude,
                &longitude,
                &bedrooms,
                &bathrooms,
                &area,
                &year_built,
                &parking_spaces,
                &featured,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM properties \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: property::Id = by.into_inner();

        // `property_images` cascade, `contacts` are detached by foreign keys.
        const SQL: &str = "\
            DELETE FROM properties \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

#[cfg(test)]
mod spec {
    use crate::read::property::search::Sort;

    use super::{order_by, page_sql};

    #[test]
    fn orders_by_sort_column_then_id() {
        assert_eq!(order_by(Sort::Sqft), "area_sqm DESC, id ASC");
        assert_eq!(order_by(Sort::PriceLow), "price ASC, id ASC");
        assert_eq!(order_by(Sort::PriceHigh), "price DESC, id ASC");
        assert_eq!(order_by(Sort::Newest), "created_at DESC, id ASC");
    }

    #[test]
    fn counts_and_pages_in_single_statement() {
        let sql = page_sql("status = $1::INT2", order_by(Sort::Sqft), 2, 3);

        assert!(!sql.contains(';'));
        assert!(sql.starts_with("WITH matching AS (SELECT id, agent_id,"));
        assert!(sql.contains("SELECT COUNT(*)::INT8 AS total FROM matching"));
        assert!(sql.contains("WHERE status = $1::INT2)"));
        assert!(sql.contains("LIMIT $3::INT8"));
        assert!(sql.contains("OFFSET (LEAST($2::INT8,"));
        assert!(sql.ends_with("ON TRUE ORDER BY area_sqm DESC, id ASC"));
    }
}
