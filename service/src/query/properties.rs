//! [`Query`] collection related to multiple [`Property`]s.

use common::operations::By;

use crate::{domain::Property, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`read::property::list::Page`] of available [`Property`]s
/// matching search criteria.
pub type List = DatabaseQuery<
    By<read::property::list::Page, read::property::list::Selector>,
>;

/// Queries featured available [`Property`]s.
pub type Featured = DatabaseQuery<By<Vec<Property>, read::property::Featured>>;

/// Queries available [`Property`]s similar to another one.
pub type Similar = DatabaseQuery<By<Vec<Property>, read::property::Similar>>;

/// Queries [`Property`]s listed by an agent.
pub type OwnedBy = DatabaseQuery<By<Vec<Property>, read::property::OwnedBy>>;

#[cfg(test)]
mod spec {
    use std::collections::{HashMap, HashSet};

    use common::{pagination, Money};

    use crate::{
        domain::{property, Property},
        infra::Memory,
        read::property::{
            list::{Arguments, Criteria, Selector, PER_PAGE},
            search::{Filter, Sort},
        },
        testing, Query as _, Service,
    };

    use super::List;

    fn criteria(params: &[(&str, &str)]) -> Criteria {
        let params = params.iter().copied().collect::<HashMap<_, _>>();
        Criteria {
            filter: Filter::from_params(|k| params.get(k).copied()),
            sort: Sort::parse(params.get("sort_by").copied()),
        }
    }

    async fn page(
        svc: &Service<Memory>,
        criteria: Criteria,
        n: i64,
    ) -> pagination::Page<Property> {
        svc.execute(List::by(Selector {
            arguments: Arguments::new(pagination::Number::new(n), PER_PAGE),
            filter: criteria,
        }))
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn filters_by_kinds_and_price_cheapest_first() {
        let svc = testing::service();
        for (age, (kind, price)) in [
            (property::Kind::House, "90000"),
            (property::Kind::House, "150000"),
            (property::Kind::Condo, "200000"),
            (property::Kind::Land, "120000"),
        ]
        .into_iter()
        .enumerate()
        {
            _ = testing::property(
                &svc,
                None,
                testing::details(kind, price),
                u64::try_from(age).unwrap(),
            )
            .await;
        }

        let found = page(
            &svc,
            criteria(&[
                ("property_type", "house,condo"),
                ("min_price", "100000"),
                ("sort_by", "price_low"),
            ]),
            1,
        )
        .await;

        let found = found
            .items
            .iter()
            .map(|p| (p.details.kind, p.details.price))
            .collect::<Vec<_>>();
        assert_eq!(
            found,
            [
                (property::Kind::House, "150000".parse::<Money>().unwrap()),
                (property::Kind::Condo, "200000".parse::<Money>().unwrap()),
            ],
        );
    }

    #[tokio::test]
    async fn orders_monotonically() {
        let svc = testing::service();
        for (age, (price, area)) in [
            ("300", "75"),
            ("100", "210.5"),
            ("200", "75"),
            ("100", "48.25"),
            ("500", "130"),
        ]
        .into_iter()
        .enumerate()
        {
            let mut details = testing::details(property::Kind::Condo, price);
            details.area = area.parse().unwrap();
            _ = testing::property(
                &svc,
                None,
                details,
                u64::try_from(age).unwrap(),
            )
            .await;
        }

        let items = page(&svc, criteria(&[("sort_by", "price_low")]), 1)
            .await
            .items;
        assert!(items
            .windows(2)
            .all(|w| w[0].details.price <= w[1].details.price));

        let items = page(&svc, criteria(&[("sort_by", "price_high")]), 1)
            .await
            .items;
        assert!(items
            .windows(2)
            .all(|w| w[0].details.price >= w[1].details.price));

        let items = page(&svc, criteria(&[("sort_by", "sqft")]), 1)
            .await
            .items;
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].details.area.to_string(), "210.5");
        assert!(items
            .windows(2)
            .all(|w| w[0].details.area >= w[1].details.area));

        let items = page(&svc, criteria(&[]), 1).await.items;
        assert!(items.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn pages_concatenate_without_gaps() {
        let svc = testing::service();
        let mut sold = testing::details(property::Kind::Villa, "1");
        sold.status = property::Status::Sold;
        _ = testing::property(&svc, None, sold, 0).await;
        for age in 1..=20 {
            _ = testing::property(
                &svc,
                None,
                testing::details(property::Kind::House, "1000"),
                age,
            )
            .await;
        }

        let first = page(&svc, criteria(&[]), 1).await;
        assert_eq!(first.window.total, 20);
        assert_eq!(first.window.pages, 3);

        let mut seen = vec![];
        for n in 1..=3 {
            let p = page(&svc, criteria(&[]), n).await;
            assert!(p.items.len() <= PER_PAGE.get());
            seen.extend(p.items.into_iter().map(|p| p.id));
        }
        assert_eq!(seen.len(), 20);
        assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 20);

        let past_end = page(&svc, criteria(&[]), 42).await;
        assert_eq!(past_end.window.number, 3);
        assert!(!past_end.has_next());
    }
}
