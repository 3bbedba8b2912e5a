//! Public [`Property`] pages.
//!
//! [`Property`]: service::domain::Property

use std::collections::HashMap;

use axum::extract::{Path, Query};
use common::pagination;
use serde::Serialize;
use service::{
    domain::property,
    query::{self, Query as _},
    read::property::{
        list,
        search::{self, Filter, Sort},
        Similar,
    },
};

use crate::{form, page::Page, view, AsError, Context, Error};

use super::SPAN_NAME;

/// Context of the listing page.
#[derive(Debug, Serialize)]
pub(super) struct List {
    /// Listings of the current page.
    properties: Vec<view::PropertyCard>,

    /// [`view::Pagination`] info.
    pagination: view::Pagination,

    /// Recognized search parameters, as submitted.
    filters: form::Values,

    /// [`Sort`] being applied.
    sort_by: Sort,

    /// Options of the search form.
    choices: view::Choices,
}

/// Renders a page of available listings matching the search parameters.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn list(
    ctx: Context,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Page<List>, Error> {
    let param = |name: &str| {
        params
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    let sort = Sort::parse(param("sort_by"));
    let criteria = list::Criteria {
        filter: Filter::from_params(param),
        sort,
    };
    let found = ctx
        .service()
        .execute(query::properties::List::by(list::Selector {
            arguments: list::Arguments::new(
                pagination::Number::parse(param("page")),
                list::PER_PAGE,
            ),
            filter: criteria,
        }))
        .await
        .map_err(AsError::into_error)?;

    let filters = search::FILTERS
        .iter()
        .filter_map(|(name, _)| {
            param(name).map(|v| ((*name).to_owned(), v.to_owned()))
        })
        .collect();

    ctx.render(
        "property_list.html",
        List {
            properties: super::property_cards(&ctx, &found.items).await?,
            pagination: (&found).into(),
            filters,
            sort_by: sort,
            choices: view::Choices::all(),
        },
    )
    .await
}

/// Context of the [`Property`] page.
///
/// [`Property`]: service::domain::Property
#[derive(Debug, Serialize)]
pub(super) struct Detail {
    /// Shown [`view::PropertyDetail`].
    property: view::PropertyDetail,

    /// Owning agent, if any.
    agent: Option<view::AgentCard>,

    /// Available listings of the same type.
    similar: Vec<view::PropertyCard>,

    /// Indicator whether the current actor may edit or delete the listing.
    can_modify: bool,
}

/// Renders the page of a single [`Property`].
///
/// [`Property`]: service::domain::Property
#[tracing::instrument(skip_all, fields(id, otel.name = SPAN_NAME))]
pub(super) async fn detail(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Page<Detail>, Error> {
    let id = super::parse_id::<property::Id>(&id, "Property")?;
    _ = tracing::Span::current().record("id", tracing::field::display(id));

    let property = ctx
        .service()
        .execute(query::property::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| {
            Error::not_found(&format!("`Property(id: {id})` does not exist"))
        })?;
    let images = ctx
        .service()
        .execute(query::property::Images::by(id))
        .await
        .map_err(AsError::into_error)?;

    let agent = match property.agent_id {
        Some(agent_id) => ctx
            .service()
            .execute(query::agent::ById::by(agent_id))
            .await
            .map_err(AsError::into_error)?,
        None => None,
    };
    let agent = match agent {
        Some(agent) => Some(super::agent_card(&ctx, &agent).await?),
        None => None,
    };

    let similar = ctx
        .service()
        .execute(query::properties::Similar::by(Similar::to(&property)))
        .await
        .map_err(AsError::into_error)?;
    let similar = super::property_cards(&ctx, &similar).await?;

    let can_modify = ctx.role().await?.access_to(&property).can_modify();

    ctx.render(
        "property_detail.html",
        Detail {
            property: view::PropertyDetail::new(
                &property,
                images,
                ctx.storage(),
            ),
            agent,
            similar,
            can_modify,
        },
    )
    .await
}
