//! Home page.

use serde::Serialize;
use service::{
    query::{self, Query as _},
    read,
};

use crate::{page::Page, view, AsError, Context, Error};

use super::SPAN_NAME;

/// Context of the home page.
#[derive(Debug, Serialize)]
pub(super) struct Home {
    /// Featured available listings, newest first.
    featured: Vec<view::PropertyCard>,
}

/// Renders the home page.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn page(ctx: Context) -> Result<Page<Home>, Error> {
    let featured = ctx
        .service()
        .execute(query::properties::Featured::by(
            read::property::Featured::default(),
        ))
        .await
        .map_err(AsError::into_error)?;

    let featured = super::property_cards(&ctx, &featured).await?;
    ctx.render("home.html", Home { featured }).await
}
