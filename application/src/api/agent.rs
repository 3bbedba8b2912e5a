//! Public [`Agent`] pages.
//!
//! [`Agent`]: service::domain::Agent

use axum::extract::Path;
use serde::Serialize;
use service::{
    domain::{agent, property},
    query::{self, Query as _},
    read,
};

use crate::{page::Page, view, AsError, Context, Error};

use super::SPAN_NAME;

/// Context of a page listing all the agents.
#[derive(Debug, Serialize)]
pub(super) struct Agents {
    /// Every agent of the company.
    agents: Vec<view::AgentCard>,
}

/// Composes the [`Agents`] context.
async fn agents(ctx: &Context) -> Result<Agents, Error> {
    let agents = ctx
        .service()
        .execute(query::agents::All::by(read::agent::All))
        .await
        .map_err(AsError::into_error)?;

    Ok(Agents {
        agents: super::agent_cards(ctx, &agents).await?,
    })
}

/// Renders the list of agents.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn list(ctx: Context) -> Result<Page<Agents>, Error> {
    let agents = agents(&ctx).await?;
    ctx.render("agent.html", agents).await
}

/// Renders the page about the company and its agents.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn about(ctx: Context) -> Result<Page<Agents>, Error> {
    let agents = agents(&ctx).await?;
    ctx.render("about.html", agents).await
}

/// Context of an agent profile page.
#[derive(Debug, Serialize)]
pub(super) struct Profile {
    /// Shown agent.
    agent: view::AgentCard,

    /// Numbers of the agent's listings.
    counts: view::Counts,

    /// Available listings of the agent.
    properties: Vec<view::PropertyCard>,
}

/// Renders the public profile of an agent.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn profile(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Page<Profile>, Error> {
    let id = super::parse_id::<agent::Id>(&id, "Agent")?;

    let agent = ctx
        .service()
        .execute(query::agent::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| {
            Error::not_found(&format!("`Agent(id: {id})` does not exist"))
        })?;
    let stats = ctx
        .service()
        .execute(query::agent::Stats::by(id))
        .await
        .map_err(AsError::into_error)?;
    let properties = ctx
        .service()
        .execute(query::properties::OwnedBy::by(read::property::OwnedBy {
            agent_id: id,
            status: Some(property::Status::Available),
        }))
        .await
        .map_err(AsError::into_error)?;

    ctx.render(
        "agent_detail.html",
        Profile {
            agent: super::agent_card(&ctx, &agent).await?,
            counts: stats.into(),
            properties: super::property_cards(&ctx, &properties).await?,
        },
    )
    .await
}
