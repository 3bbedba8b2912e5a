//! HTTP pages definitions.

mod agent;
mod auth;
mod contact;
mod dashboard;
mod health;
mod home;
mod property;

use std::str::FromStr;

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;
use service::{
    domain::{Agent, Property},
    query::{self, Query as _},
};

use crate::{form, view, AsError, Context, Error};

/// Name of the [`tracing::Span`] for the page handlers.
const SPAN_NAME: &str = "HTTP page";

/// Creates a [`Router`] serving every page of the site.
pub fn router() -> Router {
    Router::new()
        .route("/", get(home::page))
        .route("/about/", get(agent::about))
        .route("/health", get(health::check))
        .route("/properties/", get(property::list))
        .route(
            "/properties/create/",
            get(dashboard::create_form).post(dashboard::create),
        )
        .route("/properties/:id/", get(property::detail))
        .route(
            "/properties/:id/edit/",
            get(dashboard::edit_form).post(dashboard::edit),
        )
        .route(
            "/properties/:id/delete/",
            get(dashboard::delete_confirm).post(dashboard::delete),
        )
        .route("/property-images/:id/delete/", post(dashboard::delete_image))
        .route("/agents/", get(agent::list))
        .route("/agents/:id/", get(agent::profile))
        .route("/contacts/", get(contact::form).post(contact::submit))
        .route("/register/", get(auth::register_form).post(auth::register))
        .route("/login/", get(auth::login_form).post(auth::login))
        .route("/logout/", get(auth::logout).post(auth::logout))
        .route("/dashboard/", get(dashboard::page))
}

/// Context of a page with a form.
#[derive(Debug, Default, Serialize)]
struct FormState {
    /// Values to fill the form with.
    values: form::Values,

    /// Messages of the invalid fields.
    errors: form::Errors,
}

impl FormState {
    /// Key of [`FormState::errors`] not related to a single field.
    const NON_FIELD: &'static str = "__all__";

    /// Creates a [`FormState`] re-rendering the submitted [`form::Form`].
    fn invalid(form: &form::Form, errors: form::Errors) -> Self {
        Self {
            values: form.echo(),
            errors,
        }
    }

    /// Creates a [`FormState`] re-rendering the submitted [`form::Form`]
    /// rejected as a whole.
    ///
    /// # Errors
    ///
    /// Passes through the [`Error`] unless it's a client one.
    fn rejected(form: &form::Form, err: Error) -> Result<Self, Error> {
        if !err.status_code.is_client_error() {
            return Err(err);
        }
        Ok(Self::invalid(
            form,
            form::Errors::from([(Self::NON_FIELD, err.message)]),
        ))
    }
}

/// Parses an identifier out of a request path.
///
/// # Errors
///
/// With a `404` [`Error`] if the identifier is malformed.
fn parse_id<T: FromStr>(raw: &str, entity: &str) -> Result<T, Error> {
    raw.parse()
        .map_err(|_| Error::not_found(&format!("`{entity}` does not exist")))
}

/// Composes [`view::PropertyCard`]s of the provided [`Property`]s.
async fn property_cards(
    ctx: &Context,
    properties: &[Property],
) -> Result<Vec<view::PropertyCard>, Error> {
    let images = ctx
        .service()
        .execute(query::images::ByProperties::by(
            properties.iter().map(|p| p.id).collect(),
        ))
        .await
        .map_err(AsError::into_error)?;

    Ok(view::PropertyCard::list(properties, &images, ctx.storage()))
}

/// Composes the [`view::AgentCard`] of the provided [`Agent`].
async fn agent_card(
    ctx: &Context,
    agent: &Agent,
) -> Result<view::AgentCard, Error> {
    let user = ctx
        .service()
        .execute(query::user::ById::by(agent.user_id))
        .await
        .map_err(AsError::into_error)?;

    Ok(view::AgentCard::new(agent, user.as_ref(), ctx.storage()))
}

/// Composes [`view::AgentCard`]s of the provided [`Agent`]s.
async fn agent_cards(
    ctx: &Context,
    agents: &[Agent],
) -> Result<Vec<view::AgentCard>, Error> {
    let users = ctx
        .service()
        .execute(query::user::ByIds::by(
            agents.iter().map(|a| a.user_id).collect(),
        ))
        .await
        .map_err(AsError::into_error)?;

    Ok(agents
        .iter()
        .map(|a| view::AgentCard::new(a, users.get(&a.user_id), ctx.storage()))
        .collect())
}

#[cfg(test)]
mod spec {
    use service::domain::property;

    use super::{form, parse_id, FormState};

    #[test]
    fn malformed_ids_are_not_found() {
        let err = parse_id::<property::Id>("42", "Property").unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);

        let id = property::Id::new();
        let parsed = parse_id::<property::Id>(&id.to_string(), "Property");
        assert_eq!(parsed.unwrap(), id);
    }

    #[test]
    fn only_client_errors_are_shown_on_forms() {
        let form = form::Form::default();

        let state = FormState::rejected(
            &form,
            crate::Error {
                code: "WRONG_CREDENTIALS",
                status_code: http::StatusCode::BAD_REQUEST,
                message: "Wrong username or password".into(),
                backtrace: None,
            },
        )
        .unwrap();
        assert_eq!(
            state.errors.get(FormState::NON_FIELD).map(String::as_str),
            Some("Wrong username or password"),
        );

        let err = FormState::rejected(&form, crate::Error::internal(&"boom"))
            .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
