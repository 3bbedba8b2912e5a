//! Inquiry pages.

use std::collections::HashMap;

use axum::{
    extract::Query,
    response::{IntoResponse as _, Response},
};
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::property,
    query,
};

use crate::{
    form::Form,
    page::{Notice, Page, Redirect},
    AsError, Context, Error,
};

use super::{FormState, SPAN_NAME};

/// Context of the inquiry page.
#[derive(Debug, Serialize)]
pub(super) struct Inquiry {
    /// State of the inquiry form.
    #[serde(flatten)]
    form: FormState,

    /// Listing the inquiry is about, if any.
    property: Option<Subject>,
}

/// Listing an inquiry is about.
#[derive(Debug, Serialize)]
struct Subject {
    /// ID of the listing.
    id: property::Id,

    /// Title of the listing.
    title: property::Title,
}

/// Resolves the listing referenced by the `raw` ID, if it exists.
async fn subject(
    ctx: &Context,
    raw: Option<&str>,
) -> Result<Option<Subject>, Error> {
    let Some(id) = raw.and_then(|id| id.parse::<property::Id>().ok()) else {
        return Ok(None);
    };

    Ok(ctx
        .service()
        .execute(query::property::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|p| Subject {
            id: p.id,
            title: p.details.title,
        }))
}

/// Renders the empty inquiry form, optionally about the listing referenced
/// by the `property` parameter.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn form(
    ctx: Context,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Page<Inquiry>, Error> {
    let property = subject(&ctx, params.get("property").map(String::as_str))
        .await?;

    let mut form = FormState::default();
    if let Some(p) = &property {
        drop(form.values.insert("property_id".into(), p.id.to_string()));
    }

    ctx.render("contacts.html", Inquiry { form, property }).await
}

/// Stores a submitted inquiry.
///
/// Redirects back to the listing the inquiry is about, or to the inquiry
/// page otherwise.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn submit(
    ctx: Context,
    axum::Form(fields): axum::Form<HashMap<String, String>>,
) -> Result<Response, Error> {
    let form = Form::from(fields);

    let inquiry = match form.inquiry() {
        Ok(inquiry) => inquiry,
        Err(errors) => {
            let property = subject(&ctx, form.get("property_id")).await?;
            return Ok(ctx
                .render(
                    "contacts.html",
                    Inquiry {
                        form: FormState::invalid(&form, errors),
                        property,
                    },
                )
                .await?
                .into_response());
        }
    };

    let contact = ctx
        .service()
        .execute(inquiry)
        .await
        .map_err(AsError::into_error)?;

    let to = contact.property_id.map_or_else(
        || "/contacts/".to_owned(),
        |id| format!("/properties/{id}/"),
    );
    Ok(Redirect::to(to)
        .with_notice(Notice::success(
            "Thank you for contacting us! We will get back to you soon.",
        ))
        .into_response())
}

impl AsError for command::submit_inquiry::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}
