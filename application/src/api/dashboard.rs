//! Agent dashboard and listings management pages.

use axum::{
    extract::{Multipart, Path},
    response::{IntoResponse as _, Response},
};
use serde::Serialize;
use service::{
    command::{self, create_property::NewImage, Command as _},
    domain::{access::Role, agent, media, property, Property},
    query, read,
};

use crate::{
    define_error,
    form::{self, Form},
    page::{Notice, Page, Redirect},
    storage::FileStorage as _,
    view, AsError, Context, Error,
};

use super::{FormState, SPAN_NAME};

/// Name of the [`Form`] field with uploaded listing photos.
const IMAGES_FIELD: &str = "images";

/// Context of the agent dashboard.
#[derive(Debug, Serialize)]
pub(super) struct Dashboard {
    /// Signed in agent.
    agent: view::AgentCard,

    /// Every listing of the agent.
    properties: Vec<view::PropertyCard>,

    /// Numbers of the agent's listings.
    counts: view::Counts,
}

/// Renders the dashboard of the signed in agent.
///
/// Agents not authorized yet see the pending approval page instead.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn page(ctx: Context) -> Result<Response, Error> {
    let (agent_id, is_authorized) = match ctx.role().await? {
        Role::Anonymous => {
            return Ok(Redirect::to("/login/")
                .with_notice(Notice::warning(
                    "Please log in to access the dashboard.",
                ))
                .into_response());
        }
        Role::Member { .. } => {
            return Ok(Redirect::to("/")
                .with_notice(Notice::error(
                    "You are not registered as an agent.",
                ))
                .into_response());
        }
        Role::Agent {
            agent_id,
            is_authorized,
            ..
        } => (agent_id, is_authorized),
    };

    let agent = ctx
        .service()
        .execute(query::agent::ById::by(agent_id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| {
            Error::not_found(&format!("`Agent(id: {agent_id})` does not exist"))
        })?;
    let agent = super::agent_card(&ctx, &agent).await?;

    if !is_authorized {
        return Ok(ctx
            .render("pending_approval.html", Pending { agent })
            .await?
            .into_response());
    }

    let properties = ctx
        .service()
        .execute(query::properties::OwnedBy::by(read::property::OwnedBy {
            agent_id,
            status: None,
        }))
        .await
        .map_err(AsError::into_error)?;
    let stats = ctx
        .service()
        .execute(query::agent::Stats::by(agent_id))
        .await
        .map_err(AsError::into_error)?;

    Ok(ctx
        .render(
            "dashboard.html",
            Dashboard {
                agent,
                properties: super::property_cards(&ctx, &properties).await?,
                counts: stats.into(),
            },
        )
        .await?
        .into_response())
}

/// Context of the pending approval page.
#[derive(Debug, Serialize)]
struct Pending {
    /// Signed in agent waiting for approval.
    agent: view::AgentCard,
}

/// Context of the listing form page.
#[derive(Debug, Serialize)]
pub(super) struct PropertyForm {
    /// State of the form.
    #[serde(flatten)]
    form: FormState,

    /// Options of the form.
    choices: view::Choices,

    /// Edited listing along with its gallery, if any.
    property: Option<view::PropertyDetail>,
}

/// Renders the empty listing form.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn create_form(
    ctx: Context,
) -> Result<Page<PropertyForm>, Error> {
    _ = authorized_agent(&ctx).await?;

    ctx.render(
        "property_form.html",
        PropertyForm {
            form: FormState::default(),
            choices: view::Choices::all(),
            property: None,
        },
    )
    .await
}

/// Creates a new listing of the signed in agent with the uploaded photos.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn create(
    ctx: Context,
    multipart: Multipart,
) -> Result<Response, Error> {
    // Nothing is stored for actors who cannot create listings.
    _ = authorized_agent(&ctx).await?;

    let form = Form::from_multipart(multipart)
        .await
        .map_err(AsError::into_error)?;
    let details = match form.property_details() {
        Ok(details) => details,
        Err(errors) => {
            let form = FormState::invalid(&form, errors);
            return rerender(&ctx, form, None).await;
        }
    };

    let images = store_images(&ctx, &form).await?;
    let created = ctx
        .service()
        .execute(command::CreateProperty {
            actor: ctx.actor(),
            details,
            images: images.clone(),
        })
        .await;
    let created = match created {
        Ok(out) => out,
        Err(e) => {
            discard(&ctx, &images).await;
            return Err(e.into_error());
        }
    };
    tracing::info!(
        property_id = %created.property.id,
        images = created.images.len(),
        "created a new listing",
    );

    Ok(Redirect::to(format!("/properties/{}/", created.property.id))
        .with_notice(Notice::success("Property created successfully!"))
        .into_response())
}

/// Renders the form of an existing listing owned by the signed in agent.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn edit_form(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Page<PropertyForm>, Error> {
    let property = owned_property(&ctx, &id).await?;
    let detail = property_detail(&ctx, &property).await?;

    ctx.render(
        "property_form.html",
        PropertyForm {
            form: FormState {
                values: values(&property.details),
                errors: form::Errors::new(),
            },
            choices: view::Choices::all(),
            property: Some(detail),
        },
    )
    .await
}

/// Updates a listing owned by the signed in agent, appending the uploaded
/// photos to its gallery.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn edit(
    ctx: Context,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, Error> {
    // Nothing is stored for actors who cannot edit the listing.
    let property = owned_property(&ctx, &id).await?;

    let form = Form::from_multipart(multipart)
        .await
        .map_err(AsError::into_error)?;
    let details = match form.property_details() {
        Ok(details) => details,
        Err(errors) => {
            let detail = property_detail(&ctx, &property).await?;
            let form = FormState::invalid(&form, errors);
            return rerender(&ctx, form, Some(detail)).await;
        }
    };

    let images = store_images(&ctx, &form).await?;
    let updated = ctx
        .service()
        .execute(command::UpdateProperty {
            actor: ctx.actor(),
            property_id: property.id,
            details,
            images: images.clone(),
        })
        .await;
    let updated = match updated {
        Ok(out) => out,
        Err(e) => {
            discard(&ctx, &images).await;
            return Err(e.into_error());
        }
    };

    Ok(Redirect::to(format!("/properties/{}/", updated.property.id))
        .with_notice(Notice::success("Property updated successfully!"))
        .into_response())
}

/// Context of the listing deletion confirmation page.
#[derive(Debug, Serialize)]
pub(super) struct DeleteConfirm {
    /// Listing to be deleted.
    property: view::PropertyCard,
}

/// Renders the confirmation of deleting a listing.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn delete_confirm(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Page<DeleteConfirm>, Error> {
    let property = owned_property(&ctx, &id).await?;
    let images = ctx
        .service()
        .execute(query::property::Images::by(property.id))
        .await
        .map_err(AsError::into_error)?;

    ctx.render(
        "property_confirm_delete.html",
        DeleteConfirm {
            property: view::PropertyCard::new(
                &property,
                &images,
                ctx.storage(),
            ),
        },
    )
    .await
}

/// Deletes a listing owned by the signed in agent along with its photos.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn delete(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Redirect, Error> {
    let property_id = super::parse_id::<property::Id>(&id, "Property")?;

    let deleted = ctx
        .service()
        .execute(command::DeleteProperty {
            actor: ctx.actor(),
            property_id,
        })
        .await
        .map_err(AsError::into_error)?;
    for image in &deleted.images {
        ctx.storage().delete(&image.file).await;
    }
    tracing::info!(%property_id, "deleted a listing");

    Ok(Redirect::to("/dashboard/")
        .with_notice(Notice::success("Property deleted successfully!")))
}

/// Deletes a single photo of a listing owned by the signed in agent.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn delete_image(
    ctx: Context,
    Path(id): Path<String>,
) -> Result<Redirect, Error> {
    let image_id =
        super::parse_id::<property::image::Id>(&id, "PropertyImage")?;

    let deleted = ctx
        .service()
        .execute(command::DeletePropertyImage {
            actor: ctx.actor(),
            image_id,
        })
        .await
        .map_err(AsError::into_error)?;
    ctx.storage().delete(&deleted.image.file).await;

    Ok(
        Redirect::to(format!(
            "/properties/{}/edit/",
            deleted.image.property_id,
        ))
        .with_notice(Notice::success("Image deleted successfully!")),
    )
}

/// Ensures the current actor is an authorized agent.
async fn authorized_agent(ctx: &Context) -> Result<agent::Id, Error> {
    ctx.role()
        .await?
        .authorized_agent()
        .map_err(AsError::into_error)
}

/// Reads the [`Property`] by its `raw` ID, ensuring the current actor owns
/// it.
async fn owned_property(ctx: &Context, raw: &str) -> Result<Property, Error> {
    let id = super::parse_id::<property::Id>(raw, "Property")?;

    let property = ctx
        .service()
        .execute(query::property::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| {
            Error::not_found(&format!("`Property(id: {id})` does not exist"))
        })?;
    _ = ctx
        .role()
        .await?
        .owner_of(&property)
        .map_err(AsError::into_error)?;

    Ok(property)
}

/// Composes the [`view::PropertyDetail`] of the edited [`Property`].
async fn property_detail(
    ctx: &Context,
    property: &Property,
) -> Result<view::PropertyDetail, Error> {
    let images = ctx
        .service()
        .execute(query::property::Images::by(property.id))
        .await
        .map_err(AsError::into_error)?;

    Ok(view::PropertyDetail::new(property, images, ctx.storage()))
}

/// Stores the photos uploaded with the [`Form`] in upload order.
///
/// # Errors
///
/// If any of the photos cannot be stored. Already stored ones are removed.
async fn store_images(
    ctx: &Context,
    form: &Form,
) -> Result<Vec<NewImage>, Error> {
    let mut images = vec![];
    for upload in form.uploads(IMAGES_FIELD) {
        let stored = ctx
            .storage()
            .store(
                media::Namespace::Properties,
                &upload.file_name,
                &upload.bytes,
            )
            .await;
        match stored {
            Ok(file) => images.push(NewImage {
                file,
                caption: None,
            }),
            Err(e) => {
                discard(ctx, &images).await;
                return Err(e.into_error());
            }
        }
    }
    Ok(images)
}

/// Removes the stored files of the [`NewImage`]s never attached.
async fn discard(ctx: &Context, images: &[NewImage]) {
    for image in images {
        ctx.storage().delete(&image.file).await;
    }
}

/// Renders the listing form again with the rejected values.
async fn rerender(
    ctx: &Context,
    form: FormState,
    property: Option<view::PropertyDetail>,
) -> Result<Response, Error> {
    Ok(ctx
        .render(
            "property_form.html",
            PropertyForm {
                form,
                choices: view::Choices::all(),
                property,
            },
        )
        .await?
        .into_response())
}

/// Fills the listing form with the current [`property::Details`].
fn values(details: &property::Details) -> form::Values {
    let d = details;
    [
        ("title", Some(d.title.to_string())),
        ("description", Some(d.description.to_string())),
        ("price", Some(d.price.to_string())),
        ("listing_type", Some(d.listing_type.to_string())),
        ("property_type", Some(d.kind.to_string())),
        ("status", Some(d.status.to_string())),
        ("address", Some(d.address.to_string())),
        ("city", Some(d.city.to_string())),
        ("postal_code", d.postal_code.as_ref().map(ToString::to_string)),
        ("latitude", d.location.map(|l| l.latitude.to_string())),
        ("longitude", d.location.map(|l| l.longitude.to_string())),
        ("bedrooms", Some(d.bedrooms.to_string())),
        ("bathrooms", Some(d.bathrooms.to_string())),
        ("area_sqm", Some(d.area.to_string())),
        ("year_built", d.year_built.map(|y| y.to_string())),
        ("parking_spaces", Some(d.parking_spaces.to_string())),
    ]
    .into_iter()
    .filter_map(|(name, value)| Some((name.to_owned(), value?)))
    .collect()
}

impl AsError for command::create_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Denied(d) => d.try_as_error(),
        }
    }
}

impl AsError for command::update_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PROPERTY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Property` with the provided ID does not exist"]
                PropertyNotExists,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Denied(d) => return d.try_as_error(),
            Self::PropertyNotExists(_) => Error::PropertyNotExists.into(),
        })
    }
}

impl AsError for command::delete_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PROPERTY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Property` with the provided ID does not exist"]
                PropertyNotExists,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Denied(d) => return d.try_as_error(),
            Self::PropertyNotExists(_) => Error::PropertyNotExists.into(),
        })
    }
}

impl AsError for command::delete_property_image::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PROPERTY_IMAGE_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`PropertyImage` with the provided ID does not \
                             exist"]
                ImageNotExists,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Denied(d) => return d.try_as_error(),
            Self::ImageNotExists(_) => Error::ImageNotExists.into(),
        })
    }
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use service::{
        command::{delete_property, delete_property_image},
        domain::{access::Denial, property},
    };

    use crate::{form::Form, AsError as _};

    use super::values;

    #[test]
    fn prefilled_values_parse_back() {
        let fields = [
            ("title", "Garden house"),
            ("description", "Large garden."),
            ("price", "1,250,000"),
            ("listing_type", "rent"),
            ("property_type", "house"),
            ("status", "pending"),
            ("address", "8 Zhongshan Rd"),
            ("city", "Taitung"),
            ("area_sqm", "120.50"),
            ("year_built", "1998"),
            ("latitude", "22.75"),
            ("longitude", "121.15"),
        ];
        let form = Form::from(
            fields
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect::<HashMap<_, _>>(),
        );
        let details = form.property_details().unwrap();

        let prefilled = values(&details).into_iter().collect::<HashMap<_, _>>();
        let again = Form::from(prefilled).property_details().unwrap();
        assert_eq!(again.title, details.title);
        assert_eq!(again.price, details.price);
        assert_eq!(again.listing_type, property::ListingType::Rent);
        assert_eq!(again.status, property::Status::Pending);
        assert_eq!(again.city, details.city);
        assert_eq!(again.area, details.area);
        assert_eq!(again.year_built, details.year_built);
        assert_eq!(again.location, details.location);
        assert!(again.postal_code.is_none());
    }

    #[test]
    fn missing_targets_are_not_found() {
        let err = delete_property::ExecutionError::PropertyNotExists(
            property::Id::new(),
        );
        assert_eq!(err.as_error().status_code, http::StatusCode::NOT_FOUND);

        let err = delete_property_image::ExecutionError::ImageNotExists(
            property::image::Id::new(),
        );
        assert_eq!(err.as_error().code, "PROPERTY_IMAGE_NOT_EXISTS");

        let err = delete_property::ExecutionError::Denied(Denial::NotOwner);
        assert_eq!(err.as_error().status_code, http::StatusCode::FORBIDDEN);
    }
}
