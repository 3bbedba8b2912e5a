//! Agent registration and sign in pages.

use std::collections::HashMap;

use axum::response::{IntoResponse as _, Response};
use serde::Serialize;
use service::command::{self, Command as _};

use crate::{
    context::SESSION_COOKIE,
    define_error,
    form::Form,
    page::{self, Notice, Page, Redirect},
    AsError, Context, Error,
};

use super::{FormState, SPAN_NAME};

/// Context of the registration and sign in pages.
#[derive(Debug, Default, Serialize)]
pub(super) struct Credentials {
    /// State of the form.
    #[serde(flatten)]
    form: FormState,
}

/// Renders the empty agent registration form.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn register_form(
    ctx: Context,
) -> Result<Page<Credentials>, Error> {
    ctx.render("register.html", Credentials::default()).await
}

/// Registers a new agent and signs them in.
///
/// The new agent waits for an administrator to authorize them before
/// managing any listings.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn register(
    ctx: Context,
    axum::Form(fields): axum::Form<HashMap<String, String>>,
) -> Result<Response, Error> {
    const TEMPLATE: &str = "register.html";

    let form = Form::from(fields);
    let cmd = match form.registration() {
        Ok(cmd) => cmd,
        Err(errors) => {
            let form = FormState::invalid(&form, errors);
            return rerender(&ctx, TEMPLATE, form).await;
        }
    };

    let registered = match ctx.service().execute(cmd).await {
        Ok(out) => out,
        Err(e) => {
            let form = FormState::rejected(&form, e.into_error())?;
            return rerender(&ctx, TEMPLATE, form).await;
        }
    };
    tracing::info!(
        agent_id = %registered.agent.id,
        login = %registered.user.login,
        "registered a new agent",
    );

    let session = ctx
        .service()
        .execute(command::CreateUserSession::ByUserId(registered.user.id))
        .await
        .map_err(AsError::into_error)?;

    Ok(Redirect::to("/dashboard/")
        .with_cookie(ctx.session_cookie(&session.token))
        .with_notice(Notice::success(
            "Registration successful! Your account is waiting for approval.",
        ))
        .into_response())
}

/// Renders the empty sign in form.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn login_form(
    ctx: Context,
) -> Result<Page<Credentials>, Error> {
    ctx.render("login.html", Credentials::default()).await
}

/// Signs in an agent by their credentials.
#[tracing::instrument(skip_all, fields(otel.name = SPAN_NAME))]
pub(super) async fn login(
    ctx: Context,
    axum::Form(fields): axum::Form<HashMap<String, String>>,
) -> Result<Response, Error> {
    const TEMPLATE: &str = "login.html";

    let form = Form::from(fields);
    let cmd = match form.credentials() {
        Ok(cmd) => cmd,
        Err(errors) => {
            let form = FormState::invalid(&form, errors);
            return rerender(&ctx, TEMPLATE, form).await;
        }
    };

    let session = match ctx.service().execute(cmd).await {
        Ok(out) => out,
        Err(e) => {
            let form = FormState::rejected(&form, e.into_error())?;
            return rerender(&ctx, TEMPLATE, form).await;
        }
    };

    Ok(Redirect::to("/dashboard/")
        .with_cookie(ctx.session_cookie(&session.token))
        .with_notice(Notice::success(format!(
            "Welcome back, {}!",
            session.user.full_name(),
        )))
        .into_response())
}

/// Signs out the current actor.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub(super) async fn logout() -> Redirect {
    Redirect::to("/")
        .with_cookie(page::removal(SESSION_COOKIE))
        .with_notice(Notice::info("You have been logged out."))
}

/// Renders the `template` again with the rejected form.
async fn rerender(
    ctx: &Context,
    template: &'static str,
    form: FormState,
) -> Result<Response, Error> {
    Ok(ctx
        .render(template, Credentials { form })
        .await?
        .into_response())
}

impl AsError for command::register_agent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "This username is already taken"]
                LoginOccupied,

                #[code = "PASSWORD_MISMATCH"]
                #[status = BAD_REQUEST]
                #[message = "Passwords don't match"]
                PasswordMismatch,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::LoginOccupied(_) => Error::LoginOccupied.into(),
            Self::Hashing(_) | Self::PasswordHash(_) => return None,
            Self::PasswordMismatch => Error::PasswordMismatch.into(),
        })
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = BAD_REQUEST]
                #[message = "Invalid username or password"]
                WrongCredentials,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::Hashing(_)
            | Self::JsonWebTokenEncodeError(_)
            | Self::UserNotExists(_) => return None,
            Self::WrongCredentials => Error::WrongCredentials.into(),
        })
    }
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use service::{
        command::{create_user_session, register_agent},
        domain::user,
    };

    use crate::AsError as _;

    use super::logout;

    #[tokio::test]
    async fn logout_drops_session_cookie() {
        let resp = logout().await.into_response();
        assert_eq!(resp.headers()[http::header::LOCATION], "/");

        let cookies = resp
            .headers()
            .get_all(http::header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_owned())
            .collect::<Vec<_>>();
        assert!(cookies.iter().any(|c| c.starts_with("session=;")));
        assert!(cookies.iter().any(|c| c.starts_with("notice=info")));
    }

    #[test]
    fn registration_failures_are_shown_to_user() {
        use register_agent::ExecutionError as E;

        let occupied = E::LoginOccupied(user::Login::new("mei").unwrap());
        assert_eq!(
            occupied.as_error().status_code,
            http::StatusCode::CONFLICT,
        );
        assert!(occupied.as_error().status_code.is_client_error());
        assert!(E::PasswordMismatch.as_error().status_code.is_client_error());

        let wrong = create_user_session::ExecutionError::WrongCredentials;
        assert_eq!(wrong.as_error().code, "WRONG_CREDENTIALS");
    }
}
