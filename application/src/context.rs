//! [`Context`]-related definitions.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::{access::Role, company, user::session, Actor},
    query,
};
use tokio::sync::OnceCell;

use crate::{
    config,
    page::{Globals, Notice, Page},
    view, AsError, Error, Service, Storage,
};

/// Name of the cookie carrying the [`session::Token`].
pub const SESSION_COOKIE: &str = "session";

/// Context of a single HTTP request.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// [`Storage`] of uploaded media.
    storage: Storage,

    /// Site presentation configuration.
    site: Arc<config::Site>,

    /// [`Actor`] performing the request.
    actor: Actor,

    /// [`Notice`] left by the previous response.
    notice: Option<Notice>,

    /// [`Role`] of the [`Actor`], resolved on demand.
    role: OnceCell<Role>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns [`Storage`] of this [`Context`].
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Returns [`Actor`] performing the request.
    #[must_use]
    pub fn actor(&self) -> Actor {
        self.actor
    }

    /// Returns [`Role`] of the [`Actor`] as currently stored.
    ///
    /// # Errors
    ///
    /// If the [`Role`] cannot be read.
    pub async fn role(&self) -> Result<Role, Error> {
        self.role
            .get_or_try_init(|| async {
                self.service
                    .execute(query::access::RoleOf::by(self.actor))
                    .await
                    .map_err(AsError::into_error)
            })
            .await
            .copied()
    }

    /// Resolves the [`Globals`] of every page.
    ///
    /// # Errors
    ///
    /// If the company or the current [`User`] cannot be read.
    ///
    /// [`User`]: service::domain::User
    pub async fn globals(&self) -> Result<Globals, Error> {
        let default_name = company::Name::new(self.site.company_name.clone())
            .ok_or_else(|| Error::internal(&"invalid `site.company_name`"))?;
        let company = self
            .service
            .execute(command::GetOrCreateCompany { default_name })
            .await
            .map_err(AsError::into_error)?;

        let role = self.role().await?;
        let user = match self.actor {
            Actor::Anonymous => None,
            Actor::User(id) => self
                .service
                .execute(query::user::ById::by(id))
                .await
                .map_err(AsError::into_error)?,
        };

        Ok(Globals {
            maps_api_key: self.site.maps_api_key.clone(),
            company: view::Company::new(company, &self.storage),
            actor: view::ActorSummary::new(role, user.as_ref()),
        })
    }

    /// Renders the provided `template` with the `context` and the
    /// [`Globals`].
    ///
    /// # Errors
    ///
    /// If the [`Globals`] cannot be resolved.
    pub async fn render<C: Serialize>(
        &self,
        template: &'static str,
        context: C,
    ) -> Result<Page<C>, Error> {
        Ok(Page::new(
            template,
            context,
            self.globals().await?,
            self.notice.clone(),
        ))
    }

    /// Creates a cookie carrying the provided [`session::Token`].
    #[must_use]
    pub fn session_cookie(&self, token: &session::Token) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.site.secure_cookies)
            .same_site(SameSite::Lax)
            .build()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;
        let storage = parts
            .extensions
            .get::<Storage>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Storage` extension"))?;
        let site = parts
            .extensions
            .get::<Arc<config::Site>>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Site` extension"))?;

        let jar = CookieJar::from_headers(&parts.headers);
        let notice = Notice::from_cookies(&jar);

        let token = jar
            .get(SESSION_COOKIE)
            .and_then(|c| c.value().parse::<session::Token>().ok());
        let actor = match token {
            None => Actor::Anonymous,
            Some(token) => {
                use command::authorize_user_session::ExecutionError as E;

                match service
                    .execute(command::AuthorizeUserSession { token })
                    .await
                {
                    Ok(out) => out.actor,
                    Err(e) => match e.as_ref() {
                        E::Db(_) => return Err(e.into_error()),
                        E::JsonWebTokenDecodeError(_) | E::UserNotExists(_) => {
                            tracing::debug!("ignoring session: {e}");
                            Actor::Anonymous
                        }
                    },
                }
            }
        };

        Ok(Self {
            service,
            storage,
            site,
            actor,
            notice,
            role: OnceCell::new(),
        })
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenDecodeError(_) | Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::get_or_create_company::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::CompanyVanished | Self::Create(_) => None,
        }
    }
}
