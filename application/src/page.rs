//! [`Page`]-related definitions.
//!
//! Pages are never rendered into HTML here: the rendering collaborator
//! receives a [`Page`] as JSON and picks its template.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;

use crate::view;

/// Name of the cookie carrying a [`Notice`] to the next page.
pub const NOTICE_COOKIE: &str = "notice";

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Operation succeeded.
    Success,

    /// Neutral information.
    Info,

    /// Something needs attention.
    Warning,

    /// Operation failed.
    Error,
}

impl Level {
    /// Returns the string form of this [`Level`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Parses a [`Level`] from its string form.
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "success" => Self::Success,
            "info" => Self::Info,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => return None,
        })
    }
}

/// One-time message shown on the next rendered [`Page`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Notice {
    /// [`Level`] of this [`Notice`].
    pub level: Level,

    /// Text of this [`Notice`].
    pub text: String,
}

impl Notice {
    /// Creates a new [`Level::Success`] [`Notice`].
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    /// Creates a new [`Level::Info`] [`Notice`].
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
        }
    }

    /// Creates a new [`Level::Warning`] [`Notice`].
    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            text: text.into(),
        }
    }

    /// Creates a new [`Level::Error`] [`Notice`].
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }

    /// Reads the [`Notice`] left by the previous response, if any.
    #[must_use]
    pub fn from_cookies(jar: &CookieJar) -> Option<Self> {
        let raw = jar.get(NOTICE_COOKIE)?;
        let (level, text) = raw.value().split_once(':')?;
        Some(Self {
            level: Level::parse(level)?,
            text: text.to_owned(),
        })
    }

    /// Packs this [`Notice`] into a cookie for the next response.
    fn into_cookie(self) -> Cookie<'static> {
        Cookie::build((
            NOTICE_COOKIE,
            format!("{}:{}", self.level.as_str(), self.text),
        ))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
    }
}

/// Creates a cookie removing the one with the provided `name`.
#[must_use]
pub fn removal(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

/// `303 See Other` redirect, optionally leaving a [`Notice`] and setting
/// cookies.
#[derive(Debug)]
#[must_use]
pub struct Redirect {
    /// URI to redirect to.
    to: String,

    /// Cookies to set along.
    jar: CookieJar,
}

impl Redirect {
    /// Creates a new [`Redirect`] to the provided `uri`.
    pub fn to(uri: impl Into<String>) -> Self {
        Self {
            to: uri.into(),
            jar: CookieJar::new(),
        }
    }

    /// Leaves the provided [`Notice`] for the next [`Page`].
    pub fn with_notice(self, notice: Notice) -> Self {
        self.with_cookie(notice.into_cookie())
    }

    /// Sets the provided [`Cookie`] along.
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.jar = self.jar.add(cookie);
        self
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let Self { to, jar } = self;
        (jar, axum::response::Redirect::to(&to)).into_response()
    }
}

/// Values available on every [`Page`].
#[derive(Clone, Debug, Serialize)]
pub struct Globals {
    /// API key of the maps provider.
    pub maps_api_key: Option<String>,

    /// Company running the site.
    pub company: view::Company,

    /// Current actor.
    pub actor: view::ActorSummary,
}

/// Page to be rendered by the provided template.
#[derive(Debug, Serialize)]
#[must_use]
pub struct Page<C> {
    /// Name of the template to render.
    template: &'static str,

    /// Page-specific context.
    context: C,

    /// [`Globals`], missing on error pages.
    globals: Option<Globals>,

    /// [`Notice`] left by the previous response.
    notice: Option<Notice>,

    /// [`http::StatusCode`] of the response.
    #[serde(skip)]
    status: http::StatusCode,
}

impl<C> Page<C> {
    /// Creates a new [`Page`] with all the [`Globals`].
    pub fn new(
        template: &'static str,
        context: C,
        globals: Globals,
        notice: Option<Notice>,
    ) -> Self {
        Self {
            template,
            context,
            globals: Some(globals),
            notice,
            status: http::StatusCode::OK,
        }
    }

    /// Creates a new [`Page`] without [`Globals`], for when they cannot be
    /// resolved.
    pub fn bare(template: &'static str, context: C) -> Self {
        Self {
            template,
            context,
            globals: None,
            notice: None,
            status: http::StatusCode::OK,
        }
    }

    /// Sets the [`http::StatusCode`] of this [`Page`].
    pub fn with_status(mut self, status: http::StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<C: Serialize> IntoResponse for Page<C> {
    fn into_response(self) -> Response {
        let status = self.status;
        if self.notice.is_some() {
            // Shown once.
            let jar = CookieJar::new().add(removal(NOTICE_COOKIE));
            (status, jar, Json(self)).into_response()
        } else {
            (status, Json(self)).into_response()
        }
    }
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use axum_extra::extract::cookie::CookieJar;

    use super::{Level, Notice, Page, Redirect, NOTICE_COOKIE};

    #[test]
    fn notice_survives_cookie() {
        let resp = Redirect::to("/contacts/")
            .with_notice(Notice::success("Thanks: we'll reply soon"))
            .into_response();
        assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[http::header::LOCATION], "/contacts/");

        let mut headers = http::HeaderMap::new();
        let set = resp.headers()[http::header::SET_COOKIE].to_str().unwrap();
        let pair = set.split(';').next().unwrap();
        drop(headers.insert(http::header::COOKIE, pair.parse().unwrap()));

        let notice = Notice::from_cookies(&CookieJar::from_headers(&headers));
        assert_eq!(notice, Some(Notice::success("Thanks: we'll reply soon")));
    }

    #[test]
    fn garbage_notice_is_ignored() {
        let mut headers = http::HeaderMap::new();
        drop(headers.insert(
            http::header::COOKIE,
            format!("{NOTICE_COOKIE}=loud:hey").parse().unwrap(),
        ));

        let jar = CookieJar::from_headers(&headers);
        assert_eq!(Notice::from_cookies(&jar), None);
        assert_eq!(Level::parse("warning"), Some(Level::Warning));
    }

    #[tokio::test]
    async fn renders_envelope() {
        let mut page = Page::bare("home.html", serde_json::json!({"n": 1}))
            .with_status(http::StatusCode::ACCEPTED);
        page.notice = Some(Notice::info("hi"));

        let resp = page.into_response();
        assert_eq!(resp.status(), http::StatusCode::ACCEPTED);
        let set = resp.headers()[http::header::SET_COOKIE].to_str().unwrap();
        assert!(set.starts_with("notice=;"), "{set}");

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice::<serde_json::Value>(&body).unwrap();
        assert_eq!(json["template"], "home.html");
        assert_eq!(json["context"]["n"], 1);
        assert_eq!(json["notice"]["level"], "info");
        assert!(json["globals"].is_null());
    }
}
