//! [`Error`]-related definitions.

use std::fmt;

use axum::response::{IntoResponse, Response};
use derive_more::Error as StdError;
use itertools::Itertools as _;
use serde::Serialize;
use service::{domain::access::Denial, infra::database};
use tracerr::{Trace, Traced};

use crate::page::{Notice, Page, Redirect};

/// Defines a new error type.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_error {
    (
        enum $name:ident {
            $(
                #[code = $code:literal]
                #[status = $status_code:ident]
                #[message = $message:literal]
                $variant:ident
            ),* $(,)?
        }
    ) => {
        /// Error type.
        #[derive(
            Clone,
            Copy,
            Debug,
            ::derive_more::Display,
            ::derive_more::Error
        )]
        #[repr(u16)]
        pub enum $name {
            $(
                #[display($message)]
                #[doc = $message]
                $variant,
            )*
        }

        impl From<$name> for $crate::Error {
            fn from(err: $name) -> Self {
                match err {
                    $(
                        $name::$variant => Self {
                            code: $code,
                            status_code: ::http::StatusCode::$status_code,
                            message: $message.to_string(),
                            backtrace: None,
                        },
                    )*
                }
            }
        }
    };
}

/// Error of handling an HTTP request.
///
/// Converts into a response according to its [`http::StatusCode`]:
/// - `401` redirects to the login page with a [`Notice`];
/// - `403` and other client errors redirect to a safe page with a [`Notice`];
/// - `404` renders the "not found" page;
/// - server errors are logged along with their [`Trace`] and render the
///   "server error" page.
#[derive(Clone, Debug, StdError)]
pub struct Error {
    /// [`Error`] code.
    pub code: Code,

    /// [`http::StatusCode`] of this [`Error`].
    pub status_code: http::StatusCode,

    /// Backtrace of this [`Error`].
    #[error(not(backtrace))]
    pub backtrace: Option<Trace>,

    /// [`Error`] message.
    pub message: String,
}

impl Error {
    /// Create a new [`Error`] representing an internal server error.
    #[must_use]
    pub fn internal(msg: &impl ToString) -> Self {
        Self {
            code: "INTERNAL_SERVER_ERROR",
            status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            backtrace: None,
        }
    }

    /// Create a new [`Error`] representing a missing resource.
    #[must_use]
    pub fn not_found(msg: &impl ToString) -> Self {
        Self {
            code: "NOT_FOUND",
            status_code: http::StatusCode::NOT_FOUND,
            message: msg.to_string(),
            backtrace: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            code,
            status_code: _,
            backtrace,
            message,
        } = self;

        write!(
            f,
            "[{code}]: {message}{}",
            backtrace
                .iter()
                .format_with("\n", |trace, f| f(&format_args!("{trace}"))),
        )
    }
}

/// Context of an error page.
#[derive(Debug, Serialize)]
struct ErrorContext<'e> {
    /// [`Error`] code.
    code: Code,

    /// User-facing message.
    message: &'e str,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        use http::StatusCode as S;

        match self.status_code {
            S::UNAUTHORIZED => Redirect::to("/login/")
                .with_notice(Notice::warning(self.message))
                .into_response(),
            S::FORBIDDEN => Redirect::to("/dashboard/")
                .with_notice(Notice::error(self.message))
                .into_response(),
            S::NOT_FOUND => Page::bare(
                "404.html",
                ErrorContext {
                    code: self.code,
                    message: &self.message,
                },
            )
            .with_status(S::NOT_FOUND)
            .into_response(),
            s if s.is_client_error() => Redirect::to("/")
                .with_notice(Notice::error(self.message))
                .into_response(),
            s => {
                tracing::error!("{self}");
                Page::bare(
                    "500.html",
                    ErrorContext {
                        code: self.code,
                        message: "Something went wrong, please try again \
                                  later",
                    },
                )
                .with_status(s)
                .into_response()
            }
        }
    }
}

/// [`Error`] code.
pub type Code = &'static str;

/// Helper trait for converting types into [`Error`]s.
pub trait AsError {
    /// Tries to convert the type into an [`Error`].
    ///
    /// [`None`] is returned if the type cannot be converted into an [`Error`].
    fn try_as_error(&self) -> Option<Error>;

    /// Converts the type into an [`Error`].
    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error()
            .unwrap_or_else(|| Error::internal(&self))
    }

    /// Converts the type into an [`Error`] by consuming it.
    fn into_error(self) -> Error
    where
        Self: fmt::Display + Sized,
    {
        self.as_error()
    }
}

impl<E: AsError> AsError for Traced<E> {
    fn try_as_error(&self) -> Option<Error> {
        let mut error = self.as_ref().try_as_error()?;
        error.backtrace = Some(self.trace().clone());
        Some(error)
    }

    fn as_error(&self) -> Error
    where
        Self: fmt::Display,
    {
        self.try_as_error().unwrap_or_else(|| {
            let mut error = Error::internal(self);
            error.backtrace = Some(self.trace().clone());
            error
        })
    }
}

impl AsError for database::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

impl AsError for Denial {
    fn try_as_error(&self) -> Option<Error> {
        let (code, status_code) = match self {
            Self::Unauthenticated => {
                ("AUTHENTICATION_REQUIRED", http::StatusCode::UNAUTHORIZED)
            }
            Self::NotAgent => ("NOT_AGENT", http::StatusCode::FORBIDDEN),
            Self::AgentNotAuthorized => {
                ("AGENT_NOT_AUTHORIZED", http::StatusCode::FORBIDDEN)
            }
            Self::NotOwner => ("NOT_OWNER", http::StatusCode::FORBIDDEN),
            Self::NotAdmin => ("NOT_ADMIN", http::StatusCode::FORBIDDEN),
        };
        Some(Error {
            code,
            status_code,
            message: self.to_string(),
            backtrace: None,
        })
    }
}

#[cfg(test)]
mod spec {
    use axum::response::IntoResponse as _;
    use service::domain::access::Denial;

    use super::{AsError as _, Error};

    #[test]
    fn denials_redirect_with_notice() {
        let resp = Denial::Unauthenticated.as_error().into_response();
        assert_eq!(resp.status(), http::StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[http::header::LOCATION], "/login/");
        assert!(resp.headers().contains_key(http::header::SET_COOKIE));

        let resp = Denial::NotOwner.as_error().into_response();
        assert_eq!(resp.headers()[http::header::LOCATION], "/dashboard/");
    }

    #[test]
    fn renders_error_pages() {
        let resp = Error::not_found(&"`Property` does not exist")
            .into_response();
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);

        let resp = Error::internal(&"boom").into_response();
        assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!resp.headers().contains_key(http::header::SET_COOKIE));
    }
}
