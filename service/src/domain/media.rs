//! Uploaded media definitions.

use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::Serialize;
use strum::{AsRefStr, Display as StrumDisplay, EnumString};

/// Namespace grouping stored media by its owner kind.
#[derive(
    AsRefStr, Clone, Copy, Debug, EnumString, Eq, Hash, PartialEq, StrumDisplay,
)]
#[strum(serialize_all = "snake_case")]
pub enum Namespace {
    /// Photos of agents.
    Agents,

    /// Images of properties.
    Properties,

    /// Company logo.
    Company,
}

/// Reference to a stored media file, relative to the storage root.
///
/// Always has the `{namespace}/{file}` form, so it never escapes the
/// storage root.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Ref(String);

impl Ref {
    /// Creates a new [`Ref`] to the `file` in the provided [`Namespace`].
    ///
    /// [`None`] is returned if the `file` name is not a plain file name.
    #[must_use]
    pub fn new(namespace: Namespace, file: &str) -> Option<Self> {
        let plain = !file.is_empty()
            && file != "."
            && file != ".."
            && !file.contains(['/', '\\', '\0']);
        plain.then(|| Self(format!("{namespace}/{file}")))
    }

    /// Returns the [`Namespace`] this [`Ref`] belongs to.
    #[must_use]
    pub fn namespace(&self) -> Option<Namespace> {
        self.0.split_once('/').and_then(|(ns, _)| ns.parse().ok())
    }
}

#[cfg(test)]
mod spec {
    use super::{Namespace, Ref};

    #[test]
    fn stays_within_namespace() {
        let r = Ref::new(Namespace::Properties, "a1b2.jpg").unwrap();
        assert_eq!(r.as_ref(), "properties/a1b2.jpg");
        assert_eq!(r.namespace(), Some(Namespace::Properties));

        assert!(Ref::new(Namespace::Agents, "../etc/passwd").is_none());
        assert!(Ref::new(Namespace::Agents, "..").is_none());
        assert!(Ref::new(Namespace::Agents, "").is_none());
    }
}
