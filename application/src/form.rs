//! Submitted HTML [`Form`]s parsing.

use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
};

use axum::{
    body::Bytes,
    extract::multipart::{Multipart, MultipartError},
};
use secrecy::SecretBox;
use service::{
    command::{CreateUserSession, RegisterAgent, SubmitInquiry},
    domain::{agent, contact, property, user},
};

use crate::{AsError, Error};

/// Messages describing invalid fields of a [`Form`], by field name.
pub type Errors = BTreeMap<&'static str, String>;

/// Values of [`Form`] fields, by field name.
pub type Values = BTreeMap<String, String>;

/// File uploaded along with a [`Form`].
#[derive(Clone, Debug)]
pub struct Upload {
    /// Name of the file on the client side.
    pub file_name: String,

    /// Contents of the file.
    pub bytes: Bytes,
}

/// Submitted form fields with uploaded files.
#[derive(Clone, Debug, Default)]
pub struct Form {
    /// Text fields.
    fields: HashMap<String, String>,

    /// Uploaded files, by field name, in upload order.
    uploads: HashMap<String, Vec<Upload>>,
}

impl From<HashMap<String, String>> for Form {
    fn from(fields: HashMap<String, String>) -> Self {
        Self {
            fields,
            uploads: HashMap::new(),
        }
    }
}

impl Form {
    /// Reads a [`Form`] out of a `multipart/form-data` body.
    ///
    /// Empty file inputs are skipped.
    ///
    /// # Errors
    ///
    /// If the body is malformed or too large.
    pub async fn from_multipart(
        mut multipart: Multipart,
    ) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            match field.file_name().map(ToOwned::to_owned) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.uploads
                            .entry(name)
                            .or_default()
                            .push(Upload { file_name, bytes });
                    }
                }
                None => {
                    let text = field.text().await?;
                    drop(form.fields.insert(name, text));
                }
            }
        }
        Ok(form)
    }

    /// Returns the trimmed value of the field, unless it's blank.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns the files uploaded in the field.
    #[must_use]
    pub fn uploads(&self, name: &str) -> &[Upload] {
        self.uploads.get(name).map_or(&[][..], Vec::as_slice)
    }

    /// Returns the submitted values to fill the re-rendered form with.
    ///
    /// Passwords are never sent back.
    #[must_use]
    pub fn echo(&self) -> Values {
        self.fields
            .iter()
            .filter(|(k, _)| !k.starts_with("password"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Parses the required field.
    fn required<T: FromStr>(
        &self,
        name: &'static str,
        errors: &mut Errors,
    ) -> Option<T> {
        let Some(raw) = self.get(name) else {
            drop(errors.insert(name, "This field is required".into()));
            return None;
        };
        parse(name, raw, errors)
    }

    /// Parses the optional field, treating a blank one as missing.
    fn optional<T: FromStr>(
        &self,
        name: &'static str,
        errors: &mut Errors,
    ) -> Option<T> {
        self.get(name).and_then(|raw| parse(name, raw, errors))
    }

    /// Parses the editable [`property::Details`] of a [`Property`].
    ///
    /// # Errors
    ///
    /// If any of the fields is missing or invalid.
    ///
    /// [`Property`]: service::domain::Property
    pub fn property_details(&self) -> Result<property::Details, Errors> {
        let mut errors = Errors::new();

        let title = self.required::<property::Title>("title", &mut errors);
        let description = self.required("description", &mut errors);
        let price = self.required("price", &mut errors);
        let listing_type = self.required("listing_type", &mut errors);
        let kind = self.required("property_type", &mut errors);
        let status = self.optional("status", &mut errors).unwrap_or_default();
        let address = self.required("address", &mut errors);
        let city = self.optional("city", &mut errors).unwrap_or_default();
        let postal_code = self.optional("postal_code", &mut errors);
        let latitude = self.optional("latitude", &mut errors);
        let longitude = self.optional("longitude", &mut errors);
        let bedrooms = self.optional("bedrooms", &mut errors).unwrap_or(0);
        let bathrooms = self.optional("bathrooms", &mut errors).unwrap_or(0);
        let area = self.required("area_sqm", &mut errors);
        let year_built = self.optional("year_built", &mut errors);
        let parking_spaces =
            self.optional("parking_spaces", &mut errors).unwrap_or(0);

        let location = match (latitude, longitude) {
            (Some(lat), Some(long)) => {
                let location = property::Coordinates::new(lat, long);
                if location.is_none() {
                    drop(errors.insert(
                        "latitude",
                        "Coordinates are out of range or too precise".into(),
                    ));
                }
                location
            }
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                drop(errors.insert(
                    "longitude",
                    "Both latitude and longitude are required".into(),
                ));
                None
            }
        };

        match (title, description, price, listing_type, kind, address, area) {
            (
                Some(title),
                Some(description),
                Some(price),
                Some(listing_type),
                Some(kind),
                Some(address),
                Some(area),
            ) if errors.is_empty() => Ok(property::Details {
                title,
                description,
                price,
                listing_type,
                kind,
                status,
                address,
                city,
                postal_code,
                location,
                bedrooms,
                bathrooms,
                area,
                year_built,
                parking_spaces,
            }),
            _ => Err(errors),
        }
    }

    /// Parses the [`RegisterAgent`] command.
    ///
    /// # Errors
    ///
    /// If any of the fields is missing or invalid.
    pub fn registration(&self) -> Result<RegisterAgent, Errors> {
        let mut errors = Errors::new();

        let login = self.required::<user::Login>("username", &mut errors);
        let password = self.required::<user::Password>("password1", &mut errors);
        let confirmation =
            self.required::<user::Password>("password2", &mut errors);
        let first_name = self.optional("first_name", &mut errors);
        let last_name = self.optional("last_name", &mut errors);
        let email = self.optional("email", &mut errors);
        let phone = self.required("phone", &mut errors);
        let bio = self.optional::<agent::Bio>("bio", &mut errors);
        let specialization = self.optional("specialization", &mut errors);

        match (login, password, confirmation, phone) {
            (Some(login), Some(password), Some(confirmation), Some(phone))
                if errors.is_empty() =>
            {
                Ok(RegisterAgent {
                    login,
                    password: SecretBox::new(Box::new(password)),
                    password_confirmation: SecretBox::new(Box::new(
                        confirmation,
                    )),
                    first_name,
                    last_name,
                    email,
                    phone,
                    bio,
                    specialization,
                })
            }
            _ => Err(errors),
        }
    }

    /// Parses the [`CreateUserSession::ByCredentials`] command.
    ///
    /// # Errors
    ///
    /// If any of the fields is missing or invalid.
    pub fn credentials(&self) -> Result<CreateUserSession, Errors> {
        let mut errors = Errors::new();

        let login = self.required::<user::Login>("username", &mut errors);
        let password = self.required::<user::Password>("password", &mut errors);

        match (login, password) {
            (Some(login), Some(password)) => {
                Ok(CreateUserSession::ByCredentials {
                    login,
                    password: SecretBox::new(Box::new(password)),
                })
            }
            _ => Err(errors),
        }
    }

    /// Parses the [`SubmitInquiry`] command.
    ///
    /// A malformed property reference is dropped rather than rejected.
    ///
    /// # Errors
    ///
    /// If any of the required fields is missing or invalid.
    pub fn inquiry(&self) -> Result<SubmitInquiry, Errors> {
        let mut errors = Errors::new();

        let name = self.required::<contact::Name>("name", &mut errors);
        let email = self.required::<user::Email>("email", &mut errors);
        let phone = self.optional::<user::Phone>("phone", &mut errors);
        let message = self.required::<contact::Message>("message", &mut errors);
        let property_id = self.get("property_id").and_then(|raw| {
            let id = raw.parse::<property::Id>().ok();
            if id.is_none() {
                tracing::info!(
                    property_id = raw,
                    "dropping malformed property reference of inquiry",
                );
            }
            id
        });

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) if errors.is_empty() => {
                Ok(SubmitInquiry {
                    name,
                    email,
                    phone,
                    message,
                    property_id,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Parses the `raw` value of the field, recording the failure.
fn parse<T: FromStr>(
    name: &'static str,
    raw: &str,
    errors: &mut Errors,
) -> Option<T> {
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        drop(errors.insert(name, "Enter a valid value".into()));
    }
    parsed
}

impl AsError for MultipartError {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error {
            code: "INVALID_FORM",
            status_code: self.status(),
            message: self.body_text(),
            backtrace: None,
        })
    }
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use service::domain::property;

    use super::Form;

    fn form(fields: &[(&str, &str)]) -> Form {
        fields
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>()
            .into()
    }

    #[test]
    fn parses_property_details() {
        let details = form(&[
            ("title", " Sunny condo "),
            ("description", "Close to the beach."),
            ("price", "200000"),
            ("listing_type", "sale"),
            ("property_type", "condo"),
            ("address", "5 Main St"),
            ("area_sqm", "85.5"),
            ("bedrooms", "2"),
            ("latitude", "23.97"),
            ("longitude", "121.6"),
        ])
        .property_details()
        .unwrap();

        assert_eq!(details.title.as_ref(), "Sunny condo");
        assert_eq!(details.kind, property::Kind::Condo);
        assert_eq!(details.status, property::Status::Available);
        assert_eq!(details.bedrooms, 2);
        assert_eq!(details.bathrooms, 0);
        assert_eq!(details.area.sqft(), 920);
        assert!(details.location.is_some());
    }

    #[test]
    fn reports_every_invalid_field() {
        let errors = form(&[
            ("title", "Hut"),
            ("price", "cheap"),
            ("listing_type", "lease"),
            ("property_type", "house"),
            ("address", "Nowhere"),
            ("area_sqm", "40"),
            ("latitude", "23.97"),
        ])
        .property_details()
        .unwrap_err();

        let fields = errors.keys().copied().collect::<Vec<_>>();
        assert_eq!(
            fields,
            ["description", "listing_type", "longitude", "price"],
        );
    }

    #[test]
    fn rejects_numbers_not_stored_exactly() {
        let valid = [
            ("title", "Villa"),
            ("description", "Ocean view."),
            ("listing_type", "sale"),
            ("property_type", "villa"),
            ("address", "7 Coast Rd"),
        ];
        let with = |extra: &[(&'static str, &'static str)]| {
            let mut fields = valid.to_vec();
            fields.extend_from_slice(extra);
            form(&fields).property_details()
        };

        let errors = with(&[("price", "100000000000"), ("area_sqm", "120")])
            .unwrap_err();
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), ["price"]);

        let errors = with(&[("price", "100.999"), ("area_sqm", "120.125")])
            .unwrap_err();
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            ["area_sqm", "price"],
        );

        let errors = with(&[
            ("price", "100.99"),
            ("area_sqm", "120"),
            ("latitude", "23.9712345"),
            ("longitude", "121.6"),
        ])
        .unwrap_err();
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), ["latitude"]);

        assert!(with(&[("price", "9999999999.99"), ("area_sqm", "120.12")])
            .is_ok());
    }

    #[test]
    fn inquiry_drops_malformed_property_reference() {
        let inquiry = form(&[
            ("name", "Lin"),
            ("email", "lin@example.com"),
            ("phone", ""),
            ("message", "Is it still available?"),
            ("property_id", "42"),
        ])
        .inquiry()
        .unwrap();

        assert!(inquiry.phone.is_none());
        assert!(inquiry.property_id.is_none());

        let errors = form(&[("name", "Lin"), ("email", "not an email")])
            .inquiry()
            .unwrap_err();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("message"));
    }

    #[test]
    fn echo_hides_passwords() {
        let form = form(&[
            ("username", "mei"),
            ("password1", "secret one"),
            ("password2", "secret two"),
        ]);

        let echo = form.echo();
        assert_eq!(echo.get("username").map(String::as_str), Some("mei"));
        assert!(!echo.keys().any(|k| k.starts_with("password")));
    }
}
