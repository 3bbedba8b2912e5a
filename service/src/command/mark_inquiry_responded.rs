//! [`Command`] for marking an inquiry as responded.

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{
        access::{Denial, Role},
        contact, Actor, Contact,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Contact`] as responded.
///
/// Only a site administrator [`User`] may do this.
#[derive(Clone, Copy, Debug)]
pub struct MarkInquiryResponded {
    /// [`Actor`] marking the [`Contact`].
    pub actor: Actor,

    /// ID of the [`Contact`] to mark.
    pub contact_id: contact::Id,
}

impl<Db> Command<MarkInquiryResponded> for Service<Db>
where
    Db: Database<
            Select<By<Role, Actor>>,
            Ok = Role,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contact>, contact::Id>>,
            Ok = Option<Contact>,
            Err = Traced<database::Error>,
        > + Database<Update<Contact>, Err = Traced<database::Error>>,
{
    type Ok = Contact;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: MarkInquiryResponded,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkInquiryResponded { actor, contact_id } = cmd;

        drop(
            self.database()
                .execute(Select(By::new(actor)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .admin()
                .map_err(tracerr::from_and_wrap!(=> E))?,
        );

        let mut contact = self
            .database()
            .execute(Select(By::new(contact_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::ContactNotExists(contact_id))
            .map_err(tracerr::wrap!())?;
        if contact.responded {
            return Ok(contact);
        }

        contact.responded = true;
        self.database()
            .execute(Update(contact.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contact)
    }
}

/// Error of [`MarkInquiryResponded`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Contact`] with the provided ID does not exist.
    #[display("`Contact(id: {_0})` does not exist")]
    #[from(ignore)]
    ContactNotExists(#[error(not(source))] contact::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not a site administrator.
    #[display("Marking the `Contact` is denied: {_0}")]
    Denied(Denial),
}

#[cfg(test)]
mod spec {
    use common::{operations::Insert, DateTime};

    use crate::{
        domain::{access::Denial, contact, user, Actor, Contact},
        infra::{Database as _, Memory},
        testing, Command as _, Service,
    };

    use super::{ExecutionError, MarkInquiryResponded};

    async fn stored_contact(svc: &Service<Memory>) -> Contact {
        let contact = Contact {
            id: contact::Id::new(),
            name: contact::Name::new("Visitor").unwrap(),
            email: user::Email::new("visitor@example.com").unwrap(),
            phone: None,
            message: contact::Message::new("Hello").unwrap(),
            property_id: None,
            responded: false,
            created_at: DateTime::now().coerce(),
        };
        svc.database().execute(Insert(contact.clone())).await.unwrap();
        contact
    }

    #[tokio::test]
    async fn admin_marks_responded() {
        let svc = testing::service();
        let admin = testing::admin(&svc).await;
        let contact = stored_contact(&svc).await;

        let marked = svc
            .execute(MarkInquiryResponded {
                actor: Actor::User(admin.id),
                contact_id: contact.id,
            })
            .await
            .unwrap();

        assert!(marked.responded);
        assert_eq!(marked.id, contact.id);
    }

    #[tokio::test]
    async fn agents_are_denied() {
        let svc = testing::service();
        let (user, _) = testing::agent(&svc, "mei", true).await;
        let contact = stored_contact(&svc).await;

        let err = svc
            .execute(MarkInquiryResponded {
                actor: Actor::User(user.id),
                contact_id: contact.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::NotAdmin),
        ));
    }
}
