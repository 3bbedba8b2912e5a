//! [`Command`] for submitting an inquiry.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{contact, property, user, Contact, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for submitting an inquiry as a new [`Contact`].
///
/// A referenced [`Property`] that doesn't exist is dropped, while the
/// [`Contact`] is still stored. An existing [`Property`] stays locked until
/// the [`Contact`] referencing it is stored, so it cannot be deleted in
/// between.
#[derive(Clone, Debug)]
pub struct SubmitInquiry {
    /// [`contact::Name`] of the inquirer.
    pub name: contact::Name,

    /// [`user::Email`] to reply to.
    pub email: user::Email,

    /// [`user::Phone`] of the inquirer, if provided.
    pub phone: Option<user::Phone>,

    /// [`contact::Message`] of the inquiry.
    pub message: contact::Message,

    /// ID of the [`Property`] the inquiry is about, if any.
    pub property_id: Option<property::Id>,
}

impl<Db> Command<SubmitInquiry> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contact>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contact;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SubmitInquiry) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitInquiry {
            name,
            email,
            phone,
            message,
            property_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let property_id = match property_id {
            Some(id) => {
                tx.execute(Lock(By::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                let exists = tx
                    .execute(Select(By::<Option<Property>, _>::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .is_some();
                if !exists {
                    tracing::info!(
                        property_id = %id,
                        "dropping reference to non-existent `Property`",
                    );
                }
                exists.then_some(id)
            }
            None => None,
        };

        let contact = Contact {
            id: contact::Id::new(),
            name,
            email,
            phone,
            message,
            property_id,
            responded: false,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(contact.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contact)
    }
}

/// Error of [`SubmitInquiry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::{contact, property, user, Contact},
        infra::{memory::Event, Database as _},
        testing, Command as _,
    };

    use super::SubmitInquiry;

    fn inquiry(property_id: Option<property::Id>) -> SubmitInquiry {
        SubmitInquiry {
            name: contact::Name::new("Visitor").unwrap(),
            email: user::Email::new("visitor@example.com").unwrap(),
            phone: None,
            message: contact::Message::new("Can I visit on Sunday?").unwrap(),
            property_id,
        }
    }

    #[tokio::test]
    async fn keeps_existing_property_reference() {
        let svc = testing::service();
        let (_, agent) = testing::agent(&svc, "mei", true).await;
        let listing = testing::property(
            &svc,
            Some(agent.id),
            testing::details(property::Kind::House, "150000"),
            0,
        )
        .await;

        let contact = svc.execute(inquiry(Some(listing.id))).await.unwrap();

        assert_eq!(contact.property_id, Some(listing.id));
        assert!(!contact.responded);
    }

    #[tokio::test]
    async fn persists_with_null_for_unknown_property() {
        let svc = testing::service();

        let contact =
            svc.execute(inquiry(Some(property::Id::new()))).await.unwrap();

        let stored = svc
            .database()
            .execute(Select(By::<Option<Contact>, _>::new(contact.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.property_id, None);
        assert_eq!(stored.message.as_ref(), "Can I visit on Sunday?");
    }

    #[tokio::test]
    async fn stores_while_property_is_locked() {
        let svc = testing::service();
        let listing = testing::property(
            &svc,
            None,
            testing::details(property::Kind::Land, "90000"),
            0,
        )
        .await;

        let contact = svc.execute(inquiry(Some(listing.id))).await.unwrap();

        assert_eq!(
            svc.database().journal(),
            [
                Event::Transact,
                Event::LockProperty(listing.id),
                Event::InsertContact(contact.id),
                Event::Commit,
            ],
        );
    }
}
