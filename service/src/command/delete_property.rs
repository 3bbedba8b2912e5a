//! [`Command`] for deleting a [`Property`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{Agent, Contact};
use crate::{
    domain::{
        access::{Denial, Role},
        property::{self, Image},
        Actor, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Property`] along with its [`Image`]s.
///
/// [`Contact`]s about the deleted [`Property`] are kept, losing the reference
/// to it. Only the authorized [`Agent`] owning the [`Property`] may delete
/// it.
#[derive(Clone, Copy, Debug)]
pub struct DeleteProperty {
    /// [`Actor`] deleting the [`Property`].
    pub actor: Actor,

    /// ID of the [`Property`] to delete.
    pub property_id: property::Id,
}

/// Output of [`DeleteProperty`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Deleted [`Property`].
    pub property: Property,

    /// Deleted [`Image`]s, whose files are no longer referenced.
    pub images: Vec<Image>,
}

impl<Db> Command<DeleteProperty> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Role, Actor>>,
            Ok = Role,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Image>, property::Id>>,
            Ok = Vec<Image>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteProperty { actor, property_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        drop(
            tx.execute(Select(By::new(actor)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .owner_of(&property)
                .map_err(tracerr::from_and_wrap!(=> E))?,
        );

        let images = tx
            .execute(Select(By::<Vec<Image>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Delete(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output { property, images })
    }
}

/// Error of [`DeleteProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not allowed to delete the [`Property`].
    #[display("Deleting the `Property` is denied: {_0}")]
    Denied(Denial),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    PropertyNotExists(#[error(not(source))] property::Id),
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Select},
        DateTime,
    };

    use crate::{
        domain::{
            access::Denial,
            contact, media,
            property::{self, image, Image},
            user, Actor, Contact, Property,
        },
        infra::Database as _,
        testing, Command as _,
    };

    use super::{DeleteProperty, ExecutionError};

    #[tokio::test]
    async fn owner_deletes_with_images_keeping_inquiries() {
        let svc = testing::service();
        let (user, agent) = testing::agent(&svc, "mei", true).await;
        let listing = testing::property(
            &svc,
            Some(agent.id),
            testing::details(property::Kind::House, "150000"),
            0,
        )
        .await;
        let image = Image {
            id: image::Id::new(),
            property_id: listing.id,
            file: media::Ref::new(media::Namespace::Properties, "a.jpg")
                .unwrap(),
            caption: None,
            is_primary: true,
            order: 0,
        };
        svc.database().execute(Insert(image.clone())).await.unwrap();
        let inquiry = Contact {
            id: contact::Id::new(),
            name: contact::Name::new("Visitor").unwrap(),
            email: user::Email::new("visitor@example.com").unwrap(),
            phone: None,
            message: contact::Message::new("Is it still available?").unwrap(),
            property_id: Some(listing.id),
            responded: false,
            created_at: DateTime::now().coerce(),
        };
        svc.database().execute(Insert(inquiry.clone())).await.unwrap();

        let out = svc
            .execute(DeleteProperty {
                actor: Actor::User(user.id),
                property_id: listing.id,
            })
            .await
            .unwrap();

        assert_eq!(out.property.id, listing.id);
        assert_eq!(out.images.len(), 1);
        assert!(svc
            .database()
            .execute(Select(By::<Option<Property>, _>::new(listing.id)))
            .await
            .unwrap()
            .is_none());
        assert!(svc
            .database()
            .execute(Select(By::<Vec<Image>, _>::new(listing.id)))
            .await
            .unwrap()
            .is_empty());
        let kept = svc
            .database()
            .execute(Select(By::<Option<Contact>, _>::new(inquiry.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.property_id, None);
    }

    #[tokio::test]
    async fn only_authorized_owner_deletes() {
        let svc = testing::service();
        let (owner_user, owner) = testing::agent(&svc, "mei", false).await;
        let (other, _) = testing::agent(&svc, "hao", true).await;
        let listing = testing::property(
            &svc,
            Some(owner.id),
            testing::details(property::Kind::House, "150000"),
            0,
        )
        .await;

        for (actor, denial) in [
            (Actor::Anonymous, Denial::Unauthenticated),
            (Actor::User(other.id), Denial::NotOwner),
            (Actor::User(owner_user.id), Denial::AgentNotAuthorized),
        ] {
            let err = svc
                .execute(DeleteProperty {
                    actor,
                    property_id: listing.id,
                })
                .await
                .unwrap_err();
            assert!(
                matches!(err.as_ref(), ExecutionError::Denied(d) if *d == denial),
            );
        }

        assert!(svc
            .database()
            .execute(Select(By::<Option<Property>, _>::new(listing.id)))
            .await
            .unwrap()
            .is_some());
    }
}
