//! [`Command`] for updating an existing [`Property`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Agent;
use crate::{
    domain::{
        access::{Denial, Role},
        property::{self, Image},
        Actor, Property,
    },
    infra::{database, Database},
    Service,
};

use super::{create_property::NewImage, Command};

/// [`Command`] for updating the [`property::Details`] of an existing
/// [`Property`] and attaching more [`Image`]s to it.
///
/// Only the authorized [`Agent`] owning the [`Property`] may update it.
#[derive(Clone, Debug)]
pub struct UpdateProperty {
    /// [`Actor`] updating the [`Property`].
    pub actor: Actor,

    /// ID of the [`Property`] to update.
    pub property_id: property::Id,

    /// New [`property::Details`] of the [`Property`].
    pub details: property::Details,

    /// [`NewImage`]s to append to the [`Property`] gallery, in upload order.
    pub images: Vec<NewImage>,
}

/// Output of [`UpdateProperty`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Updated [`Property`].
    pub property: Property,

    /// Newly attached [`Image`]s in gallery order.
    pub images: Vec<Image>,
}

impl<Db> Command<UpdateProperty> for Service<Db>
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
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Image>, property::Id>>,
            Ok = Vec<Image>,
            Err = Traced<database::Error>,
        > + Database<Insert<Image>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateProperty {
            actor,
            property_id,
            details,
            images,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let mut property = tx
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

        property.details = details;
        property.updated_at = DateTime::now().coerce();

        tx.execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let images = NewImage::attach(self.database(), property_id, images)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output { property, images })
    }
}

/// Error of [`UpdateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not allowed to update the [`Property`].
    #[display("Updating the `Property` is denied: {_0}")]
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
        Money,
    };

    use crate::{
        command::create_property::NewImage,
        domain::{
            access::Denial,
            media,
            property::{self, image, Image},
            Actor, Property,
        },
        infra::{memory::Event, Database as _},
        testing, Command as _,
    };

    use super::{ExecutionError, UpdateProperty};

    fn upload(name: &str) -> NewImage {
        NewImage {
            file: media::Ref::new(media::Namespace::Properties, name).unwrap(),
            caption: None,
        }
    }

    #[tokio::test]
    async fn owner_updates_details_and_appends_images() {
        let svc = testing::service();
        let (user, agent) = testing::agent(&svc, "mei", true).await;
        let listing = testing::property(
            &svc,
            Some(agent.id),
            testing::details(property::Kind::Condo, "200000"),
            0,
        )
        .await;

        let mut details = listing.details.clone();
        details.status = property::Status::Pending;
        details.price = "190000".parse::<Money>().unwrap();
        let price = details.price;
        let out = svc
            .execute(UpdateProperty {
                actor: Actor::User(user.id),
                property_id: listing.id,
                details,
                images: vec![upload("x.jpg")],
            })
            .await
            .unwrap();

        assert!(out.property.updated_at > listing.updated_at);
        assert_eq!(out.property.created_at, listing.created_at);

        let stored = svc
            .database()
            .execute(Select(By::<Option<Property>, _>::new(listing.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.details.status, property::Status::Pending);
        assert_eq!(stored.details.price, price);

        let images = svc
            .database()
            .execute(Select(By::<Vec<Image>, _>::new(listing.id)))
            .await
            .unwrap();
        assert_eq!(images.len(), 1);
        assert!(images[0].is_primary);
    }

    #[tokio::test]
    async fn other_agent_cannot_update() {
        let svc = testing::service();
        let (_, owner) = testing::agent(&svc, "mei", true).await;
        let (intruder, _) = testing::agent(&svc, "hao", true).await;
        let listing = testing::property(
            &svc,
            Some(owner.id),
            testing::details(property::Kind::House, "150000"),
            0,
        )
        .await;

        let mut details = listing.details.clone();
        details.price = Money::ZERO;
        let err = svc
            .execute(UpdateProperty {
                actor: Actor::User(intruder.id),
                property_id: listing.id,
                details,
                images: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::NotOwner),
        ));
        let stored = svc
            .database()
            .execute(Select(By::<Option<Property>, _>::new(listing.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.details.price, listing.details.price);
    }

    #[tokio::test]
    async fn unknown_property_is_reported() {
        let svc = testing::service();
        let (user, _) = testing::agent(&svc, "mei", true).await;

        let err = svc
            .execute(UpdateProperty {
                actor: Actor::User(user.id),
                property_id: property::Id::new(),
                details: testing::details(property::Kind::Villa, "1"),
                images: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PropertyNotExists(_),
        ));
    }

    #[tokio::test]
    async fn places_each_image_while_property_is_locked() {
        let svc = testing::service();
        let (user, agent) = testing::agent(&svc, "mei", true).await;
        let listing = testing::property(
            &svc,
            Some(agent.id),
            testing::details(property::Kind::House, "150000"),
            0,
        )
        .await;
        let cover = Image {
            id: image::Id::new(),
            property_id: listing.id,
            file: upload("cover.jpg").file,
            caption: None,
            is_primary: true,
            order: 0,
        };
        svc.database().execute(Insert(cover.clone())).await.unwrap();

        let out = svc
            .execute(UpdateProperty {
                actor: Actor::User(user.id),
                property_id: listing.id,
                details: listing.details.clone(),
                images: vec![upload("a.jpg"), upload("b.jpg")],
            })
            .await
            .unwrap();

        let placed = out
            .images
            .iter()
            .map(|i| (i.is_primary, i.order))
            .collect::<Vec<_>>();
        assert_eq!(placed, [(false, 1), (false, 2)]);

        let locked = Event::LockProperty(listing.id);
        assert_eq!(
            svc.database().journal(),
            [
                Event::InsertImage(cover.id),
                Event::Transact,
                locked,
                Event::Commit,
                Event::Transact,
                locked,
                Event::InsertImage(out.images[0].id),
                Event::Commit,
                Event::Transact,
                locked,
                Event::InsertImage(out.images[1].id),
                Event::Commit,
            ],
        );
    }
}
