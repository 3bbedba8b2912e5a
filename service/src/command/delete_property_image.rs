//! [`Command`] for deleting an [`Image`] of a [`Property`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Agent;
use crate::{
    domain::{
        access::{Denial, Role},
        property::{self, image, Image},
        Actor, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting an [`Image`] of a [`Property`].
///
/// Once the primary [`Image`] is deleted, the next one in gallery order
/// becomes primary. Only the authorized [`Agent`] owning the [`Property`] may
/// delete its [`Image`]s.
#[derive(Clone, Copy, Debug)]
pub struct DeletePropertyImage {
    /// [`Actor`] deleting the [`Image`].
    pub actor: Actor,

    /// ID of the [`Image`] to delete.
    pub image_id: image::Id,
}

/// Output of [`DeletePropertyImage`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Deleted [`Image`], whose file is no longer referenced.
    pub image: Image,

    /// [`Image`] promoted to primary instead of the deleted one, if any.
    pub promoted: Option<Image>,
}

impl<Db> Command<DeletePropertyImage> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Role, Actor>>,
            Ok = Role,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Image>, image::Id>>,
            Ok = Option<Image>,
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
        > + Database<Delete<By<Image, image::Id>>, Err = Traced<database::Error>>
        + Database<Update<Image>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeletePropertyImage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeletePropertyImage { actor, image_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let image = tx
            .execute(Select(By::new(image_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::ImageNotExists(image_id))
            .map_err(tracerr::wrap!())?;

        // Serialize gallery changes of the same `Property`.
        tx.execute(Lock(By::new(image.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(image.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::ImageNotExists(image_id))
            .map_err(tracerr::wrap!())?;

        drop(
            tx.execute(Select(By::new(actor)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .owner_of(&property)
                .map_err(tracerr::from_and_wrap!(=> E))?,
        );

        tx.execute(Delete(By::<Image, _>::new(image_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let remaining: Vec<Image> = tx
            .execute(Select(By::<Vec<Image>, _>::new(property.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let promoted = Image::successor(&remaining).cloned().map(|mut i| {
            i.is_primary = true;
            i
        });
        if let Some(promoted) = &promoted {
            tx.execute(Update(promoted.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output { image, promoted })
    }
}

/// Error of [`DeletePropertyImage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not allowed to delete the [`Image`].
    #[display("Deleting the `Image` is denied: {_0}")]
    Denied(Denial),

    /// [`Image`] with the provided ID does not exist.
    #[display("`Image(id: {_0})` does not exist")]
    #[from(ignore)]
    ImageNotExists(#[error(not(source))] image::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Select};

    use crate::{
        domain::{
            access::Denial,
            media,
            property::{self, image, Image},
            Actor,
        },
        infra::Database as _,
        testing, Command as _,
    };

    use super::{DeletePropertyImage, ExecutionError};

    fn image(property_id: property::Id, order: u16) -> Image {
        Image {
            id: image::Id::new(),
            property_id,
            file: media::Ref::new(
                media::Namespace::Properties,
                &format!("{order}.jpg"),
            )
            .unwrap(),
            caption: None,
            is_primary: order == 0,
            order,
        }
    }

    #[tokio::test]
    async fn promotes_next_image_once_primary_is_deleted() {
        let svc = testing::service();
        let (user, agent) = testing::agent(&svc, "mei", true).await;
        let listing = testing::property(
            &svc,
            Some(agent.id),
            testing::details(property::Kind::House, "150000"),
            0,
        )
        .await;
        let gallery = [
            image(listing.id, 0),
            image(listing.id, 1),
            image(listing.id, 2),
        ];
        for i in &gallery {
            svc.database().execute(Insert(i.clone())).await.unwrap();
        }

        let out = svc
            .execute(DeletePropertyImage {
                actor: Actor::User(user.id),
                image_id: gallery[0].id,
            })
            .await
            .unwrap();
        assert_eq!(out.image.id, gallery[0].id);
        assert_eq!(out.promoted.map(|i| i.id), Some(gallery[1].id));

        let out = svc
            .execute(DeletePropertyImage {
                actor: Actor::User(user.id),
                image_id: gallery[2].id,
            })
            .await
            .unwrap();
        assert!(out.promoted.is_none());

        let left = svc
            .database()
            .execute(Select(By::<Vec<Image>, _>::new(listing.id)))
            .await
            .unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, gallery[1].id);
        assert!(left[0].is_primary);
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let svc = testing::service();
        let (_, owner) = testing::agent(&svc, "mei", true).await;
        let (other, _) = testing::agent(&svc, "hao", true).await;
        let listing = testing::property(
            &svc,
            Some(owner.id),
            testing::details(property::Kind::House, "150000"),
            0,
        )
        .await;
        let kept = image(listing.id, 0);
        svc.database().execute(Insert(kept.clone())).await.unwrap();

        let err = svc
            .execute(DeletePropertyImage {
                actor: Actor::User(other.id),
                image_id: kept.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::NotOwner),
        ));
        assert_eq!(
            svc.database()
                .execute(Select(By::<Vec<Image>, _>::new(listing.id)))
                .await
                .unwrap()
                .len(),
            1,
        );
    }
}
