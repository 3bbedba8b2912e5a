//! [`Command`] for creating a new [`Property`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Agent;
use crate::{
    domain::{
        access::{Denial, Role},
        media,
        property::{self, image, Image},
        Actor, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Property`] owned by the acting
/// [`Agent`].
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// [`Actor`] creating the [`Property`].
    pub actor: Actor,

    /// [`property::Details`] of a new [`Property`].
    pub details: property::Details,

    /// [`NewImage`]s to attach to a new [`Property`], in upload order.
    pub images: Vec<NewImage>,
}

/// Already stored file to be attached to a [`Property`] as an [`Image`].
#[derive(Clone, Debug)]
pub struct NewImage {
    /// Stored file of the [`Image`].
    pub file: media::Ref,

    /// [`image::Caption`] of the [`Image`].
    pub caption: Option<image::Caption>,
}

impl NewImage {
    /// Attaches the provided [`NewImage`]s to the [`Property`] one by one, so
    /// a failure doesn't undo the already attached ones.
    ///
    /// Each [`Image`] is placed after the ones already stored, while the
    /// [`Property`] is locked. The first attached [`Image`] becomes primary if
    /// none of the stored ones is.
    pub(crate) async fn attach<Db>(
        db: &Db,
        property_id: property::Id,
        uploads: Vec<Self>,
    ) -> Result<Vec<Image>, Traced<database::Error>>
    where
        Db: Database<Transact, Err = Traced<database::Error>>,
        Transacted<Db>: Database<
                Lock<By<Property, property::Id>>,
                Err = Traced<database::Error>,
            > + Database<
                Select<By<Vec<Image>, property::Id>>,
                Ok = Vec<Image>,
                Err = Traced<database::Error>,
            > + Database<Insert<Image>, Err = Traced<database::Error>>
            + Database<Commit, Err = Traced<database::Error>>,
    {
        let mut attached = Vec::with_capacity(uploads.len());
        for Self { file, caption } in uploads {
            let tx = db.execute(Transact).await.map_err(tracerr::wrap!())?;
            tx.execute(Lock(By::new(property_id)))
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;
            let existing = tx
                .execute(Select(By::new(property_id)))
                .await
                .map_err(tracerr::wrap!())?;

            let (is_primary, order) = image::Placement::after(&existing).place();
            let image = Image {
                id: image::Id::new(),
                property_id,
                file,
                caption,
                is_primary,
                order,
            };
            tx.execute(Insert(image.clone()))
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::wrap!())
                .map(drop)?;
            attached.push(image);
        }
        Ok(attached)
    }
}

/// Output of [`CreateProperty`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`Property`].
    pub property: Property,

    /// Attached [`Image`]s in gallery order.
    pub images: Vec<Image>,
}

impl<Db> Command<CreateProperty> for Service<Db>
where
    Db: Database<
            Select<By<Role, Actor>>,
            Ok = Role,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Property>, Err = Traced<database::Error>>
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Image>, property::Id>>,
            Ok = Vec<Image>,
            Err = Traced<database::Error>,
        > + Database<Insert<Image>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProperty {
            actor,
            details,
            images,
        } = cmd;

        let agent_id = self
            .database()
            .execute(Select(By::new(actor)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .authorized_agent()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let now = DateTime::now();
        let property = Property {
            id: property::Id::new(),
            agent_id: Some(agent_id),
            details,
            featured: false,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let images = NewImage::attach(self.database(), property.id, images)
            .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output { property, images })
    }
}

/// Error of [`CreateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not allowed to create a [`Property`].
    #[display("Creating a `Property` is denied: {_0}")]
    Denied(Denial),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        domain::{
            access::Denial,
            media,
            property::{self, Image},
            Actor, Property,
        },
        infra::Database as _,
        read, testing, Command as _,
    };

    use super::{CreateProperty, ExecutionError, NewImage};

    fn upload(name: &str) -> NewImage {
        NewImage {
            file: media::Ref::new(media::Namespace::Properties, name).unwrap(),
            caption: None,
        }
    }

    #[tokio::test]
    async fn first_of_uploaded_images_is_primary() {
        let svc = testing::service();
        let (user, agent) = testing::agent(&svc, "mei", true).await;

        let out = svc
            .execute(CreateProperty {
                actor: Actor::User(user.id),
                details: testing::details(property::Kind::House, "150000"),
                images: vec![upload("a.jpg"), upload("b.jpg"), upload("c.jpg")],
            })
            .await
            .unwrap();

        assert_eq!(out.property.agent_id, Some(agent.id));
        assert!(!out.property.featured);

        let stored = svc
            .database()
            .execute(Select(By::<Vec<Image>, _>::new(out.property.id)))
            .await
            .unwrap();
        let files = stored
            .iter()
            .map(|i| i.file.as_ref().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            files,
            ["properties/a.jpg", "properties/b.jpg", "properties/c.jpg"],
        );
        let primaries =
            stored.iter().map(|i| i.is_primary).collect::<Vec<_>>();
        assert_eq!(primaries, [true, false, false]);
    }

    #[tokio::test]
    async fn unauthorized_agent_is_denied() {
        let svc = testing::service();
        let (user, agent) = testing::agent(&svc, "mei", false).await;

        let err = svc
            .execute(CreateProperty {
                actor: Actor::User(user.id),
                details: testing::details(property::Kind::House, "150000"),
                images: vec![upload("a.jpg")],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Denied(Denial::AgentNotAuthorized),
        ));
        let owned = svc
            .database()
            .execute(Select(By::<Vec<Property>, _>::new(
                read::property::OwnedBy {
                    agent_id: agent.id,
                    status: None,
                },
            )))
            .await
            .unwrap();
        assert!(owned.is_empty());
    }

    #[tokio::test]
    async fn anonymous_and_non_agents_are_denied() {
        let svc = testing::service();
        let admin = testing::admin(&svc).await;

        for (actor, denial) in [
            (Actor::Anonymous, Denial::Unauthenticated),
            (Actor::User(admin.id), Denial::NotAgent),
        ] {
            let err = svc
                .execute(CreateProperty {
                    actor,
                    details: testing::details(property::Kind::Land, "1"),
                    images: vec![],
                })
                .await
                .unwrap_err();

            assert!(
                matches!(err.as_ref(), ExecutionError::Denied(d) if *d == denial),
            );
        }
    }
}
