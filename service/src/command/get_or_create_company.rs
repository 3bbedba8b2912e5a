//! [`Command`] for retrieving the [`Company`], creating it if missing.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{company, Company},
    infra::{database, Database},
    Service,
};

use super::{create_company, Command, CreateCompany};

/// [`Command`] for retrieving the only [`Company`], creating a blank one
/// with the provided [`company::Name`] if none exists yet.
#[derive(Clone, Debug)]
pub struct GetOrCreateCompany {
    /// [`company::Name`] of the [`Company`] created if none exists.
    pub default_name: company::Name,
}

impl<Db> Command<GetOrCreateCompany> for Service<Db>
where
    Db: Database<
        Select<By<Option<Company>, company::Singleton>>,
        Ok = Option<Company>,
        Err = Traced<database::Error>,
    >,
    Self: Command<
        CreateCompany,
        Ok = Company,
        Err = Traced<create_company::ExecutionError>,
    >,
{
    type Ok = Company;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: GetOrCreateCompany,
    ) -> Result<Self::Ok, Self::Err> {
        use create_company::ExecutionError as CreateError;
        use ExecutionError as E;

        let GetOrCreateCompany { default_name } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(company::Singleton)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(company) = existing {
            return Ok(company);
        }

        match self
            .execute(CreateCompany {
                company: Company::blank(default_name),
            })
            .await
        {
            Ok(company) => Ok(company),
            // Concurrent request has created the `Company` first.
            Err(e) if matches!(e.as_ref(), CreateError::CompanyExists(_)) => {
                self.database()
                    .execute(Select(By::new(company::Singleton)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or_else(|| E::CompanyVanished)
                    .map_err(tracerr::wrap!())
            }
            e @ Err(_) => e.map_err(tracerr::map_from_and_wrap!(=> E)),
        }
    }
}

/// Error of [`GetOrCreateCompany`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Company`] was reported as existing, but couldn't be found.
    #[display("`Company` disappeared after being created")]
    CompanyVanished,

    /// [`CreateCompany`] error.
    #[display("Failed to create `Company`: {_0}")]
    Create(create_company::ExecutionError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use crate::{domain::company, testing, Command as _};

    use super::GetOrCreateCompany;

    #[tokio::test]
    async fn always_yields_the_same_company() {
        let svc = testing::service();
        let cmd = || GetOrCreateCompany {
            default_name: company::Name::new("Hualien Homes").unwrap(),
        };

        let created = svc.execute(cmd()).await.unwrap();
        let retrieved = svc.execute(cmd()).await.unwrap();

        assert_eq!(created.id, retrieved.id);
        assert_eq!(retrieved.name.as_ref(), "Hualien Homes");
    }
}
