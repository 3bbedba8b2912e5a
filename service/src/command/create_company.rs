//! [`Command`] for creating the [`Company`].

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{company, Company},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating the only [`Company`].
///
/// Fails if the [`Company`] has been created already.
#[derive(Clone, Debug)]
pub struct CreateCompany {
    /// [`Company`] to store.
    pub company: Company,
}

impl<Db> Command<CreateCompany> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Company>, company::Singleton>>,
            Ok = Option<Company>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Company, company::Singleton>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Company>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Company;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateCompany) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCompany { company } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent creation of another `Company`.
        tx.execute(Lock(By::new(company::Singleton)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::new(company::Singleton)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(existing) = existing {
            return Err(tracerr::new!(E::CompanyExists(existing.id)));
        }

        let inserted = tx.execute(Insert(company.clone())).await;
        if let Err(e) = &inserted {
            if e.as_ref()
                .is_unique_violation(Some(database::COMPANIES_SINGLETON_KEY))
            {
                return Err(tracerr::new!(E::CompanyExists(company.id)));
            }
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(company_id = %company.id, "`Company` created");

        Ok(company)
    }
}

/// Error of [`CreateCompany`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Company`] exists already.
    #[display("`Company` exists already")]
    #[from(ignore)]
    CompanyExists(#[error(not(source))] company::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{company, Company},
        testing, Command as _,
    };

    use super::{CreateCompany, ExecutionError};

    fn company(name: &str) -> Company {
        Company::blank(company::Name::new(name).unwrap())
    }

    #[tokio::test]
    async fn second_company_is_rejected() {
        let svc = testing::service();

        let first = svc
            .execute(CreateCompany {
                company: company("Hualien Homes"),
            })
            .await
            .unwrap();

        let err = svc
            .execute(CreateCompany {
                company: company("Another Agency"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::CompanyExists(id) if *id == first.id,
        ));
    }
}
