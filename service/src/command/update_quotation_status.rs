//! [`Command`] for updating a [`quotation::Status`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{quotation, Quotation},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`quotation::Status`].
///
/// Any [`quotation::Status`] may follow any other one.
#[derive(Clone, Copy, Debug)]
pub struct UpdateQuotationStatus {
    /// ID of the [`Quotation`] to update.
    pub quotation_id: quotation::Id,

    /// New [`quotation::Status`] of the [`Quotation`].
    pub status: quotation::Status,
}

impl<Db> Command<UpdateQuotationStatus> for Service<Db>
where
    Db: Database<
            Select<By<Option<Quotation>, quotation::Id>>,
            Ok = Option<Quotation>,
            Err = Traced<database::Error>,
        > + Database<Update<Quotation>, Err = Traced<database::Error>>,
{
    type Ok = Quotation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateQuotationStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateQuotationStatus {
            quotation_id,
            status,
        } = cmd;

        let mut quotation = self
            .database()
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::QuotationNotExists(quotation_id)))?;
        if quotation.status == status {
            return Ok(quotation);
        }

        quotation.status = status;
        self.database()
            .execute(Update(quotation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(|_| quotation)
    }
}

/// Error of [`UpdateQuotationStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Quotation`] with the provided ID doesn't exist.
    #[display("`Quotation(id: {_0})` doesn't exist")]
    QuotationNotExists(#[error(not(source))] quotation::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{
            spec::{quotation_draft, service},
            CreateQuotation,
        },
        domain::{quotation, Quotation},
        infra::Database as _,
        Command as _,
    };

    use super::{ExecutionError, UpdateQuotationStatus};

    #[tokio::test]
    async fn updates_status() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        let updated = svc
            .execute(UpdateQuotationStatus {
                quotation_id: q.id,
                status: quotation::Status::Sent,
            })
            .await
            .unwrap();

        assert_eq!(updated.status, quotation::Status::Sent);
        let stored = svc
            .database()
            .execute(Select(By::<Option<Quotation>, _>::new(q.id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(updated));
    }

    #[tokio::test]
    async fn refuses_unknown_quotation() {
        let svc = service();

        let err = svc
            .execute(UpdateQuotationStatus {
                quotation_id: quotation::Id::new(),
                status: quotation::Status::Rejected,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::QuotationNotExists(_),
        ));
    }
}
