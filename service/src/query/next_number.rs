//! [`Query`]s previewing the next document [`Number`].

use std::ops::Deref;

use common::{
    operations::{By, Select},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::document::{Number, Prefix, Scope},
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] previewing the [`Number`] the next automatically numbered
/// [`Invoice`] would get.
///
/// The preview reserves nothing, so the [`Number`] may be taken by the time
/// an [`Invoice`] is created.
///
/// [`Invoice`]: crate::domain::Invoice
#[derive(Clone, Copy, Debug, Default)]
pub struct NextInvoiceNumber;

/// [`Query`] previewing the [`Number`] the next automatically numbered
/// [`Quotation`] would get.
///
/// The preview reserves nothing, so the [`Number`] may be taken by the time
/// a [`Quotation`] is created.
///
/// [`Quotation`]: crate::domain::Quotation
#[derive(Clone, Copy, Debug, Default)]
pub struct NextQuotationNumber;

impl<Db> Query<NextInvoiceNumber> for Service<Db>
where
    Db: Database<
        Select<By<read::invoice::Numbers, Scope>>,
        Ok = read::invoice::Numbers,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Number;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: NextInvoiceNumber,
    ) -> Result<Self::Ok, Self::Err> {
        preview::<_, read::invoice::Numbers>(
            self.database(),
            &self.config().numbering.invoice_prefix,
        )
        .await
    }
}

impl<Db> Query<NextQuotationNumber> for Service<Db>
where
    Db: Database<
        Select<By<read::quotation::Numbers, Scope>>,
        Ok = read::quotation::Numbers,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Number;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: NextQuotationNumber,
    ) -> Result<Self::Ok, Self::Err> {
        preview::<_, read::quotation::Numbers>(
            self.database(),
            &self.config().numbering.quotation_prefix,
        )
        .await
    }
}

/// Allocates the next [`Number`] with the provided [`Prefix`] in the current
/// year over the stored `N`umbers.
async fn preview<Db, N>(
    db: &Db,
    prefix: &Prefix,
) -> Result<Number, Traced<database::Error>>
where
    Db: Database<Select<By<N, Scope>>, Ok = N, Err = Traced<database::Error>>,
    N: Deref<Target = Vec<String>>,
{
    let scope = Scope {
        prefix: prefix.clone(),
        year: Date::today().year(),
    };
    let existing = db
        .execute(Select(By::new(scope.clone())))
        .await
        .map_err(tracerr::wrap!())?;
    Ok(Number::allocate(scope, existing.iter()))
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            spec::{number, quotation_draft, service},
            CreateQuotation,
        },
        Command as _, Query as _,
    };

    use super::{NextInvoiceNumber, NextQuotationNumber};

    #[tokio::test]
    async fn previews_without_reserving() {
        let svc = service();

        let preview = svc.execute(NextQuotationNumber).await.unwrap();
        assert_eq!(preview.to_string(), number("QUO", 1));
        assert_eq!(
            svc.execute(NextQuotationNumber).await.unwrap(),
            preview,
        );

        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();
        assert_eq!(q.number, preview);
        assert_eq!(
            svc.execute(NextQuotationNumber).await.unwrap().to_string(),
            number("QUO", 2),
        );
        assert_eq!(
            svc.execute(NextInvoiceNumber).await.unwrap().to_string(),
            number("MZK", 1),
        );
    }
}
