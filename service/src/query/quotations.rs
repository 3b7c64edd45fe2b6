//! [`Query`] collection related to the multiple [`Quotation`]s.

use common::operations::By;

use crate::{domain::Quotation, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`Quotation`]s, the most recently issued first.
pub type List =
    DatabaseQuery<By<Vec<Quotation>, read::quotation::list::Filter>>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::Date;

    use crate::{
        command::{
            spec::{quotation_draft, service},
            CreateQuotation, UpdateQuotationStatus,
        },
        domain::quotation,
        read::quotation::list::Filter,
        Command as _, Query as _,
    };

    use super::List;

    #[tokio::test]
    async fn lists_by_status_latest_first() {
        let svc = service();
        let mut ids = vec![];
        for days in 0..3 {
            let mut draft = quotation_draft(&[("Hosting", 12, 125)]);
            draft.date = (Date::today()
                + Duration::from_secs(days * 24 * 60 * 60))
            .coerce();
            let q = svc.execute(CreateQuotation { draft }).await.unwrap();
            ids.push(q.id);
        }
        _ = svc
            .execute(UpdateQuotationStatus {
                quotation_id: ids[1],
                status: quotation::Status::Sent,
            })
            .await
            .unwrap();

        let all = svc.execute(List::by(Filter::default())).await.unwrap();
        assert_eq!(
            all.iter().map(|q| q.id).collect::<Vec<_>>(),
            [ids[2], ids[1], ids[0]],
        );

        let sent = svc
            .execute(List::by(Filter {
                status: Some(quotation::Status::Sent),
            }))
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, ids[1]);
    }
}
