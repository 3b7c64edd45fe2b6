//! In-memory [`Database`] implementation.

#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::{mem, sync::Arc};

use common::operations::{By, Commit, Insert, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::Mutex;
use tracerr::Traced;

use crate::{
    domain::{document::Scope, invoice, quotation, Invoice, Quotation},
    infra::database::{self, constraint, Database},
    read,
};

/// In-memory [`Database`] keeping the stored documents in the process.
///
/// A [`Memory`] returned by [`Transact`] stages its writes on a snapshot of
/// the committed documents, and publishes them all at once on [`Commit`],
/// checking the uniqueness constraints again against the documents committed
/// in the meantime.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Committed documents.
    committed: Arc<Mutex<State>>,

    /// Transaction this [`Memory`] works in, if any.
    tx: Option<Arc<Mutex<Staged>>>,

    /// Number of the upcoming document number reads to return nothing.
    #[cfg(test)]
    stale_number_reads: Arc<AtomicUsize>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` reads of stored document numbers miss all of
    /// them, as if they were done before the concurrent writes.
    #[cfg(test)]
    pub(crate) fn stale_number_reads(&self, count: usize) {
        self.stale_number_reads.store(count, Ordering::SeqCst);
    }

    /// Reads the documents visible to this [`Memory`].
    async fn read<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        if let Some(tx) = &self.tx {
            f(&tx.lock().await.snapshot)
        } else {
            f(&*self.committed.lock().await)
        }
    }

    /// Reads the stored document numbers.
    async fn read_numbers(
        &self,
        f: impl FnOnce(&State) -> Vec<String>,
    ) -> Vec<String> {
        #[cfg(test)]
        if self
            .stale_number_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                n.checked_sub(1)
            })
            .is_ok()
        {
            return vec![];
        }
        self.read(f).await
    }

    /// Performs the provided [`Write`], staging it if this [`Memory`] works
    /// in a transaction.
    async fn write(&self, write: Write) -> Result<(), Traced<database::Error>> {
        let res = if let Some(tx) = &self.tx {
            let mut staged = tx.lock().await;
            staged
                .snapshot
                .apply(write.clone())
                .map(|()| staged.writes.push(write))
        } else {
            self.committed.lock().await.apply(write)
        };
        res.map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Uniqueness constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |n| n == *c),
        }
    }
}

/// Documents stored in a [`Memory`].
#[derive(Clone, Debug, Default)]
struct State {
    /// Stored [`Quotation`]s, in their creation order.
    quotations: Vec<Quotation>,

    /// Stored [`Invoice`]s, in their creation order.
    invoices: Vec<Invoice>,
}

/// Transaction of a [`Memory`].
#[derive(Debug)]
struct Staged {
    /// Committed documents with the [`Staged::writes`] applied.
    snapshot: State,

    /// Writes to be published on [`Commit`].
    writes: Vec<Write>,
}

/// Single write of a [`Memory`].
#[derive(Clone, Debug)]
enum Write {
    /// Stores a new [`Quotation`].
    InsertQuotation(Quotation),

    /// Overwrites a stored [`Quotation`].
    UpdateQuotation(Quotation),

    /// Stores a new [`Invoice`].
    InsertInvoice(Invoice),

    /// Overwrites a stored [`Invoice`].
    UpdateInvoice(Invoice),
}

impl State {
    /// Applies the provided [`Write`], unless it violates a constraint.
    fn apply(&mut self, write: Write) -> Result<(), Error> {
        match write {
            Write::InsertQuotation(q) => {
                if self.quotations.iter().any(|s| s.id == q.id) {
                    return Err(Error::UniqueViolation("quotations_pkey"));
                }
                self.check_quotation(&q)?;
                self.quotations.push(q);
            }
            Write::UpdateQuotation(q) => {
                self.check_quotation(&q)?;
                if let Some(s) = self.quotations.iter_mut().find(|s| s.id == q.id)
                {
                    *s = q;
                }
            }
            Write::InsertInvoice(i) => {
                if self.invoices.iter().any(|s| s.id == i.id) {
                    return Err(Error::UniqueViolation("invoices_pkey"));
                }
                self.check_invoice(&i)?;
                self.invoices.push(i);
            }
            Write::UpdateInvoice(i) => {
                self.check_invoice(&i)?;
                if let Some(s) = self.invoices.iter_mut().find(|s| s.id == i.id)
                {
                    *s = i;
                }
            }
        }
        Ok(())
    }

    /// Checks the uniqueness constraints of the provided [`Quotation`].
    fn check_quotation(&self, q: &Quotation) -> Result<(), Error> {
        if self
            .quotations
            .iter()
            .any(|s| s.id != q.id && s.number == q.number)
        {
            return Err(Error::UniqueViolation(constraint::QUOTATION_NUMBER));
        }
        Ok(())
    }

    /// Checks the uniqueness constraints of the provided [`Invoice`].
    fn check_invoice(&self, i: &Invoice) -> Result<(), Error> {
        let others = || self.invoices.iter().filter(|s| s.id != i.id);
        if others().any(|s| s.number == i.number) {
            return Err(Error::UniqueViolation(constraint::INVOICE_NUMBER));
        }
        if i.quotation_id.is_some()
            && others().any(|s| s.quotation_id == i.quotation_id)
        {
            return Err(Error::UniqueViolation(constraint::INVOICE_QUOTATION));
        }
        Ok(())
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        if self.tx.is_some() {
            return Ok(self.clone());
        }
        let snapshot = self.committed.lock().await.clone();
        Ok(Self {
            tx: Some(Arc::new(Mutex::new(Staged {
                snapshot,
                writes: vec![],
            }))),
            ..self.clone()
        })
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Some(tx) = &self.tx else {
            // Nothing is staged outside a transaction.
            return Ok(());
        };
        let mut staged = tx.lock().await;
        let mut committed = self.committed.lock().await;

        let mut next = committed.clone();
        let res = mem::take(&mut staged.writes)
            .into_iter()
            .try_for_each(|w| next.apply(w));
        if res.is_ok() {
            *committed = next;
        }
        staged.snapshot = committed.clone();

        res.map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Insert<Quotation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(q): Insert<Quotation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::InsertQuotation(q))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Update<Quotation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(q): Update<Quotation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::UpdateQuotation(q))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Insert<Invoice>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(i): Insert<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::InsertInvoice(i))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Update<Invoice>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(i): Update<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(Write::UpdateInvoice(i))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Select<By<Option<Quotation>, quotation::Id>>> for Memory {
    type Ok = Option<Quotation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Quotation>, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .read(|s| s.quotations.iter().find(|q| q.id == id).cloned())
            .await)
    }
}

impl Database<Select<By<Option<Invoice>, invoice::Id>>> for Memory {
    type Ok = Option<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Invoice>, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .read(|s| s.invoices.iter().find(|i| i.id == id).cloned())
            .await)
    }
}

impl Database<Select<By<Option<Invoice>, quotation::Id>>> for Memory {
    type Ok = Option<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Invoice>, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = Some(by.into_inner());
        Ok(self
            .read(|s| s.invoices.iter().find(|i| i.quotation_id == id).cloned())
            .await)
    }
}

impl Database<Select<By<read::quotation::Numbers, Scope>>> for Memory {
    type Ok = read::quotation::Numbers;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::quotation::Numbers, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        let scope = by.into_inner();
        Ok(self
            .read_numbers(|s| {
                s.quotations
                    .iter()
                    .filter(|q| q.number.scope() == &scope)
                    .map(|q| q.number.to_string())
                    .collect()
            })
            .await
            .into())
    }
}

impl Database<Select<By<read::invoice::Numbers, Scope>>> for Memory {
    type Ok = read::invoice::Numbers;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::invoice::Numbers, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        let scope = by.into_inner();
        Ok(self
            .read_numbers(|s| {
                s.invoices
                    .iter()
                    .filter(|i| i.number.scope() == &scope)
                    .map(|i| i.number.to_string())
                    .collect()
            })
            .await
            .into())
    }
}

impl Database<Select<By<Vec<Invoice>, read::invoice::Issued>>> for Memory {
    type Ok = Vec<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Invoice>, read::invoice::Issued>>,
    ) -> Result<Self::Ok, Self::Err> {
        let period = by.into_inner();
        let mut invoices = self
            .read(|s| {
                s.invoices
                    .iter()
                    .filter(|i| period.contains(i.date))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        invoices.sort_by_key(|i| i.date);
        Ok(invoices)
    }
}

impl Database<Select<By<Vec<Quotation>, read::quotation::list::Filter>>>
    for Memory
{
    type Ok = Vec<Quotation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Quotation>, read::quotation::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let mut quotations = self
            .read(|s| {
                s.quotations
                    .iter()
                    .filter(|q| filter.matches(q))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        quotations.sort_by(|a, b| {
            (b.date, b.created_at).cmp(&(a.date, a.created_at))
        });
        Ok(quotations)
    }
}

impl Database<Select<By<Vec<Invoice>, read::invoice::list::Filter>>>
    for Memory
{
    type Ok = Vec<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Invoice>, read::invoice::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let mut invoices = self
            .read(|s| {
                s.invoices
                    .iter()
                    .filter(|i| filter.matches(i))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await;
        invoices.sort_by(|a, b| {
            (b.date, b.created_at).cmp(&(a.date, a.created_at))
        });
        Ok(invoices)
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Commit, Insert, Select, Transact},
        Currency, Money,
    };

    use crate::{
        domain::{client, invoice, Invoice},
        read,
    };

    use super::{Database as _, Memory};

    fn invoice(number: &str) -> Invoice {
        invoice::Draft {
            number: None,
            client_id: client::Id::new(),
            project_id: None,
            amount: Money::zero(Currency::Zar),
            date: "2025-03-01".parse::<common::Date>().unwrap().coerce(),
            due_date: "2025-03-31".parse::<common::Date>().unwrap().coerce(),
            status: invoice::Status::Draft,
            description: invoice::Description::new("Website").unwrap(),
            notes: None,
        }
        .into_invoice(number.parse().unwrap())
    }

    async fn select(db: &Memory, id: invoice::Id) -> Option<Invoice> {
        db.execute(Select(By::<Option<Invoice>, _>::new(id)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn publishes_staged_writes_on_commit() {
        let db = Memory::new();
        let inv = invoice("MZK-2025-001");

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(inv.clone())).await.unwrap();
        assert_eq!(select(&tx, inv.id).await, Some(inv.clone()));
        assert_eq!(select(&db, inv.id).await, None);

        tx.execute(Commit).await.unwrap();
        assert_eq!(select(&db, inv.id).await, Some(inv));
    }

    #[tokio::test]
    async fn rejects_commit_racing_on_number() {
        let db = Memory::new();
        let (first, second) = (invoice("MZK-2025-001"), invoice("MZK-2025-001"));

        let tx1 = db.execute(Transact).await.unwrap();
        let tx2 = db.execute(Transact).await.unwrap();
        tx1.execute(Insert(first.clone())).await.unwrap();
        tx2.execute(Insert(second.clone())).await.unwrap();
        tx1.execute(Commit).await.unwrap();

        let err = tx2.execute(Commit).await.unwrap_err();
        assert!(err
            .as_ref()
            .is_unique_violation(Some("invoices_number_key")));
        assert_eq!(select(&db, first.id).await, Some(first));
        assert_eq!(select(&db, second.id).await, None);
    }

    #[tokio::test]
    async fn lists_filtered_invoices_latest_first() {
        let db = Memory::new();
        let older = invoice("MZK-2025-001");
        let mut newer = invoice("MZK-2025-002");
        newer.date = "2025-04-01".parse::<common::Date>().unwrap().coerce();
        newer.client_id = older.client_id;
        let mut paid = invoice("MZK-2025-003");
        paid.status = invoice::Status::Paid;
        for i in [&older, &newer, &paid] {
            db.execute(Insert(i.clone())).await.unwrap();
        }

        let list = |filter: read::invoice::list::Filter| {
            db.execute(Select(By::<Vec<Invoice>, _>::new(filter)))
        };
        let ids = |l: Vec<Invoice>| {
            l.into_iter().map(|i| i.id).collect::<Vec<_>>()
        };

        let all = list(read::invoice::list::Filter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, newer.id);

        let drafts = list(read::invoice::list::Filter {
            status: Some(invoice::Status::Draft),
            client_id: None,
        })
        .await
        .unwrap();
        assert_eq!(ids(drafts), [newer.id, older.id]);

        let billed = list(read::invoice::list::Filter {
            status: Some(invoice::Status::Paid),
            client_id: Some(older.client_id),
        })
        .await
        .unwrap();
        assert!(billed.is_empty());
    }
}
