//! [`Handler`] seam and the storage operations expressed through it.
//!
//! Commands, queries and document stores all implement [`Handler`]: a store
//! handles [`Insert`], [`Update`] and [`Select`] of the documents it keeps,
//! while a transactional store also handles [`Transact`] and [`Commit`].

use std::{future::Future, marker::PhantomData};

/// Asynchronous handler of some `Args`.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Handles the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

/// Operation storing a new document, failing if its unique keys (like a
/// document number) collide with a stored one.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation overwriting a stored document.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Operation reading stored documents.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation starting a transaction, so that all the writes made through it
/// are stored at once on [`Commit`], or not at all.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Handler`] a [`Transact`] operation results in.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Operation committing a [`Transact`]ed transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of a `W`hat by a `B`y value, like a quotation by its ID or
/// invoices by their issue period.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type being selected.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] selector with the given value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Consumes this [`By`] selector and returns the value to select by.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}

#[cfg(test)]
mod spec {
    use std::{convert::Infallible, sync::Mutex};

    use super::{By, Handler, Insert, Select};

    /// Store of numbers, selectable by their parity.
    #[derive(Debug, Default)]
    struct Numbers(Mutex<Vec<u32>>);

    impl Handler<Insert<u32>> for Numbers {
        type Ok = ();
        type Err = u32;

        async fn execute(&self, Insert(n): Insert<u32>) -> Result<(), u32> {
            let mut numbers = self.0.lock().unwrap();
            if numbers.contains(&n) {
                return Err(n);
            }
            numbers.push(n);
            Ok(())
        }
    }

    impl Handler<Select<By<Vec<u32>, bool>>> for Numbers {
        type Ok = Vec<u32>;
        type Err = Infallible;

        async fn execute(
            &self,
            Select(by): Select<By<Vec<u32>, bool>>,
        ) -> Result<Vec<u32>, Infallible> {
            let even = by.into_inner();
            Ok(self
                .0
                .lock()
                .unwrap()
                .iter()
                .copied()
                .filter(|n| (n % 2 == 0) == even)
                .collect())
        }
    }

    #[tokio::test]
    async fn dispatches_by_operation() {
        let store = Numbers::default();
        for n in [1, 2, 4] {
            store.execute(Insert(n)).await.unwrap();
        }

        assert_eq!(store.execute(Insert(2)).await, Err(2));
        assert_eq!(
            store.execute(Select(By::<Vec<u32>, _>::new(true))).await,
            Ok(vec![2, 4]),
        );
    }
}
