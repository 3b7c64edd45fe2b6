//! [`Quotation`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Currency, Money,
};
use itertools::Itertools as _;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{document::Scope, quotation, LineItem, Quotation},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns a [`Quotation`] is selected with.
const COLUMNS: &str = "\
    id, number, client_id, project_id, \
    date, valid_until, \
    status, currency, discount, \
    notes, terms, invoice_id, \
    created_at";

/// Columns a [`LineItem`] is selected with.
const ITEM_COLUMNS: &str = "quotation_id, description, quantity, unit_price";

/// Reads a [`Quotation`] out of the provided [`Row`] of [`COLUMNS`] and the
/// [`Row`]s of its [`ITEM_COLUMNS`].
fn from_rows(row: &Row, items: &[Row]) -> Quotation {
    let currency: Currency = row.get("currency");
    Quotation {
        id: row.get("id"),
        number: row.get("number"),
        client_id: row.get("client_id"),
        project_id: row.get("project_id"),
        date: row.get("date"),
        valid_until: row.get("valid_until"),
        status: row.get("status"),
        currency,
        items: items
            .iter()
            .map(|item| {
                LineItem::new(
                    item.get("description"),
                    item.get("quantity"),
                    Money {
                        amount: item.get("unit_price"),
                        currency,
                    },
                )
                .expect("stored `LineItem` is valid")
            })
            .collect(),
        discount: row.get("discount"),
        notes: row.get("notes"),
        terms: row.get("terms"),
        invoice_id: row.get("invoice_id"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Quotation>, quotation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Quotation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Quotation>, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: quotation::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM quotations \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        let Some(row) = self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let items_sql = format!(
            "SELECT {ITEM_COLUMNS} \
             FROM quotation_items \
             WHERE quotation_id = $1::UUID \
             ORDER BY position",
        );
        let items = self
            .query(items_sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Some(from_rows(&row, &items)))
    }
}

impl<C> Database<Select<By<Vec<Quotation>, read::quotation::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Quotation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Quotation>, read::quotation::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::quotation::list::Filter { status } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM quotations \
             WHERE ($1::INT2 IS NULL OR status = $1::INT2) \
             ORDER BY date DESC, created_at DESC",
        );
        let rows = self
            .query(sql.as_str(), &[&status])
            .await
            .map_err(tracerr::wrap!())?;
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let ids = rows
            .iter()
            .map(|row| row.get::<_, quotation::Id>("id"))
            .collect::<Vec<_>>();
        let items_sql = format!(
            "SELECT {ITEM_COLUMNS} \
             FROM quotation_items \
             WHERE quotation_id = ANY($1::UUID[]) \
             ORDER BY quotation_id, position",
        );
        let mut items = self
            .query(items_sql.as_str(), &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .into_group_map_by(|row| {
                row.get::<_, quotation::Id>("quotation_id")
            });

        Ok(rows
            .iter()
            .zip(ids)
            .map(|(row, id)| {
                from_rows(row, &items.remove(&id).unwrap_or_default())
            })
            .collect())
    }
}

impl<C> Database<Select<By<read::quotation::Numbers, Scope>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::quotation::Numbers;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::quotation::Numbers, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `Prefix` consists of letters and digits only, so cannot contain
        // `LIKE` wildcards.
        let pattern = format!("{}-%", by.into_inner());

        const SQL: &str = "\
            SELECT number \
            FROM quotations \
            WHERE number LIKE $1::VARCHAR";
        Ok(self
            .query(SQL, &[&pattern])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get::<_, String>("number"))
            .collect::<Vec<_>>()
            .into())
    }
}

impl<C> Database<Insert<Quotation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(q): Insert<Quotation>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO quotations (\
                id, number, client_id, project_id, \
                date, valid_until, \
                status, currency, discount, \
                notes, terms, invoice_id, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, \
                $5::DATE, $6::DATE, \
                $7::INT2, $8::INT2, $9::NUMERIC, \
                $10::TEXT, $11::TEXT, $12::UUID, \
                $13::TIMESTAMPTZ \
            )";
        self.exec(
            SQL,
            &[
                &q.id,
                &q.number,
                &q.client_id,
                &q.project_id,
                &q.date,
                &q.valid_until,
                &q.status,
                &q.currency,
                &q.discount,
                &q.notes,
                &q.terms,
                &q.invoice_id,
                &q.created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

        insert_items(&**self, q.id, &q.items)
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Quotation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(q): Update<Quotation>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE quotations \
            SET number = $2::VARCHAR, \
                client_id = $3::UUID, \
                project_id = $4::UUID, \
                date = $5::DATE, \
                valid_until = $6::DATE, \
                status = $7::INT2, \
                currency = $8::INT2, \
                discount = $9::NUMERIC, \
                notes = $10::TEXT, \
                terms = $11::TEXT, \
                invoice_id = $12::UUID \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &q.id,
                &q.number,
                &q.client_id,
                &q.project_id,
                &q.date,
                &q.valid_until,
                &q.status,
                &q.currency,
                &q.discount,
                &q.notes,
                &q.terms,
                &q.invoice_id,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

        const DELETE_ITEMS_SQL: &str = "\
            DELETE FROM quotation_items \
            WHERE quotation_id = $1::UUID";
        self.exec(DELETE_ITEMS_SQL, &[&q.id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        insert_items(&**self, q.id, &q.items)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Stores the provided [`LineItem`]s of a [`Quotation`], preserving their
/// order.
async fn insert_items<C: Connection>(
    conn: &C,
    id: quotation::Id,
    items: &[LineItem],
) -> Result<(), Traced<database::Error>> {
    if items.is_empty() {
        return Ok(());
    }

    let (positions, descriptions, quantities, unit_prices, amounts): (
        Vec<i32>,
        Vec<&str>,
        Vec<Decimal>,
        Vec<Decimal>,
        Vec<Decimal>,
    ) = items
        .iter()
        .zip(1..)
        .map(|(i, position)| {
            (
                position,
                AsRef::<str>::as_ref(i.description()),
                i.quantity(),
                i.unit_price().amount,
                i.amount().amount,
            )
        })
        .multiunzip();

    const SQL: &str = "\
        INSERT INTO quotation_items (\
            quotation_id, position, description, \
            quantity, unit_price, amount \
        ) \
        SELECT $1::UUID, t.position, t.description, \
               t.quantity, t.unit_price, t.amount \
        FROM unnest(\
            $2::INT4[], $3::TEXT[], \
            $4::NUMERIC[], $5::NUMERIC[], $6::NUMERIC[] \
        ) AS t(position, description, quantity, unit_price, amount)";
    conn.exec(
        SQL,
        &[
            &id,
            &positions,
            &descriptions,
            &quantities,
            &unit_prices,
            &amounts,
        ],
    )
    .await
    .map_err(tracerr::wrap!())
    .map(drop)
}
