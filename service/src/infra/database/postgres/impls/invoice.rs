//! [`Invoice`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{document::Scope, invoice, quotation, Invoice},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns an [`Invoice`] is selected with.
const COLUMNS: &str = "\
    id, number, client_id, project_id, quotation_id, \
    amount, amount_currency, \
    date, due_date, paid_date, \
    status, description, notes, \
    created_at";

/// Reads an [`Invoice`] out of the provided [`Row`] of [`COLUMNS`].
fn from_row(row: &Row) -> Invoice {
    Invoice {
        id: row.get("id"),
        number: row.get("number"),
        client_id: row.get("client_id"),
        project_id: row.get("project_id"),
        quotation_id: row.get("quotation_id"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("amount_currency"),
        },
        date: row.get("date"),
        due_date: row.get("due_date"),
        paid_date: row.get("paid_date"),
        status: row.get("status"),
        description: row.get("description"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Invoice>, invoice::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Invoice>, invoice::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: invoice::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM invoices \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Invoice>, quotation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Invoice>, quotation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: quotation::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM invoices \
             WHERE quotation_id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Invoice>, read::invoice::Issued>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Invoice>, read::invoice::Issued>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::invoice::Issued { since, until } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM invoices \
             WHERE ($1::DATE IS NULL OR date >= $1::DATE) \
               AND ($2::DATE IS NULL OR date <= $2::DATE) \
             ORDER BY date, created_at",
        );
        Ok(self
            .query(sql.as_str(), &[&since, &until])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Invoice>, read::invoice::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Invoice>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Invoice>, read::invoice::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::invoice::list::Filter { status, client_id } =
            by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM invoices \
             WHERE ($1::INT2 IS NULL OR status = $1::INT2) \
               AND ($2::UUID IS NULL OR client_id = $2::UUID) \
             ORDER BY date DESC, created_at DESC",
        );
        Ok(self
            .query(sql.as_str(), &[&status, &client_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<read::invoice::Numbers, Scope>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = read::invoice::Numbers;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::invoice::Numbers, Scope>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `Prefix` consists of letters and digits only, so cannot contain
        // `LIKE` wildcards.
        let pattern = format!("{}-%", by.into_inner());

        const SQL: &str = "\
            SELECT number \
            FROM invoices \
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

impl<C> Database<Insert<Invoice>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(i): Insert<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO invoices (\
                id, number, client_id, project_id, quotation_id, \
                amount, amount_currency, \
                date, due_date, paid_date, \
                status, description, notes, \
                created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::UUID, $4::UUID, $5::UUID, \
                $6::NUMERIC, $7::INT2, \
                $8::DATE, $9::DATE, $10::DATE, \
                $11::INT2, $12::TEXT, $13::TEXT, \
                $14::TIMESTAMPTZ \
            )";
        self.exec(
            SQL,
            &[
                &i.id,
                &i.number,
                &i.client_id,
                &i.project_id,
                &i.quotation_id,
                &i.amount.amount,
                &i.amount.currency,
                &i.date,
                &i.due_date,
                &i.paid_date,
                &i.status,
                &i.description,
                &i.notes,
                &i.created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Invoice>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(i): Update<Invoice>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE invoices \
            SET number = $2::VARCHAR, \
                client_id = $3::UUID, \
                project_id = $4::UUID, \
                quotation_id = $5::UUID, \
                amount = $6::NUMERIC, \
                amount_currency = $7::INT2, \
                date = $8::DATE, \
                due_date = $9::DATE, \
                paid_date = $10::DATE, \
                status = $11::INT2, \
                description = $12::TEXT, \
                notes = $13::TEXT \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &i.id,
                &i.number,
                &i.client_id,
                &i.project_id,
                &i.quotation_id,
                &i.amount.amount,
                &i.amount.currency,
                &i.date,
                &i.due_date,
                &i.paid_date,
                &i.status,
                &i.description,
                &i.notes,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
