use serde::{Serialize, de::DeserializeOwned};
use sqlx::{
    Encode, FromRow, Postgres, QueryBuilder, Type,
    postgres::PgRow,
};

use crate::validation::Validate;

/// Audit columns present on every entity table, appended to each select list.
pub const AUDIT_COLUMNS: &str = "INSERTDATE, UPDATEDATE, INSERTUSER, UPDATEUSER";

/// Resource
///
/// Describes one audited entity table: its row type, its create/update payloads,
/// and how those payloads bind onto INSERT and UPDATE statements.
///
/// The repository uses this description to run the same transactional
/// write-with-audit sequence for every table, so a new entity only has to
/// declare its columns.
pub trait Resource:
    for<'r> FromRow<'r, PgRow> + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static
{
    type Create: Validate + DeserializeOwned + Serialize + Send + Sync + 'static;
    type Update: Validate + DeserializeOwned + Serialize + Send + Sync + 'static;

    /// Table name, also recorded as the audit log's `tableName`.
    const TABLE: &'static str;
    /// Human label used in client-facing messages ("Merchant not found").
    const LABEL: &'static str;
    /// Select list (without the audit columns).
    const COLUMNS: &'static str;
    /// Columns populated by `bind_insert`, in bind order.
    const INSERT_COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;

    /// Pushes one bind per entry of `INSERT_COLUMNS`, in the same order.
    fn bind_insert<'a>(input: &'a Self::Create, values: &mut Values<'_, 'a>);

    /// Assigns only the fields present in the payload. `actor` is the acting
    /// user's name, for tables that stamp it on specific transitions.
    fn assign_update<'a>(input: &'a Self::Update, actor: &'a str, set: &mut Assignments<'_, 'a>);

    /// Maps a violated unique constraint to a field-specific client message.
    fn conflict_message(_constraint: &str) -> Option<&'static str> {
        None
    }

    /// Order of list responses.
    fn order_by() -> &'static str {
        "ID DESC"
    }
}

/// Full select list: the resource columns followed by the audit columns.
pub fn select_list<R: Resource>() -> String {
    format!("{}, {}", R::COLUMNS, AUDIT_COLUMNS)
}

/// Values
///
/// Comma-separated bind list inside `VALUES (...)`.
pub struct Values<'q, 'args> {
    builder: &'q mut QueryBuilder<'args, Postgres>,
    count: usize,
}

impl<'q, 'args> Values<'q, 'args> {
    pub fn new(builder: &'q mut QueryBuilder<'args, Postgres>) -> Self {
        Self { builder, count: 0 }
    }

    pub fn bind<T>(&mut self, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if self.count > 0 {
            self.builder.push(", ");
        }
        self.builder.push_bind(value);
        self.count += 1;
        self
    }
}

/// Assignments
///
/// Comma-separated `COLUMN = $n` list of an UPDATE's SET clause. `None`
/// values are skipped, which is how partial updates leave columns untouched.
/// A nullable column is cleared by passing `Some(None)`.
pub struct Assignments<'q, 'args> {
    builder: &'q mut QueryBuilder<'args, Postgres>,
    count: usize,
}

impl<'q, 'args> Assignments<'q, 'args> {
    pub fn new(builder: &'q mut QueryBuilder<'args, Postgres>) -> Self {
        Self { builder, count: 0 }
    }

    pub fn set<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.separator();
            self.builder.push(column).push(" = ").push_bind(value);
        }
        self
    }

    /// Assigns a raw SQL expression, e.g. `NOW()`.
    pub fn set_expr(&mut self, column: &'static str, expr: &'static str) -> &mut Self {
        self.separator();
        self.builder.push(column).push(" = ").push(expr);
        self
    }

    fn separator(&mut self) {
        if self.count > 0 {
            self.builder.push(", ");
        }
        self.count += 1;
    }
}

/// Borrows a nullable text field of an update payload: `None` leaves the column
/// alone, `Some(None)` writes NULL.
pub fn nullable(value: &Option<Option<String>>) -> Option<Option<&str>> {
    value.as_ref().map(Option::as_deref)
}

/// Builds `INSERT INTO <table> (...) VALUES (...) RETURNING <select list>`,
/// stamping both `INSERTUSER` and `UPDATEUSER` with the actor.
pub fn insert_statement<'a, R: Resource>(
    input: &'a R::Create,
    actor: &'a str,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("INSERT INTO {} (", R::TABLE));
    builder.push(R::INSERT_COLUMNS.join(", "));
    builder.push(", INSERTUSER, UPDATEUSER) VALUES (");
    {
        let mut values = Values::new(&mut builder);
        R::bind_insert(input, &mut values);
        values.bind(actor).bind(actor);
    }
    builder.push(") RETURNING ");
    builder.push(select_list::<R>());
    builder
}

/// Builds a partial `UPDATE ... SET ... WHERE ID = $n RETURNING <select list>`.
/// `UPDATEUSER` and `UPDATEDATE` are always assigned, so the SET clause is never empty.
pub fn update_statement<'a, R: Resource>(
    id: i64,
    input: &'a R::Update,
    actor: &'a str,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", R::TABLE));
    {
        let mut set = Assignments::new(&mut builder);
        R::assign_update(input, actor, &mut set);
        set.set("UPDATEUSER", Some(actor));
        set.set_expr("UPDATEDATE", "NOW()");
    }
    builder.push(" WHERE ID = ");
    builder.push_bind(id);
    builder.push(" RETURNING ");
    builder.push(select_list::<R>());
    builder
}

/// `SELECT ... WHERE ID = $1 FOR UPDATE`, used to read the prior row inside a write transaction.
pub fn select_for_update_sql<R: Resource>() -> String {
    format!(
        "SELECT {} FROM {} WHERE ID = $1 FOR UPDATE",
        select_list::<R>(),
        R::TABLE
    )
}

pub fn select_by_id_sql<R: Resource>() -> String {
    format!("SELECT {} FROM {} WHERE ID = $1", select_list::<R>(), R::TABLE)
}

pub fn select_all_sql<R: Resource>() -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {}",
        select_list::<R>(),
        R::TABLE,
        R::order_by()
    )
}

/// The lowest-`ID` row, the active configuration of a single-configuration table.
pub fn select_first_sql<R: Resource>() -> String {
    format!(
        "SELECT {} FROM {} ORDER BY ID LIMIT 1",
        select_list::<R>(),
        R::TABLE
    )
}

pub fn delete_sql<R: Resource>() -> String {
    format!("DELETE FROM {} WHERE ID = $1", R::TABLE)
}
