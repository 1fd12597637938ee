//! Customer repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and key lookups over the canonical `customers` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Customer::validate()` before SQL mutations.
//! - Lookup, update and remove misses are reported as `NotFound`.
//! - Storage-level uniqueness violations are reported with the same
//!   `AlreadyExistsFor*` variants the service uses for its own checks.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::customer::{Customer, CustomerId, CustomerValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    name,
    cpf,
    email,
    active
FROM customers";

pub type RepoResult<T> = Result<T, RepoError>;

/// Lookup key that identified a missing customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerKey {
    Id(CustomerId),
    Cpf(String),
    Email(String),
}

impl Display for CustomerKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Cpf(_) => write!(f, "cpf"),
            Self::Email(_) => write!(f, "email"),
        }
    }
}

/// Repository error for customer persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// No customer matches the given key.
    NotFound(CustomerKey),
    /// A customer with this id is already stored.
    AlreadyExistsForId(CustomerId),
    /// A customer with this cpf is already stored.
    AlreadyExistsForCpf(String),
    /// A customer with this email is already stored.
    AlreadyExistsForEmail(String),
    Validation(CustomerValidationError),
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "customer not found for {key}"),
            Self::AlreadyExistsForId(id) => {
                write!(f, "customer with the provided id already exists: {id}")
            }
            Self::AlreadyExistsForCpf(_) => {
                write!(f, "customer with the provided cpf already exists")
            }
            Self::AlreadyExistsForEmail(_) => {
                write!(f, "customer with the provided email already exists")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted customer data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CustomerValidationError> for RepoError {
    fn from(value: CustomerValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage capability consumed by the customer service.
///
/// Any backend can be substituted as long as lookup, update and remove misses
/// surface as [`RepoError::NotFound`].
pub trait CustomerRepository {
    fn create(&self, customer: &Customer) -> RepoResult<()>;
    fn list(&self) -> RepoResult<Vec<Customer>>;
    fn get_by_id(&self, id: CustomerId) -> RepoResult<Customer>;
    fn get_by_cpf(&self, cpf: &str) -> RepoResult<Customer>;
    fn get_by_email(&self, email: &str) -> RepoResult<Customer>;
    fn update(&self, customer: &Customer) -> RepoResult<()>;
    fn remove(&self, id: CustomerId) -> RepoResult<()>;
}

impl<R: CustomerRepository + ?Sized> CustomerRepository for &R {
    fn create(&self, customer: &Customer) -> RepoResult<()> {
        (**self).create(customer)
    }

    fn list(&self) -> RepoResult<Vec<Customer>> {
        (**self).list()
    }

    fn get_by_id(&self, id: CustomerId) -> RepoResult<Customer> {
        (**self).get_by_id(id)
    }

    fn get_by_cpf(&self, cpf: &str) -> RepoResult<Customer> {
        (**self).get_by_cpf(cpf)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Customer> {
        (**self).get_by_email(email)
    }

    fn update(&self, customer: &Customer) -> RepoResult<()> {
        (**self).update(customer)
    }

    fn remove(&self, id: CustomerId) -> RepoResult<()> {
        (**self).remove(id)
    }
}

/// SQLite-backed customer repository.
pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    /// Wraps a connection returned by `db::open_db*` (migrations applied).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn get_one(&self, column: &str, value: &str, key: CustomerKey) -> RepoResult<Customer> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE {column} = ?1;"))?;

        let raw = stmt
            .query_row([value], read_raw_row)
            .optional()?
            .ok_or(RepoError::NotFound(key))?;
        raw.into_customer()
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn create(&self, customer: &Customer) -> RepoResult<()> {
        customer.validate()?;

        self.conn
            .execute(
                "INSERT INTO customers (
                    id,
                    name,
                    cpf,
                    email,
                    active
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    customer.id().to_string(),
                    customer.name(),
                    customer.cpf(),
                    customer.email(),
                    bool_to_int(customer.active()),
                ],
            )
            .map_err(|err| map_write_error(err, customer))?;

        Ok(())
    }

    fn list(&self) -> RepoResult<Vec<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut customers = Vec::new();

        while let Some(row) = rows.next()? {
            customers.push(read_raw_row(row)?.into_customer()?);
        }

        Ok(customers)
    }

    fn get_by_id(&self, id: CustomerId) -> RepoResult<Customer> {
        self.get_one("id", &id.to_string(), CustomerKey::Id(id))
    }

    fn get_by_cpf(&self, cpf: &str) -> RepoResult<Customer> {
        self.get_one("cpf", cpf, CustomerKey::Cpf(cpf.to_string()))
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Customer> {
        self.get_one("email", email, CustomerKey::Email(email.to_string()))
    }

    fn update(&self, customer: &Customer) -> RepoResult<()> {
        customer.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE customers
                 SET
                    name = ?1,
                    cpf = ?2,
                    email = ?3,
                    active = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?5;",
                params![
                    customer.name(),
                    customer.cpf(),
                    customer.email(),
                    bool_to_int(customer.active()),
                    customer.id().to_string(),
                ],
            )
            .map_err(|err| map_write_error(err, customer))?;

        if changed == 0 {
            return Err(RepoError::NotFound(CustomerKey::Id(customer.id())));
        }

        Ok(())
    }

    fn remove(&self, id: CustomerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM customers WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(CustomerKey::Id(id)));
        }

        Ok(())
    }
}

/// Row values as stored, before domain validation.
struct RawCustomerRow {
    id: String,
    name: String,
    cpf: String,
    email: String,
    active: i64,
}

impl RawCustomerRow {
    fn into_customer(self) -> RepoResult<Customer> {
        let id = Uuid::parse_str(&self.id).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{}` in customers.id", self.id))
        })?;

        let active = match self.active {
            0 => false,
            1 => true,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid active value `{other}` in customers.active"
                )));
            }
        };

        Customer::new(id, self.name, self.cpf, self.email, active).map_err(|err| {
            RepoError::InvalidData(format!("customer {id} fails validation: {err}"))
        })
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawCustomerRow> {
    Ok(RawCustomerRow {
        id: row.get("id")?,
        name: row.get("name")?,
        cpf: row.get("cpf")?,
        email: row.get("email")?,
        active: row.get("active")?,
    })
}

fn map_write_error(err: rusqlite::Error, customer: &Customer) -> RepoError {
    let err = DbError::from(err);
    let conflict = match err.unique_violation() {
        Some("customers.id") => Some(RepoError::AlreadyExistsForId(customer.id())),
        Some("customers.cpf") => Some(RepoError::AlreadyExistsForCpf(customer.cpf().to_string())),
        Some("customers.email") => Some(RepoError::AlreadyExistsForEmail(
            customer.email().to_string(),
        )),
        _ => None,
    };
    conflict.unwrap_or_else(|| RepoError::Db(err))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
