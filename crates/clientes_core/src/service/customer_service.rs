//! Customer use-case service.
//!
//! # Responsibility
//! - Enforce cross-record invariants (cpf/email uniqueness) on create.
//! - Re-validate entities on update and delegate persistence to a
//!   `CustomerRepository`.
//!
//! # Invariants
//! - The service holds no state besides the repository; storage is the
//!   single source of truth and nothing is cached.
//! - Create checks cpf before email; on a double collision the cpf
//!   conflict is reported.
//! - Collaborator errors are forwarded, never retried or compensated. The
//!   only swallowed error is `NotFound` during create's uniqueness checks.
//! - Update does not check uniqueness against other records.

use crate::model::customer::{new_customer_id, Customer, CustomerId, CustomerValidationError};
use crate::repo::customer_repo::{CustomerKey, CustomerRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, CustomerServiceError>;

/// Service error for customer use-cases.
#[derive(Debug)]
pub enum CustomerServiceError {
    /// Entity-level field rule violation.
    Validation(CustomerValidationError),
    AlreadyExistsForId(CustomerId),
    AlreadyExistsForCpf(String),
    AlreadyExistsForEmail(String),
    /// Referenced customer does not exist.
    NotFound(CustomerKey),
    /// Opaque storage failure.
    Repo(RepoError),
}

impl CustomerServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExistsForId(_) | Self::AlreadyExistsForCpf(_) | Self::AlreadyExistsForEmail(_)
        )
    }
}

impl Display for CustomerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AlreadyExistsForId(_) => {
                write!(f, "customer with the provided id already exists")
            }
            Self::AlreadyExistsForCpf(_) => {
                write!(f, "customer with the provided cpf already exists")
            }
            Self::AlreadyExistsForEmail(_) => {
                write!(f, "customer with the provided email already exists")
            }
            Self::NotFound(key) => write!(f, "customer not found for {key}"),
            Self::Repo(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for CustomerServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CustomerValidationError> for CustomerServiceError {
    fn from(value: CustomerValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CustomerServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(key) => Self::NotFound(key),
            RepoError::AlreadyExistsForId(id) => Self::AlreadyExistsForId(id),
            RepoError::AlreadyExistsForCpf(cpf) => Self::AlreadyExistsForCpf(cpf),
            RepoError::AlreadyExistsForEmail(email) => Self::AlreadyExistsForEmail(email),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Use-case contract exposed to transport layers.
pub trait CustomerUseCase {
    /// Registers a new customer and returns its generated id.
    fn create(&self, candidate: &Customer) -> ServiceResult<CustomerId>;
    fn list(&self) -> ServiceResult<Vec<Customer>>;
    fn get_by_id(&self, id: CustomerId) -> ServiceResult<Customer>;
    fn get_by_cpf(&self, cpf: &str) -> ServiceResult<Customer>;
    fn get_by_email(&self, email: &str) -> ServiceResult<Customer>;
    /// Replaces name/cpf/email/active of the customer with the same id.
    fn update(&self, customer: &Customer) -> ServiceResult<()>;
    fn remove(&self, id: CustomerId) -> ServiceResult<()>;
}

/// Customer service over a repository implementation.
pub struct CustomerService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> CustomerService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns `Ok(true)` when `lookup` found a record, `Ok(false)` on
    /// `NotFound`, and forwards any other storage error.
    fn exists(lookup: Result<Customer, RepoError>) -> ServiceResult<bool> {
        match lookup {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl<R: CustomerRepository> CustomerUseCase for CustomerService<R> {
    /// # Contract
    /// - Fails with `AlreadyExistsForCpf` / `AlreadyExistsForEmail` (in this
    ///   order) when another record holds the same value.
    /// - The stored record gets a fresh id and `active = true` regardless of
    ///   the candidate's id and flag.
    fn create(&self, candidate: &Customer) -> ServiceResult<CustomerId> {
        if Self::exists(self.repo.get_by_cpf(candidate.cpf()))? {
            warn!("event=customer_create module=service status=conflict reason=cpf");
            return Err(CustomerServiceError::AlreadyExistsForCpf(
                candidate.cpf().to_string(),
            ));
        }

        if Self::exists(self.repo.get_by_email(candidate.email()))? {
            warn!("event=customer_create module=service status=conflict reason=email");
            return Err(CustomerServiceError::AlreadyExistsForEmail(
                candidate.email().to_string(),
            ));
        }

        let id = new_customer_id();
        let customer = Customer::new(
            id,
            candidate.name(),
            candidate.cpf(),
            candidate.email(),
            true,
        )?;
        self.repo.create(&customer)?;

        info!("event=customer_create module=service status=ok customer_id={id}");
        Ok(id)
    }

    fn list(&self) -> ServiceResult<Vec<Customer>> {
        Ok(self.repo.list()?)
    }

    fn get_by_id(&self, id: CustomerId) -> ServiceResult<Customer> {
        Ok(self.repo.get_by_id(id)?)
    }

    fn get_by_cpf(&self, cpf: &str) -> ServiceResult<Customer> {
        Ok(self.repo.get_by_cpf(cpf)?)
    }

    fn get_by_email(&self, email: &str) -> ServiceResult<Customer> {
        Ok(self.repo.get_by_email(email)?)
    }

    fn update(&self, customer: &Customer) -> ServiceResult<()> {
        customer.validate()?;
        self.repo.update(customer)?;

        info!(
            "event=customer_update module=service status=ok customer_id={}",
            customer.id()
        );
        Ok(())
    }

    fn remove(&self, id: CustomerId) -> ServiceResult<()> {
        self.repo.remove(id)?;

        info!("event=customer_remove module=service status=ok customer_id={id}");
        Ok(())
    }
}
