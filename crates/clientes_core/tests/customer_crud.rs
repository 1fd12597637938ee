use clientes_core::db::open_db_in_memory;
use clientes_core::{
    new_customer_id, Customer, CustomerKey, CustomerRepository, RepoError,
    SqliteCustomerRepository,
};
use rusqlite::params;
use std::collections::HashSet;

fn customer(name: &str, cpf: &str, email: &str) -> Customer {
    Customer::new(new_customer_id(), name, cpf, email, true).unwrap()
}

#[test]
fn create_and_get_by_every_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    let fulano = customer("Fulano", "12312312312", "fulano@email.com");
    repo.create(&fulano).unwrap();

    assert_eq!(repo.get_by_id(fulano.id()).unwrap(), fulano);
    assert_eq!(repo.get_by_cpf("12312312312").unwrap(), fulano);
    assert_eq!(repo.get_by_email("fulano@email.com").unwrap(), fulano);
}

#[test]
fn lookups_miss_with_not_found_naming_the_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);
    let missing_id = new_customer_id();

    let err = repo.get_by_id(missing_id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(CustomerKey::Id(id)) if id == missing_id));

    let err = repo.get_by_cpf("99999999999").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(CustomerKey::Cpf(ref cpf)) if cpf == "99999999999"));

    let err = repo.get_by_email("nobody@email.com").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn email_lookup_is_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);
    repo.create(&customer("Fulano", "12312312312", "fulano@email.com"))
        .unwrap();

    let err = repo.get_by_email("FULANO@email.com").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn list_returns_empty_collection_for_empty_store() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    assert!(repo.list().unwrap().is_empty());
}

#[test]
fn list_returns_every_customer() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    let first = customer("Fulano", "11111111111", "fulano@email.com");
    let second = customer("Ciclano", "22222222222", "ciclano@email.com");
    repo.create(&first).unwrap();
    repo.create(&second).unwrap();

    let ids: HashSet<_> = repo.list().unwrap().iter().map(Customer::id).collect();
    assert_eq!(ids, HashSet::from([first.id(), second.id()]));
}

#[test]
fn storage_rejects_duplicate_id_cpf_and_email() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    let fulano = customer("Fulano", "12312312312", "fulano@email.com");
    repo.create(&fulano).unwrap();

    let same_id = Customer::new(
        fulano.id(),
        "Beltrano",
        "33333333333",
        "beltrano@email.com",
        true,
    )
    .unwrap();
    let err = repo.create(&same_id).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExistsForId(id) if id == fulano.id()));

    let same_cpf = customer("Beltrano", "12312312312", "beltrano@email.com");
    let err = repo.create(&same_cpf).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExistsForCpf(_)));

    let same_email = customer("Beltrano", "33333333333", "fulano@email.com");
    let err = repo.create(&same_email).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExistsForEmail(_)));

    assert_eq!(repo.list().unwrap().len(), 1);
}

#[test]
fn update_replaces_all_mutable_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    let original = customer("Fulano", "12312312312", "fulano@email.com");
    repo.create(&original).unwrap();

    let changed = Customer::new(
        original.id(),
        "Fulano de Tal",
        "45645645645",
        "tal@email.com",
        false,
    )
    .unwrap();
    repo.update(&changed).unwrap();

    assert_eq!(repo.get_by_id(original.id()).unwrap(), changed);
    assert!(repo.get_by_cpf("12312312312").unwrap_err().is_not_found());
}

#[test]
fn update_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    let ghost = customer("Fantasma", "12312312312", "ghost@email.com");
    let err = repo.update(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(CustomerKey::Id(id)) if id == ghost.id()));
}

#[test]
fn update_into_another_customers_email_hits_storage_constraint() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    let fulano = customer("Fulano", "11111111111", "fulano@email.com");
    let ciclano = customer("Ciclano", "22222222222", "ciclano@email.com");
    repo.create(&fulano).unwrap();
    repo.create(&ciclano).unwrap();

    let colliding = Customer::new(
        ciclano.id(),
        "Ciclano",
        "22222222222",
        "fulano@email.com",
        true,
    )
    .unwrap();
    let err = repo.update(&colliding).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyExistsForEmail(_)));
}

#[test]
fn remove_deletes_row_and_second_remove_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    let fulano = customer("Fulano", "12312312312", "fulano@email.com");
    repo.create(&fulano).unwrap();

    repo.remove(fulano.id()).unwrap();
    assert!(repo.get_by_id(fulano.id()).unwrap_err().is_not_found());

    let err = repo.remove(fulano.id()).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(CustomerKey::Id(_))));
}

#[test]
fn removed_cpf_and_email_can_be_reused() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    let fulano = customer("Fulano", "12312312312", "fulano@email.com");
    repo.create(&fulano).unwrap();
    repo.remove(fulano.id()).unwrap();

    let again = customer("Fulano", "12312312312", "fulano@email.com");
    repo.create(&again).unwrap();
    assert_eq!(repo.get_by_cpf("12312312312").unwrap().id(), again.id());
}

#[test]
fn corrupt_rows_are_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::new(&conn);

    conn.execute(
        "INSERT INTO customers (id, name, cpf, email, active) VALUES (?1, ?2, ?3, ?4, ?5);",
        params!["not-a-uuid", "Fulano", "12312312312", "fulano@email.com", 1],
    )
    .unwrap();
    let err = repo.get_by_cpf("12312312312").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));

    let id = new_customer_id();
    conn.execute(
        "INSERT INTO customers (id, name, cpf, email, active) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![id.to_string(), "Ana", "45645645645", "ana@email.com", 1],
    )
    .unwrap();
    let err = repo.get_by_id(id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(ref message) if message.contains("name")));

    assert!(matches!(repo.list().unwrap_err(), RepoError::InvalidData(_)));
}
