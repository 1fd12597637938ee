//! Command-line front end for the customer core.
//!
//! # Responsibility
//! - Wire configuration, logging, SQLite storage and the customer service.
//! - Map use-case results to JSON on stdout and errors to exit codes.
//!
//! # Invariants
//! - Business rules live in `clientes_core`; this binary only translates.
//! - Exit codes: 0 ok, 1 other failure, 2 not found, 3 conflict, 4 invalid input.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use clientes_core::db::{open_db, open_db_in_memory};
use clientes_core::{
    default_log_level, init_logging, parse_customer_id, Customer, CustomerId, CustomerService,
    CustomerServiceError, CustomerUseCase, CustomerValidationError, SqliteCustomerRepository,
};
use log::info;
use rusqlite::Connection;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Parser)]
#[command(name = "clientes", version, about = "Manage customer records")]
struct Cli {
    /// SQLite database file, or `:memory:` for an ephemeral store.
    #[arg(long, env = "CLIENTES_DB", default_value = "clientes.sqlite3")]
    db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "CLIENTES_LOG_LEVEL", default_value = default_log_level())]
    log_level: String,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "CLIENTES_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new customer and print its id.
    Create(CustomerFields),
    /// Print every customer.
    List,
    /// Print one customer by id, cpf or email.
    Get(Lookup),
    /// Replace name, cpf, email and active flag of an existing customer.
    Update {
        #[arg(long, value_parser = parse_id)]
        id: CustomerId,
        #[command(flatten)]
        fields: CustomerFields,
        /// Store the customer as inactive.
        #[arg(long)]
        inactive: bool,
    },
    /// Delete a customer by id.
    Remove {
        #[arg(long, value_parser = parse_id)]
        id: CustomerId,
    },
    /// Check that the core library is linked.
    Ping,
}

#[derive(Debug, Args)]
struct CustomerFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    cpf: String,
    #[arg(long)]
    email: String,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Lookup {
    #[arg(long, value_parser = parse_id)]
    id: Option<CustomerId>,
    #[arg(long)]
    cpf: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir).context("initializing logging")?;
    }

    if let Command::Ping = cli.command {
        println!(
            "clientes_core ping={} version={}",
            clientes_core::ping(),
            clientes_core::core_version()
        );
        return Ok(());
    }

    let conn = open_connection(&cli.db)?;
    let service = CustomerService::new(SqliteCustomerRepository::new(&conn));
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );
    execute(&service, cli.command)
}

fn open_connection(db: &Path) -> anyhow::Result<Connection> {
    let conn = if db.as_os_str() == IN_MEMORY_DB {
        open_db_in_memory()
    } else {
        open_db(db)
    };
    conn.with_context(|| format!("opening database `{}`", db.display()))
}

fn execute(use_case: &impl CustomerUseCase, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Create(fields) => {
            let candidate = Customer::new(
                CustomerId::nil(),
                fields.name,
                fields.cpf,
                fields.email,
                true,
            )?;
            let id = use_case.create(&candidate)?;
            print_json(&json!({ "id": id }))
        }
        Command::List => print_json(&use_case.list()?),
        Command::Get(lookup) => {
            let customer = match (lookup.id, lookup.cpf, lookup.email) {
                (Some(id), _, _) => use_case.get_by_id(id)?,
                (_, Some(cpf), _) => use_case.get_by_cpf(&cpf)?,
                (_, _, Some(email)) => use_case.get_by_email(&email)?,
                (None, None, None) => anyhow::bail!("one of --id, --cpf or --email is required"),
            };
            print_json(&customer)
        }
        Command::Update {
            id,
            fields,
            inactive,
        } => {
            let customer = Customer::new(id, fields.name, fields.cpf, fields.email, !inactive)?;
            use_case.update(&customer)?;
            print_json(&customer)
        }
        Command::Remove { id } => {
            use_case.remove(id)?;
            print_json(&json!({ "id": id, "removed": true }))
        }
        Command::Ping => Ok(()),
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_id(value: &str) -> Result<CustomerId, String> {
    parse_customer_id(value).map_err(|err| err.to_string())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Create(_) => "create",
        Command::List => "list",
        Command::Get(_) => "get",
        Command::Update { .. } => "update",
        Command::Remove { .. } => "remove",
        Command::Ping => "ping",
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(service_err) = err.downcast_ref::<CustomerServiceError>() {
        return match service_err {
            CustomerServiceError::NotFound(_) => 2,
            err if err.is_conflict() => 3,
            CustomerServiceError::Validation(_) => 4,
            _ => 1,
        };
    }
    if err.downcast_ref::<CustomerValidationError>().is_some() {
        return 4;
    }
    1
}

#[cfg(test)]
mod tests {
    use super::{execute, exit_code_for, Cli, Command, CustomerFields};
    use clap::Parser;
    use clientes_core::db::open_db_in_memory;
    use clientes_core::{CustomerService, CustomerUseCase, SqliteCustomerRepository};

    fn fields(name: &str, cpf: &str, email: &str) -> CustomerFields {
        CustomerFields {
            name: name.to_string(),
            cpf: cpf.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn parses_get_with_exactly_one_key() {
        let cli = Cli::try_parse_from(["clientes", "--db", ":memory:", "get", "--cpf", "123"])
            .unwrap();
        assert!(matches!(cli.command, Command::Get(ref lookup) if lookup.cpf.as_deref() == Some("123")));

        assert!(Cli::try_parse_from(["clientes", "get"]).is_err());
        assert!(Cli::try_parse_from(["clientes", "get", "--cpf", "1", "--email", "a@b.c"]).is_err());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(Cli::try_parse_from(["clientes", "remove", "--id", "not-a-uuid"]).is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let conn = open_db_in_memory().unwrap();
        let service = CustomerService::new(SqliteCustomerRepository::new(&conn));

        let create = || Command::Create(fields("Fulano", "12312312312", "fulano@email.com"));
        execute(&service, create()).unwrap();
        let conflict = execute(&service, create()).unwrap_err();
        assert_eq!(exit_code_for(&conflict), 3);

        let invalid = execute(&service, Command::Create(fields("Ana", "1", "x"))).unwrap_err();
        assert_eq!(exit_code_for(&invalid), 4);

        let id = service.list().unwrap()[0].id();
        execute(&service, Command::Remove { id }).unwrap();
        let missing = execute(&service, Command::Remove { id }).unwrap_err();
        assert_eq!(exit_code_for(&missing), 2);
    }
}
