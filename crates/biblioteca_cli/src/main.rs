//! `biblioteca` command-line entry point.
//!
//! # Responsibility
//! - Turn flags into core calls: open the store, build the auth context,
//!   invoke one operation.
//! - Print results as JSON on stdout and failures on stderr.

mod args;

use args::{BookCommand, Cli, Command, LoanCommand, LoanStateArg, PageArgs, ReaderCommand};
use biblioteca_core::db::open_db;
use biblioteca_core::{
    default_log_level, init_logging, AuthContext, BookChanges, BookFilter, BookService,
    LoanFilter, LoanService, LoanState, NewBook, NewReader, PageRequest,
    ReaderChanges, ReaderService, SqliteBookRepository, SqliteLoanRepository,
    SqliteReaderRepository,
};
use clap::Parser;
use log::error;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_ref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run(&cli) {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{text}"),
                Err(err) => {
                    eprintln!("error: {err}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> CliResult<Value> {
    let conn = open_db(&cli.db)?;
    let auth = AuthContext::user(cli.user.as_deref().unwrap_or_default());

    match &cli.command {
        Command::Book(command) => run_book(&conn, &auth, command),
        Command::Reader(command) => run_reader(&conn, &auth, command),
        Command::Loan(command) => run_loan(&conn, &auth, command),
        Command::Summary => {
            let service = LoanService::new(SqliteLoanRepository::try_new(&conn)?);
            Ok(serde_json::to_value(service.summary(&auth)?)?)
        }
    }
}

fn run_book(conn: &Connection, auth: &AuthContext, command: &BookCommand) -> CliResult<Value> {
    let service = BookService::new(SqliteBookRepository::try_new(conn)?);
    let value = match command {
        BookCommand::Add {
            title,
            author,
            year,
        } => serde_json::to_value(service.create_book(
            auth,
            NewBook {
                title: title.clone(),
                author: author.clone(),
                publication_year: *year,
            },
        )?)?,
        BookCommand::Get { id } => serde_json::to_value(service.get_book(auth, *id)?)?,
        BookCommand::Update {
            id,
            title,
            author,
            year,
        } => serde_json::to_value(service.update_book(
            auth,
            *id,
            BookChanges {
                title: title.clone(),
                author: author.clone(),
                publication_year: *year,
            },
        )?)?,
        BookCommand::Delete { id } => {
            service.delete_book(auth, *id)?;
            json!({ "deleted": id })
        }
        BookCommand::List {
            title,
            author,
            available,
            year,
            page,
        } => serde_json::to_value(service.list_books(
            auth,
            BookFilter {
                title_contains: title.clone(),
                author_contains: author.clone(),
                available: *available,
                publication_year: *year,
            },
            page_request(page),
        )?)?,
    };
    Ok(value)
}

fn run_reader(
    conn: &Connection,
    auth: &AuthContext,
    command: &ReaderCommand,
) -> CliResult<Value> {
    let service = ReaderService::new(SqliteReaderRepository::try_new(conn)?);
    let value = match command {
        ReaderCommand::Add { name, email } => serde_json::to_value(service.create_reader(
            auth,
            NewReader {
                name: name.clone(),
                email: email.clone(),
            },
        )?)?,
        ReaderCommand::Get { id } => serde_json::to_value(service.get_reader(auth, *id)?)?,
        ReaderCommand::Update { id, name, email } => serde_json::to_value(service.update_reader(
            auth,
            *id,
            ReaderChanges {
                name: name.clone(),
                email: email.clone(),
            },
        )?)?,
        ReaderCommand::Delete { id } => {
            service.delete_reader(auth, *id)?;
            json!({ "deleted": id })
        }
        ReaderCommand::List { search, page } => serde_json::to_value(service.list_readers(
            auth,
            search.clone(),
            page_request(page),
        )?)?,
    };
    Ok(value)
}

fn run_loan(conn: &Connection, auth: &AuthContext, command: &LoanCommand) -> CliResult<Value> {
    let service = LoanService::new(SqliteLoanRepository::try_new(conn)?);
    let value = match command {
        LoanCommand::Open { book, reader } => {
            serde_json::to_value(service.open_loan(auth, *book, *reader)?)?
        }
        LoanCommand::Close { id } => {
            let outcome = service.close_loan(auth, *id)?;
            if outcome.is_already_returned() {
                let loan = outcome.loan();
                if let Some(returned_on) = loan.return_date {
                    eprintln!("notice: loan {} was already returned on {returned_on}", loan.id);
                }
            }
            serde_json::to_value(outcome)?
        }
        LoanCommand::Get { id } => serde_json::to_value(service.get_loan(auth, *id)?)?,
        LoanCommand::List {
            state,
            book,
            reader,
            search,
            page,
        } => serde_json::to_value(service.list_loans(
            auth,
            LoanFilter {
                state: state.map(|value| match value {
                    LoanStateArg::Open => LoanState::Open,
                    LoanStateArg::Closed => LoanState::Closed,
                }),
                book_id: *book,
                reader_id: *reader,
                search: search.clone(),
            },
            page_request(page),
        )?)?,
        LoanCommand::Delete { id } => {
            service.delete_loan(auth, *id)?;
            json!({ "deleted": id })
        }
    };
    Ok(value)
}

fn page_request(page: &PageArgs) -> PageRequest {
    PageRequest::new(page.limit, page.offset)
}
