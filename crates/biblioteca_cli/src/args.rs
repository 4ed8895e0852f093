//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

/// Record keeper for books, readers and loans.
#[derive(Parser, Debug)]
#[command(name = "biblioteca")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file (created on first use)
    #[arg(long, env = "BIBLIOTECA_DB", default_value = "biblioteca.sqlite3", global = true)]
    pub db: PathBuf,

    /// Staff username performing the operation
    #[arg(long, env = "BIBLIOTECA_USER", global = true)]
    pub user: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "BIBLIOTECA_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "BIBLIOTECA_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the book catalog
    #[command(subcommand)]
    Book(BookCommand),
    /// Manage registered readers
    #[command(subcommand)]
    Reader(ReaderCommand),
    /// Lend and return books
    #[command(subcommand)]
    Loan(LoanCommand),
    /// Show record counts
    Summary,
}

#[derive(Subcommand, Debug)]
pub enum BookCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        year: i32,
    },
    Get {
        id: Uuid,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Delete a book and its loan history
    Delete {
        id: Uuid,
    },
    List {
        /// Case-insensitive title substring
        #[arg(long)]
        title: Option<String>,
        /// Case-insensitive author substring
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        available: Option<bool>,
        #[arg(long)]
        year: Option<i32>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReaderCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    Get {
        id: Uuid,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a reader and their loans
    Delete {
        id: Uuid,
    },
    List {
        /// Case-insensitive name or email substring
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum LoanCommand {
    /// Lend a book to a reader
    Open {
        #[arg(long)]
        book: Uuid,
        #[arg(long)]
        reader: Uuid,
    },
    /// Record the return of a loan
    Close {
        id: Uuid,
    },
    Get {
        id: Uuid,
    },
    List {
        #[arg(long, value_enum)]
        state: Option<LoanStateArg>,
        #[arg(long)]
        book: Option<Uuid>,
        #[arg(long)]
        reader: Option<Uuid>,
        /// Case-insensitive book title or reader name substring
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Remove a loan record outright
    Delete {
        id: Uuid,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page size (default 20, max 100)
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanStateArg {
    Open,
    Closed,
}

#[cfg(test)]
mod tests {
    use super::{BookCommand, Cli, Command, LoanCommand, LoanStateArg};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn book_list_accepts_filters_and_paging() {
        let cli = Cli::try_parse_from([
            "biblioteca",
            "--user",
            "alice",
            "book",
            "list",
            "--title",
            "dune",
            "--available",
            "false",
            "--limit",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("alice"));
        match cli.command {
            Command::Book(BookCommand::List {
                title,
                available,
                page,
                ..
            }) => {
                assert_eq!(title.as_deref(), Some("dune"));
                assert_eq!(available, Some(false));
                assert_eq!(page.limit, Some(5));
                assert_eq!(page.offset, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn loan_list_parses_state() {
        let cli =
            Cli::try_parse_from(["biblioteca", "loan", "list", "--state", "closed"]).unwrap();
        match cli.command {
            Command::Loan(LoanCommand::List { state, .. }) => {
                assert_eq!(state, Some(LoanStateArg::Closed));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(Cli::try_parse_from(["biblioteca", "loan", "close", "not-a-uuid"]).is_err());
    }
}
