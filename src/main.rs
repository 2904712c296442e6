//! library-client - terminal front end for the library API
//!
//! One subcommand per page of the library front end.

use std::process::ExitCode;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_client::{
    config::{AppConfig, LoggingConfig},
    models::{Book, BookChanges, BorrowRecord, Genre, NewBook},
    services::{notice, Notice},
    AppState,
};

#[derive(Parser)]
#[command(name = "library-client", version, about = "Manage and borrow library books")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all books
    Books,
    /// Show the details of one book
    Show { id: String },
    /// Add a new book to the collection
    Add(AddArgs),
    /// Edit an existing book
    Edit {
        id: String,
        #[command(flatten)]
        changes: EditArgs,
    },
    /// Delete a book
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Borrow copies of a book
    Borrow {
        id: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        /// Return date (YYYY-MM-DD), after today
        #[arg(long)]
        due: NaiveDate,
    },
    /// Show borrowed books and quantities
    Summary,
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    /// FICTION, NON_FICTION, SCIENCE, HISTORY, BIOGRAPHY or FANTASY
    #[arg(long)]
    genre: Genre,
    #[arg(long)]
    isbn: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, default_value_t = 1)]
    copies: u32,
    #[arg(long)]
    available: Option<bool>,
}

#[derive(Args)]
struct EditArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    genre: Option<Genre>,
    #[arg(long)]
    isbn: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    copies: Option<u32>,
    #[arg(long)]
    available: Option<bool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let state = AppState::new(config).context("Failed to create API client")?;
    tracing::debug!("Using API at {}", state.config.api.base_url);

    let notice = run(&state, cli.command).await;
    match notice {
        Some(notice) if notice.is_error() => {
            eprintln!("{}", notice);
            Ok(ExitCode::FAILURE)
        }
        Some(notice) => {
            println!("{}", notice);
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_client={}", config.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Run one command; returns the notice to show, if any
async fn run(state: &AppState, command: Command) -> Option<Notice> {
    let catalog = &state.services.catalog;
    let loans = &state.services.loans;

    match command {
        Command::Books => match catalog.list_books().await {
            Ok(books) => {
                print_books(&books);
                None
            }
            Err(e) => Some(Notice::from_error(&e, notice::FETCH_FAILED)),
        },
        Command::Show { id } => match catalog.get_book(&id).await {
            Ok(book) => {
                print_book(&book);
                None
            }
            Err(e) => Some(Notice::from_error(&e, notice::FETCH_FAILED)),
        },
        Command::Add(args) => {
            let form = NewBook {
                title: args.title,
                author: args.author,
                genre: args.genre,
                isbn: args.isbn,
                description: args.description,
                copies: args.copies,
                available: args.available,
            };
            let result = catalog.create_book(form).await;
            Some(Notice::for_outcome(&result, notice::BOOK_ADDED, notice::BOOK_ADD_FAILED))
        }
        Command::Edit { id, changes } => {
            let changes = BookChanges {
                title: changes.title,
                author: changes.author,
                genre: changes.genre,
                isbn: changes.isbn,
                description: changes.description,
                copies: changes.copies,
                available: changes.available,
            };
            let result = catalog.update_book(&id, changes).await;
            Some(Notice::for_outcome(&result, notice::BOOK_UPDATED, notice::BOOK_UPDATE_FAILED))
        }
        Command::Delete { id, yes } => {
            if !yes {
                return Some(Notice::error("Deletion not confirmed; pass --yes to delete"));
            }
            let result = catalog.delete_book(&id).await;
            Some(Notice::for_outcome(&result, notice::BOOK_DELETED, notice::BOOK_DELETE_FAILED))
        }
        Command::Borrow { id, quantity, due } => {
            let result = loans.borrow_book(&id, quantity, due).await;
            Some(Notice::for_outcome(&result, notice::BOOK_BORROWED, notice::BOOK_BORROW_FAILED))
        }
        Command::Summary => match loans.borrow_summary().await {
            Ok(records) => {
                print_summary(&records);
                None
            }
            Err(e) => Some(Notice::from_error(&e, notice::FETCH_FAILED)),
        },
    }
}

fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("No books in the library yet.");
        return;
    }
    println!(
        "{:<26} {:<32} {:<24} {:<12} {:>6}  {}",
        "ID", "TITLE", "AUTHOR", "GENRE", "COPIES", "STATUS"
    );
    for book in books {
        println!(
            "{:<26} {:<32} {:<24} {:<12} {:>6}  {}",
            book.id,
            truncate(&book.title, 32),
            truncate(&book.author, 24),
            book.genre.as_code(),
            book.copies,
            book.availability_label()
        );
    }
}

fn print_book(book: &Book) {
    println!("{}", book.title);
    println!("  Author:           {}", book.author);
    println!("  Genre:            {}", book.genre);
    println!("  ISBN:             {}", book.isbn);
    println!("  Copies Available: {}", book.copies);
    println!("  Status:           {}", book.availability_label());
    if let Some(description) = &book.description {
        println!();
        println!("  {}", description);
    }
}

fn print_summary(records: &[BorrowRecord]) {
    if records.is_empty() {
        println!("No books borrowed yet.");
        return;
    }
    println!("{:<32} {:<20} {:>8}", "TITLE", "ISBN", "QUANTITY");
    for record in records {
        println!(
            "{:<32} {:<20} {:>8}",
            truncate(record.book.title().unwrap_or("-"), 32),
            record.book.isbn().unwrap_or("-"),
            record.borrowed_quantity()
        );
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
