//! pagestore CLI
//!
//! Manages a table of users stored with pagestore.

use std::fmt;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use pagestore::{Result, Table, TableConfig};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt as log_fmt, EnvFilter};

/// pagestore CLI
#[derive(Parser, Debug)]
#[command(name = "pagestore-cli")]
#[command(about = "Manage a file-backed user table")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: String,

    /// Records per page file
    #[arg(short, long, default_value = "4")]
    items_per_page: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a user
    Add {
        /// User name
        #[arg(long)]
        name: String,

        /// User age
        #[arg(long)]
        age: u32,

        /// Photo URL (repeatable)
        #[arg(long = "photo")]
        photos: Vec<String>,
    },

    /// List users
    List {
        #[arg(long, default_value = "20")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// List users at least `min` years old
    FilterAge {
        #[arg(long)]
        min: u32,

        #[arg(long, default_value = "20")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Delete users by name (case-insensitive)
    Delete {
        #[arg(long)]
        name: String,
    },

    /// Show page statistics
    Stats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    name: String,
    age: u32,
    /// Unix seconds
    created_at: u64,
    photo_urls: Vec<String>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (age {}, created {}, {} photos)",
            self.name,
            self.age,
            self.created_at,
            self.photo_urls.len()
        )
    }
}

/// Business operations over the user table
struct UserManager {
    table: Table<User>,
}

impl UserManager {
    fn new(table: Table<User>) -> Self {
        Self { table }
    }

    fn add_user(&self, user: User) -> Result<()> {
        self.table.insert(&user)
    }

    fn delete_user_by_name(&self, name: &str) -> Result<usize> {
        self.table.delete(|user| user.name.eq_ignore_ascii_case(name))
    }

    fn list_users(&self, limit: usize, offset: usize) -> Result<Vec<User>> {
        self.table.scan(limit, offset)
    }

    fn filter_by_age(&self, limit: usize, offset: usize, min_age: u32) -> Result<Vec<User>> {
        self.table.scan_func(limit, offset, |user| user.age >= min_age)
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,pagestore=info"));

    log_fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("pagestore CLI v{}", pagestore::VERSION);

    let config = TableConfig::builder()
        .data_dir(&args.data_dir)
        .type_tag("users")
        .items_per_page(args.items_per_page)
        .build();

    let table = match Table::<User>::open(config) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to open table: {}", e);
            process::exit(1);
        }
    };

    let manager = UserManager::new(table);

    if let Err(e) = run(&manager, args.command) {
        tracing::error!("Command failed: {}", e);
        process::exit(1);
    }

    if let Err(e) = manager.table.close() {
        tracing::error!("Failed to close table: {}", e);
        process::exit(1);
    }
}

fn run(manager: &UserManager, command: Commands) -> Result<()> {
    match command {
        Commands::Add { name, age, photos } => {
            let created_at = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();

            manager.add_user(User {
                name,
                age,
                created_at,
                photo_urls: photos,
            })?;
            println!("OK");
        }
        Commands::List { limit, offset } => {
            for user in manager.list_users(limit, offset)? {
                println!("{}", user);
            }
        }
        Commands::FilterAge { min, limit, offset } => {
            for user in manager.filter_by_age(limit, offset, min)? {
                println!("{}", user);
            }
        }
        Commands::Delete { name } => {
            let removed = manager.delete_user_by_name(&name)?;
            println!("Deleted {} user(s)", removed);
        }
        Commands::Stats => {
            let table = &manager.table;
            println!("directory:     {}", table.dir().display());
            println!("pages:         {}", table.page_names()?.len());
            println!("records:       {}", table.count()?);
            println!("indexed pages: {}", table.indexed_pages());
            println!("free slots:    {}", table.free_slots());
        }
    }

    Ok(())
}
