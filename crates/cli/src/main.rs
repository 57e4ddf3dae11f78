//! RetailCloud CLI - Command-line shopper frontend.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and sign in
//! retail register -e shopper@example.com -p secret123
//! retail confirm -e shopper@example.com -c 123456
//! retail login -e shopper@example.com -p secret123
//!
//! # Shop
//! retail cart add -i P1 -q 2 --price 9.99
//! retail cart list
//! retail checkout
//! retail pay O-1
//! ```
//!
//! # Commands
//!
//! - `register` / `confirm` / `login` / `logout` / `whoami` - session
//! - `cart` - list, add, remove, clear
//! - `checkout` / `orders` / `pay` - order lifecycle

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

use commands::App;

#[derive(Parser)]
#[command(name = "retail")]
#[command(author, version, about = "RetailCloud shopper CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Confirm a registration with an emailed code
    Confirm {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Confirmation code
        #[arg(short, long)]
        code: String,
    },
    /// Sign in
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the current session
    Whoami,
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Convert the cart into an order
    Checkout,
    /// List past orders
    Orders,
    /// Settle payment for an order
    Pay {
        /// Order id from checkout
        order_id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart contents
    List,
    /// Add an item
    Add {
        /// Product id
        #[arg(short = 'i', long)]
        product: String,

        /// Quantity
        #[arg(short, long, default_value_t = 1)]
        qty: u32,

        /// Unit price
        #[arg(long)]
        price: Decimal,
    },
    /// Remove an item
    Remove {
        /// Product id
        product: String,
    },
    /// Remove everything
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter; default to info for our crates
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "retailcloud_client=info,retailcloud_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::init()?;

    match cli.command {
        Commands::Register { email, password } => {
            commands::auth::register(&app, &email, &password).await?;
        }
        Commands::Confirm { email, code } => {
            commands::auth::confirm(&app, &email, &code).await?;
        }
        Commands::Login { email, password } => {
            commands::auth::login(&app, &email, &password).await?;
        }
        Commands::Logout => commands::auth::logout(&app).await,
        Commands::Whoami => commands::auth::whoami(&app),
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&app).await?,
            CartAction::Add {
                product,
                qty,
                price,
            } => commands::cart::add(&app, &product, qty, price).await?,
            CartAction::Remove { product } => commands::cart::remove(&app, &product).await?,
            CartAction::Clear => commands::cart::clear(&app).await?,
        },
        Commands::Checkout => commands::order::checkout(&app).await?,
        Commands::Orders => commands::order::list(&app).await?,
        Commands::Pay { order_id } => commands::order::pay(&app, &order_id).await?,
    }

    Ok(())
}
