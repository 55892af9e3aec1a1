use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use marketplace_core::api::{PostSearch, SortingProperty};
use marketplace_core::flows::{self, ChatsList, OrderForm, PostView, SearchResults, SignIn};
use marketplace_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use marketplace_core::{telemetry, ClientConfig, ClientError, InitialRoute, MarketplaceClient};
use rust_decimal::Decimal;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "marketplace")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Backend base URL, overrides the configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Directory holding the durable session entry
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in with a Google account identifier
    SignInGoogle { id: String },
    /// Forget the stored session
    SignOut,
    /// Show where the app would start
    Whoami,
    /// Search stores and posts
    Search {
        #[arg(default_value = "")]
        text: String,
        #[arg(long = "category")]
        categories: Vec<String>,
        /// price or sent_datetime
        #[arg(long, default_value = "price")]
        sort: SortingProperty,
        #[arg(long)]
        min: Option<Decimal>,
        #[arg(long)]
        max: Option<Decimal>,
    },
    /// List the signed-in user's chats
    Chats,
    /// Show a post and its comments
    Post {
        post_id: String,
        /// Comment pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Comment on a post
    Comment { post_id: String, text: String },
    /// Start a purchase
    Order {
        post_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = ClientConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(base_url) = &args.base_url {
        config.gateway.base_url = base_url.clone();
    }
    if let Some(data_dir) = &args.data_dir {
        config.session.data_dir = data_dir.clone();
    }
    config.validate()?;

    let mut log_config = LogConfig::try_from(&config.logging)?;
    if let Some(level) = &args.log_level {
        log_config.level = level.parse::<LogLevel>().unwrap_or_else(|_| {
            eprintln!("Invalid log level '{}', using 'info'", level);
            LogLevel::Info
        });
    }
    if args.json_logs {
        log_config = log_config.json_format(true);
    }
    init_logging_with_config(log_config)?;
    telemetry::describe_metrics();

    let client = MarketplaceClient::connect(config)?;
    let route = flows::boot(&client).await?;
    debug!(?route, "Session restored");

    match run(&client, route, args.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => match err.notice() {
            Some(notice) => {
                eprintln!("{}", notice);
                Ok(ExitCode::FAILURE)
            }
            None => {
                info!(kind = err.kind(), "Command failed");
                Err(err.into())
            }
        },
    }
}

async fn run(client: &MarketplaceClient, route: InitialRoute, command: Command) -> Result<(), ClientError> {
    match command {
        Command::SignIn { email, password } => {
            let mut sign_in = SignIn::new(client);
            sign_in.set_email(email);
            sign_in.set_password(password);
            let session = sign_in.submit().await?;
            println!("Signed in as {}", session.customer_id());
        }
        Command::SignInGoogle { id } => {
            let session = SignIn::new(client).submit_google(&id).await?;
            println!("Signed in as {}", session.customer_id());
        }
        Command::SignOut => {
            flows::sign_out(client).await?;
            println!("Signed out");
        }
        Command::Whoami => match route {
            InitialRoute::Authenticated(session) => println!("{}", session.customer_id()),
            InitialRoute::Anonymous => println!("anonymous"),
        },
        Command::Search { text, categories, sort, min, max } => {
            let mut results = SearchResults::new(client, PostSearch::text(text.clone()));
            let filtered = !categories.is_empty() || min.is_some() || max.is_some();
            let posts = if filtered || sort != SortingProperty::Price {
                let search = PostSearch {
                    categories,
                    sorting_property: sort,
                    minimum_price: min.unwrap_or(Decimal::ZERO),
                    maximum_price: max,
                    ..PostSearch::text(text)
                };
                results.apply_filters(search).await?
            } else {
                results.load().await?
            };

            println!("Stores:");
            for store in results.stores().await?.into_result()?.iter() {
                println!("  {}  {}", store.user_id, store.name);
            }
            println!("Posts:");
            for post in posts.into_result()?.iter() {
                println!("  {}  {}  {}", post.post_id, post.title, post.price);
            }
        }
        Command::Chats => {
            for row in ChatsList::new(client).rows().await? {
                println!("{}  {}  {}", row.chat_id, row.receiver_name, row.preview);
            }
        }
        Command::Post { post_id, pages } => {
            let mut view = PostView::new(client, post_id);
            let post = view.post().await?.into_result()?;
            println!("{} ({})", post.title, post.store_name);
            println!("{}", post.description);
            println!("Price: {}  Available: {}", post.price, post.amount);

            for _ in 0..pages {
                if view.load_more_comments().await? == 0 {
                    break;
                }
            }
            println!("Comments:");
            for comment in view.comments() {
                let author = comment.customer_name.as_deref().unwrap_or(&comment.customer_id);
                println!("  {}: {}", author, comment.text);
            }
        }
        Command::Comment { post_id, text } => {
            let mut view = PostView::new(client, post_id);
            view.set_comment_text(text);
            view.add_comment().await?;
            println!("Comment added ({} loaded)", view.comments().len());
        }
        Command::Order { post_id, quantity } => {
            let mut order = OrderForm::new(client, post_id);
            order.set_quantity(quantity).await?;
            let intent = order.submit().await?;
            println!("{}", intent.stripe_client_secret);
        }
    }

    Ok(())
}

