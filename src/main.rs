use clap::Parser;
use dotenvy::dotenv;
use meter_buddy::{
    cli::{self, Cli, CliContext},
    config::{app, database},
    errors::Result,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing (as early as possible). Logs go to stderr so command output stays clean.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // 2. Load .env file, non-fatal
    dotenv().ok();
    debug!("Attempted to load .env file.");

    // 3. Load the application configuration
    let config = app::load_config(app::config_path())
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Initialize database
    let database_url = database::get_database_url();
    let db = database::create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| debug!("Database tables ready"))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Run the command
    let ctx = CliContext::new(db, config);
    let now = chrono::Local::now();
    let output = cli::execute(&ctx, cli.command, &now)
        .await
        .inspect_err(|e| error!("{}", e))?;

    println!("{output}");
    Ok(())
}
