use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::auth_service::AuthService;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[derive(Debug, Parser)]
#[command(name = "blog-web", version, about = "Multi-user blog: web pages and JSON API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and start the HTTP server (default).
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Delete a user together with their posts and comments.
    DeleteUser {
        #[arg(long)]
        username: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            run_migrations(&pool).await?;
            let state = AppState::postgres(pool, &settings)?;
            server::run_http(&settings, state).await?;
        }
        Command::Migrate => {
            run_migrations(&pool).await?;
        }
        Command::DeleteUser { username } => {
            let service = AuthService::new(
                PostgresUserRepository::new(pool),
                JwtService::new(&settings.jwt_secret, settings.jwt_ttl_seconds),
            );
            let user = service
                .delete_user(&username)
                .await
                .with_context(|| format!("failed to delete user '{username}'"))?;
            info!(user_id = user.id, username = %user.username, "account removed");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["blog-web"]).expect("bare invocation must parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn delete_user_takes_a_username() {
        let cli = Cli::try_parse_from(["blog-web", "delete-user", "--username", "alice"])
            .expect("delete-user must parse");
        assert!(matches!(
            cli.command,
            Some(Command::DeleteUser { ref username }) if username == "alice"
        ));

        assert!(Cli::try_parse_from(["blog-web", "delete-user"]).is_err());
    }
}
