//! Operator commands against the Postgres store.

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};

use shopfront_auth::{normalize_email, Group, User};
use shopfront_catalog::{Category, NewCategory};
use shopfront_core::CategoryId;
use shopfront_infra::store::{CategoryStore, PostgresStore, SessionStore, UserStore};
use shopfront_infra::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "shopfront-admin", about = "Shopfront administration")]
struct Cli {
    /// Overrides `database.url` from the configuration.
    #[arg(long, env = "SHOPFRONT_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Print the known role groups and the permissions they grant.
    Roles,
    CreateCategory {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a category and every product in it.
    DeleteCategory { id: CategoryId },
    GrantGroup { email: String, group: String },
    RevokeGroup { email: String, group: String },
    SetSuperuser {
        email: String,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Delete sessions past their expiry.
    PruneSessions,
}

fn known_group(name: &str) -> anyhow::Result<Group> {
    Group::known()
        .into_iter()
        .find(|g| g.as_str() == name)
        .ok_or_else(|| anyhow!("unknown group {name:?}"))
}

async fn user_by_email(store: &PostgresStore, email: &str) -> anyhow::Result<User> {
    store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| anyhow!("no user with email {email}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopfront_observability::init_compact();
    let cli = Cli::parse();

    if let Command::Roles = cli.command {
        for group in Group::known() {
            let perms: Vec<String> = group
                .permissions()
                .iter()
                .map(|p| p.as_str().to_owned())
                .collect();
            println!("{}: {}", group.as_str(), perms.join(", "));
        }
        return Ok(());
    }

    let config = AppConfig::load().context("failed to load configuration")?;
    let Some(url) = cli.database_url.or(config.database.url) else {
        bail!("no database configured; set database.url or SHOPFRONT_DATABASE_URL");
    };
    let store = PostgresStore::connect(&url, config.database.max_connections)
        .await
        .context("failed to connect to database")?;

    match cli.command {
        Command::Roles => {}
        Command::Migrate => {
            store.run_migrations().await?;
            println!("migrations applied");
        }
        Command::CreateCategory { name, description } => {
            let category = Category::create(NewCategory { name, description })?;
            store.create_category(&category).await?;
            println!("{}", category.id);
        }
        Command::DeleteCategory { id } => {
            store.delete_category(id).await?;
            println!("deleted category {id}");
        }
        Command::GrantGroup { email, group } => {
            let group = known_group(&group)?;
            let user = user_by_email(&store, &email).await?;
            store.add_to_group(user.id, &group).await?;
            println!("{} added to {}", user.email, group.as_str());
        }
        Command::RevokeGroup { email, group } => {
            let group = known_group(&group)?;
            let user = user_by_email(&store, &email).await?;
            store.remove_from_group(user.id, &group).await?;
            println!("{} removed from {}", user.email, group.as_str());
        }
        Command::SetSuperuser { email, enabled } => {
            let user = user_by_email(&store, &email).await?;
            store.set_superuser(user.id, enabled).await?;
            println!("{} superuser={enabled}", user.email);
        }
        Command::PruneSessions => {
            let removed = store.prune_expired_sessions(Utc::now()).await?;
            println!("removed {removed} expired sessions");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn group_names_must_be_known() {
        assert_eq!(known_group("Content Manager").unwrap(), Group::CONTENT_MANAGER);
        assert!(known_group("Janitor").is_err());
    }

    #[test]
    fn prune_sessions_takes_no_arguments() {
        let cli = Cli::try_parse_from(["shopfront-admin", "prune-sessions"]).unwrap();
        assert!(matches!(cli.command, Command::PruneSessions));
    }
}
