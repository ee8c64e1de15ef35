//! coursegate CLI
//!
//! Audits course access decisions against a configured directory.

use anyhow::Context;
use clap::{Parser, Subcommand};
use coursegate::{
    access::AccessResolver,
    config::{AppConfig, LogFormat, load_config},
    directory::{CourseId, SharedDirectory, UserId, create_directory},
    error::{AccessError, response::map_access_error},
    identity::{IdentityContext, begin_impersonation},
    roles::{Role, has_minimum_role},
};
use serde::Serialize;
use std::io::Write;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// coursegate - course access resolution and impersonation
#[derive(Parser, Debug)]
#[command(name = "coursegate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "COURSEGATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides logging.level
    #[arg(long, env = "COURSEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the access a user (or their impersonation target) has on a course
    Resolve {
        #[arg(long)]
        user: String,

        #[arg(long)]
        course: String,

        /// Impersonate this user first
        #[arg(long = "as")]
        as_user: Option<String>,
    },

    /// Demand a minimum role; exits non-zero when access is denied
    Require {
        #[arg(long)]
        user: String,

        #[arg(long)]
        course: String,

        /// Minimum role, e.g. `teacher` or `category-reviewer`
        #[arg(long, value_parser = parse_role)]
        role: Role,

        /// Impersonate this user first
        #[arg(long = "as")]
        as_user: Option<String>,
    },

    /// Compare two role identifiers on the priority scale
    Compare { actual: String, required: String },
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::try_parse(s).ok_or_else(|| {
        let known: Vec<&str> = Role::all().map(|r| r.as_str()).collect();
        format!("unknown role '{}', expected one of: {}", s, known.join(", "))
    })
}

fn init_logging(config: &AppConfig, cli_level: Option<&str>) {
    let level = cli_level.unwrap_or(config.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn print_json<T: Serialize>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn compare(out: &mut dyn Write, actual: &str, required: &str) -> anyhow::Result<bool> {
    writeln!(out, "{}", has_minimum_role(actual, required))?;
    Ok(true)
}

/// Build the identity for `user`, substituting `as_user` when given
async fn identity_for(
    directory: &SharedDirectory,
    user: &str,
    as_user: Option<&str>,
) -> anyhow::Result<IdentityContext> {
    let user = UserId::from(user);
    let principal = directory
        .find_principal(&user)
        .await?
        .with_context(|| format!("User '{}' not found in directory", user))?;

    let ctx = IdentityContext::new(principal);
    match as_user {
        Some(target) => {
            let ctx = begin_impersonation(&ctx, &UserId::from(target), directory.as_ref()).await?;
            Ok(ctx)
        }
        None => Ok(ctx),
    }
}

/// Execute a subcommand, writing its result to `out`.
///
/// Returns `false` when the process should exit non-zero.
async fn run(
    command: Command,
    resolver: &AccessResolver,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    match command {
        Command::Resolve {
            user,
            course,
            as_user,
        } => {
            let identity = identity_for(resolver.directory(), &user, as_user.as_deref()).await?;
            let result = resolver
                .resolve_for(&identity, &CourseId::from(course))
                .await?;
            print_json(out, &result)?;
            Ok(true)
        }
        Command::Require {
            user,
            course,
            role,
            as_user,
        } => {
            let identity = identity_for(resolver.directory(), &user, as_user.as_deref()).await?;
            match resolver
                .require(&identity, &CourseId::from(course), role)
                .await
            {
                Ok(result) => {
                    print_json(out, &result)?;
                    Ok(true)
                }
                Err(err @ AccessError::Denied(_)) => {
                    info!(error = %err, "Access denied");
                    print_json(out, &map_access_error(&err))?;
                    Ok(false)
                }
                Err(err) => Err(err.into()),
            }
        }
        Command::Compare { actual, required } => compare(out, &actual, &required),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut stdout = std::io::stdout().lock();

    let succeeded = match args.command {
        // Pure role arithmetic; works without configuration or a directory
        Command::Compare { actual, required } => compare(&mut stdout, &actual, &required)?,
        command => {
            let config =
                load_config(args.config.as_deref()).context("Failed to load configuration")?;
            init_logging(&config, args.log_level.as_deref());

            debug!(backend = ?config.directory.backend, "Configuration loaded");

            let directory =
                create_directory(&config.directory).context("Failed to open directory")?;
            let resolver = AccessResolver::new(directory, &config.access);

            run(command, &resolver, &mut stdout).await?
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
