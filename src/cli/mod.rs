//! CLI module for RecuperaJud
//!
//! Provides command-line interface parsing for the recuperajud-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RecuperaJud - authentication and access-control server
#[derive(Parser, Debug)]
#[command(
    name = "recuperajud-server",
    version,
    about = "RecuperaJud - authentication and access-control server",
    long_about = "REST backend for judicial-recovery case tracking: login, token refresh,\n\
                  password reset and role-scoped account and court management.\n\n\
                  Run without arguments to start the server.",
    after_help = "EXAMPLES:\n    \
                  recuperajud-server                          # Start the server (requires recuperajud.toml)\n    \
                  recuperajud-server --config my.toml         # Use a custom config file\n    \
                  recuperajud-server config --validate        # Check the configuration\n    \
                  recuperajud-server create-admin --email admin@tj.jus.br --name Admin --password s3cret!"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "recuperajud.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve,

    /// Show configuration information
    Config {
        /// Validate the configuration file, including referenced env vars
        #[arg(long)]
        validate: bool,
    },

    /// Create a national administrator account
    ///
    /// Accounts are otherwise only created by administrators, so this is
    /// how the first one comes to exist.
    CreateAdmin {
        /// Email used to log in
        #[arg(long)]
        email: String,

        /// Display name
        #[arg(long)]
        name: String,

        /// Initial password
        #[arg(long, env = "RECUPERAJUD_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the OpenAPI document as JSON
    Openapi,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
