use anyhow::{bail, Context};
use recuperajud::{
    api::{openapi, validation::Validator},
    auth::password::PasswordHasher,
    build_app,
    cli::{output::Output, Cli, Commands},
    db::DatabaseProvider,
    email::{EmailSender, LogEmailSender, SmtpEmailSender},
    types::{AccountStatus, JobTitle, NewAccount, Permission},
    utils::toml_config::{AppConfig, LogFormat},
    AppState, AuthFlows,
};
use std::{net::SocketAddr, path::Path, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let Cli {
        config,
        verbose,
        no_color,
        command,
    } = Cli::parse_args();
    let output = if no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let result = match command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config, verbose, &output).await,
        Commands::Config { validate } => show_config(&config, validate, &output),
        Commands::CreateAdmin {
            email,
            name,
            password,
        } => create_admin(&config, &email, &name, &password, &output).await,
        Commands::Openapi => {
            println!("{}", openapi::openapi().to_pretty_json()?);
            Ok(())
        }
    };

    if let Err(ref e) = result {
        output.error(&format!("{:#}", e));
    }
    result
}

async fn serve(config_path: &Path, verbose: bool, output: &Output) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    init_tracing(&config, verbose);
    if config.server.log_format == LogFormat::Text {
        output.banner();
    }

    let db = DatabaseProvider::from_config(&config)?
        .create_client()
        .await
        .context("failed to open database")?;
    let email = email_sender(&config)?;
    let auth = Arc::new(AuthFlows::from_config(&config, db.clone(), email)?);

    let app = build_app(AppState { db, auth });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(%addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn email_sender(config: &AppConfig) -> anyhow::Result<Arc<dyn EmailSender>> {
    match config.email.smtp_host.as_deref() {
        Some(host) => {
            let sender = SmtpEmailSender::new(&config.email, host, config.smtp_credentials())?;
            tracing::info!(host, port = config.email.smtp_port, "SMTP email delivery enabled");
            Ok(Arc::new(sender))
        }
        None => {
            tracing::warn!("email.smtp_host is not set, reset links are only logged at debug level");
            Ok(Arc::new(LogEmailSender))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

fn show_config(config_path: &Path, validate: bool, output: &Output) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;

    output.header("Server");
    output.kv("address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log level", &config.server.log_level);

    output.header("Auth");
    output.kv("access token ttl", &format!("{}s", config.auth.jwt_access_expiry));
    output.kv("refresh token ttl", &format!("{}s", config.auth.jwt_refresh_expiry));
    output.kv("frontend url", &config.auth.frontend_url);

    output.header("Database");
    output.kv("url", &config.database.url);

    output.header("Email");
    output.kv("from", &config.email.from);
    match config.email.smtp_host.as_deref() {
        Some(host) => output.kv("smtp host", &format!("{}:{}", host, config.email.smtp_port)),
        None => output.warning("smtp_host is not set: reset links are only logged at debug level"),
    }

    if validate {
        output.newline();
        config.validate()?;
        output.success("Configuration is valid");
    } else {
        output.hint("Check secrets and referenced environment variables with:");
        output.command("recuperajud-server config --validate");
    }

    Ok(())
}

async fn create_admin(
    config_path: &Path,
    email: &str,
    name: &str,
    password: &str,
    output: &Output,
) -> anyhow::Result<()> {
    Validator::new()
        .name(name)
        .email(email)
        .password(
            password,
            "Senha é obrigatória",
            "A senha deve ter pelo menos 6 caracteres",
        )
        .finish()?;

    let config = AppConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let db = DatabaseProvider::from_config(&config)?.create_client().await?;

    if db.find_account_by_email(email).await?.is_some() {
        bail!("an account with email {} already exists", email);
    }

    let passwords = PasswordHasher::new(&config.auth.password)?;
    let account = db
        .create_account(&NewAccount {
            email: email.to_string(),
            password_hash: passwords.hash(password)?,
            name: name.trim().to_string(),
            job_title: JobTitle::Servidor,
            permission: Permission::NationalAdmin,
            status: AccountStatus::Active,
            court_id: None,
            region_id: None,
        })
        .await?;

    output.success(&format!(
        "Created national administrator {} (id {})",
        account.email, account.id
    ));
    output.info(&format!("Sign in at {}", config.auth.frontend_url));
    Ok(())
}
