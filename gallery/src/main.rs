use std::sync::Arc;
use std::{env, fs};

use anyhow::Context;
use aws_sdk_cognitoidentity::Client as CognitoClient;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{fmt, EnvFilter};

use gallery::{
    app::GalleryApp,
    identity_pool::CognitoIdentityPool,
    identity_provider::HeadlessProvider,
    media_storage::S3Connector,
    types::{AppConfig, Environment},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(environment.tracing_level().as_str()));

    // JSON logs for staging/production, human-readable for development
    if environment.json_logs() {
        fmt().json().with_env_filter(env_filter).init();
    } else {
        fmt().with_env_filter(env_filter).init();
    }

    // Missing configuration is fatal before any sign-in is attempted
    let config = match env::var("GALLERY_STACK_OUTPUTS") {
        Ok(path) => {
            let outputs = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read stack outputs from {path}"))?;
            AppConfig::from_stack_outputs(&outputs)?
        }
        Err(_) => AppConfig::from_env()?,
    };

    let aws_config = environment.aws_config(&config.region).await;
    let identity_pool = Arc::new(CognitoIdentityPool::new(CognitoClient::new(&aws_config)));
    let connector = Arc::new(S3Connector::new(
        environment.s3_client_config(&config.region).await,
    ));
    let identity_provider = Arc::new(HeadlessProvider::new());

    let app = GalleryApp::new(config, identity_pool, identity_provider, connector)?;
    app.start();

    let token = read_id_token().await?;
    let view = app.on_credential(&token).await;
    println!("{}", serde_json::to_string_pretty(&view)?);

    app.sign_out();

    Ok(())
}

/// `GOOGLE_ID_TOKEN`, or the first line of stdin
async fn read_id_token() -> anyhow::Result<String> {
    if let Ok(token) = env::var("GOOGLE_ID_TOKEN") {
        return Ok(token);
    }

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read Google ID token from stdin")?;

    input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(ToString::to_string)
        .context("No Google ID token provided (set GOOGLE_ID_TOKEN or pipe it on stdin)")
}
