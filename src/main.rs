use continuous_deployment::config::Config;
use continuous_deployment::service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    eprintln!("Continuous Deployment v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   OpenShift: {}", config.openshift.api_base);
    eprintln!("   Brokers: {}", config.bus.urls.join(", "));
    eprintln!("   Queue: {}", config.bus.query);
    eprintln!("   Watching: {}", config.watched_repo);
    eprintln!(
        "   Emails: {}\n",
        match (config.mail.send_emails, &config.mail.mailing_list) {
            (true, Some(list)) => format!("enabled ({})", list.email),
            _ => "disabled".to_string(),
        }
    );

    service::run(&config).await?;
    Ok(())
}
