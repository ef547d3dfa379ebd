//! Main loop: connect to the bus and feed every delivery to the listener.

use std::future::Future;
use std::sync::Arc;

use crate::bus::{AmqpConsumer, MessageHandler, MessageSource};
use crate::config::Config;
use crate::error::{BusError, Error};
use crate::handler::UpdateListener;
use crate::notify::{Notifier, Notify, Report};
use crate::openshift::TagUpdater;

/// Namespace used when reporting a main-loop failure.
pub const MAIN_LOOP_NAMESPACE: &str = "Continuous-Deployment-Main";

/// Wire up the production components and run until the subscription fails.
pub async fn run(config: &Config) -> Result<(), Error> {
    let notifier: Arc<dyn Notify> = Arc::new(Notifier::from_config(&config.mail)?);
    let updater = Arc::new(TagUpdater::new(
        config.openshift.clone(),
        Arc::clone(&notifier),
    ));
    let listener = UpdateListener::new(&config.watched_repo, updater, Arc::clone(&notifier));

    tracing::info!("Connecting to the message bus as a consumer...");
    drive(AmqpConsumer::connect(&config.bus), &listener, notifier.as_ref()).await
}

/// Connect, then consume until failure. Any failure is reported before it
/// is returned.
pub async fn drive<F, S>(
    connect: F,
    handler: &dyn MessageHandler,
    notifier: &dyn Notify,
) -> Result<(), Error>
where
    F: Future<Output = Result<S, BusError>>,
    S: MessageSource,
{
    let result: Result<(), BusError> = async {
        let mut source = connect.await?;
        tracing::info!("Starting up CD service...");
        source.consume(handler).await
    }
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            let chain = error_chain(&e);
            tracing::error!("Main loop failed: {chain}. Sending email..");
            notifier
                .notify(Report::failure(Some(MAIN_LOOP_NAMESPACE.to_string()), chain))
                .await;
            Err(e.into())
        }
    }
}

/// Render an error and all of its sources, outermost first.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\nCaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
