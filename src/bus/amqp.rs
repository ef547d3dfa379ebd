//! AMQP consumer over mutual TLS (lapin).
//!
//! lapin speaks AMQP 0-9-1, so the brokers behind `ACTIVEMQ_URL_*` must have
//! an AMQP 0-9-1 listener enabled.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions};
use lapin::tcp::{OwnedIdentity, OwnedTLSConfig};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties};
use openssl::pkcs12::Pkcs12;
use openssl::pkey::PKey;
use openssl::stack::Stack;
use openssl::x509::X509;

use crate::bus::{MessageHandler, MessageSource};
use crate::config::BusConfig;
use crate::error::BusError;

const CONSUMER_TAG: &str = "continuous-deployment";

/// Password of the in-memory PKCS#12 bundle. It never leaves the process.
const IDENTITY_PASSWORD: &str = "continuous-deployment";

/// Client identity as PKCS#12 DER plus the PEM CA bundle.
#[derive(Clone)]
struct TlsMaterial {
    identity: Vec<u8>,
    ca_certs: String,
}

impl TlsMaterial {
    async fn load(config: &BusConfig) -> Result<Self, BusError> {
        let ca_certs = read(&config.ca_certs).await?;
        let cert = read(&config.cert).await?;
        let key = read(&config.key).await?;
        Ok(Self {
            identity: pkcs12_identity(&cert, &key)?,
            ca_certs: String::from_utf8_lossy(&ca_certs).into_owned(),
        })
    }

    fn to_config(&self) -> OwnedTLSConfig {
        OwnedTLSConfig {
            identity: Some(OwnedIdentity {
                der: self.identity.clone(),
                password: IDENTITY_PASSWORD.to_string(),
            }),
            cert_chain: Some(self.ca_certs.clone()),
        }
    }
}

/// Bundle a PEM certificate (leaf first, optional chain after) and a PEM
/// private key into PKCS#12, the only identity form the TLS connector takes.
fn pkcs12_identity(cert_pem: &[u8], key_pem: &[u8]) -> Result<Vec<u8>, BusError> {
    let identity_err = |what: &str, e: openssl::error::ErrorStack| {
        BusError::Identity(format!("{what}: {e}"))
    };

    let mut certs = X509::stack_from_pem(cert_pem)
        .map_err(|e| identity_err("invalid client certificate", e))?
        .into_iter();
    let leaf = certs
        .next()
        .ok_or_else(|| BusError::Identity("client certificate file holds no certificate".into()))?;
    let key = PKey::private_key_from_pem(key_pem)
        .map_err(|e| identity_err("invalid client key", e))?;

    let mut chain = Stack::new().map_err(|e| identity_err("certificate chain", e))?;
    for cert in certs {
        chain
            .push(cert)
            .map_err(|e| identity_err("certificate chain", e))?;
    }

    Pkcs12::builder()
        .name(CONSUMER_TAG)
        .pkey(&key)
        .cert(&leaf)
        .ca(chain)
        .build2(IDENTITY_PASSWORD)
        .and_then(|p12| p12.to_der())
        .map_err(|e| identity_err("failed to build PKCS#12 identity", e))
}

async fn read(path: &Path) -> Result<Vec<u8>, BusError> {
    tokio::fs::read(path).await.map_err(|source| BusError::Tls {
        path: path.display().to_string(),
        source,
    })
}

/// Consumer bound to the configured queue on the first reachable broker.
pub struct AmqpConsumer {
    _connection: Connection,
    channel: lapin::Channel,
    queue: String,
}

impl AmqpConsumer {
    /// Connect to the first broker URL that accepts us.
    pub async fn connect(config: &BusConfig) -> Result<Self, BusError> {
        let tls = TlsMaterial::load(config).await?;

        let mut failures = Vec::new();
        for url in &config.urls {
            tracing::info!("Connecting to message bus at {url}");
            let connection = match Connection::connect_with_config(
                url,
                ConnectionProperties::default(),
                tls.to_config(),
            )
            .await
            {
                Ok(connection) => connection,
                Err(e) => {
                    tracing::warn!("Broker {url} unavailable: {e}");
                    failures.push(format!("{url}: {e}"));
                    continue;
                }
            };

            let channel = connection
                .create_channel()
                .await
                .map_err(|e| BusError::Connect(format!("Failed to create channel: {e}")))?;

            tracing::info!("Connected to message bus at {url}");
            return Ok(Self {
                _connection: connection,
                channel,
                queue: config.query.clone(),
            });
        }

        Err(BusError::Connect(if failures.is_empty() {
            "no broker URLs configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}

#[async_trait]
impl MessageSource for AmqpConsumer {
    async fn consume(&mut self, handler: &dyn MessageHandler) -> Result<(), BusError> {
        let consume_err = |reason: String| BusError::Consume {
            queue: self.queue.clone(),
            reason,
        };

        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| consume_err(e.to_string()))?;

        tracing::info!(queue = %self.queue, "Consuming messages");

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery.map_err(|e| consume_err(e.to_string()))?;

            if let Err(e) = handler.handle(&delivery.data).await {
                tracing::error!("Dropping message: {e}");
            }

            delivery
                .ack(BasicAckOptions::default())
                .await
                .map_err(|e| consume_err(format!("ack failed: {e}")))?;
        }

        Err(consume_err("subscription closed".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn bus_config(dir: &Path) -> BusConfig {
        BusConfig {
            urls: vec!["amqps://127.0.0.1:1".into()],
            query: "queue".into(),
            cert: dir.join("cert.pem"),
            key: dir.join("key.pem"),
            ca_certs: dir.join("ca.pem"),
        }
    }

    #[tokio::test]
    async fn missing_tls_material_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = bus_config(dir.path());

        let err = AmqpConsumer::connect(&config).await.err().unwrap();
        match err {
            BusError::Tls { path, .. } => assert!(PathBuf::from(path).ends_with("ca.pem")),
            other => panic!("expected Tls error, got {other:?}"),
        }
    }

    /// Self-signed certificate and key, both PEM.
    fn self_signed() -> (Vec<u8>, Vec<u8>) {
        use openssl::asn1::Asn1Time;
        use openssl::hash::MessageDigest;
        use openssl::rsa::Rsa;
        use openssl::x509::X509NameBuilder;

        let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "continuous-deployment").unwrap();
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(1).unwrap())
            .unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();
        let cert = builder.build();

        (
            cert.to_pem().unwrap(),
            key.private_key_to_pem_pkcs8().unwrap(),
        )
    }

    #[tokio::test]
    async fn pem_files_become_pkcs12_identity_and_chain() {
        let dir = tempfile::tempdir().unwrap();
        let (cert, key) = self_signed();
        std::fs::write(dir.path().join("cert.pem"), &cert).unwrap();
        std::fs::write(dir.path().join("key.pem"), &key).unwrap();
        std::fs::write(dir.path().join("ca.pem"), "CA").unwrap();

        let material = TlsMaterial::load(&bus_config(dir.path())).await.unwrap();
        let tls = material.to_config();
        assert_eq!(tls.cert_chain.as_deref(), Some("CA"));

        let identity = tls.identity.unwrap();
        assert_eq!(identity.password, IDENTITY_PASSWORD);
        let parsed = Pkcs12::from_der(&identity.der)
            .unwrap()
            .parse2(&identity.password)
            .unwrap();
        assert_eq!(parsed.cert.unwrap().to_pem().unwrap(), cert);
        assert!(parsed.pkey.is_some());
    }

    #[tokio::test]
    async fn garbage_pem_is_an_identity_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cert.pem"), "CERT").unwrap();
        std::fs::write(dir.path().join("key.pem"), "KEY").unwrap();
        std::fs::write(dir.path().join("ca.pem"), "CA").unwrap();

        let err = TlsMaterial::load(&bus_config(dir.path())).await.err().unwrap();
        assert!(matches!(err, BusError::Identity(_)), "got {err:?}");
    }
}
