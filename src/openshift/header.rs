//! Request headers for the OpenShift image API.

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue,
};
use secrecy::ExposeSecret;

use crate::config::OpenShiftConfig;
use crate::openshift::target::STAGE_NAMESPACE;

/// Pick the bearer token for `namespace`. Only an exact stage match uses the stage token.
pub fn select_token<'a>(config: &'a OpenShiftConfig, namespace: &str) -> &'a str {
    if namespace == STAGE_NAMESPACE {
        config.stage_token.expose_secret()
    } else {
        config.token.expose_secret()
    }
}

/// Build the fixed header set for a request against `namespace`.
pub fn build_header(
    config: &OpenShiftConfig,
    namespace: &str,
) -> Result<HeaderMap, InvalidHeaderValue> {
    let token = select_token(config, namespace).trim();

    let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}
