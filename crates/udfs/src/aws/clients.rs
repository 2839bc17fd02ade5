//! Secrets Manager client construction.

use aws_config::BehaviorVersion;

/// Build a Secrets Manager client from the standard AWS configuration chain.
///
/// Region and credentials resolve through the usual environment, profile and
/// instance-metadata providers. `endpoint` overrides the service URL, e.g.
/// for a local emulator.
pub async fn secrets_manager_client(endpoint: Option<&str>) -> aws_sdk_secretsmanager::Client {
    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

    let mut builder = aws_sdk_secretsmanager::config::Builder::from(&config);
    if let Some(endpoint) = endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    aws_sdk_secretsmanager::Client::from_conf(builder.build())
}
