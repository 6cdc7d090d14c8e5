use crate::{error::RuntimeError, params::ExperimentParameters};
use aws_sdk_sts::{Client, Error};

/// Account id used for the CloudWatch log group of the experiment.
/// STS is only called when the experiment logs to a bucket.
#[tracing::instrument(skip(client, params))]
pub async fn resolve_account_id(
    client: &Client,
    params: &ExperimentParameters,
) -> Result<Option<String>, RuntimeError> {
    match params.log_bucket {
        Some(_) => caller_account_id(client).await.map(Some),
        None => Ok(None),
    }
}

/// Find the account the credentials belong to.
#[tracing::instrument(skip(client))]
pub async fn caller_account_id(client: &Client) -> Result<String, RuntimeError> {
    tracing::info!("resolving caller identity");

    let identity = client
        .get_caller_identity()
        .send()
        .await
        .map_err(Error::from)?;

    match identity.account {
        Some(account) if !account.is_empty() => Ok(account),
        _ => Err(RuntimeError::MissingAccount),
    }
}
