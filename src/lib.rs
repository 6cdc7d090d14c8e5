#![deny(missing_docs)]
//! <fullname>Lambda FIS experiment launcher</fullname>
//!
//! Builds an AWS Fault Injection Simulator experiment template that
//! injects faults into Lambda functions, creates it, and optionally
//! starts the experiment. It performs one create call and at most one
//! start call, then hands control back to the operator.
use aws_smithy_types::retry::RetryConfig;
use aws_types::{region::Region, SdkConfig};

/// `cli` defines the command line
pub mod cli;

mod error;
pub use error::{Operation, RemoteError, RemoteErrorKind, RuntimeError, ValidationError};

mod fis;
pub use fis::{ExperimentResult, FisApi, FisClient, StartExperimentRequest, TemplateResult};

mod launcher;
pub use launcher::{create_template, launch, start_experiment, LaunchOutcome, LaunchReport, Stage};

/// `params` holds the experiment parameters and their defaults
pub mod params;
pub use params::ExperimentParameters;

/// `sts` includes helpers to work with AWS STS
pub mod sts;

/// `template` builds the experiment template request document
pub mod template;

#[cfg(test)]
mod test_util;

/// Load the AWS configuration for `region`.
/// Retries are disabled: every remote failure is reported after one attempt.
#[tracing::instrument]
pub async fn load_aws_config(region: &str) -> SdkConfig {
    aws_config::from_env()
        .region(Region::new(region.to_owned()))
        .retry_config(RetryConfig::disabled())
        .load()
        .await
}
