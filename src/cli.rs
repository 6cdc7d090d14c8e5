use crate::params::{
    parse_tag, ExperimentParameters, DEFAULT_ACTION_ID, DEFAULT_DESCRIPTION, DEFAULT_DURATION,
    DEFAULT_LOG_PREFIX, DEFAULT_PERCENTAGE, DEFAULT_REGION,
};
use clap::Parser;

/// Create an AWS FIS experiment template that injects faults into Lambda
/// functions, and start it.
#[derive(Debug, Parser)]
#[command(name = "fis_lambda_experiment", version)]
pub struct Args {
    /// ARN of the IAM role FIS assumes while running the experiment
    #[arg(long, env = "FIS_ROLE_ARN")]
    pub role_arn: String,

    /// ARNs of the target Lambda functions
    #[arg(long, num_args = 1.., required = true)]
    pub lambda_arns: Vec<String>,

    /// Experiment template description
    #[arg(long, default_value = DEFAULT_DESCRIPTION)]
    pub description: String,

    /// FIS action id
    #[arg(long, default_value = DEFAULT_ACTION_ID)]
    pub action_id: String,

    /// Experiment duration, ISO-8601 (PT2M is two minutes)
    #[arg(long, default_value = DEFAULT_DURATION)]
    pub duration: String,

    /// Share of invocations affected (0-100)
    #[arg(long, default_value_t = DEFAULT_PERCENTAGE, allow_negative_numbers = true)]
    pub percentage: i32,

    /// S3 bucket receiving the experiment logs
    #[arg(long, env = "FIS_LOG_BUCKET")]
    pub log_bucket: Option<String>,

    /// Key prefix for the experiment logs
    #[arg(long, default_value = DEFAULT_LOG_PREFIX)]
    pub log_prefix: String,

    /// AWS region
    #[arg(long, default_value = DEFAULT_REGION)]
    pub region: String,

    /// Only create the template, do not start the experiment
    #[arg(long)]
    pub no_start: bool,

    /// Extra template tag, KEY=VALUE (repeatable)
    #[arg(long = "tag", value_parser = parse_tag_arg)]
    pub tags: Vec<(String, String)>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Turn the command line into experiment parameters.
    pub fn into_parameters(self) -> ExperimentParameters {
        ExperimentParameters {
            role_arn: self.role_arn,
            lambda_arns: self.lambda_arns,
            description: self.description,
            action_id: self.action_id,
            duration: self.duration,
            percentage: self.percentage,
            log_bucket: self.log_bucket,
            log_prefix: self.log_prefix,
            region: self.region,
            start: !self.no_start,
            tags: self.tags.into_iter().collect(),
        }
    }
}

fn parse_tag_arg(raw: &str) -> Result<(String, String), String> {
    parse_tag(raw).map_err(|err| err.to_string())
}
