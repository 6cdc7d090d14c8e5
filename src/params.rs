use crate::error::ValidationError;
use std::collections::BTreeMap;

/// Description used when none is given.
pub const DEFAULT_DESCRIPTION: &str = "Lambda fault injection experiment";
/// Fault injected when no action id is given.
pub const DEFAULT_ACTION_ID: &str = "aws:fis:inject-api-unavailable-error";
/// Experiment duration used when none is given.
pub const DEFAULT_DURATION: &str = "PT2M";
/// Share of invocations affected when no percentage is given.
pub const DEFAULT_PERCENTAGE: i32 = 100;
/// S3 key prefix for experiment logs.
pub const DEFAULT_LOG_PREFIX: &str = "fis-logs";
/// Region used when none is given.
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Fault injection actions known to work against Lambda functions.
pub const SUPPORTED_ACTIONS: [&str; 3] = [
    "aws:fis:inject-api-unavailable-error",
    "aws:fis:inject-api-throttle-error",
    "aws:fis:inject-api-internal-error",
];

/// `ExperimentParameters` holds everything needed to build
/// and launch one experiment. It's never mutated once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentParameters {
    /// IAM role assumed by FIS while running the experiment
    pub role_arn: String,
    /// Lambda functions targeted by the fault, in the given order
    pub lambda_arns: Vec<String>,
    /// Template description
    pub description: String,
    /// FIS action id
    pub action_id: String,
    /// ISO-8601 experiment duration
    pub duration: String,
    /// Share of invocations affected, between 0 and 100
    pub percentage: i32,
    /// Bucket receiving experiment logs; no logging when absent
    pub log_bucket: Option<String>,
    /// Key prefix for experiment logs in the bucket
    pub log_prefix: String,
    /// AWS region
    pub region: String,
    /// Start the experiment once the template exists
    pub start: bool,
    /// Extra template tags, merged over the defaults
    pub tags: BTreeMap<String, String>,
}

impl ExperimentParameters {
    /// Parameters for the given role and targets, with every other option at its default.
    pub fn new(role_arn: impl Into<String>, lambda_arns: Vec<String>) -> Self {
        ExperimentParameters {
            role_arn: role_arn.into(),
            lambda_arns,
            description: DEFAULT_DESCRIPTION.into(),
            action_id: DEFAULT_ACTION_ID.into(),
            duration: DEFAULT_DURATION.into(),
            percentage: DEFAULT_PERCENTAGE,
            log_bucket: None,
            log_prefix: DEFAULT_LOG_PREFIX.into(),
            region: DEFAULT_REGION.into(),
            start: true,
            tags: BTreeMap::new(),
        }
    }

    /// Check the parameters that can be checked without calling AWS.
    /// ARN syntax and existence are left to the service.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.role_arn.trim().is_empty() {
            return Err(ValidationError::BlankRoleArn);
        }

        if self.lambda_arns.is_empty() {
            return Err(ValidationError::EmptyTargets);
        }

        if let Some(position) = self.lambda_arns.iter().position(|a| a.trim().is_empty()) {
            return Err(ValidationError::BlankTarget(position));
        }

        if self.action_id.trim().is_empty() {
            return Err(ValidationError::BlankActionId);
        }

        if !(0..=100).contains(&self.percentage) {
            return Err(ValidationError::PercentageOutOfRange(self.percentage));
        }

        if !is_iso8601_duration(&self.duration) {
            return Err(ValidationError::InvalidDuration(self.duration.clone()));
        }

        Ok(())
    }

    /// Whether the action id is one of the known Lambda fault actions.
    pub fn is_known_action(&self) -> bool {
        SUPPORTED_ACTIONS.contains(&self.action_id.as_str())
    }
}

/// Parse a `KEY=VALUE` tag.
pub fn parse_tag(raw: &str) -> Result<(String, String), ValidationError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(ValidationError::InvalidTag(raw.to_owned())),
    }
}

/// Accepts `P[nY][nM][nW][nD][T[nH][nM][nS]]` with at least one component.
/// Only the seconds component may carry a fraction.
fn is_iso8601_duration(value: &str) -> bool {
    let rest = match value.strip_prefix('P') {
        Some(rest) if !rest.is_empty() => rest,
        _ => return false,
    };

    let (date, time) = match rest.split_once('T') {
        Some((_, "")) => return false,
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    components_valid(date, "YMWD", false)
        && time.map_or(true, |time| components_valid(time, "HMS", true))
}

fn components_valid(part: &str, designators: &str, fraction_seconds: bool) -> bool {
    let mut number = String::new();
    let mut allowed = designators;

    for c in part.chars() {
        if c.is_ascii_digit() || (c == '.' && fraction_seconds) {
            number.push(c);
            continue;
        }

        // Designators must appear once each and in order.
        let position = match allowed.find(c) {
            Some(position) => position,
            None => return false,
        };
        if number.is_empty() || number.starts_with('.') || number.ends_with('.') {
            return false;
        }
        if number.contains('.') && c != 'S' {
            return false;
        }

        number.clear();
        allowed = &allowed[position + 1..];
    }

    number.is_empty()
}
