//! Builders for the experiment template request document.
//!
//! Everything here is pure: the same parameters always produce the same
//! document, down to the serialized bytes.
use crate::{error::ValidationError, params::ExperimentParameters};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name of the single target of the template.
pub const TARGET_NAME: &str = "lambda-targets";
/// Name of the single action of the template.
pub const ACTION_NAME: &str = "lambda-action";
/// Key binding the action to its target.
pub const ACTION_TARGET_KEY: &str = "Targets";
/// FIS resource type for Lambda functions.
pub const LAMBDA_RESOURCE_TYPE: &str = "aws:lambda:function";
/// Every listed resource is targeted, without sampling.
pub const SELECTION_MODE_ALL: &str = "ALL";
/// Log schema version expected by FIS.
pub const LOG_SCHEMA_VERSION: i32 = 1;
/// Stop condition source meaning "never stop early".
pub const NO_STOP_CONDITION: &str = "none";

/// `TargetSpec` selects the Lambda functions the action applies to
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    /// Always `aws:lambda:function`
    pub resource_type: String,
    /// Function ARNs, exactly as supplied
    pub resource_arns: Vec<String>,
    /// Always `ALL`
    pub selection_mode: String,
}

/// `ActionSpec` binds the fault action to the target
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSpec {
    /// FIS action id
    pub action_id: String,
    /// Target bindings, `Targets` → target name
    pub targets: BTreeMap<String, String>,
    /// Action parameters; only `percentage`
    pub parameters: BTreeMap<String, String>,
}

/// `StopCondition` of the template
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StopCondition {
    /// Condition source, `none` for the no-op condition
    pub source: String,
}

/// `S3Destination` receives the experiment logs
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Destination {
    /// Bucket name
    pub bucket_name: String,
    /// Key prefix
    pub prefix: String,
}

/// `CloudWatchLogsDestination` receives the experiment logs
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudWatchLogsDestination {
    /// Log group ARN
    pub log_group_arn: String,
}

/// `LogConfig` of the template, only built when a bucket is given
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// CloudWatch Logs destination, when the account id is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_watch_logs_configuration: Option<CloudWatchLogsDestination>,
    /// S3 destination
    pub s3_configuration: S3Destination,
    /// Log schema version
    pub log_schema_version: i32,
}

/// `ExperimentTemplateRequest` is the document sent to `CreateExperimentTemplate`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentTemplateRequest {
    /// Template description
    pub description: String,
    /// IAM role assumed by FIS
    pub role_arn: String,
    /// Always the single no-op stop condition
    pub stop_conditions: Vec<StopCondition>,
    /// Targets by name
    pub targets: BTreeMap<String, TargetSpec>,
    /// Actions by name
    pub actions: BTreeMap<String, ActionSpec>,
    /// Logging block; absent unless a bucket was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<LogConfig>,
    /// Template tags
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ExperimentTemplateRequest {
    /// The request document as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Build the target selecting every supplied Lambda function.
pub fn build_target(lambda_arns: &[String]) -> Result<TargetSpec, ValidationError> {
    if lambda_arns.is_empty() {
        return Err(ValidationError::EmptyTargets);
    }
    if let Some(position) = lambda_arns.iter().position(|a| a.trim().is_empty()) {
        return Err(ValidationError::BlankTarget(position));
    }

    Ok(TargetSpec {
        resource_type: LAMBDA_RESOURCE_TYPE.into(),
        resource_arns: lambda_arns.to_vec(),
        selection_mode: SELECTION_MODE_ALL.into(),
    })
}

/// Build the fault action bound to [`TARGET_NAME`].
pub fn build_action(action_id: &str, percentage: i32) -> Result<ActionSpec, ValidationError> {
    if !(0..=100).contains(&percentage) {
        return Err(ValidationError::PercentageOutOfRange(percentage));
    }

    Ok(ActionSpec {
        action_id: action_id.into(),
        targets: BTreeMap::from([(ACTION_TARGET_KEY.to_owned(), TARGET_NAME.to_owned())]),
        parameters: BTreeMap::from([("percentage".to_owned(), percentage.to_string())]),
    })
}

/// Build the logging block. Without a bucket there is no logging at all.
pub fn build_log_config(
    bucket: Option<&str>,
    prefix: &str,
    region: &str,
    account_id: Option<&str>,
) -> Option<LogConfig> {
    let bucket = bucket?;

    Some(LogConfig {
        cloud_watch_logs_configuration: account_id.map(|account| CloudWatchLogsDestination {
            log_group_arn: format!("arn:aws:logs:{region}:{account}:log-group:/aws/fis/*"),
        }),
        s3_configuration: S3Destination {
            bucket_name: bucket.into(),
            prefix: prefix.into(),
        },
        log_schema_version: LOG_SCHEMA_VERSION,
    })
}

/// Tags put on every template: defaults, the duration, then the caller's own.
pub fn template_tags(params: &ExperimentParameters) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::from([
        ("Environment".to_owned(), "test".to_owned()),
        ("ManagedBy".to_owned(), "fis-automation".to_owned()),
        ("Duration".to_owned(), params.duration.clone()),
    ]);
    tags.extend(params.tags.clone());
    tags
}

/// Tags put on every started experiment.
pub fn experiment_tags() -> BTreeMap<String, String> {
    BTreeMap::from([("CreatedBy".to_owned(), "fis-script".to_owned())])
}

/// Assemble the full template request. Fails without side effects
/// when the parameters are invalid.
pub fn build_template_request(
    params: &ExperimentParameters,
    account_id: Option<&str>,
) -> Result<ExperimentTemplateRequest, ValidationError> {
    params.validate()?;

    let target = build_target(&params.lambda_arns)?;
    let action = build_action(&params.action_id, params.percentage)?;

    Ok(ExperimentTemplateRequest {
        description: params.description.clone(),
        role_arn: params.role_arn.clone(),
        stop_conditions: vec![StopCondition {
            source: NO_STOP_CONDITION.into(),
        }],
        targets: BTreeMap::from([(TARGET_NAME.to_owned(), target)]),
        actions: BTreeMap::from([(ACTION_NAME.to_owned(), action)]),
        log_configuration: build_log_config(
            params.log_bucket.as_deref(),
            &params.log_prefix,
            &params.region,
            account_id,
        ),
        tags: template_tags(params),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    const ROLE_ARN: &str = "arn:aws:iam::111111111111:role/FisLambdaExperimentRole";

    fn lambda_arn(name: &str) -> String {
        format!("arn:aws:lambda:ap-northeast-1:111111111111:function:{name}")
    }

    #[test]
    fn test_build_default_request_document() {
        let params = ExperimentParameters::new(ROLE_ARN, vec![lambda_arn("orders")]);

        let request = build_template_request(&params, None).expect("valid parameters");

        assert_eq!(
            json!({
                "description": "Lambda fault injection experiment",
                "roleArn": ROLE_ARN,
                "stopConditions": [{"source": "none"}],
                "targets": {
                    "lambda-targets": {
                        "resourceType": "aws:lambda:function",
                        "resourceArns": [lambda_arn("orders")],
                        "selectionMode": "ALL"
                    }
                },
                "actions": {
                    "lambda-action": {
                        "actionId": "aws:fis:inject-api-unavailable-error",
                        "targets": {"Targets": "lambda-targets"},
                        "parameters": {"percentage": "100"}
                    }
                },
                "tags": {
                    "Duration": "PT2M",
                    "Environment": "test",
                    "ManagedBy": "fis-automation"
                }
            }),
            serde_json::to_value(&request).unwrap()
        );
    }

    #[test]
    fn test_resource_arns_are_kept_verbatim() {
        let arns = vec![lambda_arn("b"), lambda_arn("a"), lambda_arn("b")];
        let params = ExperimentParameters::new(ROLE_ARN, arns.clone());

        let request = build_template_request(&params, None).unwrap();

        assert_eq!(arns, request.targets[TARGET_NAME].resource_arns);
    }

    #[test]
    fn test_duration_is_not_an_action_parameter() {
        let params = ExperimentParameters {
            duration: "PT10M".into(),
            percentage: 25,
            ..ExperimentParameters::new(ROLE_ARN, vec![lambda_arn("orders")])
        };

        let request = build_template_request(&params, None).unwrap();
        let action = &request.actions[ACTION_NAME];

        assert_eq!(1, action.parameters.len());
        assert_eq!("25", action.parameters["percentage"]);
        assert_eq!("PT10M", request.tags["Duration"]);
    }

    #[test]
    fn test_out_of_range_percentage_is_rejected() {
        let params = ExperimentParameters {
            percentage: 150,
            ..ExperimentParameters::new(ROLE_ARN, vec![lambda_arn("orders")])
        };

        assert_eq!(
            Err(ValidationError::PercentageOutOfRange(150)),
            build_template_request(&params, None)
        );
        assert_eq!(
            Err(ValidationError::PercentageOutOfRange(-1)),
            build_action("aws:fis:inject-api-throttle-error", -1)
        );
    }

    #[test]
    fn test_empty_targets_are_rejected() {
        assert_eq!(Err(ValidationError::EmptyTargets), build_target(&[]));
    }

    #[test]
    fn test_log_configuration_presence() {
        assert_eq!(None, build_log_config(None, "fis-logs", "ap-northeast-1", Some("111111111111")));

        let params = ExperimentParameters::new(ROLE_ARN, vec![lambda_arn("orders")]);
        let without_bucket = serde_json::to_value(build_template_request(&params, None).unwrap()).unwrap();
        assert!(without_bucket.get("logConfiguration").is_none());

        let params = ExperimentParameters {
            log_bucket: Some("chaos-logs".into()),
            ..params
        };
        let with_bucket = build_template_request(&params, None).unwrap();
        assert_eq!(
            json!({
                "s3Configuration": {"bucketName": "chaos-logs", "prefix": "fis-logs"},
                "logSchemaVersion": 1
            }),
            serde_json::to_value(&with_bucket.log_configuration).unwrap()
        );
    }

    #[test]
    fn test_log_configuration_with_account() {
        let config = build_log_config(Some("chaos-logs"), "runs", "eu-west-1", Some("111111111111"))
            .expect("bucket is set");

        assert_eq!(
            Some(CloudWatchLogsDestination {
                log_group_arn: "arn:aws:logs:eu-west-1:111111111111:log-group:/aws/fis/*".into()
            }),
            config.cloud_watch_logs_configuration
        );
        assert_eq!("runs", config.s3_configuration.prefix);
        assert_eq!(LOG_SCHEMA_VERSION, config.log_schema_version);
    }

    #[test]
    fn test_caller_tags_override_defaults() {
        let params = ExperimentParameters {
            tags: BTreeMap::from([
                ("Environment".to_owned(), "staging".to_owned()),
                ("Team".to_owned(), "payments".to_owned()),
            ]),
            ..ExperimentParameters::new(ROLE_ARN, vec![lambda_arn("orders")])
        };

        let tags = template_tags(&params);

        assert_eq!("staging", tags["Environment"]);
        assert_eq!("payments", tags["Team"]);
        assert_eq!("fis-automation", tags["ManagedBy"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let params = ExperimentParameters {
            log_bucket: Some("chaos-logs".into()),
            tags: BTreeMap::from([
                ("b".to_owned(), "2".to_owned()),
                ("a".to_owned(), "1".to_owned()),
            ]),
            ..ExperimentParameters::new(ROLE_ARN, vec![lambda_arn("a"), lambda_arn("b")])
        };

        let first = build_template_request(&params, Some("111111111111")).unwrap();
        let second = build_template_request(&params, Some("111111111111")).unwrap();

        let document = first.to_json().expect("request serializes");
        assert_eq!(document, second.to_json().expect("request serializes"));
        assert_eq!(serde_json::to_string(&first).unwrap(), document);
        assert!(document.contains(r#""logConfiguration":"#));
    }
}
