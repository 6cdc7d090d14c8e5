use crate::{
    error::{Operation, RemoteError},
    template::{ExperimentTemplateRequest, LogConfig},
};
use aws_sdk_fis::{
    error::{CreateExperimentTemplateError, StartExperimentError},
    model::{
        CreateExperimentTemplateActionInput, CreateExperimentTemplateLogConfigurationInput,
        CreateExperimentTemplateStopConditionInput, CreateExperimentTemplateTargetInput,
        ExperimentTemplateCloudWatchLogsLogConfigurationInput,
        ExperimentTemplateS3LogConfigurationInput,
    },
    Client,
};
use aws_smithy_http::result::SdkError;
use serde::Serialize;
use std::collections::BTreeMap;

/// `TemplateResult` identifies a template created by FIS
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResult {
    /// Template id
    pub id: String,
    /// Creation time in epoch seconds, when returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<i64>,
}

/// `StartExperimentRequest` is sent to `StartExperiment`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExperimentRequest {
    /// Template to run
    pub experiment_template_id: String,
    /// Experiment tags
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// `ExperimentResult` identifies an experiment started by FIS
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentResult {
    /// Experiment id
    pub id: String,
    /// Initial lifecycle state, such as `initiating`
    pub state: String,
    /// Reason attached to the state, when returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The two FIS calls the launcher needs.
#[allow(async_fn_in_trait)]
pub trait FisApi {
    /// Create an experiment template.
    async fn create_experiment_template(
        &self,
        request: &ExperimentTemplateRequest,
    ) -> Result<TemplateResult, RemoteError>;

    /// Start an experiment from an existing template.
    async fn start_experiment(
        &self,
        request: &StartExperimentRequest,
    ) -> Result<ExperimentResult, RemoteError>;
}

/// FIS client implementation.
pub struct FisClient {
    inner: Client,
    client_token: Option<String>,
}

impl FisClient {
    /// Initialize the FIS client.
    #[tracing::instrument(skip(config))]
    pub fn new(config: &aws_types::SdkConfig) -> FisClient {
        tracing::info!("Initializing FIS client");
        FisClient {
            inner: Client::new(config),
            client_token: None,
        }
    }

    /// Use a fixed idempotency token instead of letting the SDK generate one.
    pub fn with_client_token(mut self, token: impl Into<String>) -> FisClient {
        self.client_token = Some(token.into());
        self
    }
}

impl FisApi for FisClient {
    #[tracing::instrument(skip(self, request), fields(description = %request.description))]
    async fn create_experiment_template(
        &self,
        request: &ExperimentTemplateRequest,
    ) -> Result<TemplateResult, RemoteError> {
        tracing::info!("creating experiment template");
        let operation = Operation::CreateExperimentTemplate;

        let mut builder = self
            .inner
            .create_experiment_template()
            .set_client_token(self.client_token.clone())
            .description(&request.description)
            .role_arn(&request.role_arn)
            .set_log_configuration(request.log_configuration.as_ref().map(log_configuration));

        for condition in &request.stop_conditions {
            builder = builder.stop_conditions(
                CreateExperimentTemplateStopConditionInput::builder()
                    .source(&condition.source)
                    .build(),
            );
        }

        for (name, target) in &request.targets {
            builder = builder.targets(
                name,
                CreateExperimentTemplateTargetInput::builder()
                    .resource_type(&target.resource_type)
                    .set_resource_arns(Some(target.resource_arns.clone()))
                    .selection_mode(&target.selection_mode)
                    .build(),
            );
        }

        for (name, action) in &request.actions {
            let mut input = CreateExperimentTemplateActionInput::builder().action_id(&action.action_id);
            for (key, target) in &action.targets {
                input = input.targets(key, target);
            }
            for (key, value) in &action.parameters {
                input = input.parameters(key, value);
            }
            builder = builder.actions(name, input.build());
        }

        for (key, value) in &request.tags {
            builder = builder.tags(key, value);
        }

        let output = builder.send().await.map_err(|err| {
            remote_error(operation, err, CreateExperimentTemplateError::meta)
        })?;

        let template = output
            .experiment_template()
            .ok_or_else(|| RemoteError::missing_field(operation, "experimentTemplate"))?;
        let id = template
            .id()
            .ok_or_else(|| RemoteError::missing_field(operation, "experimentTemplate.id"))?;

        Ok(TemplateResult {
            id: id.to_owned(),
            creation_time: template.creation_time().map(|t| t.secs()),
        })
    }

    #[tracing::instrument(skip(self, request), fields(template_id = %request.experiment_template_id))]
    async fn start_experiment(
        &self,
        request: &StartExperimentRequest,
    ) -> Result<ExperimentResult, RemoteError> {
        tracing::info!("starting experiment");
        let operation = Operation::StartExperiment;

        let mut builder = self
            .inner
            .start_experiment()
            .set_client_token(self.client_token.clone())
            .experiment_template_id(&request.experiment_template_id);

        for (key, value) in &request.tags {
            builder = builder.tags(key, value);
        }

        let output = builder
            .send()
            .await
            .map_err(|err| remote_error(operation, err, StartExperimentError::meta))?;

        let experiment = output
            .experiment()
            .ok_or_else(|| RemoteError::missing_field(operation, "experiment"))?;
        let id = experiment
            .id()
            .ok_or_else(|| RemoteError::missing_field(operation, "experiment.id"))?;
        let state = experiment
            .state()
            .and_then(|s| s.status())
            .ok_or_else(|| RemoteError::missing_field(operation, "experiment.state.status"))?;

        Ok(ExperimentResult {
            id: id.to_owned(),
            state: state.as_str().to_owned(),
            reason: experiment
                .state()
                .and_then(|s| s.reason())
                .map(str::to_owned),
        })
    }
}

fn log_configuration(config: &LogConfig) -> CreateExperimentTemplateLogConfigurationInput {
    CreateExperimentTemplateLogConfigurationInput::builder()
        .set_cloud_watch_logs_configuration(config.cloud_watch_logs_configuration.as_ref().map(
            |cw| {
                ExperimentTemplateCloudWatchLogsLogConfigurationInput::builder()
                    .log_group_arn(&cw.log_group_arn)
                    .build()
            },
        ))
        .s3_configuration(
            ExperimentTemplateS3LogConfigurationInput::builder()
                .bucket_name(&config.s3_configuration.bucket_name)
                .prefix(&config.s3_configuration.prefix)
                .build(),
        )
        .log_schema_version(config.log_schema_version)
        .build()
}

/// Keep the service error code and message as they came back.
fn remote_error<E>(
    operation: Operation,
    err: SdkError<E>,
    meta: fn(&E) -> &aws_smithy_types::Error,
) -> RemoteError
where
    E: std::error::Error + 'static,
{
    match err {
        SdkError::ServiceError { err, .. } => {
            let meta = meta(&err);
            let message = meta
                .message()
                .map(str::to_owned)
                .unwrap_or_else(|| err.to_string());
            RemoteError::service(operation, meta.code().map(str::to_owned), message)
        }
        SdkError::ConstructionFailure(err) => RemoteError::local(operation, err.to_string()),
        other => RemoteError::transport(operation, other.to_string()),
    }
}
