use crate::{
    error::RuntimeError,
    fis::{ExperimentResult, FisApi, StartExperimentRequest, TemplateResult},
    params::ExperimentParameters,
    template::{build_template_request, experiment_tags},
};
use serde::Serialize;
use std::fmt;

/// How far a launch got. Runs never move backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Nothing sent yet
    Idle,
    /// The create call is in flight
    TemplateRequested,
    /// The template exists
    TemplateCreated,
    /// The experiment was started
    ExperimentStarted,
    /// A call failed
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::TemplateRequested => "template-requested",
            Stage::TemplateCreated => "template-created",
            Stage::ExperimentStarted => "experiment-started",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// `LaunchOutcome` is the terminal state of a successful run
#[derive(Clone, Debug, PartialEq)]
pub enum LaunchOutcome {
    /// Only the template was created
    TemplateCreated(TemplateResult),
    /// The template was created and the experiment started
    ExperimentStarted {
        /// Created template
        template: TemplateResult,
        /// Started experiment
        experiment: ExperimentResult,
    },
}

impl LaunchOutcome {
    /// Stage the run ended in.
    pub fn stage(&self) -> Stage {
        match self {
            LaunchOutcome::TemplateCreated(_) => Stage::TemplateCreated,
            LaunchOutcome::ExperimentStarted { .. } => Stage::ExperimentStarted,
        }
    }

    /// Created template.
    pub fn template(&self) -> &TemplateResult {
        match self {
            LaunchOutcome::TemplateCreated(template) => template,
            LaunchOutcome::ExperimentStarted { template, .. } => template,
        }
    }

    /// Started experiment, if the run got that far.
    pub fn experiment(&self) -> Option<&ExperimentResult> {
        match self {
            LaunchOutcome::TemplateCreated(_) => None,
            LaunchOutcome::ExperimentStarted { experiment, .. } => Some(experiment),
        }
    }
}

/// `LaunchReport` is what the operator gets on stdout
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReport {
    /// Created template id
    pub template_id: String,
    /// Template creation time in epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_creation_time: Option<i64>,
    /// Started experiment id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    /// Initial experiment state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_state: Option<String>,
    /// Reason attached to the initial experiment state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_state_reason: Option<String>,
}

impl From<&LaunchOutcome> for LaunchReport {
    fn from(outcome: &LaunchOutcome) -> Self {
        LaunchReport {
            template_id: outcome.template().id.clone(),
            template_creation_time: outcome.template().creation_time,
            experiment_id: outcome.experiment().map(|e| e.id.clone()),
            experiment_state: outcome.experiment().map(|e| e.state.clone()),
            experiment_state_reason: outcome.experiment().and_then(|e| e.reason.clone()),
        }
    }
}

impl LaunchReport {
    /// Next command the operator is likely to run.
    pub fn hint(&self) -> String {
        match &self.experiment_id {
            Some(id) => format!("monitor the experiment with: aws fis get-experiment --id {id}"),
            None => format!(
                "start the experiment with: aws fis start-experiment --experiment-template-id {}",
                self.template_id
            ),
        }
    }
}

/// Build the template request and submit it once.
/// Nothing is sent when the parameters are invalid.
#[tracing::instrument(skip(client, params), fields(targets = params.lambda_arns.len()))]
pub async fn create_template(
    client: &impl FisApi,
    params: &ExperimentParameters,
    account_id: Option<&str>,
) -> Result<TemplateResult, RuntimeError> {
    let request = build_template_request(params, account_id)?;

    if !params.is_known_action() {
        tracing::warn!(action_id = %params.action_id, "action id is not a known lambda fault action");
    }
    match request.to_json() {
        Ok(document) => tracing::debug!(%document, "experiment template request"),
        Err(err) => tracing::debug!(error = %err, "experiment template request is not printable"),
    }

    tracing::info!(stage = %Stage::TemplateRequested, "submitting experiment template");
    let template = client
        .create_experiment_template(&request)
        .await
        .map_err(RuntimeError::CreateTemplate)?;

    tracing::info!(stage = %Stage::TemplateCreated, template_id = %template.id, "experiment template created");
    Ok(template)
}

/// Start one experiment from an existing template. The template is
/// never deleted when this fails.
#[tracing::instrument(skip(client))]
pub async fn start_experiment(
    client: &impl FisApi,
    template_id: &str,
) -> Result<ExperimentResult, RuntimeError> {
    let request = StartExperimentRequest {
        experiment_template_id: template_id.to_owned(),
        tags: experiment_tags(),
    };

    let experiment = client
        .start_experiment(&request)
        .await
        .map_err(|source| RuntimeError::StartExperiment {
            template_id: template_id.to_owned(),
            source,
        })?;

    tracing::info!(
        stage = %Stage::ExperimentStarted,
        experiment_id = %experiment.id,
        state = %experiment.state,
        "experiment started"
    );
    Ok(experiment)
}

/// Create the template and, when asked to, start the experiment.
/// Returns as soon as the experiment is in its starting state.
#[tracing::instrument(skip(client, params), fields(start = params.start))]
pub async fn launch(
    client: &impl FisApi,
    params: &ExperimentParameters,
    account_id: Option<&str>,
) -> Result<LaunchOutcome, RuntimeError> {
    tracing::debug!(stage = %Stage::Idle, "launching experiment");

    // The caller reports the error itself.
    let result = run(client, params, account_id).await;
    if result.is_err() {
        tracing::debug!(stage = %Stage::Failed, "experiment launch stopped");
    }
    result
}

async fn run(
    client: &impl FisApi,
    params: &ExperimentParameters,
    account_id: Option<&str>,
) -> Result<LaunchOutcome, RuntimeError> {
    let template = create_template(client, params, account_id).await?;

    if !params.start {
        return Ok(LaunchOutcome::TemplateCreated(template));
    }

    let experiment = start_experiment(client, &template.id).await?;
    Ok(LaunchOutcome::ExperimentStarted {
        template,
        experiment,
    })
}
