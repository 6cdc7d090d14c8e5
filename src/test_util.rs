use crate::{
    error::RemoteError,
    fis::{ExperimentResult, FisApi, StartExperimentRequest, TemplateResult},
    template::ExperimentTemplateRequest,
};
use aws_sdk_fis::Credentials;
use aws_smithy_types::retry::RetryConfig;
use aws_types::{region::Region, SdkConfig};
use std::cell::RefCell;

/// Configuration for mocking AWS SDK clients
pub async fn get_mock_config() -> SdkConfig {
    aws_config::from_env()
        .region(Region::new("us-west-1"))
        .retry_config(RetryConfig::disabled())
        .credentials_provider(Credentials::new(
            "accesskey",
            "privatekey",
            None,
            None,
            "dummy",
        ))
        .load()
        .await
}

/// Base request builder for the AWS SDK calls
pub fn get_request_builder(service: &str, path: &str) -> http::request::Builder {
    http::Request::builder()
        .method("POST")
        .uri(format!("https://{service}.us-west-1.amazonaws.com/{path}"))
}

/// Calls received by [`StubFis`]
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    /// `CreateExperimentTemplate` with the submitted document
    Create(ExperimentTemplateRequest),
    /// `StartExperiment` with the submitted request
    Start(StartExperimentRequest),
}

/// FIS stand-in that records calls and replays canned answers
pub struct StubFis {
    create: Result<TemplateResult, RemoteError>,
    start: Result<ExperimentResult, RemoteError>,
    calls: RefCell<Vec<Call>>,
}

impl StubFis {
    /// Stub where both calls succeed
    pub fn new() -> StubFis {
        StubFis {
            create: Ok(TemplateResult {
                id: "EXTabc123".into(),
                creation_time: Some(1_700_000_000),
            }),
            start: Ok(ExperimentResult {
                id: "EXPxyz789".into(),
                state: "initiating".into(),
                reason: None,
            }),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Make the create call fail
    pub fn failing_create(mut self, err: RemoteError) -> StubFis {
        self.create = Err(err);
        self
    }

    /// Make the start call fail
    pub fn failing_start(mut self, err: RemoteError) -> StubFis {
        self.start = Err(err);
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Number of start calls received so far
    pub fn start_calls(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Start(_)))
            .count()
    }
}

impl FisApi for StubFis {
    async fn create_experiment_template(
        &self,
        request: &ExperimentTemplateRequest,
    ) -> Result<TemplateResult, RemoteError> {
        self.calls.borrow_mut().push(Call::Create(request.clone()));
        self.create.clone()
    }

    async fn start_experiment(
        &self,
        request: &StartExperimentRequest,
    ) -> Result<ExperimentResult, RemoteError> {
        self.calls.borrow_mut().push(Call::Start(request.clone()));
        self.start.clone()
    }
}
