use aws_sdk_sts::Client as StsClient;
use clap::Parser;
use fis_lambda_experiment::{
    cli::Args, launch, load_aws_config, sts, FisClient, LaunchReport, RuntimeError,
};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(template_id) = err.created_template_id() {
                eprintln!("the experiment template {template_id} still exists; start it again or delete it");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), RuntimeError> {
    let params = args.into_parameters();
    params.validate()?;

    tracing::info!(
        lambda_arns = ?params.lambda_arns,
        action_id = %params.action_id,
        duration = %params.duration,
        percentage = params.percentage,
        "preparing experiment"
    );

    // Get AWS Configuration
    let config = load_aws_config(&params.region).await;

    // The CloudWatch log group lives in the caller's account
    let account_id = sts::resolve_account_id(&StsClient::new(&config), &params).await?;

    let fis = FisClient::new(&config);
    let outcome = launch(&fis, &params, account_id.as_deref()).await?;

    let report = LaunchReport::from(&outcome);
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("{}", report.hint());

    Ok(())
}
