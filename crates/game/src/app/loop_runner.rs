use std::process::ExitCode;

use engine::run_sim;
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        mut session,
        mut input,
    } = app;
    if let Err(err) = run_sim(config, &mut session, &mut input) {
        error!(error = %err, "startup_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
