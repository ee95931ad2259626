use core_logic::setup_logger;
use dotenv::dotenv;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let _log_guard = setup_logger();

    match evm_boilerplate::launch(None, true).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("FAILED: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
