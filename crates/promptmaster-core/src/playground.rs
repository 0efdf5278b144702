use tracing::warn;

use crate::gateway::ModelGateway;

pub const EXECUTION_FAILED: &str = "Execution failed. Please try again.";

/// Run a prompt once against the model. Failures become [`EXECUTION_FAILED`].
pub async fn execute(gateway: &ModelGateway, prompt: &str, test_input: &str) -> String {
    match gateway.execute(prompt, test_input).await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "Playground execution failed");
            EXECUTION_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::testing::{gateway, ScriptedBackend};

    #[tokio::test]
    async fn test_returns_raw_output() {
        let (gateway, _) = gateway(ScriptedBackend::new().reply(Ok("  raw output \n")));
        assert_eq!(execute(&gateway, "p", "").await, "  raw output \n");
    }

    #[tokio::test]
    async fn test_failure_returns_fixed_string() {
        let error = GatewayError::Api { status: 500, body: "x".to_string() };
        let (gateway, _) = gateway(ScriptedBackend::new().reply(Err(error)));
        assert_eq!(execute(&gateway, "p", "input").await, EXECUTION_FAILED);
    }
}
