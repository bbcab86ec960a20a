//! Leader election check.

use tracing::{debug, warn};

use crate::client::NomadApi;
use crate::error::NomadError;
use crate::report::{Report, Severity};

/// Check that the Nomad servers have elected a leader.
pub async fn check_leader<C: NomadApi + ?Sized>(client: &C) -> Report {
    match client.leader().await {
        Ok(leader) if leader.trim().is_empty() => {
            warn!("Nomad reports no leader");
            Report::status(Severity::Critical, "No Nomad leader elected")
        }
        Ok(leader) => {
            debug!(leader = %leader, "Nomad leader found");
            Report::status(Severity::Ok, format!("Nomad leader at {leader}"))
        }
        Err(e) => {
            warn!(error = %e, "Nomad leader lookup failed");
            Report::status(Severity::Critical, leader_message(&e))
        }
    }
}

/// Check output for a failed leader lookup.
fn leader_message(error: &NomadError) -> String {
    match error {
        NomadError::Connect { source, .. } => format!("Unable to contact Nomad: {source}"),
        NomadError::Client(e) => format!("Unable to contact Nomad: {e}"),
        NomadError::Decode { source, .. } => format!("Unable to parse JSON in response: {source}"),
        NomadError::Api { .. } => error.check_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_message_wording() {
        let source = serde_json::from_str::<String>("<html>").unwrap_err();
        let decode = NomadError::Decode {
            endpoint: "/v1/status/leader".to_string(),
            source,
        };
        assert!(leader_message(&decode).starts_with("Unable to parse JSON in response: "));

        let api = NomadError::Api {
            endpoint: "/v1/status/leader".to_string(),
            status: 500,
            body: "No cluster leader".to_string(),
        };
        assert_eq!(leader_message(&api), "Error 500: No cluster leader");
    }
}
