use client_blockchain_core::TransportError;

const REVERT_PREFIX: &str = "execution reverted: ";

/// Extract the contract's reason from a framed revert string.
///
/// `"execution reverted: Battle already exists."` yields
/// `"Battle already exists"`. Unframed text yields `None`.
pub fn parse_revert_reason(raw: &str) -> Option<&str> {
    let reason = raw.strip_prefix(REVERT_PREFIX)?;
    let reason = reason.strip_suffix('.').unwrap_or(reason);
    (!reason.is_empty()).then_some(reason)
}

/// User-facing message for a failed submission.
pub fn failure_message(error: &TransportError) -> String {
    match error {
        TransportError::Reverted { reason } => parse_revert_reason(reason)
            .unwrap_or(reason.as_str())
            .to_string(),
        TransportError::OutOfGas { .. } => "Transaction ran out of gas".to_string(),
        TransportError::Rejected(_) => "Transaction rejected in wallet".to_string(),
        other => other.to_string(),
    }
}
