//! Lock verification. The lock API is not offered, so clients get a 404 and
//! fall back to working without locks.

use super::{GatewayError, GatewayEvent, GatewayResponse};

pub(super) fn verify_locks(_event: &GatewayEvent) -> Result<GatewayResponse, GatewayError> {
    Err(GatewayError::NotFound("locking is not supported".to_string()))
}
