//! Vendor status strings to canonical codes.
//! `None` means the string is unrecognized and the metric must not be emitted.

pub fn health_code(health: &str) -> Option<u8> {
    match health.to_lowercase().as_str() {
        "critical" => Some(0),
        "degraded" | "warning" => Some(1),
        "ok" => Some(2),
        "unknown" => Some(3),
        _ => None,
    }
}

pub fn state_code(state: &str) -> Option<u8> {
    match state.to_lowercase().as_str() {
        "available" | "enabled" => Some(0),
        "notapplicable" => Some(1),
        "unavailable" | "disabled" => Some(2),
        _ => None,
    }
}

// The three-valued status tables below match the vendor spelling exactly.

pub fn board_power_supply_code(status: &str) -> Option<u8> {
    match status {
        "NotApplicable" => Some(0),
        "SufficientPower" => Some(1),
        "UnderPowered" => Some(2),
        _ => None,
    }
}

pub fn power_brake_code(status: &str) -> Option<u8> {
    match status {
        "NotApplicable" => Some(0),
        "Released" => Some(1),
        "Set" => Some(2),
        _ => None,
    }
}

pub fn thermal_alert_code(status: &str) -> Option<u8> {
    match status {
        "NotApplicable" => Some(0),
        "NotPending" => Some(1),
        "Pending" => Some(2),
        _ => None,
    }
}
