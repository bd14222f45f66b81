use serde::{Deserialize, Serialize};

// ─── Node reading (gateway side view of /api/solar) ──────────────────────────

/// The subset of a node snapshot the gateway bills on. Fields a node omits
/// (or reports as null) fall back to zero / "UNKNOWN".
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NodeReading {
    #[serde(default)]
    power_w: Option<f64>,
    #[serde(default)]
    bandwidth_mbps: Option<f64>,
    #[serde(default)]
    status: Option<String>,
}

impl NodeReading {
    pub fn power_w(&self) -> f64 {
        self.power_w.unwrap_or(0.0)
    }

    pub fn bandwidth_mbps(&self) -> f64 {
        self.bandwidth_mbps.unwrap_or(0.0)
    }

    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("UNKNOWN")
    }
}

// ─── Credit-Control attribute record ─────────────────────────────────────────

/// Only interim updates are ever sent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CcRequestType {
    UpdateRequest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionIdType {
    EndUserE164,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionId {
    #[serde(rename = "Type")]
    pub id_type: SubscriptionIdType,
    #[serde(rename = "Data")]
    pub data: String,
}

/// Units are integers on the wire; real values are pre-scaled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestedServiceUnit {
    /// power_w × 100
    #[serde(rename = "CC-Output-Octets")]
    pub cc_output_octets: u64,
    /// bandwidth_mbps × 1 000 000
    #[serde(rename = "CC-Total-Octets")]
    pub cc_total_octets: u64,
}

/// In-memory stand-in for a Credit-Control-Request update. Never encoded to
/// the binary wire format, only logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChargingRecord {
    #[serde(rename = "Session-Id")]
    pub session_id: String,
    #[serde(rename = "Origin-Host")]
    pub origin_host: String,
    #[serde(rename = "CC-Request-Type")]
    pub request_type: CcRequestType,
    #[serde(rename = "Service-Context-Id")]
    pub service_context_id: String,
    #[serde(rename = "Subscription-Id")]
    pub subscription_id: SubscriptionId,
    #[serde(rename = "Requested-Service-Unit")]
    pub requested_service_unit: RequestedServiceUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_defaults_missing_and_null_fields() {
        let r: NodeReading =
            serde_json::from_str(r#"{"imsi": "1", "power_w": null}"#).unwrap();
        assert_eq!(r.power_w(), 0.0);
        assert_eq!(r.bandwidth_mbps(), 0.0);
        assert_eq!(r.status(), "UNKNOWN");
    }

    #[test]
    fn request_type_uses_diameter_names() {
        let v = serde_json::to_value(CcRequestType::UpdateRequest).unwrap();
        assert_eq!(v, "UPDATE_REQUEST");
        let v = serde_json::to_value(SubscriptionIdType::EndUserE164).unwrap();
        assert_eq!(v, "END_USER_E164");
    }
}
