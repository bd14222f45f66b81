//! Telemetry → Credit-Control update translation.

use chrono::{DateTime, Utc};

use crate::models::charging::{
    CcRequestType, ChargingRecord, RequestedServiceUnit, SubscriptionId, SubscriptionIdType,
};

/// Power (W) to CC-Output-Octets.
pub const POWER_SCALE: f64 = 100.0;
/// Throughput (Mbps) to CC-Total-Octets.
pub const THROUGHPUT_SCALE: f64 = 1_000_000.0;

/// Gateway identity stamped on every record.
#[derive(Debug, Clone)]
pub struct ChargingIdentity {
    pub origin_host: String,
    pub service_context_id: String,
}

/// `sess-{hostname}-{epoch seconds}`. Two polls of the same node inside one
/// second produce the same id.
pub fn session_id(hostname: &str, now: DateTime<Utc>) -> String {
    format!("sess-{}-{}", hostname, now.timestamp())
}

fn to_units(value: f64, scale: f64) -> u64 {
    let scaled = (value * scale).round();
    if scaled.is_finite() && scaled > 0.0 { scaled as u64 } else { 0 }
}

pub fn translate(
    identity: &ChargingIdentity,
    hostname: &str,
    power_w: f64,
    bandwidth_mbps: f64,
    now: DateTime<Utc>,
) -> ChargingRecord {
    ChargingRecord {
        session_id: session_id(hostname, now),
        origin_host: identity.origin_host.clone(),
        request_type: CcRequestType::UpdateRequest,
        service_context_id: identity.service_context_id.clone(),
        subscription_id: SubscriptionId {
            id_type: SubscriptionIdType::EndUserE164,
            data: hostname.to_string(),
        },
        requested_service_unit: RequestedServiceUnit {
            cc_output_octets: to_units(power_w, POWER_SCALE),
            cc_total_octets: to_units(bandwidth_mbps, THROUGHPUT_SCALE),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity() -> ChargingIdentity {
        ChargingIdentity {
            origin_host: "gateway.pyrphoros.net".to_string(),
            service_context_id: "solar-metering@pyrphoros.net".to_string(),
        }
    }

    #[test]
    fn scales_power_and_throughput_to_integer_units() {
        let now = Utc.timestamp_opt(1_750_508_100, 0).unwrap();
        let r = translate(&identity(), "casa1", 350.5, 12.34, now);

        assert_eq!(r.requested_service_unit.cc_output_octets, 35050);
        assert_eq!(r.requested_service_unit.cc_total_octets, 12_340_000);
        assert_eq!(r.session_id, "sess-casa1-1750508100");
        assert_eq!(r.request_type, CcRequestType::UpdateRequest);
        assert_eq!(r.subscription_id.data, "casa1");
        assert_eq!(r.origin_host, "gateway.pyrphoros.net");
    }

    #[test]
    fn serializes_with_avp_names() {
        let now = Utc.timestamp_opt(1_750_508_100, 0).unwrap();
        let v = serde_json::to_value(translate(&identity(), "casa2", 1.0, 0.5, now)).unwrap();
        assert_eq!(v["CC-Request-Type"], "UPDATE_REQUEST");
        assert_eq!(v["Service-Context-Id"], "solar-metering@pyrphoros.net");
        assert_eq!(v["Subscription-Id"]["Type"], "END_USER_E164");
        assert_eq!(v["Requested-Service-Unit"]["CC-Output-Octets"], 100);
        assert_eq!(v["Requested-Service-Unit"]["CC-Total-Octets"], 500_000);
    }

    #[test]
    fn session_ids_are_namespaced_by_host() {
        let now = Utc.timestamp_opt(1_750_508_100, 0).unwrap();
        assert_ne!(session_id("casa1", now), session_id("casa2", now));
    }

    #[test]
    fn negative_or_nan_values_bill_nothing() {
        let now = Utc.timestamp_opt(0, 0).unwrap();
        let r = translate(&identity(), "casa1", -5.0, f64::NAN, now);
        assert_eq!(r.requested_service_unit.cc_output_octets, 0);
        assert_eq!(r.requested_service_unit.cc_total_octets, 0);
    }
}
