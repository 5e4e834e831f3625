//! SeriesPayload - SeriesBuffer projection, Dispatcher input
//!
//! Field names match the collector's wire format.

use serde::{Deserialize, Serialize};

/// Summary of one completed series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPayload {
    #[serde(rename = "PatientID", default)]
    pub patient_id: Option<String>,

    #[serde(rename = "PatientName", default)]
    pub patient_name: Option<String>,

    #[serde(rename = "StudyInstanceUID", default)]
    pub study_instance_uid: Option<String>,

    /// Upsert key
    #[serde(rename = "SeriesInstanceUID")]
    pub series_instance_uid: String,

    #[serde(rename = "NumInstances")]
    pub num_instances: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let payload = SeriesPayload {
            patient_id: Some("123".into()),
            patient_name: Some("Doe^John".into()),
            study_instance_uid: None,
            series_instance_uid: "1.2.3.4".into(),
            num_instances: 3,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["PatientID"], "123");
        assert_eq!(value["PatientName"], "Doe^John");
        assert!(value["StudyInstanceUID"].is_null());
        assert_eq!(value["SeriesInstanceUID"], "1.2.3.4");
        assert_eq!(value["NumInstances"], 3);
    }

    #[test]
    fn test_optional_fields_default_when_absent() {
        let payload: SeriesPayload =
            serde_json::from_str(r#"{"SeriesInstanceUID": "1.2.3.4", "NumInstances": 5}"#)
                .unwrap();
        assert!(payload.patient_id.is_none());
        assert_eq!(payload.num_instances, 5);
    }
}
