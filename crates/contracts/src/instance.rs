//! Instance - InstanceSource output
//!
//! One received data unit. Only the attributes the grouping engine reads are modelled.

use serde::{Deserialize, Serialize};

/// A single received instance
///
/// Descriptive fields are only read from the first instance of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Series identifier (opaque, stable per series)
    pub series_instance_uid: String,

    /// Instance identifier (diagnostics only)
    #[serde(default)]
    pub sop_instance_uid: Option<String>,

    /// Subject identifier
    #[serde(default)]
    pub patient_id: Option<String>,

    /// Subject display name
    #[serde(default)]
    pub patient_name: Option<String>,

    /// Parent study identifier
    #[serde(default)]
    pub study_instance_uid: Option<String>,
}

impl Instance {
    /// Create an instance carrying only its series identifier
    pub fn new(series_instance_uid: impl Into<String>) -> Self {
        Self {
            series_instance_uid: series_instance_uid.into(),
            sop_instance_uid: None,
            patient_id: None,
            patient_name: None,
            study_instance_uid: None,
        }
    }

    /// Set subject fields
    pub fn with_patient(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.patient_id = Some(id.into());
        self.patient_name = Some(name.into());
        self
    }

    /// Set parent study identifier
    pub fn with_study(mut self, study_instance_uid: impl Into<String>) -> Self {
        self.study_instance_uid = Some(study_instance_uid.into());
        self
    }

    /// Set instance identifier
    pub fn with_sop(mut self, sop_instance_uid: impl Into<String>) -> Self {
        self.sop_instance_uid = Some(sop_instance_uid.into());
        self
    }
}
