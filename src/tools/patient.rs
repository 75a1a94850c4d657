//! Patient search and claims shims.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{arg_text, envelope, required_text, ParamKind, ParamSpec, Tool, ToolArguments, ToolError};
use crate::gateway::{BackendApi, BackendRequest};

pub struct SearchPatient;

const SEARCH_FIELDS: [(&str, &str); 4] = [
    ("health_card_number", "Patient's health card number"),
    ("first_name", "Patient's first name"),
    ("last_name", "Patient's last name"),
    ("date_of_birth", "Patient's date of birth (YYYY-MM-DD)"),
];

#[async_trait]
impl Tool for SearchPatient {
    fn name(&self) -> &str {
        "ohip_search_patient"
    }

    fn description(&self) -> &str {
        "Search for patients in OHIP system"
    }

    fn params(&self) -> Vec<ParamSpec> {
        SEARCH_FIELDS
            .iter()
            .map(|(name, description)| ParamSpec::optional(name, ParamKind::String, description))
            .collect()
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        backend: &dyn BackendApi,
    ) -> Result<Value, ToolError> {
        let mut request = BackendRequest::get("/patients/search");
        for (name, _) in SEARCH_FIELDS {
            if let Some(value) = arg_text(args, name) {
                request = request.with_query(name, value);
            }
        }
        tracing::info!("Searching for patient with {} filter(s)", request.query.len());
        let data = backend.call(request).await?;
        Ok(envelope("Patient search completed", data))
    }
}

pub struct GetPatientClaims;

#[async_trait]
impl Tool for GetPatientClaims {
    fn name(&self) -> &str {
        "ohip_get_patient_claims"
    }

    fn description(&self) -> &str {
        "Get claims history for a patient"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("patient_id", ParamKind::String, "Patient ID from OHIP system"),
            ParamSpec::optional(
                "start_date",
                ParamKind::String,
                "Start date for claims search (YYYY-MM-DD)",
            ),
            ParamSpec::optional(
                "end_date",
                ParamKind::String,
                "End date for claims search (YYYY-MM-DD)",
            ),
        ]
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        backend: &dyn BackendApi,
    ) -> Result<Value, ToolError> {
        let patient_id = required_text(args, "patient_id")?;
        let mut request = BackendRequest::get(format!(
            "/patients/{}/claims",
            urlencoding::encode(&patient_id)
        ));
        for name in ["start_date", "end_date"] {
            if let Some(value) = arg_text(args, name) {
                request = request.with_query(name, value);
            }
        }
        tracing::info!("Getting claims for patient {}", patient_id);
        let data = backend.call(request).await?;
        Ok(envelope(
            format!("Claims retrieved for patient {}", patient_id),
            data,
        ))
    }
}

pub struct SubmitClaim;

#[async_trait]
impl Tool for SubmitClaim {
    fn name(&self) -> &str {
        "ohip_submit_claim"
    }

    fn description(&self) -> &str {
        "Submit a new claim to OHIP"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("patient_id", ParamKind::String, "Patient ID from OHIP system"),
            ParamSpec::required("provider_id", ParamKind::String, "Healthcare provider ID"),
            ParamSpec::required("service_code", ParamKind::String, "OHIP service code"),
            ParamSpec::required(
                "service_date",
                ParamKind::String,
                "Date service was provided (YYYY-MM-DD)",
            ),
            ParamSpec::required("amount", ParamKind::Number, "Claim amount"),
        ]
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        backend: &dyn BackendApi,
    ) -> Result<Value, ToolError> {
        let mut claim = Map::new();
        for name in ["patient_id", "provider_id", "service_code", "service_date"] {
            claim.insert(name.to_string(), Value::String(required_text(args, name)?));
        }
        let amount = args
            .get("amount")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ToolError::MissingArgument(vec!["amount".to_string()]))?;
        claim.insert("amount".to_string(), json!(amount));

        tracing::info!("Submitting claim for patient {}", claim["patient_id"]);
        let data = backend
            .call(BackendRequest::post("/claims").with_body(Value::Object(claim)))
            .await?;
        Ok(envelope("Claim submitted successfully", data))
    }
}
