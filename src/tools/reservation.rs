//! Hotel reservation lookup.

use async_trait::async_trait;
use serde_json::Value;

use super::{envelope, required_text, ParamKind, ParamSpec, Tool, ToolArguments, ToolError};
use crate::gateway::{BackendApi, BackendRequest};

const SUMMARY_BRIEF: &str = "You are a hotel concierge assistant. Convert this reservation API response into a friendly, natural language summary for hotel staff.

Focus on the most important details that hotel staff need:
- Guest name and contact information
- Check-in and check-out dates
- Room type and number of guests (adults/children)
- Reservation status and confirmation numbers
- Any special requests or notes

Make it conversational and professional, as if you're briefing the front desk staff.";

pub struct GetReservation;

#[async_trait]
impl Tool for GetReservation {
    fn name(&self) -> &str {
        "get_reservation"
    }

    fn description(&self) -> &str {
        "Get hotel reservation details by hotel ID and reservation ID"
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("hotel_id", ParamKind::String, "Hotel ID"),
            ParamSpec::required("reservation_id", ParamKind::String, "Reservation ID to retrieve"),
            ParamSpec::optional(
                "fetch_instructions",
                ParamKind::String,
                "Fetch instructions for the reservation data",
            )
            .with_default("Reservation"),
        ]
    }

    fn summary_brief(&self) -> Option<&str> {
        Some(SUMMARY_BRIEF)
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        backend: &dyn BackendApi,
    ) -> Result<Value, ToolError> {
        let hotel_id = required_text(args, "hotel_id")?;
        let reservation_id = required_text(args, "reservation_id")?;
        let fetch_instructions =
            required_text(args, "fetch_instructions").unwrap_or_else(|_| "Reservation".to_string());

        tracing::info!("Getting reservation {} for hotel {}", reservation_id, hotel_id);
        let request = BackendRequest::get(format!(
            "/rsv/v1/hotels/{}/reservations/{}",
            urlencoding::encode(&hotel_id),
            urlencoding::encode(&reservation_id)
        ))
        .with_query("fetchInstructions", fetch_instructions)
        .with_header("x-hotelid", hotel_id.as_str());

        let data = backend.call(request).await?;
        Ok(envelope(
            format!("Reservation {} retrieved successfully", reservation_id),
            data,
        ))
    }
}
