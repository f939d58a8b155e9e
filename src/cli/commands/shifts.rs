use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{field, materials, output_collection, output_success};
use crate::cli::OutputFormat;
use crate::engine::PinStopRequest;

#[derive(Subcommand)]
pub enum ShiftCommands {
    #[command(about = "List shifts still accepting picking points")]
    Open,

    #[command(about = "Pin a location onto an open shift")]
    Pin {
        #[arg(long, help = "Requester user id")]
        user: String,
        #[arg(long, help = "Shift (route) id")]
        shift: String,
        #[arg(long, help = "Location id")]
        location: String,
        #[arg(long, value_delimiter = ',', required = true, help = "Materials, comma separated")]
        materials: Vec<String>,
    },
}

pub async fn handle(cmd: ShiftCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ShiftCommands::Open => {
            let data = client.get("/shifts/open").await?;
            output_collection(&output_format, &data, "shifts", "No open shifts", shift_line)
        }
        ShiftCommands::Pin {
            user,
            shift,
            location,
            materials,
        } => {
            let request = PinStopRequest {
                user_id: user,
                shift_id: shift,
                location_id: location,
                materials,
            };
            client.post("/shifts/pin", &request).await?;
            output_success(
                &output_format,
                &format!("Location '{}' pinned on shift '{}'", request.location_id, request.shift_id),
                Some(json!({ "shift_id": request.shift_id, "location_id": request.location_id })),
            )
        }
    }
}

fn shift_line(shift: &Value) -> String {
    format!(
        "{}  {}  {} {}  [{}]",
        field(shift, "id"),
        field(shift, "formatted_date"),
        field(shift, "sector"),
        field(shift, "shift"),
        materials(shift)
    )
}
