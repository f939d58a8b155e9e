use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{field, materials, output_collection, output_success};
use crate::cli::OutputFormat;
use crate::engine::{AssignRouteRequest, FinishStopRequest, StartRouteRequest};

#[derive(Subcommand)]
pub enum RouteCommands {
    #[command(about = "List unclaimed routes starting soon")]
    Available,

    #[command(about = "List routes assigned to a gatherer")]
    Assigned {
        #[arg(help = "Gatherer user id")]
        user_id: String,
    },

    #[command(about = "Claim a route for a gatherer")]
    Assign {
        #[arg(long, help = "Gatherer user id")]
        user: String,
        #[arg(long, help = "Route id")]
        route: String,
    },

    #[command(about = "Start an assigned route")]
    Start {
        #[arg(long, help = "Gatherer user id")]
        user: String,
        #[arg(long, help = "Route id")]
        route: String,
    },

    #[command(about = "Mark a picking point as picked")]
    Finish {
        #[arg(long, help = "Gatherer user id")]
        user: String,
        #[arg(long, help = "Route id")]
        route: String,
        #[arg(long, help = "Picking point id")]
        stop: String,
    },
}

pub async fn handle(cmd: RouteCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RouteCommands::Available => {
            let data = client.get("/routes/available").await?;
            output_collection(&output_format, &data, "routes", "No routes available", route_line)
        }
        RouteCommands::Assigned { user_id } => {
            let data = client.get(&format!("/gatherers/{}/routes", user_id)).await?;
            output_collection(
                &output_format,
                &data,
                "assigned_routes",
                "No routes assigned",
                route_line,
            )
        }
        RouteCommands::Assign { user, route } => {
            let request = AssignRouteRequest {
                user_id: user,
                route_id: route,
            };
            client.post("/routes/assign", &request).await?;
            output_success(
                &output_format,
                &format!("Route '{}' assigned to '{}'", request.route_id, request.user_id),
                Some(json!({ "route_id": request.route_id, "user_id": request.user_id })),
            )
        }
        RouteCommands::Start { user, route } => {
            let request = StartRouteRequest {
                user_id: user,
                route_id: route,
            };
            let data = client.post("/routes/start", &request).await?;
            let started = data.get("assigned_route").cloned().unwrap_or(Value::Null);
            let stops = started
                .get("picking_points")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            output_success(
                &output_format,
                &format!("Route '{}' {} with {} picking point(s)", request.route_id, field(&started, "status"), stops),
                Some(data),
            )
        }
        RouteCommands::Finish { user, route, stop } => {
            let request = FinishStopRequest {
                user_id: user,
                route_id: route,
                picking_point_id: stop,
            };
            let data = client.post("/routes/finish-picking-point", &request).await?;
            let pending = data
                .get("picking_points")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            output_success(
                &output_format,
                &format!(
                    "Picking point '{}' done, route is {} with {} pending",
                    request.picking_point_id,
                    field(&data, "status"),
                    pending
                ),
                Some(json!({ "route": data })),
            )
        }
    }
}

fn route_line(route: &Value) -> String {
    let stops = route
        .get("picking_points")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    format!(
        "{}  {}  {} {}  [{}]  {} stop(s)",
        field(route, "id"),
        field(route, "formatted_date"),
        field(route, "sector"),
        field(route, "shift"),
        materials(route),
        stops
    )
}
