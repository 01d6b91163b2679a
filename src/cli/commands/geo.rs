use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_fields, output_success};
use crate::cli::OutputFormat;
use crate::geo::{path_distance, LatLng, TravelTime};

#[derive(Subcommand)]
pub enum GeoCommands {
    #[command(about = "Length and travel times of a route given as lat,lng points")]
    Distance {
        #[arg(required = true, num_args = 2.., allow_hyphen_values = true, help = "Points as lat,lng")]
        points: Vec<String>,
    },
}

/// Parses `"lat,lng"`.
pub fn parse_point(raw: &str) -> anyhow::Result<LatLng> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| anyhow!("expected lat,lng but got '{}'", raw))?;
    let lat: f64 = lat.trim().parse().with_context(|| format!("invalid latitude in '{}'", raw))?;
    let lng: f64 = lng.trim().parse().with_context(|| format!("invalid longitude in '{}'", raw))?;
    Ok(LatLng::checked(lat, lng)?)
}

pub fn handle(cmd: GeoCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        GeoCommands::Distance { points } => {
            let points = points.iter().map(|p| parse_point(p)).collect::<anyhow::Result<Vec<_>>>()?;
            let distance = path_distance(&points);
            let time = TravelTime::estimate(distance);

            output_fields(
                output_format,
                &[
                    ("distance", format!("{} m", distance)),
                    ("walking", format!("{} min", time.walking)),
                    ("cycling", format!("{} min", time.cycling)),
                    ("driving", format!("{} min", time.driving)),
                ],
            );
            output_success(
                output_format,
                &format!("Route of {} points", points.len()),
                Some(json!({ "distance": distance, "estimatedTime": time })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points() {
        let p = parse_point("-25.4358, 30.9816").unwrap();
        assert_eq!(p, LatLng::new(-25.4358, 30.9816));
        assert!(parse_point("-25.4358").is_err());
        assert!(parse_point("95,0").is_err());
        assert!(parse_point("a,b").is_err());
    }
}
