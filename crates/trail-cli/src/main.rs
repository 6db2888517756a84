//! Request a hiking route from a running trail server and print a summary.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trail server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Start point as "lat,lon"
    #[arg(long)]
    start: String,

    /// End point as "lat,lon"
    #[arg(long)]
    end: String,

    /// Grid columns override
    #[arg(long)]
    nx: Option<usize>,

    /// Grid rows override
    #[arg(long)]
    ny: Option<usize>,

    /// Print every waypoint instead of a summary
    #[arg(long, default_value_t = false)]
    full: bool,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    status: String,
    path: Vec<PathPoint>,
    total_time_s: f64,
    nodes_finalized: usize,
}

#[derive(Debug, Deserialize)]
struct PathPoint {
    lat: f64,
    lon: f64,
}

fn parse_point(raw: &str) -> Result<(f64, f64)> {
    let (lat, lon) = raw
        .split_once(',')
        .with_context(|| format!("expected \"lat,lon\", got \"{raw}\""))?;
    Ok((
        lat.trim().parse().with_context(|| format!("bad latitude \"{lat}\""))?,
        lon.trim().parse().with_context(|| format!("bad longitude \"{lon}\""))?,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (lat_start, lon_start) = parse_point(&args.start)?;
    let (lat_end, lon_end) = parse_point(&args.end)?;

    let mut query = vec![
        ("lat_start", lat_start.to_string()),
        ("lon_start", lon_start.to_string()),
        ("lat_end", lat_end.to_string()),
        ("lon_end", lon_end.to_string()),
    ];
    if let Some(nx) = args.nx {
        query.push(("nx", nx.to_string()));
    }
    if let Some(ny) = args.ny {
        query.push(("ny", ny.to_string()));
    }

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/v1/route", args.url.trim_end_matches('/')))
        .query(&query)
        .send()
        .await
        .context("request to trail server failed")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("server returned {status}: {body}");
    }
    let route: RouteResponse = response.json().await.context("malformed server response")?;

    println!("Status: {}", route.status);
    println!("Cells finalized: {}", route.nodes_finalized);
    if route.status != "ok" {
        return Ok(());
    }

    let minutes = route.total_time_s / 60.0;
    println!("Walking time: {minutes:.1} min over {} waypoints", route.path.len());
    if args.full {
        for point in &route.path {
            println!("{:.6},{:.6}", point.lat, point.lon);
        }
    } else {
        if let Some(first) = route.path.first() {
            println!("Start: {:.6},{:.6}", first.lat, first.lon);
        }
        if let Some(last) = route.path.last() {
            println!("End:   {:.6},{:.6}", last.lat, last.lon);
        }
    }
    Ok(())
}
