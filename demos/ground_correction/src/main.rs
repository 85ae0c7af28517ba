use argh::FromArgs;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use plumb::filters::{self, DarkPointParams, DensityFilterParams};
use plumb::geometry::axis::UpAxis;
use plumb::geometry::bounds::{self, BoundsKind, Units};
use plumb::geometry::pointcloud::PointCloud;
use plumb::geometry::scene::{self, OriginMode, SceneNode};
use plumb::geometry::transforms::{self, RotationCenter};
use plumb::ground::{self, GroundParams, GroundStrategy};

#[derive(FromArgs)]
/// Level a synthetic tilted scene and measure it
struct Args {
    /// number of floor points
    #[argh(option, default = "5000")]
    floor_points: usize,

    /// floor slope along x
    #[argh(option, default = "0.3")]
    slope_x: f64,

    /// floor slope along y
    #[argh(option, default = "0.1")]
    slope_y: f64,

    /// ground detection strategy
    #[argh(option, default = "GroundStrategy::LowestBand")]
    strategy: GroundStrategy,

    /// up-axis, one of X, Y, Z, -X, -Y, -Z
    #[argh(option, default = "UpAxis::Z")]
    up_axis: UpAxis,

    /// bounding volume kind, axis_aligned or oriented
    #[argh(option, default = "BoundsKind::AxisAligned")]
    bounds: BoundsKind,

    /// output units for bounds and position
    #[argh(option, default = "Units::Meters")]
    units: Units,

    /// extra rotation in degrees about the up-axis after leveling
    #[argh(option, default = "0.0")]
    yaw: f64,

    /// pivot of the extra rotation, origin or bounds_center
    #[argh(option, default = "RotationCenter::BoundsCenter")]
    rotation_center: RotationCenter,

    /// optional JSON file with ground detection parameters
    #[argh(option)]
    ground_config: Option<PathBuf>,

    /// seed of the synthetic scene
    #[argh(option, default = "7")]
    seed: u64,
}

/// Tilted noisy floor, a box standing on it, a few dark points and far outliers.
fn synthetic_scene(args: &Args) -> Result<PointCloud, Box<dyn std::error::Error>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(args.seed);
    let floor_height = |x: f64, y: f64| args.slope_x * x + args.slope_y * y;

    let mut points = Vec::new();
    let mut colors = Vec::new();

    for _ in 0..args.floor_points {
        let x = rng.random_range(0.0..10.0);
        let y = rng.random_range(0.0..10.0);
        points.push([x, y, floor_height(x, y) + rng.random_range(-0.005..0.005)]);
        colors.push([120, 120, 110]);
    }

    for _ in 0..args.floor_points / 5 {
        let x = rng.random_range(4.0..6.0);
        let y = rng.random_range(4.0..6.0);
        let z = floor_height(x, y) + rng.random_range(0.5..2.5);
        points.push([x, y, z]);
        colors.push([180, 40, 40]);
    }

    for _ in 0..20 {
        let x = rng.random_range(0.0..10.0);
        let y = rng.random_range(0.0..10.0);
        points.push([x, y, floor_height(x, y) + 0.2]);
        colors.push([3, 3, 3]);
    }

    for i in 0..10 {
        points.push([30.0 + 5.0 * i as f64, -20.0, 15.0]);
        colors.push([200, 200, 200]);
    }

    Ok(PointCloud::from_rgb(points, colors)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut ground_params: GroundParams = match &args.ground_config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => GroundParams::default(),
    };
    ground_params.strategy = args.strategy;
    ground_params.up_axis = args.up_axis;

    let cloud = synthetic_scene(&args)?;
    log::info!("synthetic scene with {} points", cloud.len());
    let nodes = vec![SceneNode::new("scene", cloud)];

    // detect on the scene as a whole and level every node
    let world = scene::aggregate_world_points(&nodes);
    let detection = ground::detect_ground(&world, &ground_params)?;
    let rotation = ground::align_to_up(
        &detection.plane.normal,
        &detection.plane.point,
        args.up_axis,
    )?;
    let mut leveled = scene::apply_transform_to_scene(&nodes, &rotation.transform);
    if args.yaw != 0.0 {
        let yaw = transforms::manual_rotation(
            &scene::aggregate_world_points(&leveled),
            args.up_axis.axis(),
            args.yaw,
            args.rotation_center,
        )?;
        leveled = scene::apply_transform_to_scene(&leveled, &yaw);
    }
    let check = ground::verify_alignment(&scene::aggregate_world_points(&leveled), args.up_axis)?;

    let mut cleaned = Vec::with_capacity(leveled.len());
    let mut density_stats = Vec::with_capacity(leveled.len());
    for node in &leveled {
        let bright = DarkPointParams::default().apply(&node.cloud)?;
        let density = filters::filter_by_density(bright.points(), &DensityFilterParams::default())?;
        density_stats.push(density.stats);
        cleaned.push(SceneNode::new(node.name.clone(), bright.select(&density.mask)?));
    }

    let cleaned_points = scene::aggregate_world_points(&cleaned);
    let bounds = bounds::compute_bounds(&cleaned_points, args.bounds)?;
    let origin = scene::origin_adjustment(
        &cleaned_points,
        OriginMode::BottomCenter,
        args.up_axis,
        args.units,
    )?;

    let summary = serde_json::json!({
        "ground": {
            "strategy": detection.strategy,
            "normal": detection.plane.normal,
            "tilt_degrees": detection.tilt_degrees,
            "inliers": detection.inliers.len(),
            "candidates": detection.candidates,
            "warnings": detection.warnings,
        },
        "rotation": rotation,
        "alignment_check": check,
        "density_filter": density_stats,
        "points": {
            "input": world.len(),
            "output": cleaned_points.len(),
        },
        "bounds": bounds.volume.in_units(args.units),
        "bounds_warnings": bounds.warnings,
        "scale": bounds.volume.in_units(args.units).scale_array(),
        "origin": origin,
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
