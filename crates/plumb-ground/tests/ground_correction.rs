use approx::assert_relative_eq;

use plumb_3d::axis::UpAxis;
use plumb_3d::linalg;
use plumb_3d::scene::{self, SceneNode};
use plumb_3d::pointcloud::PointCloud;
use plumb_3d::transforms;
use plumb_ground::{align_to_up, detect_ground, verify_alignment, GroundParams, GroundStrategy};

// 1000 points on z = 0.3x + 0.1y over [0, 10]^2 and 200 scene points well above it
fn tilted_scene() -> Vec<[f64; 3]> {
    let mut points = Vec::with_capacity(1200);
    for i in 0..40 {
        for j in 0..25 {
            let x = i as f64 * 10.0 / 39.0;
            let y = j as f64 * 10.0 / 24.0;
            points.push([x, y, 0.3 * x + 0.1 * y]);
        }
    }
    for k in 0..200 {
        let t = k as f64;
        points.push([
            (t * 0.37) % 10.0,
            (t * 0.73) % 10.0,
            20.0 + (t * 0.05) % 10.0,
        ]);
    }
    points
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[test]
fn tilted_ground_is_leveled() -> Result<(), Box<dyn std::error::Error>> {
    let points = tilted_scene();

    let params = GroundParams {
        strategy: GroundStrategy::LowestBand,
        up_axis: UpAxis::Z,
        ..Default::default()
    };
    let ground = detect_ground(&points, &params)?;

    let expected = linalg::normalize3(&[-0.3, -0.1, 1.0]).ok_or("zero normal")?;
    for i in 0..3 {
        assert_relative_eq!(ground.plane.normal[i], expected[i], epsilon = 1e-6);
    }
    assert!(ground.warnings.is_empty());

    let rotation = align_to_up(&ground.plane.normal, &ground.plane.point, UpAxis::Z)?;
    assert!(rotation.residual_degrees < 5.0);

    let corrected = linalg::transform_points44(&points, &rotation.transform);

    // the original lowest band is now flat at zero height
    let band: Vec<f64> = ground.inliers.iter().map(|&i| corrected[i][2]).collect();
    assert!(band.len() >= 3);
    assert!(std_dev(&band) < 1e-3);
    for z in &band {
        assert_relative_eq!(*z, 0.0, epsilon = 1e-6);
    }

    // all ground points are level after the correction
    let floor: Vec<f64> = corrected[..1000].iter().map(|p| p[2]).collect();
    assert!(std_dev(&floor) < 1e-3);

    let check = verify_alignment(&corrected, UpAxis::Z)?;
    assert!(check.is_level);
    Ok(())
}

#[test]
fn scene_nodes_corrected_together() -> Result<(), Box<dyn std::error::Error>> {
    let points = tilted_scene();
    let (floor, rest) = points.split_at(1000);

    // the second node is stored in local coordinates shifted down by 5
    let local_rest: Vec<[f64; 3]> = rest.iter().map(|p| [p[0], p[1], p[2] - 5.0]).collect();
    let nodes = vec![
        SceneNode::new("floor", PointCloud::from_points(floor.to_vec())),
        SceneNode::new("props", PointCloud::from_points(local_rest))
            .with_transform(transforms::translation44(&[0.0, 0.0, 5.0])),
    ];

    let world = scene::aggregate_world_points(&nodes);
    assert_eq!(world.len(), 1200);

    let ground = detect_ground(&world, &GroundParams::default())?;
    let rotation = align_to_up(&ground.plane.normal, &ground.plane.point, UpAxis::Z)?;
    let corrected = scene::apply_transform_to_scene(&nodes, &rotation.transform);

    let floor_z: Vec<f64> = corrected[0].cloud.points().iter().map(|p| p[2]).collect();
    assert!(std_dev(&floor_z) < 1e-3);
    assert!(corrected[1].cloud.points().iter().all(|p| p[2] > 5.0));
    Ok(())
}

#[test]
fn every_strategy_levels_the_scene() -> Result<(), Box<dyn std::error::Error>> {
    let points = tilted_scene();
    for strategy in [
        GroundStrategy::LowestBand,
        GroundStrategy::HeightPercentile,
        GroundStrategy::FullRansac,
        GroundStrategy::PcaFallback,
    ] {
        let params = GroundParams {
            strategy,
            ..Default::default()
        };
        let ground = detect_ground(&points, &params)?;
        let rotation = align_to_up(&ground.plane.normal, &ground.plane.point, UpAxis::Z)?;
        let corrected = linalg::transform_points44(&points, &rotation.transform);
        let floor: Vec<f64> = corrected[..1000].iter().map(|p| p[2]).collect();
        assert!(std_dev(&floor) < 1e-3, "{strategy}");
    }
    Ok(())
}

#[test]
fn rotated_normal_points_up() -> Result<(), Box<dyn std::error::Error>> {
    let points = tilted_scene();
    let ground = detect_ground(&points, &GroundParams::default())?;
    let rotation = align_to_up(&ground.plane.normal, &ground.plane.point, UpAxis::Z)?;

    let rotated = linalg::rotate_vectors(&[ground.plane.normal], &rotation.rotation);
    assert!(linalg::angle_between_deg(&rotated[0], &[0.0, 0.0, 1.0]) < 5.0);
    Ok(())
}

#[test]
fn planar_cloud_is_all_inliers() -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<[f64; 3]> = (0..30)
        .flat_map(|i| (0..30).map(move |j| [i as f64 * 0.2, j as f64 * 0.2, 1.5]))
        .collect();
    let fit = plumb_ground::fit_plane(&points, &plumb_ground::RansacParams::default())?;
    assert_eq!(fit.inliers.len(), points.len());
    assert_relative_eq!(fit.plane.normal[2].abs(), 1.0, epsilon = 1e-6);
    assert_relative_eq!(fit.inlier_ratio(points.len()), 1.0);
    Ok(())
}
