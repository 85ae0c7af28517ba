use plumb_3d::pointcloud::PointCloud;
use plumb_filters::{filter_by_density, DensityFilterParams};

// evenly spread points on a sphere of radius 1
fn fibonacci_sphere(n: usize) -> Vec<[f64; 3]> {
    let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let r = (1.0 - y * y).sqrt();
            let theta = golden * i as f64;
            [r * theta.cos(), y, r * theta.sin()]
        })
        .collect()
}

fn shell_with_outliers() -> Vec<[f64; 3]> {
    let mut points = fibonacci_sphere(10_000);
    points.extend((0..50).map(|i| [20.0 + 11.0 * i as f64, 0.0, 0.0]));
    points
}

#[test]
fn isolated_outliers_are_removed() -> Result<(), Box<dyn std::error::Error>> {
    let points = shell_with_outliers();
    let params = DensityFilterParams {
        radius: 0.1,
        min_neighbors: 5,
        density_keep_fraction: 1.0,
        core_keep_fraction: 0.8,
        adaptive: false,
        ..Default::default()
    };
    let result = filter_by_density(&points, &params)?;

    assert!(result.mask[10_000..].iter().all(|keep| !*keep));
    let shell_kept = result.mask[..10_000].iter().filter(|keep| **keep).count();
    assert!(shell_kept >= 9_900, "kept {shell_kept} shell points");
    assert_eq!(result.stats.restored_by_core, 0);

    let cloud = PointCloud::from_points(points);
    let filtered = cloud.select(&result.mask)?;
    assert_eq!(filtered.len(), shell_kept);
    assert!(filtered.points().iter().all(|p| p[0] <= 1.0 + 1e-9));
    Ok(())
}

#[test]
fn retention_is_monotone_in_min_neighbors() -> Result<(), Box<dyn std::error::Error>> {
    let points = shell_with_outliers();
    let mut previous = usize::MAX;
    for min_neighbors in [0, 5, 10, 20, 30, 40, 80] {
        let params = DensityFilterParams {
            radius: 0.1,
            min_neighbors,
            density_keep_fraction: 0.9,
            core_keep_fraction: 0.0,
            adaptive: false,
            ..Default::default()
        };
        let retained = filter_by_density(&points, &params)?.retained();
        assert!(retained <= previous, "{min_neighbors}: {retained} > {previous}");
        previous = retained;
    }
    Ok(())
}

#[test]
fn full_core_fraction_keeps_every_point() -> Result<(), Box<dyn std::error::Error>> {
    let points = shell_with_outliers();
    let params = DensityFilterParams {
        radius: 0.1,
        min_neighbors: 40,
        core_keep_fraction: 1.0,
        adaptive: false,
        ..Default::default()
    };
    let result = filter_by_density(&points, &params)?;
    assert_eq!(result.retained(), points.len());
    Ok(())
}

#[test]
fn backends_agree_on_outliers() -> Result<(), Box<dyn std::error::Error>> {
    let points = shell_with_outliers();
    for (pairwise_max_points, tree_max_points) in [(100, 1_000_000), (100, 200)] {
        let params = DensityFilterParams {
            radius: 0.1,
            density_keep_fraction: 1.0,
            core_keep_fraction: 0.0,
            adaptive: false,
            neighbor_search: plumb_nn::NeighborSearchParams {
                pairwise_max_points,
                tree_max_points,
            },
            ..Default::default()
        };
        let result = filter_by_density(&points, &params)?;
        assert!(result.mask[10_000..].iter().all(|keep| !*keep));
    }
    Ok(())
}
