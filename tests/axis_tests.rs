use plot_rs::PlotError;
use plot_rs::core::{Axis, AxisOrientation, CoordinateMapper, PixelPoint, PixelRect, PlotAxes, PlotRange, ScaleType};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn horizontal_axis_maps_linearly_from_its_offset() {
    let axis = Axis::horizontal(PlotRange::new(0.0, 100.0), 50.0, 500.0).expect("axis");
    assert_close(axis.coord_to_pixel(0.0), 50.0);
    assert_close(axis.coord_to_pixel(50.0), 300.0);
    assert_close(axis.pixel_to_coord(550.0), 100.0);
    assert_eq!(axis.orientation(), AxisOrientation::Horizontal);
    assert_eq!(axis.pixel_extent(), (50.0, 500.0));
}

#[test]
fn reversed_axes_flip_direction() {
    let horizontal = Axis::horizontal(PlotRange::new(0.0, 100.0), 50.0, 500.0)
        .expect("axis")
        .with_range_reversed(true);
    assert_close(horizontal.coord_to_pixel(0.0), 550.0);

    let vertical = Axis::vertical(PlotRange::new(0.0, 10.0), 0.0, 300.0)
        .expect("axis")
        .with_range_reversed(true);
    assert_close(vertical.coord_to_pixel(0.0), 0.0);
    assert_close(vertical.coord_to_pixel(10.0), 300.0);
}

#[test]
fn logarithmic_axis_spaces_decades_evenly() {
    let axis = Axis::horizontal(PlotRange::new(1.0, 100.0), 0.0, 200.0)
        .expect("axis")
        .with_scale_type(ScaleType::Logarithmic);
    assert_close(axis.coord_to_pixel(10.0), 100.0);
    assert_close(axis.pixel_to_coord(100.0), 10.0);
}

#[test]
fn invalid_axes_are_rejected() {
    let degenerate = Axis::horizontal(PlotRange::new(5.0, 5.0), 0.0, 100.0);
    assert!(matches!(degenerate, Err(PlotError::InvalidData(_))));
    assert!(Axis::horizontal(PlotRange::new(0.0, f64::NAN), 0.0, 100.0).is_err());
    assert!(Axis::vertical(PlotRange::new(0.0, 1.0), f64::INFINITY, 100.0).is_err());
    assert!(Axis::vertical(PlotRange::new(0.0, 1.0), 0.0, -1.0).is_err());
}

#[test]
fn set_range_normalizes_and_ignores_degenerate_input() {
    let mut axis = Axis::horizontal(PlotRange::new(0.0, 1.0), 0.0, 100.0).expect("axis");
    assert!(axis.set_range(PlotRange::new(8.0, 2.0)));
    assert_eq!(axis.range(), PlotRange::new(2.0, 8.0));
    assert!(!axis.set_range(PlotRange::new(2.0, 8.0)));
    assert!(!axis.set_range(PlotRange::new(3.0, 3.0)));
    assert_eq!(axis.range(), PlotRange::new(2.0, 8.0));
}

#[test]
fn switching_to_log_keeps_the_range_positive() {
    let mut axis = Axis::horizontal(PlotRange::new(-10.0, 100.0), 0.0, 100.0).expect("axis");
    assert!(axis.set_scale_type(ScaleType::Logarithmic));
    assert!(!axis.set_scale_type(ScaleType::Logarithmic));
    assert!(axis.range().lower > 0.0);
    assert_close(axis.range().upper, 100.0);
}

#[test]
fn move_and_scale_follow_the_scale_type() {
    let mut linear = Axis::horizontal(PlotRange::new(0.0, 100.0), 0.0, 100.0).expect("axis");
    assert!(linear.move_range(10.0));
    assert_eq!(linear.range(), PlotRange::new(10.0, 110.0));
    assert!(linear.scale_range(0.5, 60.0));
    assert_eq!(linear.range(), PlotRange::new(35.0, 85.0));
    assert!(!linear.scale_range(0.0, 60.0));

    let mut log = Axis::horizontal(PlotRange::new(1.0, 100.0), 0.0, 100.0)
        .expect("axis")
        .with_scale_type(ScaleType::Logarithmic);
    assert!(log.move_range(10.0));
    assert_close(log.range().lower, 10.0);
    assert_close(log.range().upper, 1000.0);
    assert!(!log.scale_range(0.5, -1.0));
}

#[test]
fn plot_axes_need_perpendicular_axes() {
    let first = Axis::horizontal(PlotRange::new(0.0, 1.0), 0.0, 100.0).expect("axis");
    let second = Axis::horizontal(PlotRange::new(0.0, 1.0), 0.0, 100.0).expect("axis");
    assert!(PlotAxes::new(&first, &second).is_err());
}

#[test]
fn plot_axes_swap_coordinates_for_a_vertical_key_axis() {
    let key = Axis::vertical(PlotRange::new(0.0, 10.0), 0.0, 300.0).expect("key axis");
    let value = Axis::horizontal(PlotRange::new(0.0, 10.0), 0.0, 500.0).expect("value axis");
    let axes = PlotAxes::new(&key, &value).expect("axes");

    assert!(!axes.key_is_horizontal());
    assert_eq!(axes.coords_to_pixels(5.0, 2.0), PixelPoint::new(100.0, 150.0));
    let (key_coord, value_coord) = axes.pixels_to_coords(PixelPoint::new(100.0, 150.0));
    assert_close(key_coord, 5.0);
    assert_close(value_coord, 2.0);
    assert_eq!(axes.axis_rect(), PixelRect::new(0.0, 0.0, 500.0, 300.0));
    assert_close(axes.key_pixel_length(), 300.0);
}

#[test]
fn axis_round_trips_through_json() {
    let axis = Axis::vertical(PlotRange::new(1.0, 1000.0), 10.0, 240.0)
        .expect("axis")
        .with_scale_type(ScaleType::Logarithmic)
        .with_range_reversed(true);
    let json = serde_json::to_string(&axis).expect("serialize");
    let restored: Axis = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(restored, axis);
}
