use plot_rs::api::{ColorMap, ColorMapData, ColorScale, PlotConfig, Plottable};
use plot_rs::core::{
    Axis, ColorGradient, GradientPreset, PixelPoint, PixelRect, PlotAxes, PlotRange, ScaleType,
    SignDomain,
};
use plot_rs::render::FramePainter;

fn key_axis() -> Axis {
    Axis::horizontal(PlotRange::new(0.0, 10.0), 0.0, 500.0).expect("key axis")
}

fn value_axis() -> Axis {
    Axis::vertical(PlotRange::new(0.0, 10.0), 0.0, 300.0).expect("value axis")
}

/// 3 x 2 cells centered on keys 2, 4, 6 and values 2, 4.
fn grid() -> ColorMapData {
    ColorMapData::new(3, 2, PlotRange::new(2.0, 6.0), PlotRange::new(2.0, 4.0)).expect("grid")
}

fn grayscale_map() -> ColorMap {
    let mut data = grid();
    data.set_cell(2, 1, 1.0);
    let mut map = ColorMap::new("heat", data);
    map.set_gradient(ColorGradient::from_preset(GradientPreset::Grayscale));
    map
}

#[test]
fn grid_rejects_empty_or_degenerate_dimensions() {
    assert!(ColorMapData::new(0, 2, PlotRange::new(0.0, 1.0), PlotRange::new(0.0, 1.0)).is_err());
    assert!(ColorMapData::new(2, 2, PlotRange::new(1.0, 1.0), PlotRange::new(0.0, 1.0)).is_err());
    assert!(ColorMapData::new(2, 2, PlotRange::new(0.0, 1.0), PlotRange::new(f64::NAN, 1.0)).is_err());
    assert!(ColorMapData::new(1, 2, PlotRange::new(1.0, 1.0), PlotRange::new(0.0, 1.0)).is_ok());
}

#[test]
fn cells_are_addressed_by_coordinate() {
    let mut data = grid();
    assert!(data.set_data(4.2, 3.8, 7.0));
    assert_eq!(data.cell(1, 1), Some(7.0));
    assert_eq!(data.data(3.5, 4.5), Some(7.0));
    assert_eq!(data.cells()[4], 7.0);
    assert!(!data.set_data(9.0, 3.0, 1.0));
    assert!(!data.set_cell(3, 0, 1.0));
    assert_eq!(data.cell_to_coord(2, 0), (6.0, 2.0));
}

#[test]
fn data_bounds_widen_and_can_be_recalculated() {
    let mut data = grid();
    data.set_cell(0, 0, -2.0);
    data.set_cell(1, 0, 5.0);
    assert_eq!(data.data_bounds(), Some(PlotRange::new(-2.0, 5.0)));

    data.set_cell(1, 0, 1.0);
    assert_eq!(data.data_bounds(), Some(PlotRange::new(-2.0, 5.0)));
    data.recalculate_data_bounds();
    assert_eq!(data.data_bounds(), Some(PlotRange::new(-2.0, 1.0)));

    data.fill(f64::NAN);
    assert_eq!(data.data_bounds(), None);
}

#[test]
fn image_covers_half_a_cell_past_the_outer_centers() {
    let map = grayscale_map();
    let key = key_axis();
    let value = value_axis();
    let axes = PlotAxes::new(&key, &value).expect("axes");

    assert_eq!(map.image_rect(&axes), PixelRect::new(50.0, 150.0, 300.0, 120.0));

    let mut painter = FramePainter::new();
    map.draw(&axes, &mut painter).expect("draw");
    let frame = painter.frame();
    assert_eq!(frame.images.len(), 1);
    assert_eq!(frame.images[0].target, PixelRect::new(50.0, 150.0, 300.0, 120.0));

    let image = &frame.images[0].image;
    assert_eq!((image.width(), image.height()), (3, 2));
    // highest value row on top
    assert_eq!(image.get_pixel(2, 0).0, [255, 255, 255, 255]);
    assert_eq!(image.get_pixel(0, 1).0, [0, 0, 0, 255]);
}

#[test]
fn vertical_key_axis_transposes_the_image() {
    let map = grayscale_map();
    let key = Axis::vertical(PlotRange::new(0.0, 10.0), 0.0, 300.0).expect("key axis");
    let value = Axis::horizontal(PlotRange::new(0.0, 10.0), 0.0, 500.0).expect("value axis");
    let axes = PlotAxes::new(&key, &value).expect("axes");

    let mut painter = FramePainter::new();
    map.draw(&axes, &mut painter).expect("draw");
    let image = &painter.frame().images[0].image;
    assert_eq!((image.width(), image.height()), (2, 3));
    // key 6 at the top, value 4 on the right
    assert_eq!(image.get_pixel(1, 0).0, [255, 255, 255, 255]);
}

#[test]
fn image_is_cached_until_invalidated() {
    let mut map = grayscale_map();
    let key = key_axis();
    let value = value_axis();
    let axes = PlotAxes::new(&key, &value).expect("axes");
    let mut painter = FramePainter::new();

    assert!(map.is_image_dirty());
    map.draw(&axes, &mut painter).expect("draw");
    map.draw(&axes, &mut painter).expect("draw");
    assert_eq!(map.image_generation(), 1);
    assert!(!map.is_image_dirty());

    assert!(map.set_data_range(PlotRange::new(0.0, 2.0)));
    assert!(map.is_image_dirty());
    map.draw(&axes, &mut painter).expect("draw");
    assert_eq!(map.image_generation(), 2);

    map.data_mut().set_cell(0, 0, 0.5);
    map.draw(&axes, &mut painter).expect("draw");
    assert_eq!(map.image_generation(), 3);

    let reversed = key_axis().with_range_reversed(true);
    let flipped = PlotAxes::new(&reversed, &value).expect("axes");
    map.draw(&flipped, &mut painter).expect("draw");
    assert_eq!(map.image_generation(), 4);
}

#[test]
fn hidden_map_draws_nothing() {
    let mut map = grayscale_map();
    map.style_mut().visible = false;
    let key = key_axis();
    let value = value_axis();
    let axes = PlotAxes::new(&key, &value).expect("axes");
    let mut painter = FramePainter::new();
    map.draw(&axes, &mut painter).expect("draw");
    assert!(painter.frame().is_empty());
    assert_eq!(map.image_generation(), 0);
}

#[test]
fn select_test_reports_the_cell_under_the_cursor() {
    let map = grayscale_map();
    let key = key_axis();
    let value = value_axis();
    let axes = PlotAxes::new(&key, &value).expect("axes");

    // key 6, value 4
    let hit = map
        .select_test(PixelPoint::new(300.0, 180.0), false, &axes)
        .expect("hit");
    assert_eq!(hit.distance, 0.0);
    assert_eq!(hit.data_index, 5);

    assert!(map.select_test(PixelPoint::new(25.0, 180.0), false, &axes).is_none());
    assert!(map.select_test(PixelPoint::new(600.0, 180.0), false, &axes).is_none());
}

#[test]
fn ranges_include_the_cell_margins() {
    let map = grayscale_map();
    assert_eq!(map.key_range(SignDomain::Both), Some(PlotRange::new(1.0, 7.0)));
    assert_eq!(map.value_range(SignDomain::Both, None), Some(PlotRange::new(1.0, 5.0)));
    assert!(map.key_range(SignDomain::Negative).is_none());
}

#[test]
fn rescale_fits_the_data_and_widens_flat_grids() {
    let mut map = grayscale_map();
    map.set_data_range(PlotRange::new(5.0, 6.0));
    assert!(map.rescale_data_range(false));
    assert_eq!(map.data_range(), PlotRange::new(0.0, 1.0));

    map.data_mut().set_cell(0, 0, 3.0);
    assert!(map.rescale_data_range(true));
    assert_eq!(map.data_range(), PlotRange::new(0.0, 3.0));

    map.data_mut().fill(2.0);
    assert!(map.rescale_data_range(true));
    assert_eq!(map.data_range(), PlotRange::new(1.5, 2.5));
}

#[test]
fn logarithmic_scale_sanitizes_the_local_range() {
    let mut map = grayscale_map();
    map.set_data_range(PlotRange::new(-1.0, 10.0));
    assert!(map.set_data_scale_type(ScaleType::Logarithmic));
    let range = map.data_range();
    assert!((range.lower - 1e-3).abs() <= 1e-12);
    assert!((range.upper - 10.0).abs() <= 1e-12);
}

#[test]
fn binding_adopts_the_scale_state() {
    let scale = ColorScale::new().into_shared();
    scale
        .borrow_mut()
        .set_gradient(ColorGradient::from_preset(GradientPreset::Hot));
    scale.borrow_mut().set_data_range(PlotRange::new(-4.0, 4.0));

    let map = grayscale_map().into_shared();
    ColorMap::bind_color_scale(&map, &scale).expect("bind");
    assert_eq!(
        map.borrow().gradient(),
        &ColorGradient::from_preset(GradientPreset::Hot)
    );
    assert_eq!(map.borrow().data_range(), PlotRange::new(-4.0, 4.0));
    assert!(map.borrow().color_scale().is_some());

    assert!(map.borrow_mut().set_data_range(PlotRange::new(1.0, 2.0)));
    assert_eq!(scale.borrow().data_range(), PlotRange::new(1.0, 2.0));

    assert!(map.borrow_mut().set_gradient(ColorGradient::from_preset(GradientPreset::Jet)));
    assert_eq!(
        scale.borrow().gradient(),
        &ColorGradient::from_preset(GradientPreset::Jet)
    );
}

#[test]
fn rebinding_moves_the_subscription() {
    let first = ColorScale::new().into_shared();
    let second = ColorScale::new().into_shared();
    let map = grayscale_map().into_shared();

    ColorMap::bind_color_scale(&map, &first).expect("bind first");
    ColorMap::bind_color_scale(&map, &second).expect("bind second");
    assert_eq!(first.borrow().consumer_count(), 0);
    assert_eq!(second.borrow().consumer_count(), 1);
}

#[test]
fn config_applies_gradient_levels() {
    let config = PlotConfig {
        gradient_level_count: 8,
        antialiased: false,
        ..PlotConfig::default()
    };
    let map = ColorMap::with_config("heat", grid(), &config).expect("map");
    assert_eq!(map.gradient().level_count(), 8);
    assert!(!map.style().antialiased);
}
