use std::cell::RefCell;
use std::rc::{Rc, Weak};

use plot_rs::api::{
    COLOR_SCALE_MARGIN_PX, ColorMap, ColorMapData, ColorScale, ColorScaleConsumer, ColorScaleSide,
    MAX_GRADIENT_IMAGE_THICKNESS, PlotConfig,
};
use plot_rs::core::{ColorGradient, GradientPreset, PixelRect, PlotRange, ScaleType};
use plot_rs::render::FramePainter;

fn grid() -> ColorMapData {
    ColorMapData::new(3, 3, PlotRange::new(0.0, 2.0), PlotRange::new(0.0, 2.0)).expect("grid")
}

fn vertical_scale() -> ColorScale {
    let mut scale = ColorScale::new();
    scale
        .set_outer_rect(PixelRect::new(0.0, 0.0, 30.0, 210.0))
        .expect("rect");
    scale
}

#[test]
fn new_scale_has_expected_defaults() {
    let scale = ColorScale::new();
    assert_eq!(scale.data_range(), PlotRange::new(0.0, 6.0));
    assert_eq!(scale.data_scale_type(), ScaleType::Linear);
    assert_eq!(scale.side(), ColorScaleSide::Right);
    assert!((scale.bar_width() - 20.0).abs() <= 1e-9);
    assert!(scale.range_drag());
    assert!(scale.range_zoom());
    assert!((scale.minimum_outer_extent() - (20.0 + 2.0 * COLOR_SCALE_MARGIN_PX)).abs() <= 1e-9);
}

#[test]
fn unchanged_range_is_not_propagated() {
    let mut scale = ColorScale::new();
    assert!(scale.set_data_range(PlotRange::new(1.0, 2.0)));
    assert!(!scale.set_data_range(PlotRange::new(1.0, 2.0)));
    assert!(!scale.set_data_range(PlotRange::new(f64::NAN, 2.0)));
    assert!(!scale.set_data_range(PlotRange::new(3.0, 3.0)));
    assert_eq!(scale.data_range(), PlotRange::new(1.0, 2.0));
}

#[test]
fn switching_to_log_sanitizes_a_range_crossing_zero() {
    let mut scale = ColorScale::new();
    scale.set_data_range(PlotRange::new(-5.0, 10.0));
    assert!(scale.set_data_scale_type(ScaleType::Logarithmic));

    let range = scale.data_range();
    assert!((range.lower - 1e-3).abs() <= 1e-12);
    assert!((range.upper - 10.0).abs() <= 1e-12);

    scale.set_data_range(PlotRange::new(-8.0, -2.0));
    assert_eq!(scale.data_range(), PlotRange::new(1e-3, 1.0));
}

#[derive(Default)]
struct EventLog {
    events: Vec<(&'static str, PlotRange, ScaleType)>,
    range: PlotRange,
    scale_type: ScaleType,
}

impl ColorScaleConsumer for EventLog {
    fn color_scale_data_range_changed(&mut self, range: PlotRange) {
        self.range = range;
        self.events.push(("range", self.range, self.scale_type));
    }

    fn color_scale_data_scale_type_changed(&mut self, scale_type: ScaleType) {
        self.scale_type = scale_type;
        self.events.push(("scale_type", self.range, self.scale_type));
    }

    fn color_scale_gradient_changed(&mut self, _gradient: &ColorGradient) {}
}

#[test]
fn log_switch_delivers_the_sanitized_range_before_the_scale_type() {
    let mut scale = ColorScale::new();
    scale.set_data_range(PlotRange::new(-5.0, 10.0));
    let log = Rc::new(RefCell::new(EventLog::default()));
    let weak: Weak<RefCell<dyn ColorScaleConsumer>> = Rc::<RefCell<EventLog>>::downgrade(&log);
    scale.subscribe(weak);

    assert!(scale.set_data_scale_type(ScaleType::Logarithmic));

    let log = log.borrow();
    let kinds: Vec<&str> = log.events.iter().map(|event| event.0).collect();
    assert_eq!(kinds, vec!["range", "scale_type"]);
    // no event ever pairs a log scale with a non-positive bound
    for (_, range, scale_type) in &log.events {
        if *scale_type == ScaleType::Logarithmic {
            assert!(range.lower > 0.0 && range.upper > 0.0);
        }
    }
    assert!((log.range.lower - 1e-3).abs() <= 1e-12);
}

#[test]
fn bar_hugs_the_plot_facing_edge() {
    let mut scale = ColorScale::new();
    scale
        .set_outer_rect(PixelRect::new(100.0, 0.0, 40.0, 200.0))
        .expect("rect");
    assert_eq!(scale.bar_rect(), PixelRect::new(105.0, 5.0, 20.0, 190.0));

    scale.set_side(ColorScaleSide::Left);
    assert_eq!(scale.bar_rect(), PixelRect::new(115.0, 5.0, 20.0, 190.0));

    scale.set_side(ColorScaleSide::Bottom);
    scale
        .set_outer_rect(PixelRect::new(0.0, 300.0, 200.0, 40.0))
        .expect("rect");
    assert_eq!(scale.bar_rect(), PixelRect::new(5.0, 305.0, 190.0, 20.0));

    assert!(scale.set_outer_rect(PixelRect::new(0.0, 0.0, -1.0, 10.0)).is_err());
    assert!(scale.set_bar_width(f64::INFINITY).is_err());
}

#[test]
fn gradient_image_is_rebuilt_only_when_invalidated() {
    let mut scale = vertical_scale();
    let mut painter = FramePainter::new();

    scale.draw(&mut painter).expect("draw");
    scale.draw(&mut painter).expect("draw");
    assert_eq!(scale.axis_rect().image_generation(), 1);
    assert_eq!(painter.frame().images.len(), 2);

    let image = &painter.frame().images[0];
    assert_eq!(image.target, PixelRect::new(5.0, 5.0, 20.0, 200.0));
    assert_eq!(image.image.width(), 20);
    assert_eq!(image.image.height(), 350);

    scale.set_range_reversed(true);
    scale.draw(&mut painter).expect("draw");
    assert_eq!(scale.axis_rect().image_generation(), 1);

    scale.set_gradient(ColorGradient::from_preset(GradientPreset::Hot));
    assert!(scale.axis_rect().is_image_invalidated());
    scale.draw(&mut painter).expect("draw");
    assert_eq!(scale.axis_rect().image_generation(), 2);
}

#[test]
fn vertical_image_puts_the_highest_level_on_top() {
    let mut scale = vertical_scale();
    scale.set_gradient(ColorGradient::from_preset(GradientPreset::Grayscale));
    let mut painter = FramePainter::new();
    scale.draw(&mut painter).expect("draw");

    let image = &painter.frame().images[0].image;
    assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(image.get_pixel(0, image.height() - 1).0, [0, 0, 0, 255]);

    scale.set_range_reversed(true);
    painter.reset();
    scale.draw(&mut painter).expect("draw");
    let mirrored = &painter.frame().images[0].image;
    assert_eq!(mirrored.get_pixel(0, 0).0, [0, 0, 0, 255]);
}

#[test]
fn horizontal_sides_produce_a_wide_image() {
    let mut scale = ColorScale::new();
    scale.set_side(ColorScaleSide::Bottom);
    scale
        .set_outer_rect(PixelRect::new(0.0, 0.0, 200.0, 30.0))
        .expect("rect");
    let mut painter = FramePainter::new();
    scale.draw(&mut painter).expect("draw");

    let image = &painter.frame().images[0].image;
    assert_eq!(image.width(), 350);
    assert_eq!(image.height(), 20);
}

#[test]
fn gradient_image_thickness_is_capped_for_huge_bars() {
    let mut scale = ColorScale::new();
    scale.set_bar_width(1e12).expect("bar width");
    scale
        .set_outer_rect(PixelRect::new(0.0, 0.0, 1e12, 200.0))
        .expect("rect");
    let mut painter = FramePainter::new();
    scale.draw(&mut painter).expect("draw");

    let image = &painter.frame().images[0].image;
    assert_eq!(image.width(), MAX_GRADIENT_IMAGE_THICKNESS);
    assert_eq!(image.height(), 350);
}

#[test]
fn drag_moves_the_value_with_the_pointer() {
    let mut scale = vertical_scale();
    // 200 px bar from y = 5; pixel 105 shows 3.0
    assert!(scale.drag(105.0, -50.0));
    let range = scale.data_range();
    assert!((range.lower + 1.5).abs() <= 1e-9);
    assert!((range.upper - 4.5).abs() <= 1e-9);

    scale.set_range_drag(false);
    assert!(!scale.drag(105.0, -50.0));
}

#[test]
fn zoom_scales_around_the_pointer_value() {
    let mut scale = vertical_scale();
    assert!(scale.zoom(0.5, 105.0));
    let range = scale.data_range();
    assert!((range.lower - 1.5).abs() <= 1e-9);
    assert!((range.upper - 4.5).abs() <= 1e-9);

    scale.set_range_zoom(false);
    assert!(!scale.zoom(0.5, 105.0));
}

#[test]
fn logarithmic_drag_is_multiplicative() {
    let mut scale = vertical_scale();
    scale.set_data_scale_type(ScaleType::Logarithmic);
    scale.set_data_range(PlotRange::new(1.0, 100.0));
    // half the bar is one decade
    assert!(scale.drag(105.0, -100.0));
    let range = scale.data_range();
    assert!((range.lower - 0.1).abs() <= 1e-9);
    assert!((range.upper - 10.0).abs() <= 1e-9);
}

#[test]
fn config_sets_levels_and_bar_width() {
    let config = PlotConfig {
        gradient_level_count: 16,
        color_scale_bar_width: 12.0,
        ..PlotConfig::default()
    };
    let scale = ColorScale::with_config(&config).expect("scale");
    assert_eq!(scale.gradient().level_count(), 16);
    assert!((scale.bar_width() - 12.0).abs() <= 1e-9);

    let broken = PlotConfig {
        gradient_level_count: 1,
        ..PlotConfig::default()
    };
    assert!(ColorScale::with_config(&broken).is_err());
}

#[test]
fn bound_maps_share_range_gradient_and_scale_type() {
    let scale = ColorScale::new().into_shared();
    let first = ColorMap::new("first", grid()).into_shared();
    let second = ColorMap::new("second", grid()).into_shared();
    ColorMap::bind_color_scale(&first, &scale).expect("bind first");
    ColorMap::bind_color_scale(&second, &scale).expect("bind second");
    assert_eq!(scale.borrow().consumer_count(), 2);
    assert_eq!(first.borrow().data_range(), PlotRange::new(0.0, 6.0));

    assert!(first.borrow_mut().set_data_range(PlotRange::new(2.0, 4.0)));
    assert_eq!(scale.borrow().data_range(), PlotRange::new(2.0, 4.0));
    assert_eq!(second.borrow().data_range(), PlotRange::new(2.0, 4.0));

    let hot = ColorGradient::from_preset(GradientPreset::Hot);
    assert!(scale.borrow_mut().set_gradient(hot.clone()));
    assert_eq!(first.borrow().gradient(), &hot);
    assert_eq!(second.borrow().gradient(), &hot);

    assert!(second.borrow_mut().set_data_scale_type(ScaleType::Logarithmic));
    assert_eq!(scale.borrow().data_scale_type(), ScaleType::Logarithmic);
    assert_eq!(first.borrow().data_scale_type(), ScaleType::Logarithmic);

    scale.borrow_mut().set_data_range(PlotRange::new(-5.0, 10.0));
    let synced = first.borrow().data_range();
    assert!((synced.lower - 1e-3).abs() <= 1e-12);
    assert_eq!(second.borrow().data_range(), synced);
}

#[test]
fn dropped_maps_are_released() {
    let scale = ColorScale::new().into_shared();
    let first = ColorMap::new("first", grid()).into_shared();
    {
        let second = ColorMap::new("second", grid()).into_shared();
        ColorMap::bind_color_scale(&second, &scale).expect("bind second");
    }
    ColorMap::bind_color_scale(&first, &scale).expect("bind first");
    assert_eq!(scale.borrow().consumer_count(), 1);

    assert!(scale.borrow_mut().set_data_range(PlotRange::new(1.0, 3.0)));
    assert_eq!(first.borrow().data_range(), PlotRange::new(1.0, 3.0));
}

#[test]
fn unbound_map_stops_following_the_scale() {
    let scale = ColorScale::new().into_shared();
    let map = ColorMap::new("map", grid()).into_shared();
    ColorMap::bind_color_scale(&map, &scale).expect("bind");
    assert!(map.borrow_mut().unbind_color_scale());
    assert_eq!(scale.borrow().consumer_count(), 0);

    scale.borrow_mut().set_data_range(PlotRange::new(10.0, 20.0));
    assert_eq!(map.borrow().data_range(), PlotRange::new(0.0, 6.0));
    assert!(map.borrow().color_scale().is_none());
}

#[test]
fn rescale_fits_the_union_of_consumer_bounds() {
    let scale = ColorScale::new().into_shared();
    let first = ColorMap::new("first", grid()).into_shared();
    let second = ColorMap::new("second", grid()).into_shared();
    ColorMap::bind_color_scale(&first, &scale).expect("bind first");
    ColorMap::bind_color_scale(&second, &scale).expect("bind second");

    first.borrow_mut().data_mut().set_cell(0, 0, -3.0);
    second.borrow_mut().data_mut().set_cell(1, 1, 9.0);
    assert!(scale.borrow_mut().rescale_data_range());
    assert_eq!(scale.borrow().data_range(), PlotRange::new(-3.0, 9.0));
    assert_eq!(first.borrow().data_range(), PlotRange::new(-3.0, 9.0));
}

#[test]
fn color_lookup_follows_range_and_gradient() {
    let mut scale = ColorScale::new();
    scale.set_gradient(ColorGradient::from_preset(GradientPreset::Grayscale));
    scale.set_data_range(PlotRange::new(10.0, 20.0));
    assert_eq!(scale.color_for(10.0).0, [0, 0, 0, 255]);
    assert_eq!(scale.color_for(25.0).0, [255, 255, 255, 255]);
}
