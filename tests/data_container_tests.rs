use plot_rs::core::{DataContainer, FinancialData, GraphData, PlotRange, SignDomain};

fn keys(container: &DataContainer<GraphData>) -> Vec<f64> {
    container.iter().map(|point| point.key).collect()
}

#[test]
fn unsorted_bulk_input_is_sorted_on_insert() {
    let container = DataContainer::from_points(
        vec![
            GraphData::new(3.0, 30.0),
            GraphData::new(1.0, 10.0),
            GraphData::new(2.0, 20.0),
        ],
        false,
    );
    assert_eq!(keys(&container), vec![1.0, 2.0, 3.0]);
}

#[test]
fn wrongly_flagged_sorted_input_is_still_sorted() {
    let container = DataContainer::from_points(
        vec![GraphData::new(5.0, 1.0), GraphData::new(4.0, 2.0)],
        true,
    );
    assert_eq!(keys(&container), vec![4.0, 5.0]);
}

#[test]
fn bulk_add_appends_prepends_and_merges() {
    let mut container = DataContainer::from_points(
        vec![GraphData::new(10.0, 0.0), GraphData::new(20.0, 0.0)],
        true,
    );
    container.add_bulk(vec![GraphData::new(30.0, 0.0)], true);
    container.add_bulk(vec![GraphData::new(1.0, 0.0), GraphData::new(2.0, 0.0)], true);
    container.add_bulk(vec![GraphData::new(15.0, 0.0), GraphData::new(25.0, 0.0)], false);
    assert_eq!(keys(&container), vec![1.0, 2.0, 10.0, 15.0, 20.0, 25.0, 30.0]);
}

#[test]
fn non_finite_keys_are_dropped() {
    let mut container = DataContainer::from_points(
        vec![
            GraphData::new(f64::NAN, 1.0),
            GraphData::new(1.0, 1.0),
            GraphData::new(f64::INFINITY, 1.0),
        ],
        false,
    );
    container.add(GraphData::new(f64::NEG_INFINITY, 2.0));
    assert_eq!(container.len(), 1);
}

#[test]
fn non_finite_values_are_kept() {
    let container = DataContainer::from_points(
        vec![GraphData::new(1.0, f64::NAN), GraphData::new(2.0, 4.0)],
        true,
    );
    assert_eq!(container.len(), 2);
    assert_eq!(
        container.value_range(SignDomain::Both, None),
        Some(PlotRange::new(4.0, 4.0))
    );
}

#[test]
fn single_add_keeps_order_for_any_key() {
    let mut container = DataContainer::new();
    for key in [5.0, 1.0, 3.0, 7.0, 3.0] {
        container.add(GraphData::new(key, key * 10.0));
    }
    assert_eq!(keys(&container), vec![1.0, 3.0, 3.0, 5.0, 7.0]);
}

#[test]
fn find_begin_and_end_respect_expansion() {
    let container = DataContainer::from_points(
        (0..10).map(|i| GraphData::new(f64::from(i), 0.0)).collect(),
        true,
    );
    assert_eq!(container.find_begin(3.5, false), 4);
    assert_eq!(container.find_begin(3.5, true), 3);
    assert_eq!(container.find_end(6.5, false), 7);
    assert_eq!(container.find_end(6.5, true), 8);
    assert_eq!(container.find_begin(-1.0, true), 0);
    assert_eq!(container.find_end(20.0, true), 10);
}

#[test]
fn visible_range_includes_one_neighbour_on_each_side() {
    let container = DataContainer::from_points(
        (0..10).map(|i| GraphData::new(f64::from(i), 0.0)).collect(),
        true,
    );
    assert_eq!(container.find_range(2.5, 5.5), 3..6);
    assert_eq!(container.visible_range(2.5, 5.5), 2..7);
    assert!(container.find_range(20.0, 30.0).is_empty());
}

#[test]
fn find_range_bounds_are_inclusive_on_exact_keys() {
    let container = DataContainer::from_points(
        (1..=5).map(|i| GraphData::new(f64::from(i), 0.0)).collect(),
        true,
    );
    let range = container.find_range(2.0, 4.0);
    assert_eq!(range, 1..4);
    let found: Vec<f64> = container.as_slice()[range].iter().map(|point| point.key).collect();
    assert_eq!(found, vec![2.0, 3.0, 4.0]);
    assert!(container.find_range(10.0, 20.0).is_empty());
}

#[test]
fn key_range_honours_sign_domain() {
    let container = DataContainer::from_points(
        vec![
            GraphData::new(-4.0, 0.0),
            GraphData::new(-1.0, 0.0),
            GraphData::new(2.0, 0.0),
            GraphData::new(6.0, 0.0),
        ],
        true,
    );
    assert_eq!(
        container.key_range(SignDomain::Both),
        Some(PlotRange::new(-4.0, 6.0))
    );
    assert_eq!(
        container.key_range(SignDomain::Positive),
        Some(PlotRange::new(2.0, 6.0))
    );
    assert_eq!(
        container.key_range(SignDomain::Negative),
        Some(PlotRange::new(-4.0, -1.0))
    );
    assert_eq!(DataContainer::<GraphData>::new().key_range(SignDomain::Both), None);
}

#[test]
fn value_range_can_be_restricted_to_key_interval() {
    let container = DataContainer::from_points(
        vec![
            GraphData::new(0.0, -5.0),
            GraphData::new(1.0, 2.0),
            GraphData::new(2.0, 8.0),
            GraphData::new(3.0, 100.0),
        ],
        true,
    );
    assert_eq!(
        container.value_range(SignDomain::Both, Some(PlotRange::new(0.5, 2.5))),
        Some(PlotRange::new(2.0, 8.0))
    );
    assert_eq!(
        container.value_range(SignDomain::Positive, None),
        Some(PlotRange::new(2.0, 100.0))
    );
}

#[test]
fn financial_value_range_spans_low_to_high() {
    let container = DataContainer::from_points(
        vec![
            FinancialData::new(1.0, 5.0, 10.0, 3.0, 8.0),
            FinancialData::new(2.0, 8.0, 15.0, 6.0, 6.0),
        ],
        true,
    );
    assert_eq!(
        container.value_range(SignDomain::Both, None),
        Some(PlotRange::new(3.0, 15.0))
    );
}

#[test]
fn removal_helpers_drop_the_requested_keys() {
    let fresh = || {
        DataContainer::from_points(
            (0..10).map(|i| GraphData::new(f64::from(i), 0.0)).collect(),
            true,
        )
    };

    let mut container = fresh();
    container.remove_before(3.0);
    assert_eq!(container.first().map(|p| p.key), Some(3.0));

    let mut container = fresh();
    container.remove_after(6.0);
    assert_eq!(container.last().map(|p| p.key), Some(6.0));

    let mut container = fresh();
    container.remove_range(2.0, 4.0);
    assert_eq!(keys(&container), vec![0.0, 1.0, 5.0, 6.0, 7.0, 8.0, 9.0]);

    let mut container = fresh();
    container.remove_range(4.0, 2.0);
    assert_eq!(container.len(), 10);
}
