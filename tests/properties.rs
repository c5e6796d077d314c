use proptest::prelude::*;

use music_minds::{
    aggregate, assign_bin, compose_score, drop_incomplete, filter, BinSpec, Constraint,
    ConstraintSet, Dataset, Record, Value,
};

const GENRES: [&str; 4] = ["Rock", "Jazz", "Pop", "Metal"];

fn cell(v: Option<f64>) -> Value {
    v.map_or(Value::Missing, Value::Number)
}

fn record() -> impl Strategy<Value = Record> {
    (
        proptest::option::weighted(0.9, 10.0..80.0f64),
        proptest::option::weighted(0.9, 0.0..24.0f64),
        proptest::option::weighted(0.9, 0..GENRES.len()),
        proptest::option::weighted(0.8, 0.0..10.0f64),
    )
        .prop_map(|(age, hours, genre, anxiety)| {
            Record::new()
                .with("Age", cell(age))
                .with("Hours", cell(hours))
                .with("Genre", genre.map_or(Value::Missing, |g| Value::from(GENRES[g])))
                .with("Anxiety", cell(anxiety))
        })
}

fn dataset() -> impl Strategy<Value = Dataset> {
    proptest::collection::vec(record(), 0..40).prop_map(|records| {
        Dataset::with_columns(
            ["Age", "Hours", "Genre", "Anxiety"].map(String::from).to_vec(),
            records,
        )
    })
}

fn constraint() -> impl Strategy<Value = Constraint> {
    prop_oneof![
        (0.0..90.0f64, 0.0..90.0f64).prop_map(|(lo, hi)| Constraint::range("Age", lo, hi)),
        (0.0..24.0f64, 0.0..24.0f64).prop_map(|(lo, hi)| Constraint::range("Hours", lo, hi)),
        proptest::sample::subsequence(GENRES.to_vec(), 0..=GENRES.len())
            .prop_map(|gs| Constraint::one_of("Genre", gs)),
        (0..GENRES.len()).prop_map(|g| Constraint::equals("Genre", GENRES[g])),
    ]
}

fn constraint_set() -> impl Strategy<Value = ConstraintSet> {
    proptest::collection::vec(constraint(), 0..4).prop_map(|constraints| ConstraintSet { constraints })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn drop_incomplete_is_idempotent(ds in dataset()) {
        let fields = ["Age", "Anxiety"];
        let once = drop_incomplete(&ds, &fields).unwrap();
        let twice = drop_incomplete(&once, &fields).unwrap();
        prop_assert!(once.len() <= ds.len());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn conjunctive_filters_compose(ds in dataset(), c1 in constraint_set(), c2 in constraint_set()) {
        let stepwise = filter(&filter(&ds, &c1).unwrap(), &c2).unwrap();
        let combined = filter(&ds, &c1.and(&c2)).unwrap();
        prop_assert_eq!(stepwise, combined);
    }

    #[test]
    fn empty_filter_aggregates_to_nothing(ds in dataset(), c in constraint_set()) {
        let filtered = filter(&ds, &c).unwrap();
        let rows = aggregate(&filtered, &["Genre"], &["Anxiety"], Default::default()).unwrap();
        if filtered.is_empty() {
            prop_assert!(rows.is_empty());
        }
        for row in &rows {
            prop_assert!(row.count > 0);
            prop_assert!(!row.group[0].1.is_missing());
        }
    }

    #[test]
    fn composite_of_missing_is_missing(n in 1usize..5) {
        let metrics: Vec<String> = (0..n).map(|i| format!("m{i}")).collect();
        let mut r = Record::new();
        for m in &metrics {
            r.set(m, Value::Missing);
        }
        prop_assert_eq!(compose_score(&r, &metrics), Value::Missing);
    }

    #[test]
    fn bin_assignment_is_total_and_exclusive(x in -10.0..130.0f64) {
        let spec = BinSpec::age_groups();
        let edges = spec.edges();
        let last = spec.labels().len() - 1;
        let containing: Vec<usize> = (0..=last)
            .filter(|&i| {
                let (lo, hi) = (edges[i], edges[i + 1]);
                lo <= x && (x < hi || (i == last && x == hi))
            })
            .collect();
        let label = assign_bin(&Value::Number(x), &spec);
        match containing.as_slice() {
            [] => prop_assert_eq!(label, Value::Missing),
            [i] => prop_assert_eq!(label, Value::Text(spec.labels()[*i].clone())),
            more => prop_assert!(false, "{x} falls in {} bins", more.len()),
        }
    }

    #[test]
    fn uniform_bins_cover_their_span(lo in -50.0..50.0f64, width in 0.5..100.0f64, n in 1usize..12, t in 0.0..=1.0f64) {
        let hi = lo + width;
        let spec = BinSpec::uniform(lo, hi, n).unwrap();
        let x = lo + t * width;
        prop_assert!(!assign_bin(&Value::Number(x), &spec).is_missing());
    }
}
