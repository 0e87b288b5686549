use credit_dash::data::aggregate::{AgeBucket, by_age_bucket, summarize};
use credit_dash::data::filter::{self, Bounds, CategoryFilter, FilterPredicates};
use credit_dash::data::{Dataset, Record};
use proptest::prelude::*;

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        1u32..=100,
        0u32..=95,
        0i64..=6,
        1i64..=2,
        0i64..=3,
        any::<bool>(),
    )
        .prop_map(|(limit, age, education, sex, marriage, defaulted)| Record {
            credit_limit: f64::from(limit) * 10_000.0,
            age,
            education,
            sex,
            marriage,
            pay_status: [0; 6],
            bill_amount: [0.0; 6],
            pay_amount: [0.0; 6],
            defaulted,
        })
}

fn dataset_strategy() -> impl Strategy<Value = Dataset> {
    prop::collection::vec(record_strategy(), 0..120).prop_map(Dataset::new)
}

fn category_strategy(codes: std::ops::RangeInclusive<i64>) -> impl Strategy<Value = CategoryFilter> {
    prop_oneof![Just(CategoryFilter::Any), codes.prop_map(CategoryFilter::Only)]
}

fn predicates_strategy() -> impl Strategy<Value = FilterPredicates> {
    (
        (0u32..=100, 0u32..=100),
        (0u32..=95, 0u32..=95),
        category_strategy(0..=6),
        category_strategy(1..=2),
    )
        .prop_map(|((l1, l2), (a1, a2), education, sex)| FilterPredicates {
            credit_limit: Bounds::new(
                f64::from(l1.min(l2)) * 10_000.0,
                f64::from(l1.max(l2)) * 10_000.0,
            )
            .unwrap(),
            age: Bounds::new(a1.min(a2), a1.max(a2)).unwrap(),
            education,
            sex,
        })
}

proptest! {
    #[test]
    fn filter_output_is_a_matching_subset(ds in dataset_strategy(), p in predicates_strategy()) {
        let out = filter::apply(&ds, &p);
        prop_assert!(out.len() <= ds.len());
        prop_assert!(out.iter().all(|r| p.matches(r)));
        let expected: Vec<Record> = ds.iter().filter(|r| p.matches(r)).copied().collect();
        prop_assert_eq!(out.records, expected);
    }

    #[test]
    fn unconstrained_is_identity(ds in dataset_strategy()) {
        let out = filter::apply(&ds, &FilterPredicates::unconstrained(&ds));
        prop_assert_eq!(out, ds);
    }

    #[test]
    fn filtering_is_idempotent(ds in dataset_strategy(), p in predicates_strategy()) {
        let once = filter::apply(&ds, &p);
        let twice = filter::apply(&once, &p);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn buckets_partition_the_covered_ages(ds in dataset_strategy()) {
        let buckets = by_age_bucket(&ds);
        let covered = ds.iter().filter(|r| r.age > 20 && r.age <= 80).count();
        prop_assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), covered);
        prop_assert!(covered <= ds.len());
        prop_assert!(buckets.windows(2).all(|w| w[0].bucket < w[1].bucket));
        for b in &buckets {
            prop_assert!(b.count > 0);
            prop_assert!((0.0..=1.0).contains(&b.default_rate));
            prop_assert_eq!(Some(b.bucket), AgeBucket::for_age(b.bucket.upper));
        }
    }

    #[test]
    fn rate_is_defaults_over_count(ds in dataset_strategy()) {
        let s = summarize(&ds);
        prop_assert_eq!(s.count, ds.len());
        let k = ds.iter().filter(|r| r.defaulted).count();
        match s.default_rate {
            None => prop_assert!(ds.is_empty()),
            Some(rate) => prop_assert_eq!(rate, k as f64 / ds.len() as f64),
        }
    }
}
