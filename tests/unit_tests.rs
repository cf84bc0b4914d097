use approx::assert_abs_diff_eq;
use single_outliers::prelude::*;

fn scenario() -> Dataset {
    // Sample A: [1, 2, 3, 4, 100]; sample B: [5, 6]
    Dataset::from_rows(
        &["CD44"],
        [
            ("A_cell_1", vec![1.0]),
            ("A_cell_2", vec![2.0]),
            ("A_cell_3", vec![3.0]),
            ("A_cell_4", vec![4.0]),
            ("A_cell_5", vec![100.0]),
            ("B_cell_1", vec![5.0]),
            ("B_cell_2", vec![6.0]),
        ],
    )
    .unwrap()
}

#[cfg(test)]
mod quick_test {
    use super::*;

    #[test]
    fn check_reference_fences() {
        let data = scenario();
        let table = data.reference_cutoffs("A", 1.5).unwrap();
        let stats = table.lookup("A", 0).unwrap();

        println!("Q1={} Q3={} IQR={}", stats.first_quartile, stats.third_quartile, stats.iqr);
        assert_abs_diff_eq!(stats.first_quartile, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.third_quartile, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.iqr, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.upper_cutoff, 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.lower_cutoff, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn check_only_extreme_value_is_reference_top_outlier() {
        let data = scenario();
        let reference = data.reference_cutoffs("A", 1.5).unwrap();
        let config = AnalysisConfig::default().with_cutoff_rule(CutoffRule::Reference);
        let subsets: Vec<ResultSubset> = SubsetGenerator::new(&data, &config, Some(&reference), None)
            .unwrap()
            .collect();

        assert_eq!(subsets.len(), 1);
        assert_eq!(subsets[0].rows, vec![4]);
        assert_eq!(subsets[0].info.category, Category::TopOutliers);
    }

    #[test]
    fn check_sample_b_has_no_outliers_of_its_own() {
        let data = scenario();
        let cutoffs = data.sample_cutoffs(&["A", "B"], 1.5).unwrap();
        let config = AnalysisConfig::default().with_bottom_outliers(true);
        for subset in SubsetGenerator::new(&data, &config, None, Some(&cutoffs)).unwrap() {
            assert!(subset.rows.iter().all(|&r| !data.labels()[r].starts_with('B')));
        }
    }

    #[test]
    fn check_tukey_invariant_over_factors() {
        let data = scenario();
        for k in [0.0, 0.25, 1.0, 1.5, 3.0, 10.0] {
            let table = data.sample_cutoffs(&["A", "B"], k).unwrap();
            for (sample, marker, stats) in table.iter() {
                assert!(
                    stats.lower_cutoff <= stats.first_quartile
                        && stats.first_quartile <= stats.third_quartile
                        && stats.third_quartile <= stats.upper_cutoff,
                    "fences out of order for {}/{} at k={}",
                    sample,
                    marker,
                    k
                );
            }
        }
    }

    #[test]
    fn check_boundary_values_are_non_outliers() {
        // A: [0, 1, 2, 3, 4] with k = 0 puts the fences on 1 and 3 exactly
        let data = Dataset::from_rows(
            &["M"],
            (0..5).map(|i| (format!("A_{}", i), vec![i as f64])),
        )
        .unwrap();
        let cutoffs = data.sample_cutoffs(&["A"], 0.0).unwrap();
        let config = AnalysisConfig::default()
            .with_bottom_outliers(true)
            .with_non_outliers(true);
        let subsets: Vec<ResultSubset> = SubsetGenerator::new(&data, &config, None, Some(&cutoffs))
            .unwrap()
            .collect();

        assert_eq!(subsets[0].rows, vec![4]);
        assert_eq!(subsets[1].rows, vec![0]);
        assert_eq!(subsets[2].rows, vec![1, 2, 3]);
    }

    #[test]
    fn check_missing_values_fall_in_no_category() {
        let data = Dataset::from_rows(
            &["M", "N"],
            [
                ("A_1", vec![1.0, f64::NAN]),
                ("A_2", vec![2.0, 2.0]),
                ("A_3", vec![3.0, 3.0]),
                ("A_4", vec![f64::NAN, 4.0]),
            ],
        )
        .unwrap();
        let cutoffs = data.sample_cutoffs(&["A"], 1.5).unwrap();
        let config = AnalysisConfig::default()
            .with_marker_rule(MarkerRule::Both)
            .with_bottom_outliers(true)
            .with_non_outliers(true);
        let subsets: Vec<ResultSubset> = SubsetGenerator::new(&data, &config, None, Some(&cutoffs))
            .unwrap()
            .collect();

        // any marker: every row has at least one comparable value
        assert_eq!(subsets[2].rows, vec![0, 1, 2, 3]);
        // single marker M: row 3 is missing and dropped from every category
        let m_total: usize = subsets[3..6].iter().map(|s| s.len()).sum();
        assert_eq!(m_total, 3);
        assert!(subsets[3..6].iter().all(|s| !s.rows.contains(&3)));
    }

    #[test]
    fn check_gate_boundary_is_inclusive() {
        let mut data = Dataset::from_rows(
            &["M", "N"],
            [("A_1", vec![4.0, 6.0]), ("A_2", vec![5.0, 5.1]), ("A_3", vec![0.0, 0.0])],
        )
        .unwrap();
        Gate {
            kind: GateKind::CytometryAverage,
            threshold: 5.0,
        }
        .apply(&mut data);
        assert_eq!(data.labels(), &["A_2".to_string()]);
    }

    #[test]
    fn check_sample_spec_errors() {
        let kind = |result: anyhow::Result<SampleSpec>| result.unwrap_err().downcast::<ScoutsError>().unwrap();

        assert_eq!(
            kind(SampleSpec::from_pairs(Vec::<(&str, bool)>::new())),
            ScoutsError::EmptySampleList
        );
        assert_eq!(
            kind(SampleSpec::from_pairs([("Ct", true), ("Ct", false)])),
            ScoutsError::DuplicateSample("Ct".to_string())
        );
        assert_eq!(
            kind(SampleSpec::from_pairs([("Ct", true), ("Drug", true)])),
            ScoutsError::MultipleReferences {
                first: "Ct".to_string(),
                second: "Drug".to_string()
            }
        );
    }

    #[test]
    fn check_sample_naming_mismatch() {
        let data = scenario();
        let samples = SampleSpec::from_pairs([("A", true), ("C", false)]).unwrap();
        let err = samples.validate_against(&data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScoutsError>(),
            Some(&ScoutsError::SampleNaming("C".to_string()))
        );
    }

    #[test]
    fn check_describe_statistics() {
        let data = scenario();
        let describe = Describe::of(&data, &[0, 1, 2, 3, 4], 0);
        assert_eq!(describe.count, 5);
        assert_abs_diff_eq!(describe.mean.unwrap(), 22.0, epsilon = 1e-12);
        assert_abs_diff_eq!(describe.median.unwrap(), 3.0, epsilon = 1e-12);
        // sample sd of [1, 2, 3, 4, 100]
        assert_abs_diff_eq!(describe.std_dev.unwrap(), 43.617656975128774, epsilon = 1e-9);
    }
}
