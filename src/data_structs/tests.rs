mod point_tests {
    use std::str::FromStr;

    use rstest::rstest;

    use crate::data_structs::point::*;

    // --- Chromosome tests ---

    #[rstest]
    #[case("0", Chromosome::Autosome(0))]
    #[case("7", Chromosome::Autosome(7))]
    #[case("22", Chromosome::Autosome(22))]
    #[case("150", Chromosome::Autosome(150))]
    #[case("250", Chromosome::Autosome(250))]
    #[case("251", Chromosome::Unknown)]
    #[case("999", Chromosome::Unknown)]
    #[case("05", Chromosome::Unknown)]
    #[case("x", Chromosome::X)]
    #[case("X", Chromosome::X)]
    #[case("y", Chromosome::Y)]
    #[case("xy", Chromosome::XY)]
    #[case("Mt", Chromosome::Mito)]
    #[case("MT", Chromosome::Mito)]
    #[case("chr1", Chromosome::Unknown)]
    #[case("", Chromosome::Unknown)]
    fn test_chromosome_from_str(
        #[case] input: &str,
        #[case] expected: Chromosome,
    ) {
        assert_eq!(Chromosome::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_chromosome_code_round_trip() {
        for code in 0..=u8::MAX {
            assert_eq!(Chromosome::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_chromosome_display() {
        assert_eq!(Chromosome::Autosome(9).to_string(), "9");
        assert_eq!(Chromosome::Autosome(250).to_string(), "250");
        assert_eq!(Chromosome::X.to_string(), "X");
        assert_eq!(Chromosome::XY.to_string(), "XY");
        assert_eq!(Chromosome::Mito.to_string(), "Mt");
        assert_eq!(Chromosome::Unknown.to_string(), "?");
    }

    #[test]
    fn test_chromosome_order_follows_codes() {
        assert!(Chromosome::Autosome(1) < Chromosome::Autosome(22));
        assert!(Chromosome::Autosome(250) < Chromosome::X);
        assert!(Chromosome::X < Chromosome::Y);
        assert!(Chromosome::Y < Chromosome::XY);
        assert!(Chromosome::XY < Chromosome::Mito);
        assert!(Chromosome::Mito < Chromosome::Unknown);
    }

    #[test]
    fn test_chromosome_serde_string_form() {
        let json = serde_json::to_string(&Chromosome::X).unwrap();
        assert_eq!(json, "\"X\"");
        let back: Chromosome = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(back, Chromosome::Autosome(17));
    }

    // --- Probe name tests ---

    #[rstest]
    #[case("rs123/7/123456", "rs123", Chromosome::Autosome(7), 123456)]
    #[case("rs123/X/5", "rs123", Chromosome::X, 5)]
    #[case("noslash", "", Chromosome::Unknown, 0)]
    #[case("id/12", "id", Chromosome::Unknown, 0)]
    #[case("id/12/34/56", "id", Chromosome::Autosome(12), 0)]
    #[case("id/12/bad", "id", Chromosome::Autosome(12), 0)]
    #[case("id/12/", "id", Chromosome::Autosome(12), 0)]
    #[case("/X/7", "", Chromosome::X, 7)]
    fn test_decompose(
        #[case] name: &str,
        #[case] id: &str,
        #[case] chromosome: Chromosome,
        #[case] position: u32,
    ) {
        let probe = ProbeName::decompose(name);
        assert_eq!(probe.id, id);
        assert_eq!(probe.chromosome, chromosome);
        assert_eq!(probe.position, position);
    }

    #[test]
    fn test_compose_round_trip() {
        let probe = ProbeName {
            id:         "rs10".to_string(),
            chromosome: Chromosome::Mito,
            position:   42,
        };
        assert_eq!(probe.compose(), "rs10/Mt/42");
        assert_eq!(ProbeName::decompose(&probe.compose()), probe);
    }

    #[test]
    fn test_split_name_keeps_raw_fields() {
        assert_eq!(split_name("rs1/X/07"), ("rs1", "X", "07"));
        assert_eq!(split_name("rs1/X"), ("rs1", "", ""));
        assert_eq!(split_name("rs1"), ("", "", ""));
    }

    #[test]
    fn test_decode_position_rejects_non_digits() {
        assert_eq!(decode_position("123456"), 123456);
        assert_eq!(decode_position("007"), 7);
        assert_eq!(decode_position(""), 0);
        assert_eq!(decode_position("12a"), 0);
        assert_eq!(decode_position("-5"), 0);
        assert_eq!(decode_position("+5"), 0);
    }
}

mod sequence_tests {
    use arcstr::ArcStr;

    use crate::data_structs::sequence::*;

    fn named(pairs: &[(&str, f32)]) -> Sequence {
        pairs
            .iter()
            .map(|&(name, value)| (ArcStr::from(name), value))
            .collect()
    }

    // --- Container tests ---

    #[test]
    fn test_unnamed_pushes_keep_names_empty() {
        let mut sequence = Sequence::new();
        sequence.push_value(1.0);
        sequence.push_value(2.0);
        assert!(!sequence.is_named());
        assert_eq!(sequence.values(), &[1.0, 2.0]);
        assert_eq!(sequence.name_at(0), None);
    }

    #[test]
    fn test_unnamed_push_on_named_sequence_adds_placeholder() {
        let mut sequence = named(&[("a", 1.0)]);
        sequence.push_value(2.0);
        assert_eq!(sequence.names().len(), 2);
        assert_eq!(sequence.name_at(1), None);
        assert_eq!(sequence.len(), 2);
    }

    #[test]
    fn test_iter_yields_names_and_values() {
        let sequence = named(&[("a", 1.0), ("b", 2.0)]);
        let collected: Vec<_> = sequence
            .iter()
            .map(|(name, value)| (name.map(|n| n.to_string()), value))
            .collect();
        assert_eq!(collected, vec![
            (Some("a".to_string()), 1.0),
            (Some("b".to_string()), 2.0),
        ]);
    }

    // --- Paired iterator tests ---

    #[test]
    fn test_paired_lockstep_on_identical_names() {
        let a = named(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let b = named(&[("a", 10.0), ("b", 20.0), ("c", 30.0)]);
        let rows: Vec<_> = PairedIter::new(&a, &b)
            .map(|(_, first, second)| (first, second))
            .collect();
        assert_eq!(rows, vec![(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)]);
    }

    #[test]
    fn test_paired_skips_missing_probes() {
        let a = named(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        let b = named(&[("a", 10.0), ("c", 30.0), ("d", 40.0)]);
        let rows: Vec<_> = PairedIter::new(&a, &b)
            .map(|(name, first, second)| {
                (name.map(|n| n.to_string()), first, second)
            })
            .collect();
        assert_eq!(rows, vec![
            (Some("a".to_string()), 1.0, 10.0),
            (Some("c".to_string()), 3.0, 30.0),
            (Some("d".to_string()), 4.0, 40.0),
        ]);
    }

    #[test]
    fn test_paired_unnamed_falls_back_to_lockstep() {
        let a = Sequence::from_values(vec![1.0, 2.0, 3.0]);
        let b = named(&[("a", 10.0), ("b", 20.0)]);
        let rows: Vec<_> = PairedIter::new(&a, &b)
            .map(|(_, first, second)| (first, second))
            .collect();
        assert_eq!(rows, vec![(1.0, 10.0), (2.0, 20.0)]);
    }

    #[test]
    fn test_paired_disjoint_names_fall_back_to_lockstep() {
        let a = named(&[("a", 1.0), ("b", 2.0)]);
        let b = named(&[("x", 10.0), ("y", 20.0)]);
        let rows: Vec<_> = PairedIter::new(&a, &b)
            .map(|(_, first, second)| (first, second))
            .collect();
        assert_eq!(rows, vec![(1.0, 10.0), (2.0, 20.0)]);
    }

    #[test]
    fn test_paired_prefers_nearest_match() {
        // "b" appears two steps ahead on the left and one step ahead on the
        // right; the (1, 0) cross pair must win over the later diagonal.
        let a = named(&[("x", 1.0), ("b", 2.0)]);
        let b = named(&[("b", 20.0), ("z", 30.0)]);
        let rows: Vec<_> = PairedIter::new(&a, &b)
            .map(|(name, first, second)| {
                (name.map(|n| n.to_string()), first, second)
            })
            .collect();
        assert_eq!(rows[0], (Some("b".to_string()), 2.0, 20.0));
    }

    // --- Multi iterator tests ---

    #[test]
    fn test_align_three_way_overlap() {
        let s1 = named(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let s2 = named(&[("a", 10.0), ("c", 30.0)]);
        let s3 = named(&[("b", 100.0), ("c", 300.0)]);
        let aligned = align(&[&s1, &s2, &s3]);

        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned[0].values(), &[3.0]);
        assert_eq!(aligned[1].values(), &[30.0]);
        assert_eq!(aligned[2].values(), &[300.0]);
        assert_eq!(aligned[0].name_at(0).map(|n| n.as_str()), Some("c"));
    }

    #[test]
    fn test_align_identical_sequences_is_identity() {
        let s1 = named(&[("a", 1.0), ("b", 2.0)]);
        let s2 = named(&[("a", 5.0), ("b", 6.0)]);
        let aligned = align(&[&s1, &s2]);
        assert_eq!(aligned[0].values(), s1.values());
        assert_eq!(aligned[1].values(), s2.values());
    }

    #[test]
    fn test_multi_iter_empty_member_ends_immediately() {
        let s1 = named(&[("a", 1.0)]);
        let s2 = Sequence::new();
        let iter = MultiIter::new(&[&s1, &s2]);
        assert!(!iter.is_valid());
    }

    #[test]
    fn test_multi_iter_no_members_is_invalid() {
        let iter = MultiIter::new(&[]);
        assert!(!iter.is_valid());
    }
}
