use super::*;

mod common {
    use super::*;

    pub(super) fn p(key_id: u32, offset: u32) -> Posting {
        Posting::new(KeyId::new(key_id), offset)
    }

    #[derive(Debug)]
    pub(super) struct Item {
        pub score: f32,
        pub priority: u32,
        pub id: u32,
    }

    impl Ranked for Item {
        fn score(&self) -> f32 {
            self.score
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn key_id(&self) -> KeyId {
            KeyId::new(self.id)
        }
    }
}

mod folding {
    use super::*;

    #[test]
    fn test_fold_insensitive_lowercases() {
        assert_eq!(fold("MainWindow.JAVA", false), "mainwindow.java");
    }

    #[test]
    fn test_fold_sensitive_is_identity() {
        assert_eq!(fold("MainWindow", true), "MainWindow");
    }

    #[test]
    fn test_fold_keeps_char_count() {
        // U+0130 lowercases to two codepoints; only the first is kept.
        let text = "\u{130}stanbul";
        assert_eq!(fold(text, false).chars().count(), text.chars().count());
        assert_eq!(fold_char('\u{130}', false), 'i');
    }
}

mod greedy {
    use super::*;

    #[test]
    fn test_leftmost_binding() {
        assert_eq!(
            greedy_positions("gtk_widget_show", "gtkwdg", false),
            Some(vec![0, 1, 2, 4, 6, 7])
        );
    }

    #[test]
    fn test_not_a_subsequence() {
        assert_eq!(greedy_positions("Main.java", "mw", false), None);
        assert_eq!(greedy_positions("readme.md", "mw", false), None);
    }

    #[test]
    fn test_case_sensitivity() {
        assert_eq!(greedy_positions("MainWindow", "mw", true), None);
        assert_eq!(greedy_positions("MainWindow", "MW", true), Some(vec![0, 4]));
        assert_eq!(greedy_positions("MainWindow", "mw", false), Some(vec![0, 4]));
    }

    #[test]
    fn test_empty_query_matches_without_positions() {
        assert_eq!(greedy_positions("anything", "", false), Some(vec![]));
        assert_eq!(greedy_positions("", "", false), Some(vec![]));
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        assert_eq!(greedy_positions("héllo", "lo", false), Some(vec![3, 4]));
    }
}

mod candidates {
    use super::common::p;
    use super::*;

    #[test]
    fn test_extends_within_same_key() {
        // key 0: "ab", key 1: "ba", key 2: "axb"
        let a = [p(0, 0), p(1, 1), p(2, 0)];
        let b = [p(0, 1), p(1, 0), p(2, 2)];
        let tables: Vec<&[Posting]> = vec![&a, &b];

        let found = collect_candidates(&tables, |_| true);

        assert_eq!(
            found,
            vec![
                Candidate {
                    key_id: KeyId::new(0),
                    positions: vec![0, 1]
                },
                Candidate {
                    key_id: KeyId::new(2),
                    positions: vec![0, 2]
                },
            ]
        );
    }

    #[test]
    fn test_uses_first_occurrence_of_first_char() {
        // key 0: "aab"
        let a = [p(0, 0), p(0, 1)];
        let b = [p(0, 2)];
        let tables: Vec<&[Posting]> = vec![&a, &b];

        let found = collect_candidates(&tables, |_| true);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].positions, vec![0, 2]);
    }

    #[test]
    fn test_repeated_query_char_needs_two_occurrences() {
        // key 0: "al", key 1: "all"
        let a = [p(0, 0), p(1, 0)];
        let l = [p(0, 1), p(1, 1), p(1, 2)];
        let tables: Vec<&[Posting]> = vec![&a, &l, &l];

        let found = collect_candidates(&tables, |_| true);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key_id, KeyId::new(1));
        assert_eq!(found[0].positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_skips_dead_keys() {
        let a = [p(0, 0), p(1, 0)];
        let tables: Vec<&[Posting]> = vec![&a];

        let found = collect_candidates(&tables, |id| id != KeyId::new(0));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key_id, KeyId::new(1));
    }

    #[test]
    fn test_empty_later_table_short_circuits() {
        let a = [p(0, 0)];
        let empty: [Posting; 0] = [];
        let tables: Vec<&[Posting]> = vec![&a, &empty];

        let mut visited = 0;
        let found = collect_candidates(&tables, |_| {
            visited += 1;
            true
        });

        assert!(found.is_empty());
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_no_tables_no_candidates() {
        let tables: Vec<&[Posting]> = vec![];
        assert!(collect_candidates(&tables, |_| true).is_empty());
    }

    #[test]
    fn test_default_lower_bound_agrees_with_slice() {
        struct Wrapped<'a>(&'a [Posting]);

        impl PostingList for Wrapped<'_> {
            fn len(&self) -> usize {
                self.0.len()
            }

            fn get(&self, index: usize) -> Posting {
                self.0[index]
            }
        }

        let list = [p(0, 3), p(1, 0), p(1, 4), p(3, 1)];
        for target in [p(0, 0), p(1, 1), p(1, 4), p(2, 0), p(9, 9)] {
            assert_eq!(
                Wrapped(&list).lower_bound(target),
                list.as_slice().lower_bound(target)
            );
        }
    }
}

mod scoring {
    use super::*;

    #[test]
    fn test_smaller_gap_scores_higher() {
        // Same text length and start, only the gap differs.
        let tight = score("abxxxx", "ab", &[0, 1], false);
        let loose = score("axxxxb", "ab", &[0, 5], false);
        assert!(tight > loose);
    }

    #[test]
    fn test_earlier_start_scores_higher() {
        let early = score("xabxx", "ab", &[1, 2], false);
        let late = score("xxxab", "ab", &[3, 4], false);
        assert!(early > late);
    }

    #[test]
    fn test_exact_case_scores_higher() {
        let exact = score("xFoo", "Foo", &[1, 2, 3], false);
        let folded = score("xfoo", "Foo", &[1, 2, 3], false);
        assert!(exact > folded);
    }

    #[test]
    fn test_word_boundary_scores_higher() {
        let boundary = score("xx_mw", "m", &[3], false);
        let inner = score("xxamw", "m", &[3], false);
        assert!(boundary > inner);
    }

    #[test]
    fn test_camel_case_is_a_boundary() {
        let camel = score("mainWindow", "w", &[4], false);
        let flat = score("mainwindow", "w", &[4], false);
        assert!(camel > flat);
    }

    #[test]
    fn test_deterministic() {
        let a = score("gtk_widget_show", "gtkwdg", &[0, 1, 2, 4, 6, 7], false);
        let b = score("gtk_widget_show", "gtkwdg", &[0, 1, 2, 4, 6, 7], false);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_no_positions_scores_zero() {
        assert_eq!(score("text", "", &[], false), 0.0);
    }
}

mod ranking {
    use super::common::Item;
    use super::*;

    #[test]
    fn test_orders_by_score_then_priority_then_id() {
        let mut items = vec![
            Item {
                score: 0.5,
                priority: 1,
                id: 4,
            },
            Item {
                score: 0.9,
                priority: 9,
                id: 5,
            },
            Item {
                score: 0.5,
                priority: 0,
                id: 7,
            },
            Item {
                score: 0.5,
                priority: 0,
                id: 2,
            },
        ];

        rank(&mut items, 0);

        let ids: Vec<u32> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![5, 2, 7, 4]);
    }

    #[test]
    fn test_truncates_to_max_matches() {
        let mut items: Vec<Item> = (0..10)
            .map(|id| Item {
                score: id as f32,
                priority: 0,
                id,
            })
            .collect();

        rank(&mut items, 3);

        let ids: Vec<u32> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![9, 8, 7]);
    }
}
