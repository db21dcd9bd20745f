/*!
 * Property tests for the line codec and duplicate analysis
 */

use proptest::prelude::*;
use treedump::{DuplicateAnalyzer, DuplicateKey, DumpPath, Entry, IndentStyle, LineCodec, TypeFlags};

fn type_flags() -> impl Strategy<Value = TypeFlags> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(directory, file, symlink, other)| TypeFlags {
            directory,
            file,
            symlink,
            other,
        },
    )
}

fn entry(sequence: u64, depth: usize, name: String, type_flags: TypeFlags, size: u64) -> Entry {
    Entry {
        sequence,
        depth,
        name,
        type_flags,
        size,
        created: "2021-06-01T10:00:00+02:00".to_string(),
        modified: "2021-06-02T10:00:00+02:00".to_string(),
        accessed: "2021-06-03T10:00:00+02:00".to_string(),
        path: None,
    }
}

proptest! {
    #[test]
    fn test_round_trip_plain_names(
        sequence in 1u64..10_000_000,
        depth in 1usize..12,
        name in "[A-Za-z0-9._-][A-Za-z0-9._ -]{0,30}",
        flags in type_flags(),
        size in any::<u64>(),
    ) {
        let codec = LineCodec::new(IndentStyle::default(), false);
        let original = entry(sequence, depth, name, flags, size);
        let decoded = codec.decode_line(&codec.encode_line(&original)).unwrap();
        prop_assert_eq!(decoded, original);
    }

    #[test]
    fn test_round_trip_any_name(
        name in "\\PC{1,40}",
        depth in 1usize..6,
        symbol in "[_~.*=a-mo-qs-zA-Z]{1,2}",
        size in 1usize..4,
    ) {
        let codec = LineCodec::new(IndentStyle::new(symbol, size).unwrap(), false);
        let original = entry(1, depth, name.clone(), TypeFlags::FILE, 7);
        let decoded = codec.decode_line(&codec.encode_line(&original)).unwrap();
        prop_assert_eq!(decoded.name, name);
        prop_assert_eq!(decoded.depth, depth);
    }

    #[test]
    fn test_indent_strictly_grows(depth in 1usize..20) {
        let codec = LineCodec::new(IndentStyle::default(), false);
        let shallow = codec.encode_line(&entry(1, depth, "n".to_string(), TypeFlags::FILE, 0));
        let deep = codec.encode_line(&entry(1, depth + 1, "n".to_string(), TypeFlags::FILE, 0));
        prop_assert!(shallow.find("n|").unwrap() < deep.find("n|").unwrap());
    }

    #[test]
    fn test_full_path_round_trip(segments in prop::collection::vec("[a-z0-9_.]{1,8}", 1..6)) {
        let text = format!("/{}", segments.join("/"));
        let codec = LineCodec::new(IndentStyle::default(), true);
        let mut original = entry(3, segments.len(), segments[segments.len() - 1].clone(), TypeFlags::FILE, 1);
        original.path = Some(DumpPath::parse(&text).unwrap());

        let decoded = codec.decode_line(&codec.encode_line(&original)).unwrap();
        prop_assert_eq!(decoded.path.as_ref().map(|p| p.as_str()), Some(text.as_str()));
        prop_assert_eq!(decoded.name, original.name);
    }

    #[test]
    fn test_analysis_is_idempotent(files in prop::collection::vec((0u8..4, 0u8..3, 0u64..3), 0..40)) {
        let entries: Vec<Entry> = files
            .iter()
            .enumerate()
            .map(|(i, (dir, name, size))| {
                let mut e = entry(i as u64 + 1, 2, format!("f{}", name), TypeFlags::FILE, *size);
                e.path = Some(DumpPath::parse(&format!("/d{}/f{}", dir, name)).unwrap());
                e
            })
            .collect();

        let analyzer = DuplicateAnalyzer::new(DuplicateKey::NameSizeType);
        let sets = analyzer.parent_set_counts(&entries);
        prop_assert_eq!(&sets, &analyzer.parent_set_counts(&entries));
        prop_assert_eq!(analyzer.parent_counts(&entries), analyzer.parent_counts(&entries));

        // ranking never increases
        for pair in sets.windows(2) {
            prop_assert!(pair[0].count >= pair[1].count);
        }
        // every group counted once
        let groups = analyzer.duplicate_groups(&entries).len() as u64;
        prop_assert_eq!(sets.iter().map(|s| s.count).sum::<u64>(), groups);
    }
}
