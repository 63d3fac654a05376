//! Property-based tests for the tar parser.
//!
//! Archives are produced by the `tar` crate and fed through the in-memory
//! filesystem, so no disk is touched.

#![allow(clippy::expect_used)]

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use proptest::prelude::*;
use zipper_core::fs::Filesystem;
use zipper_core::fs::MemoryFs;
use zipper_core::tar::BLOCK_SIZE;
use zipper_core::tar::extract_tar;
use zipper_core::tar::header::HeaderDecode;
use zipper_core::tar::header::decode_header;
use zipper_core::tar::header::padding_for;
use zipper_core::tar::header::parse_octal;

fn build_tar(files: &BTreeMap<String, Vec<u8>>) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in files {
        let mut header = tar::Header::new_ustar();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(data.len() as u64);
        builder
            .append_data(&mut header, name, data.as_slice())
            .expect("append entry");
    }
    builder.into_inner().expect("finish archive")
}

fn fresh_fs() -> MemoryFs {
    let mut fs = MemoryFs::new();
    fs.create_dir_all(Path::new("/out")).expect("create /out");
    fs
}

proptest! {
    /// Data plus padding always lands on a block boundary.
    #[test]
    fn prop_padding_aligns(size in 0u64..10_000_000) {
        let padding = padding_for(size);
        prop_assert!(padding < BLOCK_SIZE as u64);
        prop_assert_eq!((size + padding) % BLOCK_SIZE as u64, 0);
    }

    /// Octal fields in the usual zero-padded, NUL-terminated form parse back.
    #[test]
    fn prop_octal_field_parses(value in 0u64..0o77_777_777_777) {
        let field = format!("{value:011o}\0");
        prop_assert_eq!(parse_octal(field.as_bytes()), Some(value));
    }

    /// Space-terminated fields parse the same way.
    #[test]
    fn prop_octal_space_terminated(value in 0u64..0o7_777_777) {
        let field = format!("{value:07o} ");
        prop_assert_eq!(parse_octal(field.as_bytes()), Some(value));
    }

    /// Arbitrary blocks decode or skip; they never panic.
    #[test]
    fn prop_decode_total(block in prop::collection::vec(any::<u8>(), BLOCK_SIZE)) {
        let block: [u8; BLOCK_SIZE] = block.try_into().expect("block length");
        if let HeaderDecode::Header(header) = decode_header(&block) {
            prop_assert!(!header.name.is_empty());
        }
    }

    /// Every regular entry becomes exactly one file with identical bytes.
    #[test]
    fn prop_file_count_matches_entries(
        files in prop::collection::btree_map(
            "[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.txt",
            prop::collection::vec(any::<u8>(), 0..1500),
            0..12,
        )
    ) {
        let mut fs = fresh_fs();
        let archive = build_tar(&files);

        let outcome = extract_tar(archive.as_slice(), &mut fs, Path::new("/out"))
            .expect("extract");

        prop_assert_eq!(outcome.files_extracted, files.len());
        prop_assert_eq!(outcome.bytes_read, archive.len() as u64);
        for (name, data) in &files {
            let path = PathBuf::from("/out").join(name);
            prop_assert_eq!(&fs.read_file(&path).expect("extracted file"), data);
        }
        prop_assert_eq!(fs.list_files(Path::new("/out")).expect("list").len(), files.len());
    }

    /// Trailing garbage after the two-block trailer is never read.
    #[test]
    fn prop_trailer_stops_run(garbage in prop::collection::vec(any::<u8>(), 0..2048)) {
        let mut files = BTreeMap::new();
        files.insert("kept.txt".to_string(), b"kept".to_vec());
        let mut archive = build_tar(&files);
        // Header, one data block, two trailer blocks.
        let trailer_end = 4 * BLOCK_SIZE;
        prop_assert_eq!(archive.len(), trailer_end);
        archive.extend_from_slice(&garbage);

        let mut fs = fresh_fs();
        let outcome = extract_tar(archive.as_slice(), &mut fs, Path::new("/out"))
            .expect("extract");

        prop_assert_eq!(outcome.files_extracted, 1);
        prop_assert_eq!(outcome.bytes_read, trailer_end as u64);
    }
}
