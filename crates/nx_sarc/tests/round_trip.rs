use std::collections::BTreeMap;

use nx_binary::align_up;
use nx_sarc::{
    alignment::AlignmentPolicy,
    error::Result,
    hash::hash_name,
    types::{SARC_HEADER_SIZE, SFAT_HEADER_SIZE, SFNT_HEADER_SIZE},
    write::SarcWriterOptions,
    SarcArchive, SarcWriter,
};
use proptest::prelude::*;
use tracing::info;
use tracing_test::traced_test;

fn policy() -> AlignmentPolicy {
    AlignmentPolicy::new(4)
        .with("bfres", 0x2000)
        .with("bntx", 0x1000)
        .with("byml", 8)
        .with("bin.c", 0x80)
}

fn file_name() -> impl Strategy<Value = String> {
    (
        "[A-Za-z0-9_/]{1,24}",
        prop::sample::select(vec!["", ".bfres", ".bntx", ".byml", ".txt", ".bin.c", ".BYML"]),
    )
        .prop_map(|(stem, ext)| format!("{}{}", stem, ext))
}

fn archive_contents() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(file_name(), prop::collection::vec(any::<u8>(), 0..64), 0..24)
}

proptest! {
    #[test]
    fn content_round_trip(files in archive_contents()) {
        let mut sarc = SarcWriter::new(SarcWriterOptions::builder().alignment(policy()).build());
        for (name, data) in &files {
            sarc.add_file(name.as_str(), data.clone());
        }

        let built = sarc.build().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let archive = SarcArchive::new(&built).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(archive.len(), files.len());
        for (name, data) in &files {
            let file = archive.by_name(name).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(file.data(), data.as_slice());
        }
    }

    #[test]
    fn entries_sorted_and_aligned(files in archive_contents(), key in prop::sample::select(vec![0x65u32, 0x1F, 0x83])) {
        let mut sarc = SarcWriter::new(
            SarcWriterOptions::builder().hash_key(key).alignment(policy()).build(),
        );
        for (name, data) in &files {
            sarc.add_file(name.as_str(), data.clone());
        }

        let built = sarc.build().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let archive = SarcArchive::new(&built).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(archive.hash_key(), key);

        for pair in archive.entries().windows(2) {
            prop_assert!(pair[0].name_hash <= pair[1].name_hash);
            prop_assert!(pair[0].data_begin <= pair[1].data_begin);
            prop_assert!(pair[0].data_end <= pair[1].data_begin);
        }

        let policy = policy();
        for entry in archive.entries() {
            let name = entry.name.as_deref().unwrap_or_default();
            prop_assert_eq!(entry.name_hash, hash_name(key, name));
            prop_assert_eq!(entry.data_begin % policy.resolve(name), 0);
        }
    }
}

#[traced_test]
#[test]
fn empty_archive_layout() -> Result<()> {
    let built = SarcWriter::new(SarcWriterOptions::builder().alignment(policy()).build()).build()?;
    let archive = SarcArchive::new(&built)?;

    let header_sizes =
        SARC_HEADER_SIZE as usize + SFAT_HEADER_SIZE as usize + SFNT_HEADER_SIZE as usize;
    info!("empty archive is {} bytes", built.len());

    assert!(archive.is_empty());
    assert_eq!(archive.data_start() as usize, align_up(header_sizes, 1));
    assert_eq!(built.len(), header_sizes);
    assert_eq!(u16::from_le_bytes([built[0x1A], built[0x1B]]), 0);

    Ok(())
}

#[traced_test]
#[test]
fn replace_payload_and_rebuild() -> Result<()> {
    let mut sarc = SarcWriter::new(SarcWriterOptions::builder().alignment(policy()).build());
    sarc.add_file("Actor/ActorLink/Enemy_Lizalfos.bxml", b"link".to_vec());
    sarc.add_file("Model/Enemy_Lizalfos.bfres", vec![0xAB; 0x30]);
    sarc.add_file("Param/Drop.byml", b"drops".to_vec());

    let original = sarc.build()?;
    let archive = SarcArchive::new(&original)?;

    let mut edited = SarcWriter::from_archive(&archive, policy());
    assert!(edited.replace("Param/Drop.byml", b"more drops".to_vec()));
    let rebuilt = edited.build()?;

    let archive = SarcArchive::new(&rebuilt)?;
    assert_eq!(archive.len(), 3);
    assert_eq!(archive.by_name("Param/Drop.byml")?.data(), b"more drops");
    assert_eq!(
        archive.by_name("Model/Enemy_Lizalfos.bfres")?.data(),
        vec![0xAB; 0x30].as_slice()
    );

    let bfres = archive.by_name("Model/Enemy_Lizalfos.bfres")?;
    assert_eq!(bfres.entry().data_begin % 0x2000, 0);

    Ok(())
}

#[test]
fn unnamed_files_are_found_by_hash() -> Result<()> {
    let mut sarc = SarcWriter::default();
    sarc.add_hashed_file(0x0BAD_F00D, b"ghost".to_vec());
    sarc.add_file("visible.txt", b"seen".to_vec());

    let built = sarc.build()?;
    let archive = SarcArchive::new(&built)?;

    assert_eq!(archive.by_hash(0x0BAD_F00D)?.data(), b"ghost");
    assert_eq!(archive.by_hash(0x0BAD_F00D)?.name(), None);
    assert_eq!(archive.file_names().collect::<Vec<_>>(), vec!["visible.txt"]);

    Ok(())
}
