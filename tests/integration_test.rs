//! Integration tests across the codec, annotation, extraction and batch modules

extern crate std;

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

use voxpatch::annotation::{AnnotationSession, ConfirmOutcome, SessionError};
use voxpatch::batch::{BatchLayout, SkipReason, VolumeOutcome};
use voxpatch::codec;
use voxpatch::extractor::{Extraction, ExtractionPolicy, ExtractionSettings, PatchExtractor};
use voxpatch::{AnnotationStore, Config, Point, SampleType, Volume, VolumeReader, VolumeWriter, VoxPatch};

/// Two 2x2 uint8 pages written entry by entry
fn hand_written_tiff() -> Vec<u8> {
    let mut buffer = Vec::new();

    // Header (little-endian), first IFD right after it
    buffer.extend_from_slice(&[0x49, 0x49, 42, 0]);
    buffer.write_u32::<LittleEndian>(8).unwrap();

    let ifd_len = 2 + 9 * 12 + 4;
    let first_ifd = 8u32;
    let second_ifd = first_ifd + ifd_len;
    let data_start = second_ifd + ifd_len;

    for page in 0..2u32 {
        let next = if page == 0 { second_ifd } else { 0 };
        let strip = data_start + page * 4;

        buffer.write_u16::<LittleEndian>(9).unwrap();
        for (tag, field_type, value) in [
            (256u16, 3u16, 2u32), // ImageWidth
            (257, 3, 2),          // ImageLength
            (258, 3, 8),          // BitsPerSample
            (259, 3, 1),          // Compression
            (262, 3, 1),          // Photometric
            (273, 4, strip),      // StripOffsets
            (277, 3, 1),          // SamplesPerPixel
            (278, 3, 2),          // RowsPerStrip
            (279, 4, 4),          // StripByteCounts
        ] {
            buffer.write_u16::<LittleEndian>(tag).unwrap();
            buffer.write_u16::<LittleEndian>(field_type).unwrap();
            buffer.write_u32::<LittleEndian>(1).unwrap();
            if field_type == 3 {
                buffer.write_u16::<LittleEndian>(value as u16).unwrap();
                buffer.write_u16::<LittleEndian>(0).unwrap();
            } else {
                buffer.write_u32::<LittleEndian>(value).unwrap();
            }
        }
        buffer.write_u32::<LittleEndian>(next).unwrap();
    }

    buffer.extend_from_slice(&[1, 2, 3, 4]);
    buffer.extend_from_slice(&[5, 6, 7, 8]);
    buffer
}

#[test]
fn test_complete_tiff_workflow() {
    let mut cursor = Cursor::new(hand_written_tiff());
    let volume = VolumeReader::new().read_from(&mut cursor).unwrap();

    assert_eq!(volume.shape(), (2, 2, 2));
    assert_eq!(volume.sample_type(), SampleType::U8);
    assert_eq!(volume.value_at(0, 0, 1), Some(2.0));
    assert_eq!(volume.value_at(1, 1, 0), Some(7.0));

    // Writing and reading back keeps every sample
    let encoded = VolumeWriter::default().to_bytes(&volume).unwrap();
    let decoded = VolumeReader::new().read_from(&mut Cursor::new(encoded)).unwrap();
    assert_eq!(decoded, volume);
}

/// Volume whose samples are all nonzero
fn filled_volume(shape: (usize, usize, usize), sample_type: SampleType) -> Volume {
    let (depth, height, width) = shape;
    let count = depth * height * width;
    let mut bytes = Vec::with_capacity(count * sample_type.bytes());
    for i in 0..count {
        let value = 1 + (i % 200) as u8;
        bytes.push(value);
        bytes.extend(std::iter::repeat(0).take(sample_type.bytes() - 1));
    }
    Volume::from_raw(shape, sample_type, bytes).unwrap()
}

#[test]
fn test_bounded_and_padded_disagree_only_at_the_edge() {
    let volume = filled_volume((100, 256, 256), SampleType::U8);
    let center = Point::new(10, 10, 50);

    let bounded = PatchExtractor::new(&ExtractionSettings::with_policy(ExtractionPolicy::Bounded)).unwrap();
    assert!(matches!(bounded.extract(&volume, center).unwrap(), Extraction::OutOfBounds(_)));

    let padded = PatchExtractor::new(&ExtractionSettings::with_policy(ExtractionPolicy::Padded)).unwrap();
    let patch = padded.extract(&volume, center).unwrap().into_patch().unwrap();
    assert_eq!(patch.shape(), (128, 128, 128));

    // Only the overlap z 0..100, y 0..74, x 0..74 carries data
    let nonzero = patch.data().iter().filter(|&&b| b != 0).count();
    assert_eq!(nonzero, 100 * 74 * 74);
    assert_eq!(patch.value_at(14, 54, 54), volume.value_at(0, 0, 0));
    assert_eq!(patch.value_at(0, 0, 0), Some(0.0));

    // Away from the edges both policies agree
    let inner = Point::new(128, 128, 50);
    let shifted_bounded = PatchExtractor::new(&ExtractionSettings {
        policy: ExtractionPolicy::Bounded,
        patch_size: 64,
        ..ExtractionSettings::default()
    }).unwrap();
    let shifted_padded = PatchExtractor::new(&ExtractionSettings {
        policy: ExtractionPolicy::Padded,
        patch_size: 64,
        ..ExtractionSettings::default()
    }).unwrap();
    assert_eq!(
        shifted_bounded.extract(&volume, inner).unwrap(),
        shifted_padded.extract(&volume, inner).unwrap()
    );
}

fn write_cube(root: &Path, id: &str, volume: &Volume, labels: Option<&[(Point, &str)]>) -> PathBuf {
    let crop = root.join(id).join("CropForHTP");
    fs::create_dir_all(&crop).unwrap();
    let path = crop.join(format!("{}_crop.tif", id));
    VolumeWriter::default().write(volume, &path).unwrap();

    if let Some(labels) = labels {
        let mut store = AnnotationStore::new();
        for (point, label) in labels {
            store.append(*point, label.to_string());
        }
        store.save(&crop.join(format!("{}_crop_labels.csv", id))).unwrap();
    }
    path
}

#[test]
fn test_batch_isolates_volumes() {
    let root = tempfile::tempdir().unwrap();
    let volume = filled_volume((20, 40, 40), SampleType::U16);

    write_cube(root.path(), "Cube_01", &volume, Some(&[
        (Point::new(20, 20, 10), "L1_C1__a"),
        (Point::new(2, 2, 10), "L1_C2__edge"),
    ]));
    write_cube(root.path(), "Cube_02", &volume, None);
    write_cube(root.path(), "Cube_03", &volume, Some(&[(Point::new(20, 20, 10), "L1_C1__b")]));
    fs::create_dir_all(root.path().join("Notes")).unwrap();

    let mut config = Config::default();
    config.extraction = ExtractionSettings {
        policy: ExtractionPolicy::Bounded,
        patch_size: 16,
        ..ExtractionSettings::default()
    };
    config.logging.progress = false;

    let report = VoxPatch::new(config).run_batch(root.path()).unwrap();
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.processed().count(), 2);
    assert_eq!(report.total_saved(), 2);
    assert_eq!(report.total_out_of_bounds(), 1);

    match report.outcome("Cube_02") {
        Some(VolumeOutcome::Skipped { reason: SkipReason::MissingStore(path), .. }) => {
            assert!(path.ends_with("Cube_02_crop_labels.csv"));
        }
        other => panic!("expected Cube_02 to be skipped, got {:?}", other),
    }

    let layout = BatchLayout::default();
    let local = layout.patch_dir(&root.path().join("Cube_01"), "Cube_01").join("Cube_01_L1_C1__a.tif");
    let central = root.path().join("All_Crops").join("Cube_03_L1_C1__b.tif");
    assert!(local.exists());
    assert!(central.exists());
    assert!(!root.path().join("All_Crops").join("Cube_01_L1_C2__edge.tif").exists());

    let patch = VolumeReader::new().read_file(&local).unwrap();
    assert_eq!(patch.shape(), (16, 16, 16));
    assert_eq!(patch.sample_type(), SampleType::U16);
}

#[test]
fn test_batch_survives_corrupt_store() {
    let root = tempfile::tempdir().unwrap();
    let volume = filled_volume((12, 12, 12), SampleType::U8);

    write_cube(root.path(), "Cube_01", &volume, None);
    fs::write(root.path().join("Cube_01/CropForHTP/Cube_01_crop_labels.csv"),
              "x,y,z,label\n1,2,three,L1_C1__a\n").unwrap();
    write_cube(root.path(), "Cube_02", &volume, Some(&[(Point::new(6, 6, 6), "L1_C1__ok")]));

    let mut config = Config::default();
    config.extraction.patch_size = 4;
    config.logging.progress = false;

    let report = VoxPatch::new(config).run_batch(root.path()).unwrap();
    assert!(matches!(report.outcome("Cube_01"), Some(VolumeOutcome::Failed { .. })));
    assert!(matches!(report.outcome("Cube_02"), Some(VolumeOutcome::Processed(_))));
}

#[test]
fn test_batch_contains_extreme_coordinates() {
    let volume = filled_volume((12, 12, 12), SampleType::U8);
    let rows = format!("x,y,z,label\n4,4,{},L1_C1__low\n{},4,6,L1_C2__high\n", i64::MIN, i64::MAX);

    for policy in [ExtractionPolicy::Bounded, ExtractionPolicy::Padded, ExtractionPolicy::Sparse] {
        let root = tempfile::tempdir().unwrap();
        write_cube(root.path(), "Cube_01", &volume, None);
        fs::write(root.path().join("Cube_01/CropForHTP/Cube_01_crop_labels.csv"), &rows).unwrap();
        write_cube(root.path(), "Cube_02", &volume, Some(&[(Point::new(6, 6, 6), "L1_C1__ok")]));

        let mut config = Config::default();
        config.extraction = ExtractionSettings {
            policy,
            patch_size: 4,
            depth_samples: 3,
            ..ExtractionSettings::default()
        };
        config.logging.progress = false;

        let report = VoxPatch::new(config).run_batch(root.path()).unwrap();
        match report.outcome("Cube_01") {
            Some(VolumeOutcome::Processed(r)) if policy == ExtractionPolicy::Padded => {
                assert_eq!((r.saved, r.out_of_bounds), (2, 0));
                let low = root.path().join("All_Crops").join("Cube_01_L1_C1__low.tif");
                assert!(VolumeReader::new().read_file(&low).unwrap().is_all_zero());
            }
            Some(VolumeOutcome::Processed(r)) => assert_eq!((r.saved, r.out_of_bounds), (0, 2)),
            other => panic!("expected Cube_01 to be processed with {}, got {:?}", policy, other),
        }
        assert!(matches!(report.outcome("Cube_02"), Some(VolumeOutcome::Processed(r)) if r.saved == 1));
    }
}

#[test]
fn test_sparse_batch_writes_strided_stacks() {
    let root = tempfile::tempdir().unwrap();
    let volume = filled_volume((100, 40, 40), SampleType::I16);
    write_cube(root.path(), "Cube_09", &volume, Some(&[
        (Point::new(20, 20, 50), "L1_C1__deep"),
        (Point::new(20, 20, 10), "L1_C2__shallow"),
    ]));

    let mut config = Config::default();
    config.extraction = ExtractionSettings {
        policy: ExtractionPolicy::Sparse,
        patch_size: 16,
        ..ExtractionSettings::default()
    };
    config.output_compression = "zstd".to_string();
    config.logging.progress = false;

    let report = VoxPatch::new(config).run_batch(root.path()).unwrap();
    assert_eq!(report.total_saved(), 1);
    assert_eq!(report.total_out_of_bounds(), 1);

    let patch = VolumeReader::new()
        .read_file(&root.path().join("All_Crops/Cube_09_L1_C1__deep.tif"))
        .unwrap();
    assert_eq!(patch.shape(), (11, 16, 16));
    assert_eq!(patch.sample_type(), SampleType::I16);
    for (i, z) in (20..=80).step_by(3).enumerate() {
        assert_eq!(patch.value_at(i, 0, 0), volume.value_at(z, 12, 12));
    }
}

#[test]
fn test_session_resumes_numbering_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.tif");
    VolumeWriter::default().write(&filled_volume((5, 30, 30), SampleType::U8), &path).unwrap();

    let mut session = AnnotationSession::default();
    session.load_volume(&path).unwrap();
    for (i, tag) in ["a", "b", "c"].iter().enumerate() {
        session.primary_click(i as i64, 1).unwrap();
        session.request_confirm(|_, _| Some(tag.to_string())).unwrap();
    }
    assert_eq!((session.counters().line, session.counters().column), (1, 4));

    session.new_line().unwrap();
    session.primary_click(9, 9).unwrap();
    match session.request_confirm(|_, _| Some("d".to_string())).unwrap() {
        ConfirmOutcome::Confirmed(annotation) => {
            assert_eq!(annotation.point, Point::new(9, 9, 2));
            assert_eq!(codec::decode(&annotation.label).unwrap(), (2, 1));
        }
        ConfirmOutcome::Cancelled => panic!("tag was not empty"),
    }
    let store_path = session.save().unwrap();
    assert_eq!(store_path, dir.path().join("stack_labels.csv"));

    // A new session over the same file picks up where this one stopped
    let mut resumed = AnnotationSession::default();
    let outcome = resumed.load_volume(&path).unwrap();
    assert_eq!(outcome.restored, 4);
    assert_eq!((resumed.counters().line, resumed.counters().column), (2, 2));

    resumed.undo().unwrap();
    assert_eq!((resumed.counters().line, resumed.counters().column), (1, 4));
    assert_eq!(resumed.annotations().last().map(|a| a.label.as_str()), Some("L1_C3__c"));

    // A flat image is refused and leaves the session as it was
    let flat = dir.path().join("flat.tif");
    VolumeWriter::default().write(&filled_volume((1, 30, 30), SampleType::U8), &flat).unwrap();
    assert!(matches!(resumed.load_volume(&flat), Err(SessionError::NotAVolume(_))));
    assert_eq!(resumed.annotations().len(), 3);
}
