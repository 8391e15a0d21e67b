use std::sync::Arc;

use arrow::array::{Array, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sydata_result::Error;
use sydata_storage::constants::MAX_ATTRIBUTE_BYTES;
use sydata_storage::pager::{InstrumentedPager, MemPager};
use sydata_storage::{
    AccessMode, AttrValue, Attributes, ExternalTarget, FilterPipeline, Link, ObjectKind, Shape,
    StoreFile,
};
use sydata_test_utils::init_tracing_for_tests;
use tempfile::TempDir;

#[test]
fn group_children_iterate_lexicographically() {
    init_tracing_for_tests();
    let file = StoreFile::in_memory("node-lexicographic").unwrap();
    let root = file.root().unwrap();
    for name in ["b", "a", "c"] {
        root.create_group(name).unwrap();
    }
    assert_eq!(root.keys().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(root.kind("b").unwrap(), ObjectKind::Group);
    assert!(matches!(
        root.create_group("a"),
        Err(Error::InvalidArgumentError(_))
    ));
    assert!(root.create_group("x/y").is_err());
    file.close().unwrap();
}

#[test]
fn datasets_round_trip_through_each_pipeline() {
    let file = StoreFile::in_memory("node-pipelines").unwrap();
    let root = file.root().unwrap();
    let values: Vec<i64> = (0..2000).map(|i| i / 3).collect();
    let array = Int64Array::from(values);

    for (name, pipeline) in [
        ("plain", FilterPipeline::NONE),
        ("lz4", FilterPipeline::internal()),
        ("zstd", FilterPipeline::shareable()),
    ] {
        let ds = root
            .create_dataset(name, &array, Shape::Vector, pipeline)
            .unwrap();
        assert_eq!(ds.filters().unwrap(), pipeline);
        assert_eq!(ds.data_type().unwrap(), DataType::Int64);
        assert_eq!(ds.len().unwrap(), 2000);
        let back = ds.read().unwrap();
        assert_eq!(back.as_ref(), &array as &dyn Array);
        if pipeline.is_compressed() {
            assert!(ds.stored_bytes().unwrap() < ds.raw_bytes().unwrap());
        }
    }
    file.close().unwrap();
}

#[test]
fn random_payloads_survive_every_pipeline() {
    let file = StoreFile::in_memory("node-random").unwrap();
    let root = file.root().unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let array = Int64Array::from((0..4096).map(|_| rng.random::<i64>()).collect::<Vec<_>>());

    for (name, pipeline) in [
        ("plain", FilterPipeline::NONE),
        ("lz4", FilterPipeline::internal()),
        ("zstd", FilterPipeline::shareable()),
    ] {
        let ds = root
            .create_dataset(name, &array, Shape::Vector, pipeline)
            .unwrap();
        assert_eq!(ds.read().unwrap().as_ref(), &array as &dyn Array);
    }
    file.close().unwrap();
}

#[test]
fn strings_booleans_and_scalars() {
    let file = StoreFile::in_memory("node-kinds").unwrap();
    let root = file.root().unwrap();

    let s = StringArray::from(vec!["x", "", "zzz"]);
    let ds = root
        .create_dataset("s", &s, Shape::Vector, FilterPipeline::internal())
        .unwrap();
    assert_eq!(ds.read().unwrap().as_ref(), &s as &dyn Array);

    let b = BooleanArray::from(vec![true, false, true]);
    let ds = root
        .create_dataset("b", &b, Shape::Vector, FilterPipeline::NONE)
        .unwrap();
    assert_eq!(ds.read().unwrap().as_ref(), &b as &dyn Array);

    let one = Float64Array::from(vec![2.5]);
    let ds = root
        .create_dataset("scalar", &one, Shape::Scalar, FilterPipeline::NONE)
        .unwrap();
    assert!(ds.is_scalar().unwrap());
    assert_eq!(ds.read().unwrap().len(), 1);

    let two = Float64Array::from(vec![1.0, 2.0]);
    assert!(
        root.create_dataset("bad", &two, Shape::Scalar, FilterPipeline::NONE)
            .is_err()
    );
    file.close().unwrap();
}

#[test]
fn attributes_set_list_remove_and_size_limit() {
    let file = StoreFile::in_memory("node-attrs").unwrap();
    let root = file.root().unwrap();
    let g = root.create_group("g").unwrap();

    g.set_attr("zeta", AttrValue::Int(3)).unwrap();
    g.set_attr("alpha", AttrValue::from("hello")).unwrap();
    assert_eq!(g.attr_keys().unwrap(), vec!["alpha", "zeta"]);
    assert_eq!(g.attr("zeta").unwrap(), Some(AttrValue::Int(3)));
    assert_eq!(
        g.attr("alpha").unwrap().unwrap().as_bytes(),
        Some(&b"hello"[..])
    );

    assert!(g.remove_attr("zeta").unwrap());
    assert!(!g.remove_attr("zeta").unwrap());

    let huge = AttrValue::IntArray((0..(MAX_ATTRIBUTE_BYTES as i64)).collect());
    assert!(matches!(
        g.set_attr("huge", huge),
        Err(Error::InvalidArgumentError(_))
    ));
    assert_eq!(g.attr("huge").unwrap(), None);
    file.close().unwrap();
}

#[test]
fn hard_links_share_payload_and_survive_unlink() {
    let (pager, stats) = InstrumentedPager::new(MemPager::new());
    let pager = Arc::new(pager);
    let file = StoreFile::with_pager("mem://node-hardlink", pager.clone(), true).unwrap();
    let root = file.root().unwrap();

    let data = Int32Array::from((0..1000).collect::<Vec<i32>>());
    let ds = root
        .create_dataset("orig", &data, Shape::Vector, FilterPipeline::NONE)
        .unwrap();
    let stored = ds.stored_bytes().unwrap();

    let before = stats.snapshot();
    let other = root.create_group("other").unwrap();
    other.link_hard("alias", &ds).unwrap();
    let delta = stats.snapshot().delta_since(&before);
    assert!(
        delta.bytes_written < stored,
        "linking wrote {} bytes, payload is {stored}",
        delta.bytes_written
    );

    let linked = other.dataset("alias").unwrap();
    assert!(linked.same_object(&ds));

    root.remove("orig").unwrap();
    assert_eq!(linked.read().unwrap().len(), 1000);
    let held = pager.inner().stored_bytes();
    other.remove("alias").unwrap();
    assert!(pager.inner().stored_bytes() < held);
    file.close().unwrap();
}

#[test]
fn hard_links_cannot_cross_files() {
    let a = StoreFile::in_memory("node-cross-a").unwrap();
    let b = StoreFile::in_memory("node-cross-b").unwrap();
    let ds = a
        .root()
        .unwrap()
        .create_dataset("x", &Int64Array::from(vec![1]), Shape::Vector, FilterPipeline::NONE)
        .unwrap();
    assert!(b.root().unwrap().link_hard("x", &ds).is_err());
    a.close().unwrap();
    b.close().unwrap();
}

#[test]
fn external_links_resolve_between_open_memory_files() {
    let src = StoreFile::in_memory("node-ext-src").unwrap();
    let dst = StoreFile::in_memory("node-ext-dst").unwrap();
    let table = src.root().unwrap().create_group("table").unwrap();
    let col = table
        .create_dataset("col", &Int64Array::from(vec![7, 8, 9]), Shape::Vector, FilterPipeline::NONE)
        .unwrap();

    let target = ExternalTarget::to_dataset(&col).unwrap();
    assert_eq!(target.path(), "/table/col");
    let root = dst.root().unwrap();
    root.link_external("linked", &target).unwrap();

    assert!(matches!(root.link_info("linked").unwrap(), Link::External { .. }));
    let resolved = root.dataset("linked").unwrap();
    assert!(resolved.file().same_file(&src));
    assert_eq!(resolved.read().unwrap().len(), 3);

    src.close().unwrap();
    assert!(matches!(root.dataset("linked"), Err(Error::NotFound(_))));
    dst.close().unwrap();
}

#[test]
fn external_links_open_closed_files_read_only() {
    let tmp = TempDir::new().unwrap();
    let src_path = tmp.path().join("src.sy");
    {
        let src = StoreFile::create(&src_path).unwrap();
        src.root()
            .unwrap()
            .create_dataset("v", &Int64Array::from(vec![1, 2]), Shape::Vector, FilterPipeline::NONE)
            .unwrap();
        src.close().unwrap();
    }

    let dst = StoreFile::in_memory("node-ext-disk").unwrap();
    let root = dst.root().unwrap();
    root.link_external("v", &ExternalTarget::from_path(&src_path, "/v").unwrap())
        .unwrap();
    let ds = root.dataset("v").unwrap();
    assert!(!ds.file().is_writable());
    assert_eq!(ds.read().unwrap().len(), 2);
    dst.close().unwrap();
}

#[test]
fn files_persist_and_reopen_read_only() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data.sy");
    {
        let file = StoreFile::create(&path).unwrap();
        let g = file.root().unwrap().create_group("grp").unwrap();
        g.create_dataset(
            "s",
            &StringArray::from(vec!["a", "b"]),
            Shape::Vector,
            FilterPipeline::shareable(),
        )
        .unwrap();
        g.set_attr("n", AttrValue::Float(1.5)).unwrap();
        file.close().unwrap();
    }

    let file = StoreFile::open(&path, AccessMode::Read).unwrap();
    let again = StoreFile::open(&path, AccessMode::Read).unwrap();
    assert!(file.same_file(&again));

    let g = file.root().unwrap().group("grp").unwrap();
    assert_eq!(g.attr("n").unwrap(), Some(AttrValue::Float(1.5)));
    assert_eq!(g.dataset("s").unwrap().len().unwrap(), 2);
    assert!(matches!(
        g.create_group("new"),
        Err(Error::ModeViolation(_))
    ));
    assert!(matches!(
        StoreFile::open(&path, AccessMode::ReadWrite),
        Err(Error::ModeViolation(_))
    ));
    file.close().unwrap();
    assert!(file.root().is_err());
}

#[test]
fn opening_a_missing_file_read_only_is_not_found() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        StoreFile::open(&tmp.path().join("nope.sy"), AccessMode::Read),
        Err(Error::NotFound(_))
    ));
}
