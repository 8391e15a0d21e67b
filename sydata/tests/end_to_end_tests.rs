use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, DurationMicrosecondArray, Int64Array, StringArray, TimestampMicrosecondArray,
};
use sydata::storage::{InstrumentedPager, Link, MemPager, StoreFile};
use sydata::{
    Container, Error, GroupSource, List, ListMode, SourceRef, Table, Text, TypeTag, from_url,
    with_url,
};
use sydata_test_utils::init_tracing_for_tests;
use tempfile::TempDir;
use url::Url;

fn file_url(path: &Path, query: &str) -> String {
    let mut url = Url::from_file_path(path).unwrap();
    url.set_query(Some(query));
    url.to_string()
}

fn ints(values: impl IntoIterator<Item = i64>) -> ArrayRef {
    Arc::new(Int64Array::from_iter_values(values))
}

fn text(value: &mut Container) -> String {
    value.as_text_mut().unwrap().get().unwrap().to_string()
}

#[test]
fn list_of_tables_persists_order_and_types() {
    init_tracing_for_tests();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("runs.sy");
    let tag = TypeTag::list(TypeTag::Table);

    let labels = StringArray::from(vec!["α", "β"]);
    let stamps = TimestampMicrosecondArray::from(vec![1_700_000_000_000_000, 1_700_000_000_500_000]);
    let spans = DurationMicrosecondArray::from(vec![250, -250]);
    with_url(&file_url(&path, "mode=w"), Some(&tag), false, |value| {
        let mut table = Table::new();
        table.set_column("b", Arc::new(labels.clone()))?;
        table.set_column("a", Arc::new(stamps.clone()))?;
        table.set_column("c", Arc::new(spans.clone()))?;
        value.as_list_mut().unwrap().append(table)
    })
    .unwrap();

    with_url(&file_url(&path, "mode=r"), None, true, |value| {
        let list = value.as_list_mut().unwrap();
        assert_eq!(list.mode(), ListMode::ReadThrough);
        let table = list.get_mut(0);
        assert!(matches!(table, Err(Error::ModeViolation(_))));
        let mut first = list.get(0)?;
        let table = first.as_table_mut().unwrap();
        assert_eq!(table.column_names(), vec!["b", "a", "c"]);
        assert_eq!(table.column("b")?.as_ref(), &labels as &dyn Array);
        assert_eq!(table.column("a")?.as_ref(), &stamps as &dyn Array);
        assert_eq!(table.column("c")?.as_ref(), &spans as &dyn Array);
        Ok(())
    })
    .unwrap();
}

#[test]
fn write_through_requires_an_empty_target() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("log.sy");
    let tag = TypeTag::list(TypeTag::Text);

    let file = StoreFile::create(&path).unwrap();
    let root: SourceRef = Arc::new(GroupSource::root(&file, true, false, false).unwrap());
    let mut log = List::write_through(root.clone(), TypeTag::Text).unwrap();
    for line in ["start", "stop"] {
        log.append(Text::from(line)).unwrap();
    }
    assert_eq!(text(&mut log.get(1).unwrap()), "stop");
    assert!(matches!(
        List::write_through(root.clone(), TypeTag::Text),
        Err(Error::ModeViolation(_))
    ));
    file.close().unwrap();

    let mut scoped = from_url(&file_url(&path, "mode=r"), Some(&tag), true).unwrap();
    let list = scoped.as_list_mut().unwrap();
    assert_eq!(list.len(), 2);
    assert!(matches!(list.append(Text::from("x")), Err(Error::ModeViolation(_))));
    scoped.finish().unwrap();
}

#[test]
fn linked_tables_do_not_duplicate_column_bytes() {
    let src_file = StoreFile::in_memory("e2e-link-src").unwrap();
    let src: SourceRef = Arc::new(GroupSource::root(&src_file, true, true, false).unwrap());
    let mut table = Table::new();
    let scattered = (0..50_000).map(|i| (i * 2_654_435_761) % 1_000_003);
    table.set_column("big", ints(scattered)).unwrap();
    table.writeback(&src, None).unwrap();
    let stored = src_file
        .root()
        .unwrap()
        .dataset("big")
        .unwrap()
        .stored_bytes()
        .unwrap();

    let (pager, stats) = InstrumentedPager::new(MemPager::new());
    let dst_file = StoreFile::with_pager("mem://e2e-link-dst", Arc::new(pager), true).unwrap();
    let dst: SourceRef = Arc::new(GroupSource::root(&dst_file, true, true, false).unwrap());

    let before = stats.snapshot();
    let mut bound = Table::bound(src.clone()).unwrap();
    bound.writeback(&dst, None).unwrap();
    let written = stats.snapshot().delta_since(&before).bytes_written;
    assert!(written < stored, "wrote {written} bytes for a {stored}-byte column");
    assert!(matches!(
        dst_file.root().unwrap().link_info("big").unwrap(),
        Link::External { .. }
    ));

    let mut copy = Table::bound(dst.clone()).unwrap();
    assert_eq!(copy.column("big").unwrap().len(), 50_000);
    dst_file.close().unwrap();
    src_file.close().unwrap();
}

#[test]
fn compression_follows_the_size_threshold() {
    let file = StoreFile::in_memory("e2e-compression").unwrap();
    let root: SourceRef = Arc::new(GroupSource::root(&file, true, false, false).unwrap());
    let small = root.write_with_type("small", &TypeTag::Table).unwrap();
    let large = root.write_with_type("large", &TypeTag::Table).unwrap();

    let mut t = Table::new();
    t.set_column("v", ints(0..12)).unwrap();
    t.writeback(&small, None).unwrap();
    let mut t = Table::new();
    t.set_column("v", ints(0..375)).unwrap();
    t.writeback(&large, None).unwrap();

    let store = small.table_store().unwrap();
    assert!(!store.column_dataset("v").unwrap().is_compressed().unwrap());
    let store = large.table_store().unwrap();
    assert!(store.column_dataset("v").unwrap().is_compressed().unwrap());
    file.close().unwrap();
}

#[test]
fn type_strings_drive_url_opens() {
    let file = StoreFile::in_memory("e2e-type-strings").unwrap();
    let tag: TypeTag = "(title: text, rows: [table])".parse().unwrap();
    with_url("mem://e2e-type-strings?mode=w", Some(&tag), false, |value| {
        let record = value.as_record_mut().unwrap();
        record.set("title", Text::from("daily"))?;
        let mut table = Table::new();
        table.set_column("x", ints(0..3))?;
        record.get_mut("rows")?.as_list_mut().unwrap().append(table)
    })
    .unwrap();

    with_url("mem://e2e-type-strings", None, false, |value| {
        assert_eq!(value.type_tag(), tag);
        let record = value.as_record_mut().unwrap();
        assert_eq!(text(record.get_mut("title")?), "daily");
        let mut rows = record.get("rows")?;
        let mut first = rows.as_list_mut().unwrap().get(0)?;
        assert_eq!(first.as_table_mut().unwrap().number_of_rows(), 3);
        Ok(())
    })
    .unwrap();
    file.close().unwrap();
}
