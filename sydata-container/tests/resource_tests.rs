mod common;

use std::path::Path;

use common::{text_of, texts};
use sydata_container::{FORMAT_VERSION, ListMode, ResourceUrl, Text, from_url, with_url};
use sydata_result::{Error, Result};
use sydata_storage::{AccessMode, AttrValue, Attributes, StoreFile};
use sydata_table::reserved::VERSION_KEY;
use sydata_test_utils::init_tracing_for_tests;
use sydata_types::TypeTag;
use tempfile::TempDir;
use url::Url;

fn file_url(path: &Path, query: &str) -> String {
    let mut url = Url::from_file_path(path).unwrap();
    url.set_query(Some(query));
    url.to_string()
}

#[test]
fn urls_parse_location_and_options() {
    let parsed = ResourceUrl::parse("mem://scratch?mode=w&link=true").unwrap();
    assert_eq!(parsed.location(), "mem://scratch");
    assert_eq!(parsed.mode(), AccessMode::ReadWrite);
    assert!(parsed.can_link());

    let parsed = ResourceUrl::parse("mem://scratch").unwrap();
    assert_eq!(parsed.mode(), AccessMode::Read);
    assert!(!parsed.can_link());

    let parsed = ResourceUrl::parse("mem://scratch?mode=a").unwrap();
    assert_eq!(parsed.mode(), AccessMode::ReadWrite);
    assert!(!parsed.truncates());
    assert!(ResourceUrl::parse("mem://scratch?mode=w").unwrap().truncates());

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data.sy");
    let parsed = ResourceUrl::parse(&file_url(&path, "mode=r&link=0")).unwrap();
    assert_eq!(Path::new(parsed.location()), path);

    for bad in ["mem://x?mode=x", "mem://x?speed=9", "http://host/x", "not a url"] {
        assert!(
            matches!(ResourceUrl::parse(bad), Err(Error::InvalidArgumentError(_))),
            "{bad}"
        );
    }
}

#[test]
fn files_record_their_type_for_later_reads() {
    init_tracing_for_tests();
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("list.sy");
    let tag = TypeTag::list(TypeTag::Text);

    let mut scoped = from_url(&file_url(&path, "mode=w"), Some(&tag), false).unwrap();
    let list = scoped.as_list_mut().unwrap();
    assert_eq!(list.mode(), ListMode::Normal);
    list.append(Text::from("one")).unwrap();
    list.append(Text::from("two")).unwrap();
    scoped.finish().unwrap();

    let mut scoped = from_url(&file_url(&path, "mode=r"), None, true).unwrap();
    let list = scoped.as_list_mut().unwrap();
    assert_eq!(list.mode(), ListMode::ReadThrough);
    assert_eq!(texts(list), vec!["one", "two"]);
    assert!(matches!(list.append(Text::from("x")), Err(Error::ModeViolation(_))));
    scoped.finish().unwrap();

    assert!(matches!(
        from_url(&file_url(&path, "mode=r"), Some(&TypeTag::Table), false),
        Err(Error::ConsistencyError(_))
    ));
}

#[test]
fn managed_lists_over_empty_writable_files_write_through() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("stream.sy");
    let tag = TypeTag::list(TypeTag::Text);

    with_url(&file_url(&path, "mode=w"), Some(&tag), true, |value| {
        let list = value.as_list_mut().unwrap();
        assert_eq!(list.mode(), ListMode::WriteThrough);
        list.append(Text::from("streamed"))?;
        assert_eq!(text_of(&mut list.get(0)?), "streamed");
        Ok(())
    })
    .unwrap();

    let count = with_url(&file_url(&path, "mode=r"), None, false, |value| {
        Ok(value.as_list().unwrap().len())
    })
    .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn appending_to_a_written_file_keeps_its_contents() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("kept.sy");
    let tag = TypeTag::list(TypeTag::Text);

    with_url(&file_url(&path, "mode=w"), Some(&tag), false, |value| {
        value.as_list_mut().unwrap().append(Text::from("first"))
    })
    .unwrap();

    with_url(&file_url(&path, "mode=a"), None, true, |value| {
        let list = value.as_list_mut().unwrap();
        assert_eq!(list.mode(), ListMode::ReadThrough);
        assert!(matches!(list.append(Text::from("x")), Err(Error::ModeViolation(_))));
        assert_eq!(texts(list), vec!["first"]);
        Ok(())
    })
    .unwrap();

    with_url(&file_url(&path, "mode=a"), None, false, |value| {
        value.as_list_mut().unwrap().append(Text::from("second"))
    })
    .unwrap();
    let mut scoped = from_url(&file_url(&path, "mode=r"), None, false).unwrap();
    assert_eq!(texts(scoped.as_list_mut().unwrap()), vec!["first", "second"]);
    scoped.abandon().unwrap();

    with_url(&file_url(&path, "mode=w"), Some(&tag), true, |value| {
        assert_eq!(value.as_list().unwrap().mode(), ListMode::WriteThrough);
        Ok(())
    })
    .unwrap();
}

#[test]
fn failed_scopes_skip_writeback() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("aborted.sy");
    let tag = TypeTag::list(TypeTag::Text);

    let result: Result<()> = with_url(&file_url(&path, "mode=w"), Some(&tag), false, |value| {
        value.as_list_mut().unwrap().append(Text::from("lost"))?;
        Err(Error::InvalidArgumentError("abort".into()))
    });
    assert!(matches!(result, Err(Error::InvalidArgumentError(_))));

    let len = with_url(&file_url(&path, "mode=r"), None, false, |value| {
        Ok(value.as_list().unwrap().len())
    })
    .unwrap();
    assert_eq!(len, 0);
}

fn stored_len(url: &str) -> usize {
    with_url(url, None, false, |value| {
        Ok(value.as_list().map_or(0, |list| list.len()))
    })
    .unwrap()
}

#[test]
fn dropping_a_scope_only_closes() {
    let file = StoreFile::in_memory("resource-dropped").unwrap();
    let tag = TypeTag::list(TypeTag::Text);
    {
        let mut scoped = from_url("mem://resource-dropped?mode=w", Some(&tag), false).unwrap();
        scoped.as_list_mut().unwrap().append(Text::from("dropped")).unwrap();
    }
    assert!(file.is_open());
    assert_eq!(stored_len("mem://resource-dropped"), 0);
    file.close().unwrap();
}

fn refuse() -> Result<()> {
    Err(Error::InvalidArgumentError("refused".into()))
}

fn append_then_fail(url: &str, tag: &TypeTag) -> Result<()> {
    let mut scoped = from_url(url, Some(tag), false)?;
    scoped
        .as_list_mut()
        .ok_or_else(|| Error::Internal("expected a list".into()))?
        .append(Text::from("never stored"))?;
    refuse()?;
    scoped.finish()
}

#[test]
fn early_return_through_question_mark_skips_writeback() {
    init_tracing_for_tests();
    let file = StoreFile::in_memory("resource-early-return").unwrap();
    let tag = TypeTag::list(TypeTag::Text);
    let url = "mem://resource-early-return?mode=w";
    assert!(matches!(
        append_then_fail(url, &tag),
        Err(Error::InvalidArgumentError(_))
    ));
    assert_eq!(stored_len("mem://resource-early-return"), 0);

    let mut scoped = from_url(url, Some(&tag), false).unwrap();
    scoped.as_list_mut().unwrap().append(Text::from("stored")).unwrap();
    scoped.finish().unwrap();
    assert_eq!(stored_len("mem://resource-early-return"), 1);
    file.close().unwrap();
}

#[test]
fn open_memory_files_are_shared_not_closed() {
    let file = StoreFile::in_memory("resource-shared").unwrap();
    let tag = TypeTag::dict(TypeTag::Text);
    with_url("mem://resource-shared?mode=w", Some(&tag), false, |value| {
        value.as_dict_mut().unwrap().set("k", Text::from("v"))
    })
    .unwrap();
    assert!(file.is_open());

    with_url("mem://resource-shared", None, false, |value| {
        let dict = value.as_dict_mut().unwrap();
        assert_eq!(text_of(&mut dict.get("k")?), "v");
        Ok(())
    })
    .unwrap();
    file.close().unwrap();

    assert!(matches!(
        from_url("mem://resource-shared", Some(&tag), false),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn headers_are_required_and_versioned() {
    let file = StoreFile::in_memory("resource-headers").unwrap();
    assert!(matches!(
        from_url("mem://resource-headers", None, false),
        Err(Error::InvalidArgumentError(_))
    ));

    let root = file.root().unwrap();
    root.set_attr(VERSION_KEY, AttrValue::Int(FORMAT_VERSION + 1))
        .unwrap();
    assert!(matches!(
        from_url("mem://resource-headers", Some(&TypeTag::Table), false),
        Err(Error::UnsupportedType(_))
    ));
    file.close().unwrap();
}

#[test]
fn write_mode_on_a_read_only_open_file_is_refused() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ro.sy");
    StoreFile::create(&path).unwrap().close().unwrap();
    let reader = StoreFile::open(&path, AccessMode::Read).unwrap();
    assert!(matches!(
        from_url(&file_url(&path, "mode=w"), Some(&TypeTag::Table), false),
        Err(Error::ModeViolation(_))
    ));
    reader.close().unwrap();
}
