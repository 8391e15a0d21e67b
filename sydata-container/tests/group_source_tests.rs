mod common;

use std::sync::Arc;

use common::mem_root;
use sydata_container::{DataSource, GroupSource, SourceRef};
use sydata_result::Error;
use sydata_storage::Link;
use sydata_types::TypeTag;

#[test]
fn keys_are_sanitized_on_disk_and_restored() {
    let (file, root) = mem_root("source-keys", false);
    for key in ["plain", "a/b", "__sy_order__", "100%"] {
        root.write_with_type(key, &TypeTag::Text).unwrap();
    }
    assert_eq!(root.size().unwrap(), 4);
    assert_eq!(
        root.keys().unwrap(),
        vec!["100%", "__sy_order__", "a/b", "plain"]
    );
    let on_disk = file.root().unwrap().keys().unwrap();
    assert!(on_disk.contains(&"a%2Fb".to_string()), "{on_disk:?}");
    assert!(!on_disk.contains(&"__sy_order__".to_string()), "{on_disk:?}");

    root.remove("a/b").unwrap();
    assert_eq!(root.size().unwrap(), 3);
    file.close().unwrap();
}

#[test]
fn text_leaves_round_trip() {
    let (file, root) = mem_root("source-text", false);
    let child = root.write_with_type("note", &TypeTag::Text).unwrap();
    let long = "lorem ipsum ".repeat(400);
    child.write_text(&long).unwrap();
    let again = root.read_with_type("note", &TypeTag::Text).unwrap();
    assert_eq!(again.read_text().unwrap(), long);
    assert!(matches!(
        root.read_with_type("note", &TypeTag::Table),
        Err(Error::ConsistencyError(_))
    ));
    file.close().unwrap();
}

#[test]
fn read_only_sources_refuse_writes() {
    let file = sydata_storage::StoreFile::in_memory("source-read-only").unwrap();
    let source: SourceRef = Arc::new(GroupSource::root(&file, false, true, false).unwrap());
    assert!(!source.can_write());
    assert!(matches!(
        source.write_with_type("x", &TypeTag::Text),
        Err(Error::ModeViolation(_))
    ));
    assert!(matches!(source.write_text("x"), Err(Error::ModeViolation(_))));
    file.close().unwrap();
}

#[test]
fn links_need_both_sides_and_a_non_root_target() {
    let (a_file, a) = mem_root("source-link-a", true);
    let (b_file, b) = mem_root("source-link-b", false);
    let (c_file, c) = mem_root("source-link-c", true);
    let child = a.write_with_type("t", &TypeTag::Text).unwrap();
    child.write_text("shared").unwrap();

    assert!(!b.link("t", child.as_ref()).unwrap());
    assert!(!c.link("root", a.as_ref()).unwrap());
    assert!(c.link("t", child.as_ref()).unwrap());
    assert!(matches!(
        c_file.root().unwrap().link_info("t").unwrap(),
        Link::External { .. }
    ));
    assert_eq!(c.identity().path, "/");
    assert_eq!(c.child_identity("a/b").path, "/a%2Fb");
    let linked = c.read_with_type("t", &TypeTag::Text).unwrap();
    assert_eq!(linked.identity(), child.identity());
    assert!(linked.shares_origin(a.as_ref()));

    c_file.close().unwrap();
    b_file.close().unwrap();
    a_file.close().unwrap();
}
