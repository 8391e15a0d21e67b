mod common;

use common::{CountingSource, mem_root, text_of};
use sydata_container::{Container, Dict, Record, SourceRef, Text, Tuple, from_datasource, from_type};
use sydata_result::Error;
use sydata_types::TypeTag;

fn dict_of(entries: &[(&str, &str)]) -> Dict {
    let mut dict = Dict::new(TypeTag::Text);
    for (k, v) in entries {
        dict.set(k, Text::from(*v)).unwrap();
    }
    dict
}

#[test]
fn dict_keys_are_sorted_and_values_read_lazily() {
    let (file, root) = mem_root("dict-lazy", false);
    dict_of(&[("zeta", "z"), ("alpha", "a"), ("a/b", "slash")])
        .writeback(&root, None)
        .unwrap();

    let counting = CountingSource::wrap(root.clone());
    let source: SourceRef = counting.clone();
    let mut dict = Dict::bound(source, TypeTag::Text).unwrap();
    assert_eq!(dict.keys(), vec!["a/b", "alpha", "zeta"]);
    assert_eq!(counting.total_reads(), 0);
    assert_eq!(text_of(&mut dict.get("a/b").unwrap()), "slash");
    dict.get_ref("a/b").unwrap();
    assert_eq!(counting.reads("a/b"), 1);
    assert!(matches!(dict.get("missing"), Err(Error::NotFound(_))));
    file.close().unwrap();
}

#[test]
fn dict_set_checks_the_value_type() {
    let mut dict = Dict::new(TypeTag::Text);
    assert!(matches!(
        dict.set("t", sydata_container::Table::new()),
        Err(Error::ConsistencyError(_))
    ));
    assert_eq!(dict.type_tag(), TypeTag::dict(TypeTag::Text));
}

#[test]
fn dict_in_place_writeback_applies_removals() {
    let (file, root) = mem_root("dict-remove", false);
    dict_of(&[("k1", "one"), ("k2", "two"), ("k3", "three")])
        .writeback(&root, None)
        .unwrap();

    let mut dict = Dict::bound(root.clone(), TypeTag::Text).unwrap();
    let moved = dict.get("k2").unwrap();
    dict.set("k1", moved).unwrap();
    dict.remove("k2").unwrap();
    assert!(dict.is_modified());
    dict.writeback(&root, None).unwrap();

    let mut again = Dict::bound(root.clone(), TypeTag::Text).unwrap();
    assert_eq!(again.keys(), vec!["k1", "k3"]);
    assert_eq!(text_of(&mut again.get("k1").unwrap()), "two");
    assert_eq!(text_of(&mut again.get("k3").unwrap()), "three");
    file.close().unwrap();
}

#[test]
fn record_fields_follow_the_tag() {
    let tag = TypeTag::record([("title", TypeTag::Text), ("tags", TypeTag::list(TypeTag::Text))]);
    let mut value = from_type(&tag).unwrap();
    assert_eq!(value.type_tag(), tag);
    let record = value.as_record_mut().unwrap();
    assert_eq!(record.field_names(), ["title", "tags"]);
    assert_eq!(text_of(record.get_mut("title").unwrap()), "");

    record.set("title", Text::from("report")).unwrap();
    assert!(matches!(
        record.set("tags", Text::from("x")),
        Err(Error::ConsistencyError(_))
    ));
    assert!(matches!(record.get("nope"), Err(Error::NotFound(_))));

    let (file, root) = mem_root("record-round-trip", false);
    record
        .get_mut("tags")
        .unwrap()
        .as_list_mut()
        .unwrap()
        .append(Text::from("daily"))
        .unwrap();
    record.writeback(&root, None).unwrap();

    let mut bound = from_datasource(root.clone(), &tag).unwrap();
    let record = bound.as_record_mut().unwrap();
    assert!(!record.is_modified());
    assert_eq!(text_of(record.get_mut("title").unwrap()), "report");
    let mut tags = record.get("tags").unwrap();
    assert_eq!(tags.as_list().unwrap().len(), 1);
    assert_eq!(
        text_of(&mut tags.as_list_mut().unwrap().get(0).unwrap()),
        "daily"
    );
    file.close().unwrap();
}

#[test]
fn tuple_positions_round_trip() {
    let tag = TypeTag::tuple([TypeTag::Text, TypeTag::Text]);
    let mut tuple = Tuple::new(vec![TypeTag::Text, TypeTag::Text]).unwrap();
    tuple.set(0, Text::from("left")).unwrap();
    tuple.set(1, Text::from("right")).unwrap();
    assert!(matches!(tuple.get(2), Err(Error::NotFound(_))));

    let (file, root) = mem_root("tuple-round-trip", false);
    tuple.writeback(&root, None).unwrap();
    let mut bound = Tuple::bound(root.clone(), vec![TypeTag::Text, TypeTag::Text]).unwrap();
    assert_eq!(bound.type_tag(), tag);
    assert_eq!(text_of(&mut bound.get(1).unwrap()), "right");
    assert!(!bound.writeback(&root, Some("x")).unwrap());
    file.close().unwrap();
}

#[test]
fn stored_type_is_checked_on_read() {
    let (file, root) = mem_root("keyed-type-check", false);
    let mut record = Record::new(vec![("f".to_string(), TypeTag::Text)]).unwrap();
    record.writeback(&root, None).unwrap();

    let mut wrong = Record::bound(root.clone(), vec![("f".to_string(), TypeTag::Table)]).unwrap();
    assert!(matches!(wrong.get("f"), Err(Error::ConsistencyError(_))));

    let mut generic = Record::bound(root.clone(), vec![("f".to_string(), TypeTag::generic("a"))]).unwrap();
    assert!(matches!(generic.get("f"), Err(Error::UnsupportedType(_))));
    file.close().unwrap();
}

#[test]
fn factory_dispatch() {
    assert!(matches!(
        from_type(&TypeTag::function(TypeTag::Text, TypeTag::Text)),
        Err(Error::UnsupportedType(_))
    ));
    assert!(matches!(
        from_type(&TypeTag::generic("t")),
        Err(Error::UnsupportedType(_))
    ));
    assert!(matches!(
        from_type(&TypeTag::Dict {
            key: Box::new(TypeTag::Table),
            value: Box::new(TypeTag::Text),
        }),
        Err(Error::UnsupportedType(_))
    ));
    assert!(matches!(
        from_type(&TypeTag::record([("f", TypeTag::generic("t"))])),
        Err(Error::UnsupportedType(_))
    ));

    let alias = TypeTag::alias("Names", TypeTag::list(TypeTag::Text));
    let value = from_type(&alias).unwrap();
    assert!(matches!(value, Container::List(_)));
    assert_eq!(value.type_tag(), TypeTag::list(TypeTag::Text));

    assert!(matches!(from_type(&TypeTag::Table).unwrap(), Container::Table(_)));
    assert!(matches!(from_type(&TypeTag::Text).unwrap(), Container::Text(_)));
    assert!(matches!(
        from_type(&TypeTag::dict(TypeTag::Table)).unwrap(),
        Container::Dict(_)
    ));
}

#[test]
fn text_links_only_when_unmodified() {
    let (src_file, src) = mem_root("text-link-src", true);
    let (dst_file, dst) = mem_root("text-link-dst", true);
    let mut dict = dict_of(&[("greeting", "hello")]);
    dict.writeback(&src, None).unwrap();

    let mut bound = Dict::bound(src.clone(), TypeTag::Text).unwrap();
    let mut text = bound.get("greeting").unwrap();
    assert!(text.writeback(&dst, Some("g")).unwrap());
    text.as_text_mut().unwrap().set("changed");
    assert!(!text.writeback(&dst, Some("h")).unwrap());

    dst_file.close().unwrap();
    src_file.close().unwrap();
}
