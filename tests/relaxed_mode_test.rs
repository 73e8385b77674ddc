use musicxml_model::{DocumentNode, Schema};

fn element(name: &str) -> DocumentNode<'static> {
    Schema::musicxml()
        .expect("built-in catalog should resolve")
        .element(name)
        .expect("element kind should exist")
}

fn relaxed_part_list() -> DocumentNode<'static> {
    let mut part_list = element("part-list").relaxed();
    part_list
        .add_child(element("score-part").with_attribute("id", "p-1").unwrap())
        .unwrap();
    part_list
        .add_child(element("part-group").with_attribute("type", "start").unwrap())
        .unwrap();
    part_list
        .add_child(element("score-part").with_attribute("id", "p-2").unwrap())
        .unwrap();
    part_list
        .add_child(element("part-group").with_attribute("type", "stop").unwrap())
        .unwrap();
    part_list
}

#[test]
fn test_relaxed_keeps_insertion_order() {
    let part_list = relaxed_part_list();
    let expected = r#"<part-list>
  <score-part id="p-1"/>
  <part-group type="start"/>
  <score-part id="p-2"/>
  <part-group type="stop"/>
</part-list>
"#;
    assert_eq!(part_list.to_xml().expect("relaxed node skips checks"), expected);
}

#[test]
fn test_empty_relaxed_node() {
    assert_eq!(element("part-list").relaxed().to_xml().unwrap(), "<part-list/>\n");
    assert!(element("part-list").to_xml().is_err());
}

#[test]
fn test_explicit_final_checks_on_relaxed_node() {
    let part_list = relaxed_part_list();
    // replay works; the strict score-part children still lack part-name
    assert!(part_list.required_children(false).unwrap().is_empty());
    assert!(part_list.final_checks(false).is_err());

    let mut unsorted = element("part-list").relaxed();
    unsorted
        .add_child(element("part-group").with_attribute("type", "start").unwrap())
        .unwrap();
    assert_eq!(unsorted.required_children(false).unwrap(), vec!["score-part"]);
}

#[test]
fn test_restoring_strict_mode_sorts_children() {
    let mut part_list = relaxed_part_list();
    part_list.set_strict(true).expect("children fit the content model");

    let ordered: Vec<_> = part_list
        .children(true)
        .iter()
        .map(|c| format!("{}:{}", c.name(), c.attributes().values().next().unwrap()))
        .collect();
    // both part-groups land in the leading repeatable part-group group, the
    // second score-part opens the trailing choice
    assert_eq!(
        ordered,
        vec![
            "part-group:start",
            "part-group:stop",
            "score-part:p-1",
            "score-part:p-2"
        ]
    );

    let inserted: Vec<_> = part_list.children(false).iter().map(|c| c.name()).collect();
    assert_eq!(inserted, vec!["score-part", "part-group", "score-part", "part-group"]);
}

#[test]
fn test_strict_mode_rejected_when_children_do_not_fit() {
    let mut pitch = element("pitch").relaxed();
    pitch.add_child(element("step").with_value("C").unwrap()).unwrap();
    pitch.add_child(element("step").with_value("D").unwrap()).unwrap();

    assert!(pitch.set_strict(true).is_err());
    assert!(!pitch.is_strict());
    assert_eq!(pitch.child_count(), 2);
}
