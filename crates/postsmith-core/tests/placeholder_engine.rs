use postsmith_core::{
    FieldDefinition, Template, Transform, UnresolvedPlaceholders, ValueMap, apply_transform,
    build_value_map, compute_missing_fields, extract_placeholders, fill_template, generate,
    render_markup,
};

fn values(pairs: &[(&str, &str)]) -> ValueMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn placeholders_are_unique_in_first_seen_order() {
    let keys = extract_placeholders("{{b}} {{ a }} {{b}}\n{{\tc\t}} {{a}}");
    assert_eq!(keys, ["b", "a", "c"]);
}

#[test]
fn template_exposes_its_placeholders() {
    let template = Template::new("Dear {{ name }}, see {{link}}.");
    assert_eq!(template.placeholders(), ["name", "link"]);
}

#[test]
fn missing_field_blocks_generation() {
    let template = "Hello {{name}}";
    let placeholders = extract_placeholders(template);
    let missing = compute_missing_fields(&placeholders, &[], &ValueMap::new());
    assert_eq!(missing, ["name"]);

    let err = generate(template, &[], &ValueMap::new(), &ValueMap::new())
        .expect_err("generation must be refused");
    assert_eq!(
        err,
        UnresolvedPlaceholders {
            keys: vec!["name".to_string()]
        }
    );
    assert_eq!(err.to_string(), "unresolved placeholders: name");
}

#[test]
fn provided_value_or_field_resolves_a_placeholder() {
    let placeholders = extract_placeholders("{{a}} {{b}} {{c}}");
    let fields = [FieldDefinition::new("b")];
    let provided = values(&[("a", "x")]);
    assert_eq!(
        compute_missing_fields(&placeholders, &fields, &provided),
        ["c"]
    );
}

#[test]
fn value_priority_is_provided_then_input_then_default() {
    let template = "{{rank}}|{{unit}}|{{shift}}|{{notes}}";
    let fields = [
        FieldDefinition::new("rank").with_default("Probie"),
        FieldDefinition::new("unit").with_default("Engine 1"),
        FieldDefinition::new("shift").with_default("A"),
        FieldDefinition::new("notes"),
    ];
    let inputs = values(&[("rank", "Captain"), ("unit", "Medic 2")]);
    let provided = values(&[("rank", "Chief")]);

    let map = build_value_map(template, &fields, &inputs, &provided);
    assert_eq!(map["rank"], "Chief");
    assert_eq!(map["unit"], "Medic 2");
    assert_eq!(map["shift"], "A");
    assert_eq!(map["notes"], "");
    assert_eq!(fill_template(template, &map), "Chief|Medic 2|A|");
}

#[test]
fn provided_values_skip_transforms() {
    let fields = [FieldDefinition::new("reasons").with_transform(Transform::BbcList)];
    let provided = values(&[("reasons", "a\nb")]);
    let map = build_value_map("{{reasons}}", &fields, &ValueMap::new(), &provided);
    assert_eq!(map["reasons"], "a\nb");
}

#[test]
fn list_transform_applies_to_defaults() {
    let fields = [FieldDefinition::new("duties")
        .with_transform(Transform::BbcList)
        .with_default("patrol\n\nreports")];
    let map = build_value_map("{{duties}}", &fields, &ValueMap::new(), &ValueMap::new());
    assert_eq!(map["duties"], "[LIST]\n[*] patrol\n[*] reports\n[/LIST]");
}

#[test]
fn empty_list_input_becomes_not_applicable() {
    assert_eq!(apply_transform("", Transform::BbcList), "N/A");
    let fields = [FieldDefinition::new("reasons").with_transform(Transform::BbcList)];
    let text = generate(
        "Reasons: {{reasons}}",
        &fields,
        &values(&[("reasons", "  \n ")]),
        &ValueMap::new(),
    )
    .expect("generate");
    assert_eq!(text, "Reasons: N/A");
}

#[test]
fn list_transform_round_trips_through_renderer() {
    let list = apply_transform("a\n\nb\n", Transform::BbcList);
    assert_eq!(list.matches("[*]").count(), 2);
    assert_eq!(render_markup(&list), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn every_occurrence_is_filled() {
    let fields = [FieldDefinition::new("name")];
    let text = generate(
        "{{name}} and {{ name }} again",
        &fields,
        &values(&[("name", "Ray")]),
        &ValueMap::new(),
    )
    .expect("generate");
    assert_eq!(text, "Ray and Ray again");
    assert!(!text.contains("{{"));
}

#[test]
fn malformed_tokens_are_left_alone() {
    let text = generate(
        "{{ok}} {{not-ok}} {{also not}}",
        &[FieldDefinition::new("ok")],
        &values(&[("ok", "1")]),
        &ValueMap::new(),
    )
    .expect("generate");
    assert_eq!(text, "1 {{not-ok}} {{also not}}");
}

#[test]
fn generation_is_deterministic() {
    let template = "{{b}} {{a}} {{c}} {{a}}";
    let fields = [
        FieldDefinition::new("a").with_transform(Transform::BbcList),
        FieldDefinition::new("b"),
        FieldDefinition::new("c").with_default("z"),
    ];
    let inputs = values(&[("a", "x\ny"), ("b", "1.5")]);
    let first = generate(template, &fields, &inputs, &ValueMap::new()).expect("first");
    let second = generate(template, &fields, &inputs, &ValueMap::new()).expect("second");
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn hr_post_end_to_end() {
    let template = "[b]{{hr_rank}}[/b] {{hr_name}}: {{reasons}}";
    let fields = [FieldDefinition::new("reasons").with_transform(Transform::BbcList)];
    let inputs = values(&[("reasons", "late\nincomplete")]);
    let provided = values(&[("hr_rank", "Commander"), ("hr_name", "J. Smith")]);

    let text = generate(template, &fields, &inputs, &provided).expect("generate");
    assert_eq!(
        text,
        "[b]Commander[/b] J. Smith: [LIST]\n[*] late\n[*] incomplete\n[/LIST]"
    );
    assert_eq!(
        render_markup(&text),
        "<strong>Commander</strong> J. Smith: <ul><li>late</li><li>incomplete</li></ul>"
    );
}
