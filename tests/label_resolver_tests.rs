use dermaserve::labels::resolve_class_names;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

use common::{create_temp_dir, missing_path, write_label_file};

#[test]
fn numeric_key_json_is_ordered_by_numeric_value() {
    let dir = create_temp_dir();
    // lexicographic order would give 0, 10, 2
    let json = write_label_file(
        &dir,
        "class_indices.json",
        r#"{"0": "Eczema", "10": "Melanoma", "2": "Psoriasis"}"#,
    );
    let txt = missing_path(&dir, "labels.txt");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Eczema", "Psoriasis", "Melanoma"]);
}

#[test]
fn name_to_index_json_places_names_at_their_positions() {
    let dir = create_temp_dir();
    let json = write_label_file(
        &dir,
        "class_indices.json",
        r#"{"Psoriasis": 1, "Eczema": 0}"#,
    );
    let txt = missing_path(&dir, "labels.txt");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Eczema", "Psoriasis"]);
}

#[test]
fn name_to_index_json_drops_gaps() {
    let dir = create_temp_dir();
    let json = write_label_file(
        &dir,
        "class_indices.json",
        r#"{"Acne": 0, "Melanoma": 3}"#,
    );
    let txt = missing_path(&dir, "labels.txt");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Acne", "Melanoma"]);
}

#[test]
fn name_to_index_json_accepts_numeric_strings() {
    let dir = create_temp_dir();
    let json = write_label_file(
        &dir,
        "class_indices.json",
        r#"{"Warts": "1", "Acne": "0"}"#,
    );
    let txt = missing_path(&dir, "labels.txt");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Acne", "Warts"]);
}

#[test]
fn colliding_indices_are_last_write_wins() {
    let dir = create_temp_dir();
    // iteration is by key order, so "Psoriasis" overwrites "Eczema" at 0
    let json = write_label_file(
        &dir,
        "class_indices.json",
        r#"{"Eczema": 0, "Psoriasis": 0}"#,
    );
    let txt = missing_path(&dir, "labels.txt");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Psoriasis"]);
}

#[test]
fn unparseable_json_degrades_to_labels_txt() {
    let dir = create_temp_dir();
    let json = write_label_file(&dir, "class_indices.json", "{not json at all");
    let txt = write_label_file(&dir, "labels.txt", "0 Eczema\n1 Psoriasis\n");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Eczema", "Psoriasis"]);
}

#[test]
fn non_object_json_degrades_to_labels_txt() {
    let dir = create_temp_dir();
    let json = write_label_file(&dir, "class_indices.json", r#"["Eczema", "Psoriasis"]"#);
    let txt = write_label_file(&dir, "labels.txt", "Acne\nWarts\n");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Acne", "Warts"]);
}

#[test]
fn empty_json_object_degrades_to_labels_txt() {
    let dir = create_temp_dir();
    let json = write_label_file(&dir, "class_indices.json", "{}");
    let txt = write_label_file(&dir, "labels.txt", "Acne\n");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Acne"]);
}

#[rstest]
#[case("0 Eczema\n1 Psoriasis", vec!["Eczema", "Psoriasis"])]
#[case("1 Psoriasis\n0 Eczema", vec!["Eczema", "Psoriasis"])]
#[case("Eczema\nPsoriasis", vec!["Eczema", "Psoriasis"])]
#[case("\n\n0 Eczema\n\n1 Psoriasis\n\n", vec!["Eczema", "Psoriasis"])]
#[case("3 Melanoma 1677", vec!["Melanoma 1677"])]
fn labels_txt_layouts(#[case] content: &str, #[case] expected: Vec<&str>) {
    let dir = create_temp_dir();
    let json = missing_path(&dir, "class_indices.json");
    let txt = write_label_file(&dir, "labels.txt", content);

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, expected);
}

#[test]
fn bare_index_line_names_itself() {
    let dir = create_temp_dir();
    let json = missing_path(&dir, "class_indices.json");
    let txt = write_label_file(&dir, "labels.txt", "0 Eczema\n1\n");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Eczema", "1"]);
}

#[test]
fn mixed_prefixed_and_unprefixed_lines() {
    let dir = create_temp_dir();
    let json = missing_path(&dir, "class_indices.json");
    // "Acne" has no prefix and is assigned the next sequential slot (1)
    let txt = write_label_file(&dir, "labels.txt", "0 Eczema\nAcne\n2 Warts\n");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["Eczema", "Acne", "Warts"]);
}

#[test]
fn missing_both_sources_is_an_error() {
    let dir = create_temp_dir();
    let json = missing_path(&dir, "class_indices.json");
    let txt = missing_path(&dir, "labels.txt");

    let err = resolve_class_names(&json, &txt).unwrap_err();
    assert!(err.to_string().contains("No valid class label source"));
}

#[test]
fn empty_labels_txt_is_an_error() {
    let dir = create_temp_dir();
    let json = missing_path(&dir, "class_indices.json");
    let txt = write_label_file(&dir, "labels.txt", "\n\n\n");

    let err = resolve_class_names(&json, &txt).unwrap_err();
    assert!(err.to_string().contains("No valid class label source"));
}

#[test]
fn json_wins_over_labels_txt_when_both_parse() {
    let dir = create_temp_dir();
    let json = write_label_file(&dir, "class_indices.json", r#"{"0": "FromJson"}"#);
    let txt = write_label_file(&dir, "labels.txt", "0 FromTxt\n");

    let names = resolve_class_names(&json, &txt).unwrap();
    assert_eq!(names, vec!["FromJson"]);
}
