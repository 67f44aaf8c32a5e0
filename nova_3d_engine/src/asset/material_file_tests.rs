use crate::asset::material_file::*;
use crate::error::Error;

#[test]
fn test_parse_entries_in_order() {
    let entries = parse_material_entries("hull 32 0.5\nglass 128.0 1.0\n", 2).unwrap();
    assert_eq!(
        entries,
        vec![
            MaterialEntry { name: "hull".to_string(), shininess: 32.0, specular_strength: 0.5 },
            MaterialEntry { name: "glass".to_string(), shininess: 128.0, specular_strength: 1.0 },
        ]
    );
}

#[test]
fn test_parse_ignores_line_layout_and_trailing_content() {
    let entries = parse_material_entries("a 1\n2 b 3 4 extra", 2).unwrap();
    assert_eq!(entries[1].name, "b");
    assert_eq!(entries[1].specular_strength, 4.0);
}

#[test]
fn test_missing_entry_is_parse_error() {
    assert!(matches!(parse_material_entries("hull 32 0.5", 2), Err(Error::ParseError(_))));
}

#[test]
fn test_bad_number_is_parse_error() {
    assert!(matches!(parse_material_entries("hull shiny 0.5", 1), Err(Error::ParseError(_))));
}

#[test]
fn test_missing_file_is_asset_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_material_file(&dir.path().join("absent.mat"), 1);
    assert!(matches!(result, Err(Error::AssetNotFound(_))));
}

#[test]
fn test_read_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ship.mat");
    std::fs::write(&path, "hull 16 0.25\n").unwrap();
    assert_eq!(read_material_file(&path, 1).unwrap()[0].shininess, 16.0);
}
