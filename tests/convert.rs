mod common;

use std::fs;

use common::Level;
use rse_map::convert::{self, ConvertOptions, FileOutcome, STRIPPED};
use rse_map::map::Dialect;
use serde_json::{json, Value};

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn converts_rainbow_six_with_stripped_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("M01.map");
    let mut level = Level::rainbow_six();
    level.geometry_flags = 0x8000_0011;
    fs::write(&path, level.build()).unwrap();

    let report = convert::convert_file(&path, &ConvertOptions::default()).unwrap();
    let output = dir.path().join("M01.map.JSON");
    assert_eq!(
        report.outcome,
        FileOutcome::Converted {
            dialect: Dialect::RainbowSix,
            end_of_file_reached: true,
            unevaluated_flags: 1,
            output: output.clone(),
        }
    );
    assert_eq!(report.light_types.iter().collect::<Vec<_>>(), vec![1, 3]);

    let doc = read_json(&output);
    assert_eq!(doc["filename"], path.display().to_string());
    assert_eq!(doc["end_of_file_reached"], true);

    let contents = &doc["filecontents"];
    assert_eq!(contents["dialect"], "RainbowSix");
    assert_eq!(contents["header"]["marker"], "BeginMapv2.1");
    assert_eq!(contents["materials"]["materials"][0]["name"], "WI_plain5");

    let object = &contents["geometries"]["objects"][0];
    assert_eq!(object["name"], "wall");
    assert_eq!(object["vertices"], json!([STRIPPED]));
    assert_eq!(object["faces"], json!([STRIPPED]));
    let mesh = &object["meshes"][0];
    assert_eq!(mesh["name"], "wall_mesh");
    assert_eq!(mesh["face_indices"], json!([STRIPPED]));
    assert_eq!(mesh["renderable"], json!([STRIPPED]));
    assert_eq!(mesh["geometry_flags_evaluated"]["CLIMBABLE"], true);
    assert_eq!(mesh["geometry_flags_evaluated"]["UnevaluatedFlags"], true);
}

#[test]
fn keep_arrays_writes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m02.map");
    fs::write(&path, Level::rainbow_six().build()).unwrap();

    let options = ConvertOptions {
        output_suffix: ".json".to_string(),
        strip_arrays: false,
        pretty: false,
    };
    convert::convert_file(&path, &options).unwrap();

    let text = fs::read_to_string(dir.path().join("m02.map.json")).unwrap();
    assert!(!text.contains('\n'));
    let doc: Value = serde_json::from_str(&text).unwrap();
    let object = &doc["filecontents"]["geometries"]["objects"][0];
    assert_eq!(object["vertices"].as_array().unwrap().len(), 4);
    let renderable = &object["meshes"][0]["renderable"];
    assert_eq!(renderable["triangles"], json!([[0, 1, 2], [2, 3, 4]]));
}

#[test]
fn converts_rogue_spear_with_stripped_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rs01.map");
    fs::write(&path, Level::rogue_spear().build()).unwrap();

    convert::convert_file(&path, &ConvertOptions::default()).unwrap();
    let doc = read_json(&dir.path().join("rs01.map.JSON"));

    let contents = &doc["filecontents"];
    assert_eq!(contents["transitions"]["transitions"][0]["name"], "stairs01");
    let data = &contents["geometries"]["objects"][0]["geometry_data"];
    assert_eq!(data["vertices"], json!([STRIPPED]));
    assert_eq!(data["face_groups"][0]["material_index"], 0);
    assert_eq!(data["face_groups"][0]["vertex_indices"], json!([STRIPPED]));
    assert_eq!(data["collision_information"]["faces"], json!([STRIPPED]));
    assert_eq!(
        data["collision_information"]["collision_mesh_definitions"],
        json!([STRIPPED])
    );
}

#[test]
fn batch_keeps_going_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("m01")).unwrap();
    fs::create_dir_all(root.join("test")).unwrap();

    fs::write(root.join("m01").join("M01.map"), Level::rainbow_six().build()).unwrap();
    fs::write(root.join("RS01.MAP"), Level::rogue_spear().build()).unwrap();

    let mut extra = Level::rogue_spear().build();
    extra.extend_from_slice(&[1, 2, 3]);
    fs::write(root.join("extra.map"), extra).unwrap();

    let mut broken = Level::rainbow_six().build();
    broken.truncate(broken.len() / 2);
    fs::write(root.join("broken.map"), broken).unwrap();

    fs::write(root.join("test").join("obstacletest.map"), b"not a map").unwrap();
    fs::write(root.join("notes.txt"), b"not a map either").unwrap();

    let files = convert::discover_files(root, "map").unwrap();
    assert_eq!(files.len(), 5);

    let summary = convert::run_batch(&files, &ConvertOptions::default());
    assert_eq!(summary.converted, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.incomplete, vec![root.join("extra.map")]);
    assert_eq!(summary.light_types.iter().collect::<Vec<_>>(), vec![1, 3]);

    assert!(root.join("m01").join("M01.map.JSON").exists());
    assert!(root.join("RS01.MAP.JSON").exists());
    assert!(!root.join("broken.map.JSON").exists());
    assert!(!root.join("test").join("obstacletest.map.JSON").exists());
}

#[test]
fn file_without_readable_footer_still_converts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mansion.map");
    let mut bytes = Level::rainbow_six().build();
    let footer_at = bytes.len() - (4 + 7);
    bytes.splice(footer_at..footer_at, [0u8; 4]);
    fs::write(&path, bytes).unwrap();

    let summary = convert::run_batch(&[path.clone()], &ConvertOptions::default());
    assert_eq!(summary.converted, 1);
    assert_eq!(summary.incomplete, vec![path]);

    let doc = read_json(&dir.path().join("mansion.map.JSON"));
    assert_eq!(doc["end_of_file_reached"], false);
    assert!(doc["filecontents"]["footer"].is_null());
    assert_eq!(doc["filecontents"]["materials"]["materials"][0]["name"], "WI_plain5");
}
