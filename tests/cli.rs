use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_scene(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(xml.as_bytes()).expect("write scene");
    tmp
}

fn fly_through_scene() -> NamedTempFile {
    write_scene(
        r#"<scene>
  <object>
    <name>Crate</name>
    <position>0 0 -2</position>
  </object>
  <light>
    <type>directional</type>
  </light>
  <light>
    <position>1.2 1.0 2.0</position>
  </light>
  <frame><dt>1</dt><keys>W</keys></frame>
  <frame><scroll>50</scroll></frame>
  <frame><mouse>0 -1000</mouse></frame>
</scene>
"#,
    )
}

#[test]
fn cli_replays_frames_and_prints_final_camera() {
    let scene = fly_through_scene();
    let mut cmd = Command::cargo_bin("learngl-camera").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 1 objects, 2 lights, 3 input frames"))
        .stdout(contains(" - Crate"))
        .stdout(contains(
            "Camera position=(0.00, 0.00, 1.50) yaw=-90.00 pitch=89.00 fov=1.00",
        ))
        .stdout(contains("Camera front=(0.00, 1.00, -0.02)"));
}

#[test]
fn cli_reports_default_camera_without_frames() {
    let scene = write_scene("<scene/>");
    let mut cmd = Command::cargo_bin("learngl-camera").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 0 objects, 0 lights, 0 input frames"))
        .stdout(contains(
            "Camera position=(0.00, 0.00, 3.00) yaw=-90.00 pitch=0.00 fov=45.00",
        ));
}

#[test]
fn cli_rejects_unknown_arguments() {
    let scene = write_scene("<scene/>");
    let mut cmd = Command::cargo_bin("learngl-camera").expect("binary exists");
    cmd.arg(scene.path()).arg("--fullscreen");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"));
}

#[test]
fn cli_requires_a_scene_path() {
    let mut cmd = Command::cargo_bin("learngl-camera").expect("binary exists");
    cmd.assert()
        .failure()
        .stderr(contains("Usage: learngl-camera"));
}

#[test]
fn cli_reports_missing_scene_file() {
    let mut cmd = Command::cargo_bin("learngl-camera").expect("binary exists");
    cmd.arg("does-not-exist.xml").arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to read scene does-not-exist.xml"));
}

#[test]
fn cli_reports_invalid_scene() {
    let scene = write_scene("<scene><object><position>1 2 3</position></object></scene>");
    let mut cmd = Command::cargo_bin("learngl-camera").expect("binary exists");
    cmd.arg(scene.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to parse scene XML"));
}
