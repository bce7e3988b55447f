use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

mod common;
use common::{file_names, write_blank_png, write_mask_png, write_rgb_frame};

fn framecurate() -> Command {
    Command::cargo_bin("framecurate").unwrap()
}

#[test]
fn runs() {
    framecurate()
        .assert()
        .success()
        .stdout(contains("framecurate"));
}

#[test]
fn outputs_tool_name() {
    let mut cmd = framecurate();
    cmd.arg("-V");
    cmd.assert().success().stdout("framecurate 0.1.0\n");
}

// bbox subcommand

#[test]
fn bbox_prints_mask_bounds() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let mask = temp.path().join("mask.png");
    write_mask_png(&mask, 64, 48, (10, 20, 50, 30));

    framecurate()
        .arg("bbox")
        .arg(&mask)
        .assert()
        .success()
        .stdout(contains("mask.png 10 20 50 30"));
}

#[test]
fn bbox_json_output_format() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let mask = temp.path().join("mask.png");
    write_mask_png(&mask, 64, 48, (1, 2, 3, 4));

    framecurate()
        .arg("bbox")
        .arg(&mask)
        .args(["--output", "json"])
        .assert()
        .success()
        .stdout(contains("\"x_min\": 1"))
        .stdout(contains("\"y_max\": 4"))
        .stdout(contains("\"width\": 64"));
}

#[test]
fn bbox_empty_mask_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let mask = temp.path().join("blank.png");
    write_blank_png(&mask, 8, 8);

    framecurate()
        .arg("bbox")
        .arg(&mask)
        .assert()
        .failure()
        .stderr(contains("no foreground pixel"));
}

// encode subcommand

#[test]
fn encode_masks_uses_mask_size() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let mask = temp.path().join("mask.png");
    let out = temp.path().join("labels.txt");
    write_mask_png(&mask, 64, 64, (10, 20, 50, 60));

    framecurate()
        .arg("encode")
        .arg("--mask")
        .arg(&mask)
        .args(["--label", "2"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&out).expect("read labels"),
        "2 0.468750 0.625000 0.625000 0.625000\n"
    );
}

#[test]
fn encode_boxes_with_explicit_size() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let out = temp.path().join("labels.txt");

    framecurate()
        .args(["encode", "--width", "100", "--height", "100"])
        .args(["--box", "10,10,20,30", "--label", "3"])
        .args(["--box", "0,0,99,99", "--label", "0"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&out).expect("read labels"),
        "3 0.150000 0.200000 0.100000 0.200000\n0 0.495000 0.495000 0.990000 0.990000\n"
    );
}

#[test]
fn encode_label_count_mismatch_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let out = temp.path().join("labels.txt");

    framecurate()
        .args(["encode", "--width", "100", "--height", "100"])
        .args(["--box", "10,10,20,30", "--box", "1,1,2,2", "--label", "3"])
        .arg("--output")
        .arg(&out)
        .assert()
        .failure()
        .stderr(contains("counts must be equal"));

    assert!(!out.exists());
}

#[test]
fn encode_extreme_box_coordinates_does_not_crash() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let out = temp.path().join("labels.txt");

    framecurate()
        .args(["encode", "--width", "10", "--height", "10"])
        .args(["--box", "9223372036854775807,0,9223372036854775807,1", "--label", "0"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let content = fs::read_to_string(&out).expect("read labels");
    let x_center: f64 = content
        .split_whitespace()
        .nth(1)
        .expect("x_center field")
        .parse()
        .expect("numeric x_center");
    assert!(x_center.is_finite() && x_center > 9.2e17);
}

#[test]
fn encode_zero_size_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let out = temp.path().join("labels.txt");

    framecurate()
        .args(["encode", "--width", "0", "--height", "10"])
        .args(["--box", "1,1,2,2", "--label", "0", "--output"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(contains("Invalid image size 0x10"));

    assert!(!out.exists());
}

#[test]
fn encode_boxes_without_size_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");

    framecurate()
        .args(["encode", "--box", "1,1,2,2", "--label", "0", "--output"])
        .arg(temp.path().join("labels.txt"))
        .assert()
        .failure()
        .stderr(contains("image size required"));
}

// decode subcommand

#[test]
fn decode_prints_pixel_boxes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let labels = temp.path().join("labels.txt");
    fs::write(&labels, "2 0.468750 0.625000 0.625000 0.625000\n").expect("write labels");

    framecurate()
        .arg("decode")
        .arg(&labels)
        .args(["--width", "64", "--height", "64"])
        .assert()
        .success()
        .stdout("2 10 20 50 60\n");
}

#[test]
fn decode_reads_size_from_image() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let labels = temp.path().join("frame.txt");
    let image = temp.path().join("frame.png");
    fs::write(&labels, "0 0.5 0.5 0.25 0.25\n").expect("write labels");
    write_blank_png(&image, 64, 32);

    framecurate()
        .arg("decode")
        .arg(&labels)
        .arg("--image")
        .arg(&image)
        .args(["--output", "json"])
        .assert()
        .success()
        .stdout(contains("\"x_min\": 24"))
        .stdout(contains("\"y_min\": 12"))
        .stdout(contains("\"skipped\": []"));
}

#[test]
fn decode_malformed_file_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let labels = temp.path().join("labels.txt");
    fs::write(&labels, "0 0.5 0.5 0.25 0.25\n0 0.5\n").expect("write labels");

    framecurate()
        .arg("decode")
        .arg(&labels)
        .args(["--width", "64", "--height", "64"])
        .assert()
        .failure()
        .stderr(contains("Malformed YOLO label"))
        .stderr(contains(":2:"));
}

#[test]
fn decode_lenient_skips_malformed_lines() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let labels = temp.path().join("labels.txt");
    fs::write(&labels, "0 0.5 0.5 0.25 0.25\n0 0.5\n").expect("write labels");

    framecurate()
        .arg("decode")
        .arg(&labels)
        .args(["--width", "64", "--height", "64", "--lenient"])
        .assert()
        .success()
        .stdout("0 24 24 40 40\n")
        .stderr(contains("Skipped malformed line"));
}

#[test]
fn decode_strict_rejects_out_of_range_records() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let labels = temp.path().join("labels.txt");
    fs::write(&labels, "0 1.25 0.5 0.25 0.25\n").expect("write labels");

    framecurate()
        .arg("decode")
        .arg(&labels)
        .args(["--width", "64", "--height", "64"])
        .assert()
        .success()
        .stdout("0 72 24 88 40\n");

    framecurate()
        .arg("decode")
        .arg(&labels)
        .args(["--width", "64", "--height", "64", "--strict"])
        .assert()
        .failure()
        .stderr(contains("Validation failed with 1 error(s)"));
}

#[test]
fn decode_missing_file_fails() {
    framecurate()
        .args(["decode", "nonexistent_labels.txt", "--width", "10", "--height", "10"])
        .assert()
        .failure()
        .stderr(contains("No such file or directory"));
}

#[test]
fn decode_unknown_output_format_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let labels = temp.path().join("labels.txt");
    fs::write(&labels, "0 0.5 0.5 0.25 0.25\n").expect("write labels");

    framecurate()
        .arg("decode")
        .arg(&labels)
        .args(["--width", "64", "--height", "64", "--output", "xml"])
        .assert()
        .failure()
        .stderr(contains("invalid value 'xml'"));
}

// check subcommand

#[test]
fn check_valid_directory_succeeds() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::write(temp.path().join("000.txt"), "0 0.5 0.5 0.25 0.25\n").expect("write labels");
    fs::write(temp.path().join("notes.md"), "not a label file").expect("write notes");

    framecurate()
        .arg("check")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("Validation passed"));
}

#[test]
fn check_reports_issues_and_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::create_dir_all(temp.path().join("batch_0")).expect("create batch dir");
    fs::write(
        temp.path().join("batch_0/000.txt"),
        "0 1.5 0.5 0.25 0.25\n0 0.5\n",
    )
    .expect("write labels");

    framecurate()
        .arg("check")
        .arg(temp.path())
        .assert()
        .failure()
        .stdout(contains("CenterOutOfRange"))
        .stdout(contains("MalformedLine"));
}

#[test]
fn check_strict_fails_on_warnings() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let labels = temp.path().join("000.txt");
    fs::write(&labels, "0 0.05 0.5 0.25 0.25\n").expect("write labels");

    framecurate()
        .arg("check")
        .arg(&labels)
        .assert()
        .success()
        .stdout(contains("ExtendsPastImage"));

    framecurate()
        .arg("check")
        .arg(&labels)
        .arg("--strict")
        .assert()
        .failure();
}

#[test]
fn check_num_classes_and_json_output() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let labels = temp.path().join("000.txt");
    fs::write(&labels, "7 0.5 0.5 0.25 0.25\n").expect("write labels");

    framecurate()
        .arg("check")
        .arg(&labels)
        .args(["--num-classes", "5", "--output", "json"])
        .assert()
        .failure()
        .stdout(contains("\"error_count\": 1"))
        .stdout(contains("LabelOutOfRange"));
}

// frame subcommands

#[test]
fn clean_removes_blank_frames_and_renumbers() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_rgb_frame(&temp.path().join("frame_a.png"), 0);
    write_rgb_frame(&temp.path().join("frame_b.png"), 200);
    write_rgb_frame(&temp.path().join("frame_c.png"), 90);

    framecurate()
        .arg("clean")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(contains("clean: 3 file(s) processed"))
        .stdout(contains("deleted: 1"));

    assert_eq!(file_names(temp.path()), vec!["000.png", "001.png"]);
}

#[test]
fn frame_directory_can_come_from_env() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_rgb_frame(&temp.path().join("000.png"), 120);

    framecurate()
        .arg("convert")
        .env("FRAMECURATE_DIR", temp.path())
        .assert()
        .success()
        .stdout(contains("converted: 1"));

    assert_eq!(file_names(temp.path()), vec!["000.jpg"]);
}

#[test]
fn downsample_split_and_join_round_trip() {
    let temp = tempfile::tempdir().expect("create temp dir");
    for idx in 0..9 {
        write_rgb_frame(&temp.path().join(format!("{idx:03}.jpg")), 100);
    }

    framecurate()
        .arg("downsample")
        .arg(temp.path())
        .args(["--fraction", "2"])
        .assert()
        .success();
    assert_eq!(
        file_names(temp.path()),
        vec!["000.jpg", "001.jpg", "002.jpg", "003.jpg", "004.jpg"]
    );

    framecurate()
        .arg("split")
        .arg(temp.path())
        .args(["--batches", "2", "--output", "json"])
        .assert()
        .success()
        .stdout(contains("\"moved\": 5"))
        .stdout(contains("\"batches\": 2"));
    assert_eq!(file_names(temp.path()), vec!["batch_0", "batch_1"]);
    assert_eq!(
        file_names(&temp.path().join("batch_1")),
        vec!["002.jpg", "003.jpg", "004.jpg"]
    );

    framecurate().arg("join").arg(temp.path()).assert().success();
    assert_eq!(
        file_names(temp.path()),
        vec!["000.jpg", "001.jpg", "002.jpg", "003.jpg", "004.jpg"]
    );
}

#[test]
fn downsample_zero_fraction_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");

    framecurate()
        .arg("downsample")
        .arg(temp.path())
        .args(["--fraction", "0"])
        .assert()
        .failure()
        .stderr(contains("Invalid frame operation parameters"));
}
