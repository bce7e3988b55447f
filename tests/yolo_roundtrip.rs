//! Integration tests for mask bounding, label writing, and label reading.

use std::fs;

use framecurate::ir::io_yolo::{read_labels_lenient, read_labels_with, ReadOptions};
use framecurate::{
    bounding_box_of, read_labels, save_bboxes_to_yolo, FramecurateError, LabelId, Mask, PixelBox,
};

mod common;
use common::{write_blank_png, write_mask_png};

#[test]
fn masks_to_label_file_and_back() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_mask_png(&temp.path().join("car.png"), 64, 64, (10, 20, 50, 60));
    write_mask_png(&temp.path().join("person.png"), 64, 64, (2, 4, 6, 12));

    let mut boxes = Vec::new();
    for name in ["car.png", "person.png"] {
        let mask = Mask::from_image_path(&temp.path().join(name)).expect("read mask");
        boxes.push(bounding_box_of(&mask).expect("non-empty mask"));
    }
    assert_eq!(boxes[0], PixelBox::new(10, 20, 50, 60));
    assert_eq!(boxes[1], PixelBox::new(2, 4, 6, 12));

    let labels = vec![LabelId::new(2), LabelId::new(0)];
    let out = temp.path().join("frame_000.txt");
    save_bboxes_to_yolo(64, 64, &boxes, &labels, &out).expect("write labels");

    let content = fs::read_to_string(&out).expect("read label file");
    assert_eq!(
        content,
        "2 0.468750 0.625000 0.625000 0.625000\n0 0.062500 0.125000 0.062500 0.125000\n"
    );

    let decoded = read_labels(&out, 64, 64).expect("read labels");
    assert_eq!(
        decoded,
        vec![(LabelId::new(2), boxes[0]), (LabelId::new(0), boxes[1])]
    );
}

#[test]
fn empty_mask_is_rejected() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("blank.png");
    write_blank_png(&path, 8, 6);

    let mask = Mask::from_image_path(&path).expect("read mask");
    let err = bounding_box_of(&mask).unwrap_err();
    assert!(matches!(
        err,
        FramecurateError::EmptyMask {
            height: 6,
            width: 8
        }
    ));
}

#[test]
fn save_replaces_existing_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let out = temp.path().join("labels.txt");
    fs::write(&out, "9 0.1 0.1 0.1 0.1\n9 0.2 0.2 0.2 0.2\n").expect("seed file");

    save_bboxes_to_yolo(
        100,
        100,
        &[PixelBox::new(10, 10, 20, 30)],
        &[LabelId::new(3)],
        &out,
    )
    .expect("write labels");

    assert_eq!(
        fs::read_to_string(&out).expect("read label file"),
        "3 0.150000 0.200000 0.100000 0.200000\n"
    );
}

#[test]
fn length_mismatch_leaves_existing_file_untouched() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let out = temp.path().join("labels.txt");
    fs::write(&out, "1 0.5 0.5 0.5 0.5\n").expect("seed file");

    let err = save_bboxes_to_yolo(
        100,
        100,
        &[PixelBox::new(0, 0, 9, 9), PixelBox::new(1, 1, 2, 2)],
        &[LabelId::new(0)],
        &out,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        FramecurateError::LengthMismatch {
            boxes: 2,
            labels: 1
        }
    ));
    assert_eq!(
        fs::read_to_string(&out).expect("read label file"),
        "1 0.5 0.5 0.5 0.5\n"
    );
}

#[test]
fn empty_input_writes_empty_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let out = temp.path().join("empty.txt");

    save_bboxes_to_yolo(640, 480, &[], &[], &out).expect("write labels");

    assert_eq!(fs::read_to_string(&out).expect("read label file"), "");
    assert!(read_labels(&out, 640, 480).expect("read labels").is_empty());
}

#[test]
fn malformed_file_fails_strict_reader_but_not_lenient_one() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("labels.txt");
    fs::write(
        &path,
        "0 0.5 0.5 0.25 0.25\n\nperson 0.5 0.5 0.1 0.1\n1 0.25 0.25 0.125 0.125\n",
    )
    .expect("write labels");

    let err = read_labels(&path, 64, 64).unwrap_err();
    assert!(matches!(err, FramecurateError::MalformedLine { line: 3, .. }));

    let outcome = read_labels_lenient(&path, 64, 64).expect("lenient read");
    assert_eq!(
        outcome.labels,
        vec![
            (LabelId::new(0), PixelBox::new(24, 24, 40, 40)),
            (LabelId::new(1), PixelBox::new(12, 12, 20, 20)),
        ]
    );
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].line, 3);
    assert!(!outcome.is_complete());
}

#[test]
fn strict_read_rejects_records_outside_the_image() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let path = temp.path().join("labels.txt");
    fs::write(&path, "0 1.25 0.5 0.25 0.25\n").expect("write labels");

    let permissive = read_labels(&path, 64, 64).expect("permissive read");
    assert_eq!(permissive, vec![(LabelId::new(0), PixelBox::new(72, 24, 88, 40))]);

    let err = read_labels_with(&path, 64, 64, &ReadOptions { strict: true }).unwrap_err();
    assert!(matches!(
        err,
        FramecurateError::ValidationFailed { error_count: 1, .. }
    ));
}
