#![allow(dead_code)]

use framecurate::{LabelId, PixelBox};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Image sizes from a single pixel up to 4K frames.
pub fn arb_image_dims() -> BoxedStrategy<(u32, u32)> {
    (1u32..=4096, 1u32..=4096).boxed()
}

/// Power-of-two sizes whose pixel fractions print exactly with six decimals.
pub fn arb_exact_dims() -> BoxedStrategy<(u32, u32)> {
    let sides = vec![16u32, 32, 64];
    (
        prop::sample::select(sides.clone()),
        prop::sample::select(sides),
    )
        .boxed()
}

/// An ordered box with every index inside a `width` x `height` image.
pub fn arb_box_within(width: u32, height: u32) -> BoxedStrategy<PixelBox> {
    let xs = (0..i64::from(width), 0..i64::from(width));
    let ys = (0..i64::from(height), 0..i64::from(height));
    (xs, ys)
        .prop_map(|((xa, xb), (ya, yb))| {
            PixelBox::new(xa.min(xb), ya.min(yb), xa.max(xb), ya.max(yb))
        })
        .boxed()
}

/// Like [`arb_box_within`], but with even `min + max` on both axes so the
/// center lands on a whole pixel.
pub fn arb_whole_center_box_within(width: u32, height: u32) -> BoxedStrategy<PixelBox> {
    arb_box_within(width, height)
        .prop_map(move |bbox| {
            let x_max = if (bbox.x_min + bbox.x_max) % 2 == 0 {
                bbox.x_max
            } else {
                bbox.x_max - 1
            };
            let y_max = if (bbox.y_min + bbox.y_max) % 2 == 0 {
                bbox.y_max
            } else {
                bbox.y_max - 1
            };
            PixelBox::new(bbox.x_min, bbox.y_min, x_max, y_max)
        })
        .boxed()
}

/// An image size plus up to `max_boxes` labelled boxes inside it.
pub fn arb_labelled_boxes(
    max_boxes: usize,
) -> BoxedStrategy<((u32, u32), Vec<PixelBox>, Vec<LabelId>)> {
    arb_image_dims()
        .prop_flat_map(move |(width, height)| {
            prop::collection::vec(
                (arb_box_within(width, height), 0u32..80),
                0..=max_boxes,
            )
            .prop_map(move |pairs| {
                let (boxes, labels): (Vec<_>, Vec<_>) = pairs
                    .into_iter()
                    .map(|(bbox, label)| (bbox, LabelId::new(label)))
                    .unzip();
                ((width, height), boxes, labels)
            })
        })
        .boxed()
}

/// Checks that a decoded box lies within one pixel below the original on
/// every edge.
pub fn assert_within_one_below(original: &PixelBox, decoded: &PixelBox) -> Result<(), String> {
    let pairs = [
        ("x_min", original.x_min, decoded.x_min),
        ("y_min", original.y_min, decoded.y_min),
        ("x_max", original.x_max, decoded.x_max),
        ("y_max", original.y_max, decoded.y_max),
    ];

    for (name, want, got) in pairs {
        if got > want || got < want - 1 {
            return Err(format!(
                "{name} drifted: original {original:?}, decoded {decoded:?}"
            ));
        }
    }

    Ok(())
}
