use crate::pipeline::{OutputFormat, Pipeline, PipelineError, output_key};
use crate::store::memory::{MemorySink, MemorySource};
use crate::store::{ArtifactIo, DynOutputSink};
use crate::{PipelineConfig, TargetConfig};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::sync::Arc;

fn rgb_png(width: u32, height: u32, pixel: Rgb<u8>) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, pixel);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
    bytes
}

fn rgba_png(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, pixel);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
    bytes
}

fn png_config() -> PipelineConfig {
    PipelineConfig {
        output_format: OutputFormat::Png,
        ..PipelineConfig::default()
    }
}

fn memory_io(pipeline: &Pipeline) -> (ArtifactIo, Vec<Arc<MemorySink>>) {
    let input = Arc::new(MemorySource::new());
    let watermark = Arc::new(MemorySource::new());
    let sinks: Vec<Arc<MemorySink>> = pipeline
        .target_widths()
        .iter()
        .map(|_| Arc::new(MemorySink::new()))
        .collect();
    let io = ArtifactIo {
        input: input.clone(),
        watermark: watermark.clone(),
        watermark_key: "watermark.png".to_string(),
        sinks: sinks
            .iter()
            .map(|s| Arc::clone(s) as DynOutputSink)
            .collect(),
    };
    (io, sinks)
}

#[test]
fn targets_must_be_strictly_descending() {
    let mut config = PipelineConfig::default();
    config.targets = vec![
        TargetConfig::new(1024, "a"),
        TargetConfig::new(1920, "b"),
    ];
    assert!(matches!(
        Pipeline::new(&config),
        Err(PipelineError::Config(_))
    ));

    config.targets = vec![TargetConfig::new(400, "a"), TargetConfig::new(400, "b")];
    assert!(matches!(
        Pipeline::new(&config),
        Err(PipelineError::Config(_))
    ));

    config.targets = Vec::new();
    assert!(matches!(
        Pipeline::new(&config),
        Err(PipelineError::Config(_))
    ));
}

#[tokio::test]
async fn run_produces_three_exact_renditions_with_watermark() {
    let pipeline = Pipeline::new(&png_config()).unwrap();
    let input = rgb_png(3840, 2160, Rgb([100, 100, 100]));
    let watermark = rgba_png(200, 100, Rgba([200, 0, 50, 255]));

    let renditions = pipeline.run(input, &watermark).await.unwrap();

    let widths: Vec<u32> = renditions.iter().map(|r| r.width).collect();
    assert_eq!(widths, vec![1920, 1024, 400]);

    let expected_dims = [(1920, 1080), (1024, 576), (400, 225)];
    for (rendition, expected) in renditions.iter().zip(expected_dims) {
        assert_eq!(rendition.format, OutputFormat::Png);
        let decoded = image::load_from_memory(&rendition.bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), expected);

        // Watermark blended at alpha 0.5 in the top-left 200x100 region,
        // unclipped at every size in this example.
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([150, 50, 75]));
        assert_eq!(decoded.get_pixel(199, 99), &Rgb([150, 50, 75]));
        // Outside the watermark footprint the rendition is untouched.
        assert_eq!(decoded.get_pixel(250, 150), &Rgb([100, 100, 100]));
    }
}

#[tokio::test]
async fn run_encodes_jpeg_by_default() {
    let pipeline = Pipeline::new(&PipelineConfig::default()).unwrap();
    let input = rgb_png(2000, 1500, Rgb([120, 90, 60]));
    let watermark = rgba_png(50, 50, Rgba([255, 255, 255, 255]));

    let renditions = pipeline.run(input, &watermark).await.unwrap();
    for rendition in &renditions {
        assert_eq!(rendition.format, OutputFormat::Jpeg);
        assert_eq!(&rendition.bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&rendition.bytes).unwrap();
        assert_eq!(decoded.width(), rendition.width);
    }
}

#[tokio::test]
async fn empty_watermark_aborts_the_run_before_any_resize() {
    let pipeline = Pipeline::new(&png_config()).unwrap();
    let input = rgb_png(3840, 2160, Rgb([100, 100, 100]));

    let err = pipeline.run(input, &[]).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Decode {
            artifact: "watermark",
            ..
        }
    ));
}

#[tokio::test]
async fn watermark_is_cached_across_runs_of_one_pipeline() {
    let pipeline = Pipeline::new(&png_config()).unwrap();
    let watermark = rgba_png(10, 10, Rgba([0, 0, 0, 255]));

    pipeline
        .run(rgb_png(2000, 1200, Rgb([10, 20, 30])), &watermark)
        .await
        .unwrap();

    // Second run passes garbage watermark bytes; the cached raster is used.
    let renditions = pipeline
        .run(rgb_png(2000, 1200, Rgb([10, 20, 30])), b"garbage")
        .await
        .unwrap();
    assert_eq!(renditions.len(), 3);
}

#[tokio::test]
async fn process_delivers_every_rendition_to_its_sink() {
    let pipeline = Pipeline::new(&png_config()).unwrap();
    let (io, sinks) = memory_io(&pipeline);

    let input_source = Arc::new(MemorySource::new());
    input_source.insert("photo.jpg", rgb_png(1920, 1080, Rgb([100, 100, 100])));
    let watermark_source = Arc::new(MemorySource::new());
    watermark_source.insert("watermark.png", rgba_png(64, 32, Rgba([255, 0, 0, 255])));

    let io = ArtifactIo {
        input: input_source,
        watermark: watermark_source,
        ..io
    };

    pipeline.process("photo.jpg", &io).await.unwrap();

    let expected_dims = [(1920, 1080), (1024, 576), (400, 225)];
    for (sink, expected) in sinks.iter().zip(expected_dims) {
        let bytes = sink.get("photo.png").expect("rendition delivered");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), expected);
    }
}

#[tokio::test]
async fn mid_run_failure_delivers_nothing() {
    let pipeline = Pipeline::new(&png_config()).unwrap();
    let (mut io, sinks) = memory_io(&pipeline);

    // 3840x2 survives the 1920 step but fails at 1024 with a zero-height
    // rendition, after the widest target already resized cleanly.
    let input_source = Arc::new(MemorySource::new());
    input_source.insert("thin.png", rgb_png(3840, 2, Rgb([100, 100, 100])));
    let watermark_source = Arc::new(MemorySource::new());
    watermark_source.insert("watermark.png", rgba_png(8, 1, Rgba([0, 0, 0, 255])));
    io.input = input_source;
    io.watermark = watermark_source;

    let err = pipeline.process("thin.png", &io).await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidDimension { .. }));

    for sink in &sinks {
        assert!(sink.is_empty(), "no sink may receive a partial output set");
    }
}

#[tokio::test]
async fn encode_failure_on_one_target_delivers_nothing() {
    // The widest target lands beyond the WebP dimension limit, so exactly
    // one of the three encodes fails while the others succeed.
    let config = PipelineConfig {
        targets: vec![
            TargetConfig::new(16390, "a"),
            TargetConfig::new(8000, "b"),
            TargetConfig::new(4000, "c"),
        ],
        output_format: OutputFormat::WebP,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(&config).unwrap();
    let (mut io, sinks) = memory_io(&pipeline);

    let input_source = Arc::new(MemorySource::new());
    input_source.insert("wide.png", rgb_png(100, 2, Rgb([100, 100, 100])));
    let watermark_source = Arc::new(MemorySource::new());
    watermark_source.insert("watermark.png", rgba_png(8, 1, Rgba([0, 0, 0, 255])));
    io.input = input_source;
    io.watermark = watermark_source;

    let err = pipeline.process("wide.png", &io).await.unwrap_err();
    assert!(matches!(err, PipelineError::Encode { width: 16390, .. }));

    for sink in &sinks {
        assert!(sink.is_empty(), "no sink may receive a partial output set");
    }
}

#[tokio::test]
async fn sink_rejection_surfaces_as_delivery_failure() {
    let pipeline = Pipeline::new(&png_config()).unwrap();
    let (mut io, sinks) = memory_io(&pipeline);

    let input_source = Arc::new(MemorySource::new());
    input_source.insert("photo.png", rgb_png(1920, 1080, Rgb([50, 50, 50])));
    let watermark_source = Arc::new(MemorySource::new());
    watermark_source.insert("watermark.png", rgba_png(8, 8, Rgba([0, 0, 0, 255])));
    io.input = input_source;
    io.watermark = watermark_source;

    sinks[1].reject_writes(true);

    let err = pipeline.process("photo.png", &io).await.unwrap_err();
    assert!(matches!(err, PipelineError::Delivery { width: 1024, .. }));
}

#[tokio::test]
async fn missing_input_surfaces_as_fetch_failure() {
    let pipeline = Pipeline::new(&png_config()).unwrap();
    let (io, _sinks) = memory_io(&pipeline);

    let err = pipeline.process("nope.png", &io).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Fetch {
            artifact: "input image",
            ..
        }
    ));
}

#[tokio::test]
async fn sink_count_must_match_target_count() {
    let pipeline = Pipeline::new(&png_config()).unwrap();
    let (mut io, _sinks) = memory_io(&pipeline);
    io.sinks.pop();

    let err = pipeline.process("photo.png", &io).await.unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[test]
fn output_key_swaps_the_extension() {
    assert_eq!(output_key("photo.jpeg", OutputFormat::Jpeg), "photo.jpg");
    assert_eq!(output_key("photo.png", OutputFormat::Jpeg), "photo.jpg");
    assert_eq!(output_key("photo.jpg", OutputFormat::Png), "photo.png");
    assert_eq!(output_key("noext", OutputFormat::WebP), "noext.webp");
}
