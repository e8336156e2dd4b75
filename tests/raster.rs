use archigen::Rasterizer;
use archigen::raster::{EXPORT_SIZE, SNAPSHOT_SIZE};
use std::time::Duration;

const WIDE: &str =
    r#"<svg viewBox="0 0 400 300"><rect width="400" height="300" fill="black" stroke-width="4"/></svg>"#;

fn is_black(r: &archigen::raster::Raster, x: u32, y: u32) -> bool {
    let px = r.pixmap.pixel(x, y).unwrap();
    px.red() < 16 && px.green() < 16 && px.blue() < 16
}

fn is_white(r: &archigen::raster::Raster, x: u32, y: u32) -> bool {
    let px = r.pixmap.pixel(x, y).unwrap();
    px.red() > 240 && px.green() > 240 && px.blue() > 240
}

#[test]
fn view_box_only_drawing_fills_central_band() {
    let raster = Rasterizer::snapshot().render(WIDE).unwrap();
    assert_eq!(raster.pixmap.width(), SNAPSHOT_SIZE);
    assert_eq!(raster.pixmap.height(), SNAPSHOT_SIZE);

    // 400x300 scaled by 2.56 is 1024x768, centered vertically at y=128.
    assert!((raster.placement.y - 128.0).abs() < 0.5);
    assert!((raster.placement.height - 768.0).abs() < 0.5);

    assert!(is_white(&raster, 512, 60));
    assert!(is_white(&raster, 512, 960));
    assert!(is_black(&raster, 512, 512));
    assert!(is_black(&raster, 2, 140));
    assert!(is_black(&raster, 1021, 880));
}

#[test]
fn tall_drawing_is_centered_horizontally() {
    let tall = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 300 600" width="300" height="600"><rect width="300" height="600" fill="black"/></svg>"#;
    let raster = Rasterizer::snapshot().render(tall).unwrap();
    assert!((raster.placement.x - 256.0).abs() < 0.5);
    assert!(is_white(&raster, 200, 512));
    assert!(is_black(&raster, 512, 512));
    assert!(is_white(&raster, 820, 512));
}

#[test]
fn export_canvas_and_png_output() {
    let rasterizer = Rasterizer::export();
    assert_eq!(rasterizer.canvas_size(), (EXPORT_SIZE, EXPORT_SIZE));
    let png = rasterizer.rasterize(WIDE).unwrap();
    assert_eq!(png.mime_type, "image/png");
    assert_eq!(&png.data[1..4], b"PNG");
}

#[tokio::test]
async fn async_rasterization_matches_sync() {
    let rasterizer = Rasterizer::snapshot().timeout(Duration::from_secs(10));
    let a = rasterizer.rasterize_async(WIDE.to_string()).await.unwrap();
    let b = rasterizer.rasterize(WIDE).unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn garbage_is_reported_not_hung() {
    let err = Rasterizer::snapshot()
        .rasterize_async("definitely not svg".into())
        .await
        .unwrap_err();
    assert!(matches!(err, archigen::GenerationError::Rasterization(_)));
}

const UNSIZED: &str =
    r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="50" height="50"/></svg>"#;

#[test]
fn unsized_drawing_takes_fallback_size() {
    let raster = Rasterizer::snapshot().render(UNSIZED).unwrap();
    assert!((raster.placement.scale - 1.0).abs() < 1e-4);
    assert!((raster.placement.width - 1024.0).abs() < 0.5);
    assert!(raster.placement.x.abs() < 0.5 && raster.placement.y.abs() < 0.5);
    // the rect covers the top-left quarter of the stretched drawing
    assert!(is_black(&raster, 256, 256));
    assert!(is_white(&raster, 768, 768));

    let export = Rasterizer::export().render(UNSIZED).unwrap();
    assert!((export.placement.scale - 2.048).abs() < 1e-3);

    let custom = Rasterizer::new(1024, 1024)
        .fallback_size(512.0, 512.0)
        .render(UNSIZED)
        .unwrap();
    assert!((custom.placement.scale - 2.0).abs() < 1e-4);
}
