//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a tempdir-backed config and full
//! [`AppContext`]. The [`with_server`] constructor starts Axum on a random
//! port for HTTP-level testing.

use std::io::Cursor;
use std::net::SocketAddr;

use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

use clearcut::config::Config;
use clearcut::server::{build_context, create_router, AppContext};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temporary data directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub data_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with a custom configuration. The storage data
    /// directory is always replaced with a fresh tempdir.
    pub fn with_config(mut config: Config) -> Self {
        let data_dir = tempfile::tempdir().expect("failed to create tempdir");
        config.storage.data_dir = data_dir.path().to_path_buf();

        let ctx = build_context(config).expect("failed to build context");

        Self { ctx, data_dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Build a small PNG with a distinct color per column so a horizontal flip
/// is detectable at the pixel level.
pub fn column_gradient_png(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let shade = ((x * 255) / width.max(1)) as u8;
            img.put_pixel(x, y, Rgba([shade, 0, 255 - shade, 255]));
        }
    }
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Assert that `actual` is `reference` mirrored horizontally, pixel for pixel.
pub fn assert_flipped(actual: &[u8], reference: &[u8]) {
    let actual = image::load_from_memory(actual).unwrap().to_rgba8();
    let reference = image::load_from_memory(reference).unwrap().to_rgba8();
    assert_eq!(actual.dimensions(), reference.dimensions());

    let width = reference.width();
    for y in 0..reference.height() {
        for x in 0..width {
            assert_eq!(
                actual.get_pixel(width - 1 - x, y),
                reference.get_pixel(x, y),
                "mismatch at column {x}, row {y}"
            );
        }
    }
}

/// Build a multipart form uploading `data` as the `image` field.
pub fn image_form(data: Vec<u8>, filename: &str, content_type: &str) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(data)
        .file_name(filename.to_string())
        .mime_str(content_type)
        .unwrap();
    reqwest::multipart::Form::new().part("image", part)
}
