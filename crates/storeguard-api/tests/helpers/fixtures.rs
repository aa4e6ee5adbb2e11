//! Test fixtures: upload forms and file bodies.

use axum_test::multipart::{MultipartForm, Part};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Plain text comfortably above the scanner's minimum plausible size.
pub fn text_body() -> Vec<u8> {
    "Quarterly inventory notes.\n"
        .repeat(10)
        .into_bytes()
}

/// Text file carrying a PHP opener, well above the minimum size.
pub fn php_body() -> Vec<u8> {
    let mut body = b"<?php system($_GET['cmd']); ?>\n".to_vec();
    body.extend_from_slice("padding line\n".repeat(10).as_bytes());
    body
}

pub fn png_body(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode png");
    buffer.into_inner()
}

pub fn file_form(data: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data).file_name(file_name).mime_type(mime_type),
    )
}

pub fn text_form() -> MultipartForm {
    file_form(text_body(), "notes.txt", "text/plain")
}
