//! Content fixtures recognised by the MIME sniffer

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub fn png(width: u32, height: u32) -> Bytes {
    let img = RgbaImage::from_pixel(width, height, Rgba([12, 34, 56, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png fixture");
    Bytes::from(buffer)
}

pub fn pdf(pages: u32) -> Bytes {
    Bytes::from(format!(
        "%PDF-1.4\n1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
         2 0 obj << /Type /Pages /Count {} >> endobj\n%%EOF\n",
        pages
    ))
}

pub fn mp3() -> Bytes {
    Bytes::from_static(b"ID3\x03\x00\x00\x00\x00\x00\x21\xff\xfb\x90\x64\x00\x00")
}

pub fn mp4() -> Bytes {
    Bytes::from_static(b"\x00\x00\x00\x18ftypisom\x00\x00\x02\x00isomiso2mp41")
}

pub fn text(body: &str) -> Bytes {
    Bytes::from(body.to_string())
}
