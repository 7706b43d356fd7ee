//! Draws generated images with half-block cells and writes them to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use careerdesk_core::GeneratedImage;
use image::imageops::FilterType;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// Rendered preview plus what it was rendered for, so it is only rebuilt
/// when the image or the panel size changes.
pub struct ImagePreview {
    pub request: u64,
    pub width: u16,
    pub height: u16,
    pub lines: Vec<Line<'static>>,
}

impl ImagePreview {
    pub fn matches(&self, request: u64, width: u16, height: u16) -> bool {
        self.request == request && self.width == width && self.height == height
    }
}

/// Scale the image to fit `width` x `height` cells, two pixel rows per cell.
pub fn render_half_blocks(bytes: &[u8], width: u16, height: u16) -> Result<Vec<Line<'static>>> {
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let decoded = image::load_from_memory(bytes)?;
    let scaled = decoded
        .resize(width as u32, height as u32 * 2, FilterType::Triangle)
        .to_rgb8();
    let (w, h) = scaled.dimensions();

    let mut lines = Vec::with_capacity((h as usize + 1) / 2);
    for y in (0..h).step_by(2) {
        let spans: Vec<Span<'static>> = (0..w)
            .map(|x| {
                let top = scaled.get_pixel(x, y).0;
                let bottom = if y + 1 < h {
                    scaled.get_pixel(x, y + 1).0
                } else {
                    top
                };
                Span::styled(
                    "▀",
                    Style::default()
                        .fg(Color::Rgb(top[0], top[1], top[2]))
                        .bg(Color::Rgb(bottom[0], bottom[1], bottom[2])),
                )
            })
            .collect();
        lines.push(Line::from(spans));
    }
    Ok(lines)
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Write the image under `dir` and return the file path.
pub fn save_image(dir: &Path, image: &GeneratedImage, request: u64) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let path = dir.join(format!(
        "careerdesk-{}-{}.{}",
        stamp,
        request,
        extension_for(&image.mime_type)
    ));
    fs::write(&path, &image.bytes)?;
    Ok(path)
}
