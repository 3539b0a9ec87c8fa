use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::image_crate::{self, DynamicImage};
use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use thiserror::Error;
use tracing::{info, warn};

const PAGE_DPI: f32 = 100.0;
const MM_PER_INCH: f32 = 25.4;

/// Extensions accepted as assembly input, matched against the file name
/// suffix case-insensitively.
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("failed to read image directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no valid images found in {0}")]
    NoImages(PathBuf),
    #[error("failed to write PDF {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render PDF: {0}")]
    Render(String),
}

fn px_to_mm(pixels: u32) -> Mm {
    Mm(pixels as f32 * MM_PER_INCH / PAGE_DPI)
}

/// Lists the directory's image files in page order: numeric stems sort
/// ascending; anything with a non-numeric stem falls to the end instead of
/// failing the run.
fn numbered_entries(dir: &Path) -> Result<Vec<PathBuf>, AssembleError> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| AssembleError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut entries: Vec<(u64, PathBuf)> = Vec::new();
    for entry in read_dir.flatten() {
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|value| value.to_str()) else {
            continue;
        };
        if !IMAGE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(extension))
        {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or_default();
        let order = stem.parse::<u64>().unwrap_or(u64::MAX);
        entries.push((order, path));
    }

    entries.sort_by_key(|(order, _)| *order);
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

/// Merges the numbered images in `dir` into a single PDF at `output`, one
/// page per image in ascending numeric order, every page normalized to RGB.
///
/// Unreadable files are skipped with a warning; if nothing decodes the
/// whole assembly fails with [`AssembleError::NoImages`]. `output` is
/// created or overwritten, the source images are left untouched.
pub fn assemble(dir: &Path, output: &Path) -> Result<PathBuf, AssembleError> {
    let mut pages: Vec<DynamicImage> = Vec::new();
    for path in numbered_entries(dir)? {
        match image_crate::open(&path) {
            Ok(decoded) => pages.push(DynamicImage::ImageRgb8(decoded.to_rgb8())),
            Err(err) => warn!("Skipping unreadable image {}: {err}", path.display()),
        }
    }

    if pages.is_empty() {
        return Err(AssembleError::NoImages(dir.to_path_buf()));
    }

    let (document, first_page, first_layer) = PdfDocument::new(
        "Gallery",
        px_to_mm(pages[0].width()),
        px_to_mm(pages[0].height()),
        "page 1",
    );

    for (index, page_image) in pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            document.add_page(
                px_to_mm(page_image.width()),
                px_to_mm(page_image.height()),
                format!("page {}", index + 1),
            )
        };
        Image::from_dynamic_image(page_image).add_to_layer(
            document.get_page(page).get_layer(layer),
            ImageTransform {
                dpi: Some(PAGE_DPI),
                ..Default::default()
            },
        );
    }

    let file = File::create(output).map_err(|source| AssembleError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    document
        .save(&mut BufWriter::new(file))
        .map_err(|err| AssembleError::Render(err.to_string()))?;

    info!(
        "Assembled {} page(s) into {}",
        pages.len(),
        output.display()
    );
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use printpdf::image_crate::RgbImage;
    use std::fs;
    use tempfile::tempdir;

    fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
        let image = RgbImage::from_pixel(width, height, image_crate::Rgb([200, 120, 40]));
        image.save(dir.join(name)).expect("write test image");
    }

    #[test]
    fn entries_sort_by_numeric_stem_not_lexicographically() {
        let dir = tempdir().expect("tempdir");
        for name in ["10.jpg", "2.png", "1.jpg", "3.jpeg"] {
            fs::write(dir.path().join(name), b"stub").expect("write stub");
        }
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("write stub");

        let names: Vec<String> = numbered_entries(dir.path())
            .expect("list entries")
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1.jpg", "2.png", "3.jpeg", "10.jpg"]);
    }

    #[test]
    fn non_numeric_stems_sort_to_the_end() {
        let dir = tempdir().expect("tempdir");
        for name in ["cover.png", "1.jpg", "2.jpg"] {
            fs::write(dir.path().join(name), b"stub").expect("write stub");
        }

        let names: Vec<String> = numbered_entries(dir.path())
            .expect("list entries")
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["1.jpg", "2.jpg", "cover.png"]);
    }

    #[test]
    fn empty_directory_is_a_content_error() {
        let dir = tempdir().expect("tempdir");
        match assemble(dir.path(), &dir.path().join("out.pdf")) {
            Err(AssembleError::NoImages(path)) => assert_eq!(path.as_path(), dir.path()),
            other => panic!("expected NoImages, got {other:?}"),
        }
    }

    #[test]
    fn assembles_numbered_images_into_a_pdf() {
        let dir = tempdir().expect("tempdir");
        write_image(dir.path(), "2.png", 8, 12);
        write_image(dir.path(), "1.jpg", 10, 10);
        write_image(dir.path(), "3.jpeg", 6, 6);

        let output = dir.path().join("out.pdf");
        let produced = assemble(dir.path(), &output).expect("assemble");
        assert_eq!(produced, output);

        let bytes = fs::read(&output).expect("read pdf");
        assert!(bytes.starts_with(b"%PDF"));
        // All three source files must survive assembly untouched.
        for name in ["1.jpg", "2.png", "3.jpeg"] {
            assert!(dir.path().join(name).exists());
        }
    }

    #[test]
    fn unreadable_files_are_skipped_rather_than_fatal() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("1.jpg"), b"not an image").expect("write garbage");
        write_image(dir.path(), "2.png", 4, 4);

        let output = dir.path().join("out.pdf");
        assemble(dir.path(), &output).expect("assemble should skip the bad file");
        assert!(output.exists());
    }

    #[test]
    fn only_garbage_input_still_fails_with_no_images() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("1.jpg"), b"not an image").expect("write garbage");

        assert!(matches!(
            assemble(dir.path(), &dir.path().join("out.pdf")),
            Err(AssembleError::NoImages(_))
        ));
    }
}
