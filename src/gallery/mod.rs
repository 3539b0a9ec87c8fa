pub mod pdf;
pub mod scraper;

pub use pdf::{assemble, AssembleError};
pub use scraper::{download_image, scrape_images, ImageReference, ScrapeError};
