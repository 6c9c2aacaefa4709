use url::Url;

use crate::models::ImageRef;

const IMAGE_CDN_BASE: &str = "https://cdn.sanity.io/images";

/// Turns asset references into CDN URLs for the configured project and dataset.
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

/// Pieces of an `image-{id}-{w}x{h}-{ext}` asset reference.
#[derive(Debug, PartialEq, Eq)]
struct ParsedAsset<'a> {
    id: &'a str,
    dimensions: &'a str,
    format: &'a str,
}

fn parse_asset_ref(reference: &str) -> Option<ParsedAsset<'_>> {
    let rest = reference.strip_prefix("image-")?;
    let (rest, format) = rest.rsplit_once('-')?;
    let (id, dimensions) = rest.rsplit_once('-')?;

    let (w, h) = dimensions.split_once('x')?;
    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if id.is_empty() || format.is_empty() || !numeric(w) || !numeric(h) {
        return None;
    }

    Some(ParsedAsset {
        id,
        dimensions,
        format,
    })
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    /// Starts a URL for `image`; `None` when the image has no usable asset reference.
    pub fn image(&self, image: &ImageRef) -> Option<ImageUrl> {
        self.asset(image.asset_ref()?)
    }

    pub fn asset(&self, reference: &str) -> Option<ImageUrl> {
        let parsed = parse_asset_ref(reference)?;
        let base = format!(
            "{}/{}/{}/{}-{}.{}",
            IMAGE_CDN_BASE, self.project_id, self.dataset, parsed.id, parsed.dimensions, parsed.format
        );
        Some(ImageUrl {
            base,
            width: None,
            height: None,
        })
    }
}

/// A CDN image URL with optional resize parameters.
#[derive(Debug, Clone)]
pub struct ImageUrl {
    base: String,
    width: Option<u32>,
    height: Option<u32>,
}

impl ImageUrl {
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn url(&self) -> String {
        let mut url = match Url::parse(&self.base) {
            Ok(url) => url,
            Err(_) => return self.base.clone(),
        };
        {
            let mut query = url.query_pairs_mut();
            if let Some(w) = self.width {
                query.append_pair("w", &w.to_string());
            }
            if let Some(h) = self.height {
                query.append_pair("h", &h.to_string());
            }
            // Cropping only makes sense when both edges are fixed.
            if self.width.is_some() && self.height.is_some() {
                query.append_pair("fit", "crop");
            }
            query.append_pair("auto", "format");
        }
        url.to_string()
    }
}
