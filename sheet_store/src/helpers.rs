const IMAGE_EXTENSIONS: [&str; 7] = ["jpeg", "jpg", "gif", "png", "webp", "bmp", "svg"];

/// Rewrites a stored image URL into something an `<img>` tag can load directly.
///
/// Direct links to image files pass through untouched. Google Drive share links (the
/// `/file/d/<ID>/view` and `open?id=<ID>` forms, including docs.google.com) become thumbnail
/// endpoint URLs, which serve public files far more reliably than `uc?export=view`. Anything
/// else passes through trimmed.
pub fn direct_image_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if has_image_extension(trimmed) {
        return trimmed.to_string();
    }
    if trimmed.contains("drive.google.com") || trimmed.contains("docs.google.com") {
        if let Some(id) = extract_drive_id(trimmed) {
            return format!("https://drive.google.com/thumbnail?id={id}&sz=s3000");
        }
    }
    trimmed.to_string()
}

fn has_image_extension(url: &str) -> bool {
    let lower = url.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(&format!(".{ext}")))
}

fn extract_drive_id(url: &str) -> Option<String> {
    let start = url.find("/d/").map(|i| i + 3).or_else(|| url.find("id=").map(|i| i + 3))?;
    let id: String =
        url[start..].chars().take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_').collect();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
