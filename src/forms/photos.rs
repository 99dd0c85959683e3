//! Photo attachments for a listing draft.
//!
//! The set accepts image files only, caps the per-file size and the total
//! count, and hands removed attachments back to the caller so their
//! preview resources are released right away.

use std::path::PathBuf;

use crate::constants::{MAX_LISTING_PHOTOS, MAX_PHOTO_BYTES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoAttachment {
    pub path: PathBuf,
    pub name: String,
    pub len: u64,
    pub mime: String,
}

impl PhotoAttachment {
    pub fn from_path(path: PathBuf) -> std::io::Result<PhotoAttachment> {
        let meta = std::fs::metadata(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        Ok(PhotoAttachment { mime: mime_for(&path), name, len: meta.len(), path })
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// The pickers hand us paths, not MIME types; the extension decides.
pub fn mime_for(path: &std::path::Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoRejection {
    NotAnImage(String),
    TooLarge(String),
    TooMany { capacity: usize },
}

impl std::fmt::Display for PhotoRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoRejection::NotAnImage(name) => {
                write!(f, "{} n'est pas une image", name)
            }
            PhotoRejection::TooLarge(name) => {
                write!(f, "{} dépasse 5 Mo", name)
            }
            PhotoRejection::TooMany { capacity } => {
                write!(f, "{} photos maximum", capacity)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct AddOutcome {
    pub added: usize,
    pub rejected: Vec<PhotoRejection>,
}

#[derive(Debug, Default)]
pub struct PhotoSet {
    photos: Vec<PhotoAttachment>,
}

impl PhotoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhotoAttachment> {
        self.photos.iter()
    }

    pub fn as_slice(&self) -> &[PhotoAttachment] {
        &self.photos
    }

    /// Filter the candidates (image MIME, size cap), then append them.
    /// If the accepted files would push the set past the photo cap, the
    /// whole batch is refused and the set is left untouched.
    pub fn add(&mut self, candidates: Vec<PhotoAttachment>) -> AddOutcome {
        let mut outcome = AddOutcome::default();
        let mut accepted = Vec::new();
        for photo in candidates {
            if !photo.is_image() {
                outcome.rejected.push(PhotoRejection::NotAnImage(photo.name));
            } else if photo.len > MAX_PHOTO_BYTES {
                outcome.rejected.push(PhotoRejection::TooLarge(photo.name));
            } else {
                accepted.push(photo);
            }
        }
        if self.photos.len() + accepted.len() > MAX_LISTING_PHOTOS {
            outcome.rejected.push(PhotoRejection::TooMany { capacity: MAX_LISTING_PHOTOS });
            return outcome;
        }
        outcome.added = accepted.len();
        self.photos.extend(accepted);
        outcome
    }

    /// Removes one attachment. The caller owns the returned value and is
    /// expected to drop the matching preview with it.
    pub fn remove(&mut self, index: usize) -> Option<PhotoAttachment> {
        if index < self.photos.len() {
            Some(self.photos.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) -> Vec<PhotoAttachment> {
        std::mem::take(&mut self.photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(name: &str, len: u64) -> PhotoAttachment {
        PhotoAttachment {
            path: PathBuf::from(format!("/tmp/{name}")),
            name: name.to_string(),
            len,
            mime: "image/jpeg".to_string(),
        }
    }

    #[test]
    fn test_accepts_images_under_cap() {
        let mut set = PhotoSet::new();
        let outcome = set.add(vec![jpeg("a.jpg", 1024), jpeg("b.jpg", 2048)]);
        assert_eq!(outcome.added, 2);
        assert!(outcome.rejected.is_empty());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_filters_non_images_and_oversized() {
        let mut set = PhotoSet::new();
        let pdf = PhotoAttachment {
            path: PathBuf::from("/tmp/facture.pdf"),
            name: "facture.pdf".to_string(),
            len: 1024,
            mime: "application/pdf".to_string(),
        };
        let big = jpeg("grand.jpg", MAX_PHOTO_BYTES + 1);
        let outcome = set.add(vec![pdf, big, jpeg("ok.jpg", 500)]);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_over_cap_batch_leaves_set_unchanged() {
        let mut set = PhotoSet::new();
        for i in 0..MAX_LISTING_PHOTOS {
            set.add(vec![jpeg(&format!("p{i}.jpg"), 100)]);
        }
        assert_eq!(set.len(), MAX_LISTING_PHOTOS);
        let before: Vec<String> = set.iter().map(|p| p.name.clone()).collect();

        let outcome = set.add(vec![jpeg("extra.jpg", 100)]);
        assert_eq!(outcome.added, 0);
        assert!(matches!(outcome.rejected[0], PhotoRejection::TooMany { .. }));
        assert_eq!(set.len(), MAX_LISTING_PHOTOS);
        let after: Vec<String> = set.iter().map(|p| p.name.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for(std::path::Path::new("/tmp/a.JPG")), "image/jpeg");
        assert_eq!(mime_for(std::path::Path::new("/tmp/a.png")), "image/png");
        assert_eq!(mime_for(std::path::Path::new("/tmp/a.pdf")), "application/octet-stream");
    }

    #[test]
    fn test_remove_hands_attachment_back() {
        let mut set = PhotoSet::new();
        set.add(vec![jpeg("a.jpg", 100), jpeg("b.jpg", 100)]);
        let removed = set.remove(0).unwrap();
        assert_eq!(removed.name, "a.jpg");
        assert_eq!(set.len(), 1);
        assert!(set.remove(5).is_none());
    }
}
