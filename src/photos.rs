//! Photo records built from exported Markdown pages.
//!
//! Building is split in two: [`build_draft`] resolves fields and the image
//! URL without touching the network, then [`materialize_photos`] mirrors
//! expiring links through the [`AssetMaterializer`] one photo at a time.

use crate::assets::AssetMaterializer;
use crate::fields;
use crate::models::{assign_ids, Photo, SourceDocument};
use crate::text;

const UNTITLED: &str = "未命名";

/// Host and query markers of time-limited signed storage links.
const EXPIRING_MARKERS: &[&str] = &["prod-files-secure.s3.us-west-2.amazonaws.com", "X-Amz-Expires"];

/// True when `url` is a signed link that stops working after a while.
pub fn is_expiring_url(url: &str) -> bool {
    EXPIRING_MARKERS.iter().any(|m| url.contains(m))
}

/// A photo with its image source resolved but not yet made durable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoDraft {
    pub file_name: String,
    pub caption: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub url: String,
    /// Stable file base name used when `url` must be downloaded.
    pub base_name: String,
}

impl PhotoDraft {
    pub fn needs_download(&self) -> bool {
        is_expiring_url(&self.url)
    }

    fn into_photo(self, url: String) -> Photo {
        Photo {
            id: String::new(),
            url,
            caption: self.caption,
            location: self.location,
            date: self.date,
        }
    }
}

/// Resolve one photo document. `index` is the 0-based file position.
///
/// Returns `None` (with a warning) when the document names no image.
pub fn build_draft(doc: &SourceDocument, index: usize, public_prefix: &str) -> Option<PhotoDraft> {
    let fm = &doc.front_matter;

    let caption = fields::resolve(fm, &["介绍", "description", "描述"])
        .or_else(|| fields::resolve(fm, &["title", "标题"]))
        .map(str::to_string)
        .or_else(|| Some(doc.stem.clone()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| UNTITLED.to_string());

    let date = fields::resolve(fm, &["日期", "date", "updated"]).and_then(text::normalize_date);
    let location = fields::resolve(fm, &["拍摄地点", "地点", "location"]).map(str::to_string);

    let Some(url) = resolve_image_url(doc) else {
        tracing::warn!(
            file = %doc.file_name,
            "skipping photo: no image (upload one to the image column or embed it in the page)"
        );
        return None;
    };

    let url = canonicalize_path(&url, public_prefix);

    Some(PhotoDraft {
        file_name: doc.file_name.clone(),
        caption,
        date,
        location,
        url,
        base_name: stable_base_name(doc, index),
    })
}

fn resolve_image_url(doc: &SourceDocument) -> Option<String> {
    let fm = &doc.front_matter;
    let groups: [&[&str]; 3] = [&["文件和媒体", "files"], &["图片", "image"], &["cover"]];
    let from_fields = groups
        .into_iter()
        .filter_map(|candidates| fields::resolve(fm, candidates))
        .map(fields::first_list_item)
        .find(|v| !v.is_empty());

    if let Some(url) = from_fields {
        return Some(url.to_string());
    }
    if let Some(url) = text::first_markdown_image(&doc.body) {
        return Some(url.to_string());
    }
    fm.iter()
        .map(|(_, v)| fields::first_list_item(v))
        .find(|v| v.starts_with("http") || v.starts_with("/images/"))
        .map(str::to_string)
}

/// Root-relative paths outside `/images/` and outside `public_prefix` are
/// moved under `public_prefix`.
pub fn canonicalize_path(url: &str, public_prefix: &str) -> String {
    let prefix = public_prefix.trim_end_matches('/');
    let under_prefix = url
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/'));
    if url.starts_with('/') && !url.starts_with("/images/") && !under_prefix {
        format!("{}{}", prefix, url)
    } else {
        url.to_string()
    }
}

/// `photo-<docId>`, where docId comes from `urlname`, `id`, or the file
/// name, reduced to `[A-Za-z0-9-]`.
fn stable_base_name(doc: &SourceDocument, index: usize) -> String {
    let raw = fields::resolve(&doc.front_matter, &["urlname", "id"]).unwrap_or(&doc.file_name);
    let doc_id: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if doc_id.is_empty() {
        format!("photo-{}", index + 1)
    } else {
        format!("photo-{}", doc_id)
    }
}

/// Turn drafts into photos, downloading expiring images sequentially.
///
/// A failed download drops that photo with a warning.
pub async fn materialize_photos(drafts: Vec<PhotoDraft>, assets: &AssetMaterializer) -> Vec<Photo> {
    let mut photos = Vec::with_capacity(drafts.len());
    for draft in drafts {
        if !draft.needs_download() {
            let url = draft.url.clone();
            photos.push(draft.into_photo(url));
            continue;
        }

        match assets.materialize(&draft.url, &draft.base_name).await {
            Ok(local) => {
                tracing::info!(caption = %draft.caption, url = %local, "image stored");
                photos.push(draft.into_photo(local));
            }
            Err(e) => {
                tracing::warn!(file = %draft.file_name, "skipping photo, image download failed: {}", e);
            }
        }
    }
    photos
}

/// Sort newest first with undated photos last, then number `"1".."N"`.
pub fn finalize_photos(photos: &mut [Photo]) {
    photos.sort_by(|a, b| match (&a.date, &b.date) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    assign_ids(photos, |p, id| p.id = id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse_front_matter;
    use std::path::PathBuf;

    fn doc(file: &str, raw: &str) -> SourceDocument {
        let parsed = parse_front_matter(raw);
        SourceDocument {
            path: PathBuf::from(file),
            file_name: file.to_string(),
            stem: file.trim_end_matches(".md").to_string(),
            front_matter: parsed.front_matter,
            body: parsed.body,
        }
    }

    #[test]
    fn expiring_url_detection() {
        assert!(is_expiring_url(
            "https://prod-files-secure.s3.us-west-2.amazonaws.com/a/b.png"
        ));
        assert!(is_expiring_url("https://cdn.example.com/x.jpg?X-Amz-Expires=3600"));
        assert!(!is_expiring_url("https://cdn.example.com/x.jpg"));
    }

    #[test]
    fn caption_priority() {
        let d = build_draft(
            &doc("a.md", "---\ntitle: T\ndescription: D\nimage: /images/x.png\n---\n"),
            0,
            "/images/elog",
        )
        .unwrap();
        assert_eq!(d.caption, "D");

        let d = build_draft(
            &doc("a.md", "---\ntitle: T\nimage: /images/x.png\n---\n"),
            0,
            "/images/elog",
        )
        .unwrap();
        assert_eq!(d.caption, "T");

        let d = build_draft(&doc("stem.md", "---\nimage: /images/x.png\n---\n"), 0, "/images/elog")
            .unwrap();
        assert_eq!(d.caption, "stem");
    }

    #[test]
    fn url_priority_and_list_values() {
        let d = build_draft(
            &doc(
                "a.md",
                "---\ncover: https://c/cover.png\n文件和媒体: [https://c/media.png, https://c/2.png]\n---\n![x](https://c/body.png)",
            ),
            0,
            "/images/elog",
        )
        .unwrap();
        assert_eq!(d.url, "https://c/media.png");
    }

    #[test]
    fn body_image_then_any_http_value() {
        let d = build_draft(&doc("a.md", "---\ntitle: t\n---\n![x](https://c/body.png)"), 0, "/p")
            .unwrap();
        assert_eq!(d.url, "https://c/body.png");

        let d = build_draft(&doc("a.md", "---\n%XY: https://c/opaque.png\n---\nno image"), 0, "/p")
            .unwrap();
        assert_eq!(d.url, "https://c/opaque.png");
    }

    #[test]
    fn missing_image_is_dropped() {
        assert!(build_draft(&doc("a.md", "---\ntitle: t\n---\nno image here"), 0, "/p").is_none());
    }

    #[test]
    fn root_relative_paths_are_prefixed() {
        assert_eq!(canonicalize_path("/uploads/a.png", "/images/elog"), "/images/elog/uploads/a.png");
        assert_eq!(canonicalize_path("/images/a.png", "/images/elog"), "/images/a.png");
        assert_eq!(canonicalize_path("https://x/a.png", "/images/elog"), "https://x/a.png");
    }

    #[test]
    fn paths_under_custom_prefix_are_kept() {
        assert_eq!(canonicalize_path("/assets/photos/a.png", "/assets/photos"), "/assets/photos/a.png");
        assert_eq!(canonicalize_path("/assets/photos/a.png", "/assets/photos/"), "/assets/photos/a.png");
        assert_eq!(
            canonicalize_path("/assets/photoshoot/a.png", "/assets/photos"),
            "/assets/photos/assets/photoshoot/a.png"
        );
        assert_eq!(canonicalize_path("/uploads/a.png", "/assets/photos"), "/assets/photos/uploads/a.png");
    }

    #[test]
    fn base_name_from_urlname_or_position() {
        let d = build_draft(
            &doc("a.md", "---\nurlname: ab_c-1!\nimage: https://x/a.png\n---\n"),
            4,
            "/p",
        )
        .unwrap();
        assert_eq!(d.base_name, "photo-abc-1");

        let d = build_draft(&doc("页面.md", "---\nimage: https://x/a.png\n---\n"), 4, "/p").unwrap();
        assert_eq!(d.base_name, "photo-md");

        let d = build_draft(&doc("照片", "---\nimage: https://x/a.png\n---\n"), 4, "/p").unwrap();
        assert_eq!(d.base_name, "photo-5");
    }

    #[test]
    fn undated_photos_sort_last() {
        let mk = |date: Option<&str>, caption: &str| Photo {
            id: String::new(),
            url: "/images/a.png".into(),
            caption: caption.into(),
            location: None,
            date: date.map(str::to_string),
        };
        let mut photos = vec![
            mk(None, "undated"),
            mk(Some("2023-05-01"), "old"),
            mk(Some("2024-05-01"), "new"),
        ];
        finalize_photos(&mut photos);
        let order: Vec<_> = photos.iter().map(|p| (p.id.as_str(), p.caption.as_str())).collect();
        assert_eq!(order, vec![("1", "new"), ("2", "old"), ("3", "undated")]);
    }
}
