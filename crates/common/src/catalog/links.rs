//! Direct links for files shared through Google Drive

use regex_lite::Regex;
use std::sync::LazyLock;

static DRIVE_FILE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("drive file id pattern is valid")
});

/// How the file is about to be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    View,
    Download,
}

impl LinkMode {
    fn export_param(self) -> &'static str {
        match self {
            LinkMode::View => "view",
            LinkMode::Download => "download",
        }
    }
}

/// Rewrite a Drive share link (`.../file/d/{id}/view`) into its direct
/// `uc?export=...&id={id}` form. Other URLs are returned unchanged.
pub fn resolve_file_url(file_url: &str, mode: LinkMode) -> String {
    if !file_url.contains("drive.google.com") {
        return file_url.to_string();
    }

    match DRIVE_FILE_ID.captures(file_url).and_then(|c| c.get(1)) {
        Some(id) => format!(
            "https://drive.google.com/uc?export={}&id={}",
            mode.export_param(),
            id.as_str()
        ),
        None => file_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_share_link_rewritten() {
        let url = "https://drive.google.com/file/d/1AbC_d-9/view?usp=sharing";
        assert_eq!(
            resolve_file_url(url, LinkMode::View),
            "https://drive.google.com/uc?export=view&id=1AbC_d-9"
        );
        assert_eq!(
            resolve_file_url(url, LinkMode::Download),
            "https://drive.google.com/uc?export=download&id=1AbC_d-9"
        );
    }

    #[test]
    fn test_drive_link_without_file_id_kept() {
        let url = "https://drive.google.com/drive/folders";
        assert_eq!(resolve_file_url(url, LinkMode::View), url);
    }

    #[test]
    fn test_other_hosts_untouched() {
        let url = "https://www.dropbox.com/s/abc/d/file.pdf";
        assert_eq!(resolve_file_url(url, LinkMode::Download), url);
    }
}
