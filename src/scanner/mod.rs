mod exif;

use crate::error::{ReceiptScanError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
    /// EXIFの撮影日時
    pub date: Option<String>,
}

impl ImageInfo {
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            file_name,
            date: exif::extract_date(path).ok(),
        }
    }
}

/// `image` クレートで読める形式のみ（認識前に画像ヘッダーを検査するため）
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(ReceiptScanError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_image_path(e.path()))
        .map(|e| ImageInfo::from_path(e.path()))
        .collect();

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// 画像ファイル1枚またはフォルダを受け付ける
pub fn resolve_inputs(input: &Path) -> Result<Vec<ImageInfo>> {
    if input.is_file() {
        return Ok(vec![ImageInfo::from_path(input)]);
    }
    if !input.exists() {
        return Err(ReceiptScanError::FileNotFound(input.display().to_string()));
    }

    let images = scan_folder(input)?;
    if images.is_empty() {
        return Err(ReceiptScanError::NoImagesFound(input.display().to_string()));
    }
    Ok(images)
}
