pub mod excel;

use std::path::{Path, PathBuf};

/// 出力先が省略・ディレクトリならファイル名を補う
pub fn output_path_for(input: &Path, output: Option<&Path>, extension: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() || path.extension().is_none() => {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("receipts");
            path.join(format!("{}.{}", stem, extension))
        }
        Some(path) => path.to_path_buf(),
        None => input.with_extension(extension),
    }
}
