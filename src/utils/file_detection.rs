use std::path::Path;

/// Marker text that stands in for the content of a binary file.
pub const BINARY_PLACEHOLDER: &str = "[BINARY FILE - CONTENT SKIPPED]";

const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "app", "deb", "rpm", "msi",
    "zip", "tar", "gz", "bz2", "7z", "rar", "jar", "war",
    "mp3", "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm",
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "webp", "tiff", "tif", "heic", "avif",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    "bin", "db", "sqlite", "sqlite3",
    "rlib", "rmeta", "pdb", "ilk", "exp", "lib", "a",
    "obj", "o", "class", "pyc", "pyo", "nupkg", "whl", "egg",
    "woff", "woff2", "ttf", "otf", "eot",
];

/// Number of leading bytes inspected by [`looks_like_binary`].
const SNIFF_LEN: usize = 1024;

/// Whether the extension of `path` names a well-known binary format.
pub fn is_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Content sniffing: a NUL byte among the first KiB marks the data as binary.
pub fn looks_like_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(SNIFF_LEN)].contains(&0)
}
