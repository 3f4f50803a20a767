use std::fs;
use std::io;
use std::path::Path;

/// Reads an entire file into a string.
pub fn read_file(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Writes `text` to `path`, creating any missing parent directories first.
pub fn write_file(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)
}
