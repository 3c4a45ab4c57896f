//! Human-readable rendering of command results

use cbk_core::{FileEntry, Metadata};

const RULE: &str = "----------------------------------------";

pub fn listing(path: &str, entries: &[FileEntry]) -> String {
    if entries.is_empty() {
        return "directory is empty\n".to_string();
    }

    let mut out = format!("path: {path}\n{RULE}\n");
    for entry in entries {
        if entry.is_dir {
            out.push_str(&format!("[DIR]  {}\n", entry.name()));
        } else {
            out.push_str(&format!("[FILE] {} ({} bytes)\n", entry.name(), entry.size));
        }
    }
    out
}

pub fn file_info(path: &str, metadata: &Metadata) -> String {
    let mut out = format!("file info: {path}\n{RULE}\n");
    for (key, value) in metadata {
        out.push_str(&format!("{key}: {value}\n"));
    }
    out
}

pub fn generated_key(size: usize, key_hex: &str) -> String {
    format!(
        "generated key ({size} bytes):\n{key_hex}\n\n\
         Keep this key safe: files encrypted with it cannot be recovered without it.\n"
    )
}
