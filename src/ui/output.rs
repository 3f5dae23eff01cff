use crate::report::SkippedRecord;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::WRENCH, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().repaired.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().failed.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().detail.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().detail.clone()).to_string()
}

pub fn muted(text: &str) -> String {
    text.style(theme().record_key.clone()).to_string()
}

/// A resolved path, marked by whether it is on disk
pub fn path_status(path: &str, exists: bool) {
    if exists {
        println!("{} {}", Icons::FILE.style(theme().repaired.clone()), path);
    } else {
        println!("{} {}", Icons::CROSS.style(theme().failed.clone()), path.style(theme().missing_path.clone()));
    }
}

pub fn not_repaired(record: &SkippedRecord) {
    let key = record
        .primary_key
        .map(|pk| format!("#{pk} "))
        .unwrap_or_default();
    println!(
        "  {}{} {}",
        muted(&key),
        record.subject,
        dim(&format!("({})", record.reason))
    );
}
