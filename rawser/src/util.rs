/// Format a byte count for humans, e.g. `1.5 KiB`.
pub fn format_size(bytes: u64) -> String {
    use humansize::{FormatSize, BINARY};
    bytes.format_size(BINARY)
}
