/// Chat records are stored server-side as `.jsonl` files; everything in this
/// crate keys on the bare name.
pub fn normalize_chat_id(file_name: &str) -> String {
    file_name
        .strip_suffix(".jsonl")
        .unwrap_or(file_name)
        .to_string()
}
