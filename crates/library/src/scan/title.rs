use regex::Regex;
use romshelf_storage::FALLBACK_TITLE;
use std::path::Path;
use std::sync::LazyLock;

// Region, revision and dump tags: "(USA)", "(Rev A)", "[!]", "[T+Eng]".
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").unwrap());

/// Derive a display title from a file name or archive member name.
///
/// Takes the file stem, drops bracketed and parenthesised tags, turns `_` and
/// `.` into spaces and capitalises each word.
///
/// ```
/// use romshelf_library::scan::guess_title;
/// assert_eq!(guess_title("super_mario_world (USA) [!].sfc"), "Super Mario World");
/// assert_eq!(guess_title("roms/Sonic.The.Hedgehog.md"), "Sonic The Hedgehog");
/// ```
pub fn guess_title(name: &str) -> String {
    let stem = Path::new(name).file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let stripped = TAGS.replace_all(&stem, " ");
    let title = stripped.replace(['_', '.'], " ").split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ");
    match title.is_empty() {
        true => FALLBACK_TITLE.to_string(),
        false => title,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
