//! PDF inspection

/// Page count of a PDF, read from the page tree.
///
/// Takes the largest `/Count` that follows a `/Type /Pages` node, which is the
/// root of the tree in well-formed files. Falls back to counting leaf `/Page`
/// objects. Compressed object streams are not decoded, so some PDFs yield `None`.
pub fn pdf_page_count(data: &[u8]) -> Option<u32> {
    let text = String::from_utf8_lossy(data);

    let from_tree = text
        .match_indices("/Pages")
        .filter_map(|(idx, _)| {
            let node_end = text[idx..].find(">>").map(|e| idx + e).unwrap_or(text.len());
            let node_start = text[..idx].rfind("<<").unwrap_or(0);
            let node = &text[node_start..node_end];
            if !node.contains("/Type") {
                return None;
            }
            node.split("/Count").nth(1).and_then(|rest| {
                rest.chars()
                    .skip_while(|c| c.is_whitespace())
                    .take_while(|c| c.is_ascii_digit())
                    .collect::<String>()
                    .parse::<u32>()
                    .ok()
            })
        })
        .max();

    if from_tree.is_some() {
        return from_tree;
    }

    let leaves = text
        .match_indices("/Type")
        .filter(|(idx, m)| {
            let rest = text[idx + m.len()..].trim_start();
            rest.starts_with("/Page") && !rest.starts_with("/Pages")
        })
        .count();
    u32::try_from(leaves).ok().filter(|n| *n > 0)
}
