/// Case-insensitive substring search over a lexically sorted title list
///
/// An empty query matches every title. Results keep the input order.
pub fn search_titles<'a>(titles: &'a [String], query: &str) -> Vec<&'a str> {
    if query.is_empty() {
        return titles.iter().map(String::as_str).collect();
    }

    let needle = query.to_lowercase();
    titles
        .iter()
        .filter(|title| title.to_lowercase().contains(&needle))
        .map(String::as_str)
        .collect()
}
