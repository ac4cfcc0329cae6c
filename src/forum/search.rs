use super::repo::Topic;

/// Whole-word keyword match over topic titles: the query splits on
/// whitespace, each title splits on whitespace, and a topic matches when
/// any keyword equals any title word. No case folding, no substrings, no
/// index; a linear scan is fine at this scale.
pub fn matching_topics(query: &str, topics: Vec<Topic>) -> Vec<Topic> {
    let keywords: Vec<&str> = query.split_whitespace().collect();
    topics
        .into_iter()
        .filter(|topic| {
            topic
                .title
                .split_whitespace()
                .any(|word| keywords.contains(&word))
        })
        .collect()
}
