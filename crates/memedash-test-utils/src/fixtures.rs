use memedash_protocol::{Meme, MemePage};

/// A meme with predictable fields derived from `id`.
pub fn meme(id: &str) -> Meme {
    Meme {
        reddit_id: id.to_string(),
        title: format!("Meme {id}"),
        url: format!("https://i.redd.it/{id}.png"),
        permalink: format!("https://reddit.com/r/memes/comments/{id}"),
        score: 0,
        num_comments: 0,
        created_at: Some("2024-05-01T12:00:00Z".to_string()),
        reddit_created_at: Some("2024-05-01T11:30:00Z".to_string()),
    }
}

pub fn meme_with_stats(id: &str, score: i64, num_comments: i64) -> Meme {
    Meme {
        score,
        num_comments,
        ..meme(id)
    }
}

/// `count` memes with ids `{prefix}-0`, `{prefix}-1`, ...
pub fn memes(prefix: &str, count: usize) -> Vec<Meme> {
    (0..count)
        .map(|index| meme(&format!("{prefix}-{index}")))
        .collect()
}

pub fn page(items: Vec<Meme>, next_cursor: Option<&str>) -> MemePage {
    MemePage {
        items,
        next_cursor: next_cursor.map(str::to_string),
    }
}
