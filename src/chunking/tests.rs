use super::*;

fn lorem(target_chars: usize) -> String {
    let sentence = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, \
                    sed do eiusmod tempor incididunt ut labore et dolore magna \
                    aliqua. ";
    let mut text = String::new();
    while text.chars().count() < target_chars {
        text.push_str(sentence);
    }
    text.chars().take(target_chars).collect()
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

#[test]
fn empty_input_yields_no_chunks() {
    let config = ChunkingConfig::default();

    assert!(split_text("", &config).is_empty());
    assert!(split_text("   \n\n  \n ", &config).is_empty());
}

#[test]
fn short_text_yields_single_chunk() {
    let config = ChunkingConfig::default();

    let chunks = split_text("a small document", &config);

    assert_eq!(chunks, vec!["a small document".to_string()]);
}

#[test]
fn chunks_never_exceed_max_size_and_are_never_empty() {
    let config = ChunkingConfig {
        max_chunk_size: 1000,
        chunk_overlap: 20,
    };
    let text = lorem(5000);

    let chunks = split_text(&text, &config);

    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(char_count(chunk) <= 1000, "chunk exceeded max size");
        assert!(!chunk.trim().is_empty(), "chunk was empty");
    }
}

#[test]
fn lorem_2500_produces_three_chunks() {
    let config = ChunkingConfig {
        max_chunk_size: 1000,
        chunk_overlap: 20,
    };
    let text = lorem(2500);

    let chunks = split_text(&text, &config);

    assert_eq!(chunks.len(), 3);
    for chunk in &chunks {
        assert!(char_count(chunk) <= 1000);
    }
}

#[test]
fn consecutive_chunks_share_an_overlap_within_budget() {
    let config = ChunkingConfig {
        max_chunk_size: 1000,
        chunk_overlap: 20,
    };
    let text = lorem(2500);

    let chunks = split_text(&text, &config);

    assert!(chunks.len() > 1);
    for pair in chunks.windows(2) {
        let first_word: String = pair[1].chars().take_while(|c| !c.is_whitespace()).collect();
        let prev_tail: String = {
            let chars: Vec<char> = pair[0].chars().collect();
            chars[chars.len().saturating_sub(40)..].iter().collect()
        };
        assert!(
            prev_tail.contains(&first_word),
            "chunk did not begin with overlap carried from the previous chunk"
        );
    }
}

#[test]
fn paragraph_boundaries_are_preferred() {
    let config = ChunkingConfig {
        max_chunk_size: 1000,
        chunk_overlap: 0,
    };
    let first = lorem(600);
    let second = lorem(600);
    let text = format!("{}\n\n{}", first, second);

    let chunks = split_text(&text, &config);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0], first.trim());
    assert_eq!(chunks[1], second.trim());
}

#[test]
fn unbroken_text_falls_back_to_hard_splits() {
    let config = ChunkingConfig {
        max_chunk_size: 1000,
        chunk_overlap: 20,
    };
    let text = "x".repeat(2050);

    let chunks = split_text(&text, &config);

    let lengths: Vec<usize> = chunks.iter().map(|c| char_count(c)).collect();
    assert_eq!(lengths, vec![1000, 1000, 50]);
}

#[test]
fn zero_overlap_produces_disjoint_chunks() {
    let config = ChunkingConfig {
        max_chunk_size: 100,
        chunk_overlap: 0,
    };
    let text = lorem(350);

    let chunks = split_text(&text, &config);

    let total: usize = chunks.iter().map(|c| char_count(c)).sum();
    // Only inter-chunk whitespace may be lost to trimming.
    assert!(total <= 350);
    assert!(total >= 350 - chunks.len() * 2);
}

#[test]
fn splitting_is_deterministic() {
    let config = ChunkingConfig::default();
    let text = lorem(3000);

    assert_eq!(split_text(&text, &config), split_text(&text, &config));
}
