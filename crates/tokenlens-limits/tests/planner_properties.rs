#![allow(clippy::unwrap_used)]

use tokenlens_limits::{Batch, plan_batches};
use tokenlens_tokenizers::{ApproximateTokenizer, TiktokenTokenizer, Tokenizer};

const TEXTS: &[&str] = &[
    "a",
    "The quick brown fox jumps over the lazy dog.",
    "  leading and trailing whitespace  \n\n",
    "Unicode: naïve café, 数字 and emoji 🎉🎉🎉 in one line!",
    "fn main() { println!(\"hello\"); }\n// comment with symbols: <>[]{}()",
];

fn assert_covers(batches: &[Batch], total_tokens: usize, decoded_len: usize, batch_size: usize) {
    let mut expected_start = 0;
    for (position, batch) in batches.iter().enumerate() {
        assert_eq!(batch.index, position + 1);
        assert_eq!(batch.start_char, expected_start, "gap before batch {}", batch.index);
        assert!(batch.end_char >= batch.start_char);
        expected_start = batch.end_char;
    }
    assert_eq!(expected_start, decoded_len);

    let sum: usize = batches.iter().map(|b| b.token_count).sum();
    assert_eq!(sum, total_tokens);

    if let Some((last, rest)) = batches.split_last() {
        assert!(rest.iter().all(|b| b.token_count == batch_size));
        assert!((1..=batch_size).contains(&last.token_count));
    }
}

#[test]
fn test_approximate_plans_cover_the_source_text() {
    let tokenizer = ApproximateTokenizer::new(4);
    for text in TEXTS {
        let total = tokenizer.encode(text).unwrap().len();
        for batch_size in [1, 2, 3, 7, 1000] {
            let batches = plan_batches(text, &tokenizer, batch_size).unwrap();
            assert_covers(&batches, total, text.chars().count(), batch_size);
        }
    }
}

#[test]
fn test_tiktoken_plans_cover_the_source_text() {
    let tokenizer = TiktokenTokenizer::for_model("gpt-4").unwrap();
    for text in TEXTS {
        let total = tokenizer.encode(text).unwrap().len();
        for batch_size in [1, 2, 5, 1000] {
            let batches = plan_batches(text, &tokenizer, batch_size).unwrap();
            assert_covers(&batches, total, text.chars().count(), batch_size);
        }
    }
}

#[test]
fn test_single_batch_when_everything_fits() {
    let tokenizer = ApproximateTokenizer::default();
    let text = TEXTS[1];
    let total = tokenizer.encode(text).unwrap().len();
    let batches = plan_batches(text, &tokenizer, total).unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].start_char, 0);
    assert_eq!(batches[0].end_char, text.chars().count());
}

#[test]
fn test_planning_is_idempotent() {
    let tokenizer = TiktokenTokenizer::for_model("gpt-4o").unwrap();
    let text = TEXTS[3];
    let first = plan_batches(text, &tokenizer, 3).unwrap();
    let second = plan_batches(text, &tokenizer, 3).unwrap();
    assert_eq!(first, second);
}
