use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use super::model::{FileRef, SortStrategy};

static RE_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+|[^0-9]+").expect("Invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn tokenize(name: &str) -> impl Iterator<Item = Token<'_>> {
    RE_TOKENS.find_iter(name).map(|m| {
        let run = m.as_str();
        if run.as_bytes()[0].is_ascii_digit() {
            Token::Digits(run)
        } else {
            Token::Text(run)
        }
    })
}

fn lowercase_chars(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().flat_map(char::to_lowercase)
}

/// Arbitrary-precision comparison of two digit runs. Equal values with more
/// leading zeros sort first, so "007" < "07" < "7".
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a_value = a.trim_start_matches('0');
    let b_value = b.trim_start_matches('0');

    a_value
        .len()
        .cmp(&b_value.len())
        .then_with(|| a_value.cmp(b_value))
        .then_with(|| b.len().cmp(&a.len()))
}

fn compare_tokens(a: Token<'_>, b: Token<'_>) -> Ordering {
    match (a, b) {
        (Token::Digits(a), Token::Digits(b)) => compare_digits(a, b),
        (Token::Text(a), Token::Text(b)) => lowercase_chars(a).cmp(lowercase_chars(b)),
        // A text run never starts with an ASCII digit, so this is never Equal.
        (Token::Digits(_), Token::Text(t)) => '0'.cmp(&lowercase_chars(t).next().unwrap_or('0')),
        (Token::Text(t), Token::Digits(_)) => lowercase_chars(t).next().unwrap_or('0').cmp(&'0'),
    }
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_tokens = tokenize(a);
    let mut b_tokens = tokenize(b);

    loop {
        match (a_tokens.next(), b_tokens.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => match compare_tokens(a, b) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

pub fn sort(files: &[FileRef], strategy: SortStrategy) -> Vec<FileRef> {
    let mut sorted = files.to_vec();

    match strategy {
        SortStrategy::OriginalOrder => {}
        SortStrategy::DateModified => sorted.sort_by(|a, b| b.modified.cmp(&a.modified)),
        SortStrategy::Size => sorted.sort_by(|a, b| b.size.cmp(&a.size)),
        SortStrategy::Natural => sorted.sort_by(|a, b| natural_cmp(&a.name, &b.name)),
    }

    sorted
}
