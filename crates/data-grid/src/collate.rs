use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Locale-style string comparison used for sorting grid columns.
///
/// Letters compare case-insensitively first; strings equal up to case order
/// lowercase before uppercase. With `numeric`, runs of ASCII digits compare
/// by value, so `"item 9"` sorts before `"item 10"`.
pub fn compare_text(a: &str, b: &str, numeric: bool) -> Ordering {
    primary_order(a, b, numeric)
        .then_with(|| case_order(a, b))
        .then_with(|| a.cmp(b))
}

fn primary_order(a: &str, b: &str, numeric: bool) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        let (l, r) = match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => (l, r),
        };

        if numeric && l.is_ascii_digit() && r.is_ascii_digit() {
            let ord = compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
            if ord != Ordering::Equal {
                return ord;
            }
            continue;
        }

        let ord = fold(l).cmp(&fold(r));
        if ord != Ordering::Equal {
            return ord;
        }
        left.next();
        right.next();
    }
}

fn case_order(a: &str, b: &str) -> Ordering {
    for (l, r) in a.chars().zip(b.chars()) {
        if l == r {
            continue;
        }
        match (l.is_lowercase(), r.is_lowercase()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("apple", "Banana", false, Ordering::Less)]
    #[case("a", "A", false, Ordering::Less)]
    #[case("abc", "abcd", false, Ordering::Less)]
    #[case("item 10", "item 9", false, Ordering::Less)]
    #[case("item 10", "item 9", true, Ordering::Greater)]
    #[case("007", "7", true, Ordering::Less)]
    #[case("가나", "나", false, Ordering::Less)]
    #[case("same", "same", true, Ordering::Equal)]
    fn orders(#[case] a: &str, #[case] b: &str, #[case] numeric: bool, #[case] expected: Ordering) {
        assert_eq!(compare_text(a, b, numeric), expected);
    }
}
