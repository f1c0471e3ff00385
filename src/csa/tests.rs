use super::*;

use simple_sds::serialize;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::fs;

//-----------------------------------------------------------------------------

fn random_text(len: usize, alphabet: &[u8], seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect()
}

// Rows for the pattern in the naive suffix array, where the empty suffix is the endmarker.
fn naive_range(text: &[u8], pattern: &[u8]) -> LexRange {
    let mut suffixes: Vec<&[u8]> = (0..=text.len()).map(|i| &text[i..]).collect();
    suffixes.sort();
    let start = suffixes.partition_point(|suffix| *suffix < pattern && !suffix.starts_with(pattern));
    let end = suffixes.partition_point(|suffix| *suffix < pattern || suffix.starts_with(pattern));
    LexRange::new(start, end)
}

fn naive_count(text: &[u8], pattern: &[u8]) -> usize {
    (0..text.len()).filter(|&i| text[i..].starts_with(pattern)).count()
}

fn all_patterns(alphabet: &[u8], max_len: usize) -> Vec<Vec<u8>> {
    let mut result: Vec<Vec<u8>> = vec![Vec::new()];
    let mut start = 0;
    for _ in 0..max_len {
        let end = result.len();
        for i in start..end {
            for &c in alphabet.iter() {
                let mut pattern = result[i].clone();
                pattern.push(c);
                result.push(pattern);
            }
        }
        start = end;
    }
    result.remove(0);
    result
}

fn build(text: &[u8]) -> Csa {
    let csa = Csa::new(text);
    assert!(csa.is_ok(), "Failed to build the index: {}", csa.unwrap_err());
    csa.unwrap()
}

fn build_reverse(text: &[u8]) -> Csa {
    let csa = Csa::new_reverse(text);
    assert!(csa.is_ok(), "Failed to build the reverse index: {}", csa.unwrap_err());
    csa.unwrap()
}

//-----------------------------------------------------------------------------

#[test]
fn lex_range() {
    let range = LexRange::new(3, 7);
    assert_eq!((range.lb(), range.rb(), range.len()), (3, 6, 4), "Wrong bounds");
    assert!(!range.is_empty() && !range.is_singleton(), "Wrong range type");
    assert!(LexRange::new(4, 5).is_singleton(), "A single row is a singleton");
    assert!(LexRange::new(5, 5).is_empty(), "An empty range is not empty");

    assert!(LexRange::new(4, 6).has_prefix(&range), "Nested range");
    assert!(range.has_prefix(&range), "A range contains itself");
    assert!(!LexRange::new(2, 5).has_prefix(&range), "Overlapping range");
    assert!(!range.has_prefix(&LexRange::new(4, 6)), "Containing range");
    assert!(!LexRange::new(4, 4).has_prefix(&range), "Empty range");
}

#[test]
fn empty_text() {
    let csa = build(b"");
    assert_eq!(csa.size(), 1, "Wrong size");
    assert!(csa.alphabet().is_empty(), "Nonempty alphabet");
    assert!(csa.find(b"A").is_empty(), "Found a pattern in an empty text");
    assert!(csa.interval_symbols(csa.full_range()).is_empty(), "Found symbols in an empty text");
}

#[test]
fn backward_search() {
    let alphabet = b"#ACGT";
    let text = random_text(300, alphabet, 0x1234);
    let csa = build(&text);
    assert_eq!(csa.size(), text.len() + 1, "Wrong size");
    assert_eq!(csa.alphabet(), alphabet, "Wrong alphabet");
    for &c in alphabet.iter() {
        assert_eq!(csa.symbol_count(c), naive_count(&text, &[c]), "Wrong count for {}", c as char);
    }
    assert_eq!(csa.symbol_count(b'N'), 0, "Got occurrences for a missing symbol");

    for pattern in all_patterns(alphabet, 4) {
        let truth = naive_range(&text, &pattern);
        let range = csa.find(&pattern);
        assert_eq!(range.len(), truth.len(), "Wrong number of occurrences for {}", String::from_utf8_lossy(&pattern));
        if !truth.is_empty() {
            assert_eq!(range, truth, "Wrong range for {}", String::from_utf8_lossy(&pattern));
        }
    }
    assert!(csa.find(b"ACNT").is_empty(), "Found a pattern with a missing symbol");
}

#[test]
fn separator_search() {
    let text = b"#AC#AG#ACCT#AGCT#";
    let csa = build(text);

    let range = csa.backward_search_h(csa.full_range(), b"CT", b'#');
    assert_eq!(range.len(), 2, "Wrong number of occurrences for CT#");
    assert_eq!(range, naive_range(text, b"CT#"), "Wrong range for CT#");
    let range = csa.backward_search_str(range, b"AC");
    assert!(range.is_singleton(), "ACCT# should occur once");
    assert_eq!(range, naive_range(text, b"ACCT#"), "Wrong range for ACCT#");

    // The separator sorts after the endmarker and before the other symbols.
    let range = csa.find(b"#");
    assert_eq!(range, LexRange::new(1, 6), "Wrong range for the separator");
}

#[test]
fn forward_search() {
    let alphabet = b"#ACGT";
    let text = random_text(250, alphabet, 0x5678);
    let reverse = build_reverse(&text);
    for pattern in all_patterns(alphabet, 3) {
        let co_range = reverse.forward_search_str(reverse.full_range(), &pattern);
        assert_eq!(co_range.len(), naive_count(&text, &pattern), "Wrong number of occurrences for {}", String::from_utf8_lossy(&pattern));
    }

    let text = b"#AC#AG#ACCT#AGCT#";
    let reverse = build_reverse(text);
    let co_range = reverse.forward_search_h(reverse.full_range(), b"AGCT", b'#');
    assert!(co_range.is_singleton(), "AGCT# should occur once");
    let co_range = reverse.forward_search_h(reverse.full_range(), b"CT", b'#');
    assert_eq!(co_range.len(), 2, "Wrong number of occurrences for CT#");

    // Co-lexicographic ranks of strings ending with a separator start after the endmarker.
    let all = reverse.find(b"#");
    assert!(co_range.has_prefix(&all), "CT# should be within the separator range");
    assert_eq!(all.lb(), 1, "Wrong first separator row");
}

#[test]
fn interval_symbols() {
    let alphabet = b"#ACGT";
    let text = random_text(200, alphabet, 0x9abc);
    let csa = build(&text);
    for pattern in all_patterns(alphabet, 2) {
        let range = csa.find(&pattern);
        let symbols = csa.interval_symbols(range);
        let mut expected: Vec<(u8, LexRange)> = Vec::new();
        for &c in alphabet.iter() {
            let mut extended = vec![c];
            extended.extend_from_slice(&pattern);
            let extended_range = csa.find(&extended);
            if !extended_range.is_empty() {
                expected.push((c, extended_range));
            }
        }
        assert_eq!(symbols, expected, "Wrong symbols for {}", String::from_utf8_lossy(&pattern));
    }
}

#[test]
fn range_pair() {
    let text = b"#AC#AG#ACCT#AGCT#";
    let csa = build(text);
    let reverse = build_reverse(text);

    let empty = RangePair::new(&csa, &reverse);
    assert_eq!(empty.len(), csa.size(), "Wrong range for the empty pattern");

    let pair = RangePair::find(&csa, &reverse, b"AC");
    assert_eq!(pair.len(), 2, "Wrong number of occurrences for AC");
    assert_eq!(pair.co_range.len(), 2, "Wrong co-lexicographic range length for AC");
    let prefix = RangePair::find(&csa, &reverse, b"A");
    assert!(pair.has_prefix(&prefix), "AC should have prefix A");
    assert!(!prefix.has_prefix(&pair), "A should not have prefix AC");

    let pair = RangePair::find(&csa, &reverse, b"ACCT");
    assert!(pair.is_singleton(), "ACCT should occur once");
    let pair = RangePair::find(&csa, &reverse, b"GA");
    assert!(pair.is_empty(), "GA should not occur");
}

#[test]
fn serialize_csa() {
    let text = random_text(500, b"#ACGT", 0xdef0);
    let csa = build(&text);

    let filename = serialize::temp_file_name("csa");
    let result = serialize::serialize_to(&csa, &filename);
    assert!(result.is_ok(), "Failed to serialize the index: {}", result.unwrap_err());
    let loaded: Result<Csa, _> = serialize::load_from(&filename);
    assert!(loaded.is_ok(), "Failed to load the index: {}", loaded.unwrap_err());
    let loaded = loaded.unwrap();
    assert_eq!(loaded.size(), csa.size(), "Wrong size after loading");
    assert_eq!(loaded.alphabet(), csa.alphabet(), "Wrong alphabet after loading");
    assert_eq!(loaded.size_in_elements(), csa.size_in_elements(), "Wrong serialized size");
    let patterns: [&[u8]; 4] = [b"A", b"#AC", b"GT#", b"TTT"];
    for pattern in patterns {
        assert_eq!(loaded.find(pattern), csa.find(pattern), "Wrong range for {} after loading", String::from_utf8_lossy(pattern));
    }

    fs::remove_file(&filename).unwrap();
}

//-----------------------------------------------------------------------------
