use std::hash::Hasher;

use twox_hash::XxHash64;

/// Hash of a line sequence, separator-aware so `["ab"]` and `["a", "b"]` differ.
pub fn hash_lines(lines: &[String]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for line in lines {
        hasher.write(line.as_bytes());
        hasher.write_u8(b'\n');
    }
    hasher.write_usize(lines.len());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_lines_distinguishes_splits() {
        let joined = vec!["ab".to_string()];
        let split = vec!["a".to_string(), "b".to_string()];
        assert_ne!(hash_lines(&joined), hash_lines(&split));
        assert_eq!(hash_lines(&split), hash_lines(&split.clone()));
    }
}
