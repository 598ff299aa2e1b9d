/// Return type of tests which use `?` on fixtures.
#[cfg(test)]
pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Order two vertices so that undirected edges have a single representation.
pub fn ordered<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered() {
        assert_eq!(ordered(3, 1), (1, 3));
        assert_eq!(ordered(1, 3), (1, 3));
        assert_eq!(ordered(2, 2), (2, 2));
    }
}
