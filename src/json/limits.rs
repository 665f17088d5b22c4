//! Resource limits for JSON parsing.
//!
//! Limits guard the harness against pathological suite documents
//! (deeply nested arrays in particular) without rejecting real fixtures.

/// Resource limits for JSON parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum total input size in bytes
    pub max_input_size: u64,
    /// Maximum nesting depth for arrays/objects
    pub max_nesting_depth: u64,
    /// Maximum string length in bytes
    pub max_string_length: u64,
    /// Maximum number of members in an object
    pub max_object_fields: u64,
    /// Maximum number of elements in an array
    pub max_array_length: u64,
}

impl Limits {
    /// Limits for corpus-sized documents.
    ///
    /// Large enough for every fixture, small enough that a hostile suite
    /// document cannot exhaust the stack.
    pub const fn standard() -> Self {
        Self {
            max_input_size: 256 * 1024 * 1024, // 256 MiB
            max_nesting_depth: 256,            // 256 levels
            max_string_length: 64 * 1024 * 1024,
            max_object_fields: 1 << 24,
            max_array_length: 1 << 26,
        }
    }

}

impl Default for Limits {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard() {
        let standard = Limits::standard();
        assert_eq!(standard.max_nesting_depth, 256);
        assert_eq!(Limits::default(), standard);
    }
}
