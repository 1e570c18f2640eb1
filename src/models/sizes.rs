//! Product size catalogue.
//!
//! Two sizes are in production today (22 on thermoformer 1, 25 on
//! thermoformer 2); 27 and 30 are supported by the schema and can be
//! activated by extending `ACTIVE_SIZES`.

/// Sizes currently in production.
pub const ACTIVE_SIZES: [i32; 2] = [22, 25];

/// All sizes the system understands.
pub const ALL_SIZES: [i32; 4] = [22, 25, 27, 30];

pub fn is_supported(size: i32) -> bool {
    ALL_SIZES.contains(&size)
}

pub fn is_active(size: i32) -> bool {
    ACTIVE_SIZES.contains(&size)
}

/// The two physical production machines carry ids 1 and 2.
pub fn is_valid_thermoformer(n: i16) -> bool {
    n == 1 || n == 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_catalogue() {
        assert!(is_supported(22));
        assert!(is_supported(30));
        assert!(!is_supported(15));
        assert!(!is_supported(20));
        assert!(is_active(25));
        assert!(!is_active(27));
    }

    #[test]
    fn thermoformer_ids() {
        assert!(is_valid_thermoformer(1));
        assert!(is_valid_thermoformer(2));
        assert!(!is_valid_thermoformer(0));
        assert!(!is_valid_thermoformer(3));
    }
}
