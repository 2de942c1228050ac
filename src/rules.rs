/// Whether any hand card may be played, or only the most recently drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandAccess {
    #[default]
    RandomAccess,
    TopOnly,
}

/// The immutable rule set for one sort. Passed explicitly into the deal,
/// the move engine and the retry driver; nothing reads ambient state.
#[derive(Debug, Clone, Copy)]
pub struct Rules {
    /// Maximum number of cards the hand holds after a draw.
    pub hand_size_max: usize,
    pub hand_access: HandAccess,
    /// Fresh deals attempted before the sort gives up.
    pub max_retries: usize,
    pub field_stacks: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            hand_size_max: 3,
            hand_access: HandAccess::RandomAccess,
            max_retries: 3,
            field_stacks: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rules = Rules::default();
        assert_eq!(rules.hand_size_max, 3);
        assert_eq!(rules.hand_access, HandAccess::RandomAccess);
        assert_eq!(rules.max_retries, 3);
        assert_eq!(rules.field_stacks, 8);
    }
}
