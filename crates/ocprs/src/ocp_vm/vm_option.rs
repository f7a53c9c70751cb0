use crate::limits::DEFAULT_MAX_STEPS;

/// What the machine does when no rule of the current state matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoMatchPolicy {
    /// Abort with `NoMatchingRule` (or `UnterminatedMatch` at end of input)
    #[default]
    Fault,
    /// Copy the current character to the output unchanged
    PassThrough,
    /// Discard the current character
    Drop,
}

#[derive(Debug, Clone)]
pub struct VmOptions {
    pub no_match: NoMatchPolicy,
    /// Ceiling on consecutive steps that make no net progress through the
    /// input, `None` for no limit
    pub max_steps: Option<u64>,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            no_match: NoMatchPolicy::Fault,
            max_steps: Some(DEFAULT_MAX_STEPS),
        }
    }
}

impl VmOptions {
    pub fn pass_through() -> Self {
        Self {
            no_match: NoMatchPolicy::PassThrough,
            ..Self::default()
        }
    }
}
