//! Condition codes for `icmp`/`fcmp` (§4.2.2 comparison operators).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntCC {
    Equal,
    NotEqual,
    SignedLessThan,
    SignedGreaterThanOrEqual,
    SignedGreaterThan,
    SignedLessThanOrEqual,
    UnsignedLessThan,
    UnsignedGreaterThanOrEqual,
    UnsignedGreaterThan,
    UnsignedLessThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatCC {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// Unordered-or-equal: true when either operand is NaN, used to build
    /// the Wasm min/max NaN-propagation selects (§4.2.2).
    UnorderedOrEqual,
    /// True exactly when either operand is NaN.
    Unordered,
}
