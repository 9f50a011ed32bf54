//! Command abstractions.

/// Trait that all write-side commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Operation id used to correlate the intent event with its completion.
    fn operation_id(&self) -> &str;

    /// Owner on whose behalf the command runs.
    fn owner(&self) -> &str;
}
