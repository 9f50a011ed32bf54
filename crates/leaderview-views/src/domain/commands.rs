//! Commands for the views context.

use leaderview_core::command::Command;
use leaderview_core::entity::{CreateEntityRequest, ExtraArguments, Game};
use leaderview_core::error::ControllerError;

/// Largest number of entity requests a single view may carry.
pub const MAX_ENTITIES_PER_VIEW: usize = 50;

/// Command to create a view.
#[derive(Debug, Clone)]
pub struct CreateView {
    /// Correlates the intent event with its completion.
    pub operation_id: String,
    /// The caller.
    pub owner: String,
    /// Id of the new view.
    pub view_id: String,
    /// View name.
    pub name: String,
    /// Whether the view is publicly listed.
    pub published: bool,
    /// Requested member entities.
    pub entities: Vec<CreateEntityRequest>,
    /// Game of the view.
    pub game: Game,
    /// Whether the view is featured.
    pub featured: bool,
    /// Game-specific resolution options.
    pub extra_arguments: Option<ExtraArguments>,
}

/// Command to replace a view's definition.
#[derive(Debug, Clone)]
pub struct EditView {
    /// Correlates the intent event with its completion.
    pub operation_id: String,
    /// The caller.
    pub owner: String,
    /// The view to edit.
    pub view_id: String,
    /// View name.
    pub name: String,
    /// Whether the view is publicly listed.
    pub published: bool,
    /// Requested member entities.
    pub entities: Vec<CreateEntityRequest>,
    /// Whether the view is featured.
    pub featured: bool,
    /// Game-specific resolution options.
    pub extra_arguments: Option<ExtraArguments>,
}

/// Command to change some fields of a view.
#[derive(Debug, Clone)]
pub struct PatchView {
    /// Correlates the intent event with its completion.
    pub operation_id: String,
    /// The caller.
    pub owner: String,
    /// The view to patch.
    pub view_id: String,
    /// New name.
    pub name: Option<String>,
    /// New published flag.
    pub published: Option<bool>,
    /// New member entities.
    pub entities: Option<Vec<CreateEntityRequest>>,
    /// New featured flag.
    pub featured: Option<bool>,
    /// Game-specific resolution options.
    pub extra_arguments: Option<ExtraArguments>,
}

/// Command to delete a view.
#[derive(Debug, Clone)]
pub struct DeleteView {
    /// Correlates the command with its event.
    pub operation_id: String,
    /// The caller.
    pub owner: String,
    /// The view to delete.
    pub view_id: String,
}

/// Command to synchronize a view's members now.
#[derive(Debug, Clone)]
pub struct RequestSync {
    /// Correlates the command with its event.
    pub operation_id: String,
    /// The caller.
    pub owner: String,
    /// The view to synchronize.
    pub view_id: String,
}

macro_rules! impl_command {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Command for $ty {
                fn command_type(&self) -> &'static str {
                    stringify!($ty)
                }

                fn operation_id(&self) -> &str {
                    &self.operation_id
                }

                fn owner(&self) -> &str {
                    &self.owner
                }
            }
        )+
    };
}

impl_command!(CreateView, EditView, PatchView, DeleteView, RequestSync);

/// Rejects blank view names.
///
/// # Errors
///
/// Returns `ControllerError::Validation` if `name` is empty or whitespace.
pub fn validate_name(name: &str) -> Result<(), ControllerError> {
    if name.trim().is_empty() {
        return Err(ControllerError::Validation(
            "view name must not be empty".into(),
        ));
    }
    Ok(())
}

/// Checks a view's entity requests against its game.
///
/// Guild views are WoW Hardcore views whose single request names the guild.
///
/// # Errors
///
/// Returns `ControllerError::Validation` when there are too many requests, a
/// request belongs to another game, or a guild view is malformed.
pub fn validate_entities(
    game: Game,
    entities: &[CreateEntityRequest],
    extra: Option<&ExtraArguments>,
) -> Result<(), ControllerError> {
    if entities.len() > MAX_ENTITIES_PER_VIEW {
        return Err(ControllerError::Validation(format!(
            "a view may track at most {MAX_ENTITIES_PER_VIEW} entities, got {}",
            entities.len()
        )));
    }
    if let Some(other) = entities.iter().find(|e| e.game() != game) {
        return Err(ControllerError::Validation(format!(
            "entity {} belongs to {}, not {game}",
            other.describe(),
            other.game()
        )));
    }
    if extra.is_some_and(|e| e.is_guild) {
        if game != Game::WowHc {
            return Err(ControllerError::Validation(format!(
                "guild views are only supported for {}",
                Game::WowHc
            )));
        }
        if entities.len() != 1 {
            return Err(ControllerError::Validation(
                "a guild view must name exactly one guild".into(),
            ));
        }
    }
    Ok(())
}
