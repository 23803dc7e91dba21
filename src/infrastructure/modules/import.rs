//! Unit importer - turns one source file into one descriptor
//!
//! Importing is pure with respect to the registry: it reads the file, checks
//! its shape and resolves its handler key, and leaves registration to the
//! caller. Every call reads from disk, so there is no stale parse to invalidate.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::discovery::category_of;
use super::unit::{read_unit, AddonUnit, CommandUnit, EventUnit, StructuredUnit};
use crate::application::errors::LoadError;
use crate::application::handlers::HandlerTable;
use crate::domain::entities::{
    AddonDescriptor, CommandDescriptor, CommandFlags, CommandOption, CommandPolicy, EventBinding,
    Permissions, StructuredCommandDescriptor,
};

static STRUCTURED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-_a-z0-9]{1,32}$").expect("static pattern")
});

const MAX_DESCRIPTION: usize = 100;
const MAX_OPTIONS: usize = 25;

/// Fields shared by command and structured command units
struct PolicyFields<'a> {
    cooldown: Option<u64>,
    owner: bool,
    maintenance: bool,
    nsfw: bool,
    permissions: &'a [String],
    bot_permissions: &'a [String],
}

impl PolicyFields<'_> {
    fn build(&self, path: &Path) -> Result<CommandPolicy, LoadError> {
        let parse = |names: &[String]| {
            Permissions::parse_names(names).map_err(|permission| LoadError::UnknownPermission {
                path: path.to_path_buf(),
                permission,
            })
        };
        Ok(CommandPolicy {
            permissions: parse(self.permissions)?,
            bot_permissions: parse(self.bot_permissions)?,
            cooldown: self.cooldown.filter(|s| *s > 0).map(Duration::from_secs),
            flags: CommandFlags {
                owner_only: self.owner,
                maintenance: self.maintenance,
                nsfw_only: self.nsfw,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_options(options: &[CommandOption], path: &Path) -> Result<(), LoadError> {
    let invalid = |reason: String| LoadError::InvalidStructured {
        path: path.to_path_buf(),
        reason,
    };

    if options.len() > MAX_OPTIONS {
        return Err(invalid(format!("more than {} options", MAX_OPTIONS)));
    }
    let mut seen_optional = false;
    for option in options {
        if !STRUCTURED_NAME.is_match(&option.name) {
            return Err(invalid(format!("invalid option name '{}'", option.name)));
        }
        let len = option.description.chars().count();
        if len == 0 || len > MAX_DESCRIPTION {
            return Err(invalid(format!(
                "option '{}' needs a description of 1-{} characters",
                option.name, MAX_DESCRIPTION
            )));
        }
        if !option.kind.is_group() {
            if option.required && seen_optional {
                return Err(invalid(format!(
                    "required option '{}' follows an optional one",
                    option.name
                )));
            }
            seen_optional |= !option.required;
        }
        validate_options(&option.options, path)?;
    }
    Ok(())
}

/// Parses source units and resolves their handler keys
#[derive(Clone)]
pub struct UnitImporter {
    handlers: Arc<HandlerTable>,
}

impl UnitImporter {
    pub fn new(handlers: Arc<HandlerTable>) -> Self {
        Self { handlers }
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Text command; category comes from the parent directory
    pub fn import_command(&self, path: &Path) -> Result<CommandDescriptor, LoadError> {
        let unit: CommandUnit = read_unit(path)?;
        let name = non_empty(unit.name).ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: "name",
        })?;

        let policy = PolicyFields {
            cooldown: unit.cooldown,
            owner: unit.owner,
            maintenance: unit.maintenance,
            nsfw: unit.nsfw,
            permissions: &unit.permissions,
            bot_permissions: &unit.bot_permissions,
        }
        .build(path)?;

        let key = handler_key(unit.execute, unit.response.is_some(), &name);
        let handler = self
            .handlers
            .command_handler(&key)
            .ok_or_else(|| LoadError::UnknownHandler {
                path: path.to_path_buf(),
                key: key.clone(),
            })?;

        let mut descriptor = CommandDescriptor::new(name, handler)
            .with_aliases(unit.aliases)
            .with_category(category_of(path))
            .with_policy(policy)
            .with_handler_key(key)
            .with_source(path);
        descriptor.description = non_empty(unit.description);
        descriptor.usage = non_empty(unit.usage);
        descriptor.response = unit.response;
        Ok(descriptor)
    }

    pub fn import_structured(&self, path: &Path) -> Result<StructuredCommandDescriptor, LoadError> {
        let unit: StructuredUnit = read_unit(path)?;
        let name = non_empty(unit.name).ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: "name",
        })?;
        let description = non_empty(unit.description).ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: "description",
        })?;

        if !STRUCTURED_NAME.is_match(&name) {
            return Err(LoadError::InvalidStructured {
                path: path.to_path_buf(),
                reason: format!(
                    "name '{}' must be 1-32 lowercase letters, digits, '-' or '_'",
                    name
                ),
            });
        }
        if description.chars().count() > MAX_DESCRIPTION {
            return Err(LoadError::InvalidStructured {
                path: path.to_path_buf(),
                reason: format!("description longer than {} characters", MAX_DESCRIPTION),
            });
        }
        validate_options(&unit.options, path)?;

        let policy = PolicyFields {
            cooldown: unit.cooldown,
            owner: unit.owner,
            maintenance: unit.maintenance,
            nsfw: unit.nsfw,
            permissions: &unit.permissions,
            bot_permissions: &unit.bot_permissions,
        }
        .build(path)?;

        let key = handler_key(unit.execute, unit.response.is_some(), &name);
        let handler = self
            .handlers
            .command_handler(&key)
            .ok_or_else(|| LoadError::UnknownHandler {
                path: path.to_path_buf(),
                key: key.clone(),
            })?;

        let mut descriptor = StructuredCommandDescriptor::new(name, description, handler)
            .with_localizations(unit.localizations)
            .with_policy(policy)
            .with_source(path);
        descriptor.options = unit.options;
        descriptor.handler_key = key;
        descriptor.response = unit.response;
        Ok(descriptor)
    }

    pub fn import_event(&self, path: &Path) -> Result<EventBinding, LoadError> {
        let unit: EventUnit = read_unit(path)?;
        let event = non_empty(unit.event).ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: "event",
        })?;
        let key = non_empty(unit.run).unwrap_or_else(|| event.clone());
        let handler = self
            .handlers
            .event_handler(&key)
            .ok_or_else(|| LoadError::UnknownHandler {
                path: path.to_path_buf(),
                key: key.clone(),
            })?;

        Ok(EventBinding {
            event,
            once: unit.once,
            handler_key: key,
            handler,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn import_addon(&self, path: &Path) -> Result<AddonDescriptor, LoadError> {
        let unit: AddonUnit = read_unit(path)?;
        let structure = unit.structure.ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: "structure",
        })?;
        let name = non_empty(structure.name).ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: "name",
        })?;
        let version = non_empty(structure.version).ok_or_else(|| LoadError::MissingField {
            path: path.to_path_buf(),
            field: "version",
        })?;
        let key = non_empty(unit.initialize).unwrap_or_else(|| name.clone());
        let initializer = self
            .handlers
            .addon_initializer(&key)
            .ok_or_else(|| LoadError::UnknownHandler {
                path: path.to_path_buf(),
                key: key.clone(),
            })?;

        Ok(AddonDescriptor {
            name,
            version,
            author: non_empty(structure.author),
            permissions: Permissions::from_bits_truncate(structure.bitfield.unwrap_or(0)),
            config: unit.config,
            initializer,
            source: Some(path.to_path_buf()),
        })
    }
}

/// `execute` if given, `reply` for template-only units, else the command name
fn handler_key(execute: Option<String>, has_response: bool, name: &str) -> String {
    match non_empty(execute) {
        Some(key) => key.to_lowercase(),
        None if has_response => "reply".to_string(),
        None => name.to_lowercase(),
    }
}
