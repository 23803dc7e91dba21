use std::fmt;

bitflags::bitflags! {
    /// Platform permission bitfield.
    ///
    /// Bit positions follow the remote platform's permission integer so an
    /// addon's raw `bitfield` can be read with [`Permissions::from_bits_truncate`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permissions: u64 {
        const CREATE_INSTANT_INVITE = 1 << 0;
        const KICK_MEMBERS = 1 << 1;
        const BAN_MEMBERS = 1 << 2;
        const ADMINISTRATOR = 1 << 3;
        const MANAGE_CHANNELS = 1 << 4;
        const MANAGE_GUILD = 1 << 5;
        const ADD_REACTIONS = 1 << 6;
        const VIEW_AUDIT_LOG = 1 << 7;
        const VIEW_CHANNEL = 1 << 10;
        const SEND_MESSAGES = 1 << 11;
        const MANAGE_MESSAGES = 1 << 13;
        const EMBED_LINKS = 1 << 14;
        const ATTACH_FILES = 1 << 15;
        const READ_MESSAGE_HISTORY = 1 << 16;
        const MENTION_EVERYONE = 1 << 17;
        const USE_EXTERNAL_EMOJIS = 1 << 18;
        const CONNECT = 1 << 20;
        const SPEAK = 1 << 21;
        const CHANGE_NICKNAME = 1 << 26;
        const MANAGE_NICKNAMES = 1 << 27;
        const MANAGE_ROLES = 1 << 28;
        const MANAGE_WEBHOOKS = 1 << 29;
        const MANAGE_EMOJIS = 1 << 30;
        const MODERATE_MEMBERS = 1 << 40;
    }
}

impl Permissions {
    /// Parse a single permission name.
    ///
    /// Accepts `manage-messages`, `manage_messages`, `MANAGE_MESSAGES` and
    /// `ManageMessages`.
    pub fn parse_name(name: &str) -> Option<Self> {
        let mut normalized = String::with_capacity(name.len() + 4);
        let mut prev_lower = false;
        for ch in name.trim().chars() {
            if ch == '-' || ch == '_' || ch == ' ' {
                normalized.push('_');
                prev_lower = false;
            } else if ch.is_ascii_uppercase() && prev_lower {
                normalized.push('_');
                normalized.push(ch);
                prev_lower = false;
            } else {
                prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
                normalized.push(ch.to_ascii_uppercase());
            }
        }
        Self::from_name(&normalized)
    }

    /// Parse a list of names, returning the first unknown name on failure.
    pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        names.iter().try_fold(Self::empty(), |acc, name| {
            Self::parse_name(name.as_ref())
                .map(|p| acc | p)
                .ok_or_else(|| name.as_ref().to_string())
        })
    }

    /// Permissions in `required` that this set does not grant.
    ///
    /// `ADMINISTRATOR` grants everything.
    pub fn missing(&self, required: Permissions) -> Permissions {
        if self.contains(Permissions::ADMINISTRATOR) {
            return Permissions::empty();
        }
        required - *self
    }

    /// Human-readable names, e.g. `["Manage Messages", "Ban Members"]`.
    pub fn display_names(&self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| {
                name.split('_')
                    .map(|word| {
                        let mut chars = word.chars();
                        match chars.next() {
                            Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
                            None => String::new(),
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_names().join(", "))
    }
}
