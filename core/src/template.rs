//! Placeholder substitution for setup commands.
//!
//! Commands in a metafile may reference the package being configured through
//! `!TOKEN!` placeholders. Substitution is purely textual and runs token by
//! token in a fixed order, each token replaced everywhere before the next one
//! is considered:
//!
//! | token | value |
//! |---|---|
//! | `!VERSION!` | full version string |
//! | `!MAJOR_VERSION!` | first dot-separated component |
//! | `!MINOR_VERSION!` | second component, or empty |
//! | `!BASE!` | base path |
//! | `!ROOT!` | root path |
//! | `!USER!` | acting user, or `UNKNOWN_USER` |

use crate::types::Descriptor;

/// Environment variable holding the acting user's name.
pub const USER_ENV: &str = "USER";

/// Substituted for `!USER!` when no user is known.
pub const UNKNOWN_USER: &str = "UNKNOWN_USER";

/// Major and minor components of a dot-separated version.
///
/// Missing components are empty strings, so lookups never fail.
///
/// # Examples
///
/// ```
/// use metafile_core::VersionParts;
///
/// let parts = VersionParts::split("2.5.1");
/// assert_eq!((parts.major, parts.minor), ("2", "5"));
///
/// let parts = VersionParts::split("3");
/// assert_eq!((parts.major, parts.minor), ("3", ""));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionParts<'a> {
    pub major: &'a str,
    pub minor: &'a str,
}

impl<'a> VersionParts<'a> {
    pub fn split(version: &'a str) -> Self {
        let mut components = version.split('.');
        Self {
            major: components.next().unwrap_or_default(),
            minor: components.next().unwrap_or_default(),
        }
    }
}

/// Per-invocation values for command placeholders.
///
/// [`CommandContext::new`] reads the user from `$USER`; use
/// [`with_user`](CommandContext::with_user) to override it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    version: String,
    base: String,
    root: String,
    user: Option<String>,
    unknown_user: String,
}

impl CommandContext {
    pub fn new(
        version: impl Into<String>,
        base: impl Into<String>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            base: base.into(),
            root: root.into(),
            user: std::env::var(USER_ENV).ok(),
            unknown_user: UNKNOWN_USER.to_string(),
        }
    }

    /// Replaces the acting user. `None` makes `!USER!` expand to the
    /// unknown-user fallback.
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    /// Replaces the text used when no user is known.
    pub fn with_unknown_user(mut self, unknown_user: impl Into<String>) -> Self {
        self.unknown_user = unknown_user.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The value `!USER!` expands to.
    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or(&self.unknown_user)
    }

    /// Substitutes every placeholder in `template`.
    pub fn render(&self, template: &str) -> String {
        let parts = VersionParts::split(&self.version);
        let substitutions = [
            ("!VERSION!", self.version.as_str()),
            ("!MAJOR_VERSION!", parts.major),
            ("!MINOR_VERSION!", parts.minor),
            ("!BASE!", self.base.as_str()),
            ("!ROOT!", self.root.as_str()),
            ("!USER!", self.user()),
        ];
        substitutions
            .iter()
            .fold(template.to_string(), |acc, &(token, value)| {
                acc.replace(token, value)
            })
    }
}

/// Renders `descriptor`'s commands for one package installation, taking the
/// user from the environment.
pub fn render_commands(
    descriptor: &Descriptor,
    version: &str,
    base: &str,
    root: &str,
) -> Option<Vec<String>> {
    descriptor.render_commands(&CommandContext::new(version, base, root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(version: &str, user: Option<&str>) -> CommandContext {
        CommandContext::new(version, "/base", "/root").with_user(user.map(String::from))
    }

    #[test]
    fn test_user_substitution() {
        let ctx = context("2.5.1", Some("alice"));
        assert_eq!(ctx.render("setup !VERSION! !USER!"), "setup 2.5.1 alice");

        let ctx = context("2.5.1", None);
        assert_eq!(
            ctx.render("setup !VERSION! !USER!"),
            "setup 2.5.1 UNKNOWN_USER"
        );
    }

    #[test]
    fn test_custom_unknown_user() {
        let ctx = context("1", None).with_unknown_user("nobody");
        assert_eq!(ctx.user(), "nobody");
        assert_eq!(ctx.render("!USER!"), "nobody");
    }

    #[test]
    fn test_all_tokens_replaced_globally() {
        let ctx = context("4.8.2", Some("bob"));
        let rendered = ctx.render(
            "!BASE!/!MAJOR_VERSION!.!MINOR_VERSION! !ROOT! !ROOT! !VERSION! !USER! !VERSION!",
        );
        assert_eq!(rendered, "/base/4.8 /root /root 4.8.2 bob 4.8.2");
    }

    #[test]
    fn test_version_without_minor() {
        let ctx = context("3", Some("u"));
        assert_eq!(ctx.render("[!MAJOR_VERSION!][!MINOR_VERSION!]"), "[3][]");
    }

    #[test]
    fn test_empty_version() {
        let parts = VersionParts::split("");
        assert_eq!(parts, VersionParts { major: "", minor: "" });
    }

    #[test]
    fn test_substitution_order_is_fixed() {
        // !VERSION! runs first, so a version that itself contains a later
        // token is expanded again by that token's pass.
        let ctx = CommandContext::new("!ROOT!", "/b", "/r").with_user(None);
        assert_eq!(ctx.render("!VERSION!"), "/r");

        // Later tokens are not revisited by earlier passes.
        let ctx = CommandContext::new("1.0", "!VERSION!", "/r").with_user(None);
        assert_eq!(ctx.render("!BASE!"), "!VERSION!");
    }

    #[test]
    fn test_render_commands_absent() {
        let stub = Descriptor::stub("p");
        assert_eq!(render_commands(&stub, "1.0", "/b", "/r"), None);
    }

    #[test]
    fn test_unknown_tokens_untouched() {
        let ctx = context("1.0", Some("u"));
        assert_eq!(ctx.render("echo !PATCH! $HOME"), "echo !PATCH! $HOME");
    }
}
